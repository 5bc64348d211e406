use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::config::core_config::FormConfig;
use crate::provider::certificate_api::CertificateApi;

pub mod dto;
mod service;
pub(crate) mod validator;

use dto::SubmitButtonState;

/// The application form as the controller sees it.
///
/// Implementations render whatever the controller asks for; they never decide anything
/// themselves.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait FormView: Send + Sync {
    /// Current raw value of a field, `None` if the form has no such field
    fn field_value(&self, name: &str) -> Option<String>;

    /// Every field of the form with its raw value, in form order
    fn form_data(&self) -> Vec<(String, String)>;

    /// Puts the field's form group in the error state and fills its message slot
    fn mark_field_invalid(&self, name: &str, message: &str);

    /// Clears the error state and the message slot of the field's form group
    fn clear_field_error(&self, name: &str);

    fn set_submit_button(&self, state: SubmitButtonState);

    /// Blocking, user facing notification
    fn alert(&self, message: &str);

    fn navigate(&self, path: &str);
}

/// Whatever hosts forms, looked up by form id
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait Page: Send + Sync {
    fn find_form(&self, form_id: &str) -> Option<Arc<dyn FormView>>;
}

/// Builds [`AttachedForm`]s for pages that carry the application form
#[derive(Clone)]
pub struct ApplicationFormController {
    certificate_api: Arc<dyn CertificateApi>,
    config: Arc<FormConfig>,
}

impl ApplicationFormController {
    pub fn new(certificate_api: Arc<dyn CertificateApi>, config: FormConfig) -> Self {
        Self {
            certificate_api,
            config: Arc::new(config),
        }
    }
}

/// Controller bound to one form instance
pub struct AttachedForm {
    certificate_api: Arc<dyn CertificateApi>,
    config: Arc<FormConfig>,
    view: Arc<dyn FormView>,
    attached: AtomicBool,
    submitting: AtomicBool,
}
