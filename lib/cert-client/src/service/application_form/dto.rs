use crate::model::certificate::Certificate;
use crate::provider::certificate_api::error::CertificateApiError;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubmitButtonState {
    pub disabled: bool,
    pub label: String,
}

impl SubmitButtonState {
    pub fn idle(label: impl Into<String>) -> Self {
        Self {
            disabled: false,
            label: label.into(),
        }
    }

    pub fn busy(label: impl Into<String>) -> Self {
        Self {
            disabled: true,
            label: label.into(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldValidation {
    Valid,
    Invalid { message: String },
}

impl FieldValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidField {
    pub name: String,
    pub message: String,
}

#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Application accepted, the user was sent to the list view
    Success(Certificate),
    /// The service call failed, the user was alerted with the error
    Failure(CertificateApiError),
    /// Local validation refused the form, nothing was sent
    Invalid(Vec<InvalidField>),
    /// Another submission of this form is still waiting for the service
    AlreadySubmitting,
    Detached,
}
