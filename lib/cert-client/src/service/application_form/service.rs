use std::sync::atomic::{AtomicBool, Ordering};

use super::dto::{FieldValidation, InvalidField, SubmissionOutcome, SubmitButtonState};
use super::validator::validate_field;
use super::{ApplicationFormController, AttachedForm, FormView, Page};
use crate::config::core_config::FormConfig;
use crate::model::application::ApplicationPayload;

impl ApplicationFormController {
    /// Binds to the configured form of `page`; a page without it is left alone
    pub fn attach(&self, page: &dyn Page) -> Option<AttachedForm> {
        let Some(view) = page.find_form(&self.config.form_id) else {
            tracing::debug!(form_id = %self.config.form_id, "Form not present, not attaching");
            return None;
        };

        tracing::debug!(form_id = %self.config.form_id, "Attached to form");
        Some(AttachedForm {
            certificate_api: self.certificate_api.clone(),
            config: self.config.clone(),
            view,
            attached: AtomicBool::new(true),
            submitting: AtomicBool::new(false),
        })
    }
}

impl AttachedForm {
    /// Stops reacting to form events. Idempotent.
    pub fn detach(&self) {
        if self.attached.swap(false, Ordering::AcqRel) {
            tracing::debug!(form_id = %self.config.form_id, "Detached from form");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Validates one field after it lost focus and renders the result.
    ///
    /// Returns `None` when detached or when the form has no such field.
    pub fn blur(&self, field_name: &str) -> Option<FieldValidation> {
        if !self.is_attached() {
            return None;
        }

        let field = self.config.fields.field(field_name)?;
        let value = self.view.field_value(field_name)?;

        let validation = validate_field(field, &value, &self.config);
        self.render_validation(field_name, &validation);

        Some(validation)
    }

    /// Runs one submission: validate, send, report, restore the button.
    pub async fn submit(&self) -> SubmissionOutcome {
        if !self.is_attached() {
            return SubmissionOutcome::Detached;
        }

        let Some(_in_flight) = InFlight::begin(&self.submitting) else {
            tracing::warn!(form_id = %self.config.form_id, "Submission already in progress");
            return SubmissionOutcome::AlreadySubmitting;
        };

        if self.config.validate_before_submit {
            let invalid = self.validate_all();
            if !invalid.is_empty() {
                tracing::info!(count = invalid.len(), "Form has invalid fields, not submitting");
                return SubmissionOutcome::Invalid(invalid);
            }
        }

        let payload: ApplicationPayload = self.view.form_data().into_iter().collect();

        let _button = BusyButton::show(self.view.as_ref(), &self.config);

        match self.certificate_api.apply(payload).await {
            Ok(certificate) => {
                tracing::info!(id = ?certificate.id(), "Certificate application submitted");
                self.view.alert(&self.config.success_message);
                self.view.navigate(&self.config.list_path);
                SubmissionOutcome::Success(certificate)
            }
            Err(error) => {
                self.view
                    .alert(&format!("{}{error}", self.config.failure_prefix));
                SubmissionOutcome::Failure(error)
            }
        }
    }

    fn validate_all(&self) -> Vec<InvalidField> {
        self.config
            .fields
            .fields
            .iter()
            .filter_map(|field| {
                // fields missing from the form cannot be filled in, so they are not checked
                let value = self.view.field_value(&field.name)?;
                let validation = validate_field(field, &value, &self.config);
                self.render_validation(&field.name, &validation);

                match validation {
                    FieldValidation::Valid => None,
                    FieldValidation::Invalid { message } => Some(InvalidField {
                        name: field.name.to_owned(),
                        message,
                    }),
                }
            })
            .collect()
    }

    fn render_validation(&self, field_name: &str, validation: &FieldValidation) {
        match validation {
            FieldValidation::Valid => self.view.clear_field_error(field_name),
            FieldValidation::Invalid { message } => {
                self.view.mark_field_invalid(field_name, message)
            }
        }
    }
}

/// Holds the per-form submission flag, released on drop
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn begin(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Disables the submit button for its lifetime and restores the idle label on drop
struct BusyButton<'a> {
    view: &'a dyn FormView,
    idle_label: &'a str,
}

impl<'a> BusyButton<'a> {
    fn show(view: &'a dyn FormView, config: &'a FormConfig) -> Self {
        view.set_submit_button(SubmitButtonState::busy(&config.submitting_label));
        Self {
            view,
            idle_label: &config.submit_label,
        }
    }
}

impl Drop for BusyButton<'_> {
    fn drop(&mut self) {
        self.view
            .set_submit_button(SubmitButtonState::idle(self.idle_label));
    }
}
