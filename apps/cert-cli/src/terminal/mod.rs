use std::fmt::Arguments;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use cert_client::model::application::FormDescription;
use cert_client::service::application_form::dto::SubmitButtonState;
use cert_client::service::application_form::{FormView, Page};
use indexmap::IndexMap;

/// Application form filled from the command line; feedback goes to `out`.
///
/// Every described field exists, empty unless given. Given fields the description does not
/// know are kept and sent along.
pub struct TerminalForm<W> {
    values: IndexMap<String, String>,
    out: Mutex<W>,
    location: Mutex<Option<String>>,
}

impl<W: Write + Send> TerminalForm<W> {
    pub fn new(
        description: &FormDescription,
        fields: impl IntoIterator<Item = (String, String)>,
        out: W,
    ) -> Self {
        let mut values: IndexMap<String, String> = description
            .fields
            .iter()
            .map(|field| (field.name.to_owned(), String::new()))
            .collect();
        values.extend(fields);

        Self {
            values,
            out: Mutex::new(out),
            location: Mutex::new(None),
        }
    }

    /// Last path the form navigated to
    pub fn location(&self) -> Option<String> {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn print(&self, line: Arguments<'_>) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(error) = writeln!(out, "{line}") {
            tracing::warn!(%error, "Failed to write form output");
        }
    }
}

impl<W: Write + Send> FormView for TerminalForm<W> {
    fn field_value(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn form_data(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect()
    }

    fn mark_field_invalid(&self, name: &str, message: &str) {
        self.print(format_args!("{name}: {message}"));
    }

    fn clear_field_error(&self, name: &str) {
        tracing::trace!(name, "Field valid");
    }

    fn set_submit_button(&self, state: SubmitButtonState) {
        tracing::debug!(label = %state.label, disabled = state.disabled, "Submit button");
    }

    fn alert(&self, message: &str) {
        self.print(format_args!("{message}"));
    }

    fn navigate(&self, path: &str) {
        tracing::info!(path, "Navigating");
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = Some(path.to_owned());
    }
}

/// Page holding a single form under `form_id`
pub struct TerminalPage {
    form_id: String,
    form: Arc<dyn FormView>,
}

impl TerminalPage {
    pub fn new(form_id: impl Into<String>, form: Arc<dyn FormView>) -> Self {
        Self {
            form_id: form_id.into(),
            form,
        }
    }
}

impl Page for TerminalPage {
    fn find_form(&self, form_id: &str) -> Option<Arc<dyn FormView>> {
        (self.form_id == form_id).then(|| self.form.clone())
    }
}
