use std::sync::LazyLock;

use regex::Regex;

use super::dto::FieldValidation;
use crate::config::core_config::FormConfig;
use crate::model::application::{FieldDescription, FieldKind};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

/// `local@domain.tld` shape check, nothing stricter
pub(crate) fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

pub(crate) fn validate_field(
    field: &FieldDescription,
    value: &str,
    config: &FormConfig,
) -> FieldValidation {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return if field.required {
            FieldValidation::Invalid {
                message: config.empty_field_message.to_owned(),
            }
        } else {
            FieldValidation::Valid
        };
    }

    if field.kind == FieldKind::Email && !is_valid_email(value) {
        return FieldValidation::Invalid {
            message: config.invalid_email_message.to_owned(),
        };
    }

    FieldValidation::Valid
}
