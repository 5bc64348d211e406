use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Form field name to raw value, in form order.
///
/// Built from the form on every submission attempt; empty values are kept.
pub type ApplicationPayload = IndexMap<String, String>;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    #[default]
    Text,
    Email,
    Select,
    TextArea,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescription {
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

impl FieldDescription {
    pub fn new(name: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            required,
        }
    }
}

/// Ordered description of the fields an application form carries
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormDescription {
    pub fields: Vec<FieldDescription>,
}

impl FormDescription {
    pub fn field(&self, name: &str) -> Option<&FieldDescription> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl Default for FormDescription {
    fn default() -> Self {
        Self {
            fields: vec![
                FieldDescription::new("name", FieldKind::Text, true),
                FieldDescription::new("type", FieldKind::Select, true),
                FieldDescription::new("email", FieldKind::Email, true),
                FieldDescription::new("description", FieldKind::TextArea, false),
            ],
        }
    }
}
