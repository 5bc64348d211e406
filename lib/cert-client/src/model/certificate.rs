use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::CertificateId;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Certificate exactly as the remote service returned it.
///
/// The body is kept verbatim. The accessors are best effort: a missing attribute, or one of
/// an unexpected type, reads as `None` and never invalidates the certificate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Certificate(Value);

impl Certificate {
    /// Numeric id, also accepted as a numeric string
    pub fn id(&self) -> Option<CertificateId> {
        match self.0.get("id")? {
            Value::Number(number) => number.as_i64().map(Into::into),
            Value::String(text) => text.parse().ok(),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    pub fn r#type(&self) -> Option<&str> {
        self.text("type")
    }

    pub fn email(&self) -> Option<&str> {
        self.text("email")
    }

    pub fn description(&self) -> Option<&str> {
        self.text("description")
    }

    pub fn status(&self) -> Option<CertificateStatus> {
        self.text("status").map(CertificateStatus::from)
    }

    pub fn created_at(&self) -> Option<PrimitiveDateTime> {
        self.text("createdAt").and_then(parse_timestamp)
    }

    pub fn updated_at(&self) -> Option<PrimitiveDateTime> {
        self.text("updatedAt").and_then(parse_timestamp)
    }

    /// Any attribute of the body, typed or not
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.as_str()
    }
}

impl From<Value> for Certificate {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Local date-time with optional fractional seconds; RFC 3339 values are normalized to UTC
fn parse_timestamp(value: &str) -> Option<PrimitiveDateTime> {
    let local = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );

    PrimitiveDateTime::parse(value, local).ok().or_else(|| {
        let utc = OffsetDateTime::parse(value, &Rfc3339)
            .ok()?
            .to_offset(UtcOffset::UTC);
        Some(PrimitiveDateTime::new(utc.date(), utc.time()))
    })
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CertificateStatus {
    /// Initial state assigned by the service on creation
    Pending,
    Other(String),
}

impl CertificateStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Other(value) => value,
        }
    }
}

impl From<&str> for CertificateStatus {
    fn from(value: &str) -> Self {
        match value {
            "PENDING" => Self::Pending,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl std::fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary certificate download
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CertificateFile {
    /// Name suggested by the service's `Content-Disposition`, if any
    pub file_name: Option<String>,
    pub content: Vec<u8>,
}
