use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier the certificate service assigns to an application.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct CertificateId(i64);

impl FromStr for CertificateId {
    type Err = ParseIntError;

    /// Surrounding whitespace is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for CertificateId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<CertificateId> for i64 {
    fn from(value: CertificateId) -> Self {
        value.0
    }
}

impl PartialEq<i64> for CertificateId {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}
