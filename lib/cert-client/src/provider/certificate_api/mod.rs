use shared_types::CertificateId;

use self::error::CertificateApiError;
use crate::model::application::ApplicationPayload;
use crate::model::certificate::{Certificate, CertificateFile};

pub mod error;
pub mod http;

/// Remote certificate collection
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait::async_trait]
pub trait CertificateApi: Send + Sync {
    /// Reads the whole collection
    async fn list(&self) -> Result<Vec<Certificate>, CertificateApiError>;

    /// Reads a single certificate; every call goes to the service
    async fn get_by_id(&self, id: CertificateId) -> Result<Certificate, CertificateApiError>;

    /// Submits a new application, returning what the service created
    async fn apply(&self, payload: ApplicationPayload)
    -> Result<Certificate, CertificateApiError>;

    /// Submits an application the service issues right away
    async fn one_click_apply(
        &self,
        payload: ApplicationPayload,
    ) -> Result<Certificate, CertificateApiError>;

    /// Issued certificate file of an application
    async fn download(&self, id: CertificateId) -> Result<CertificateFile, CertificateApiError>;

    /// Raw content of a file the service stores under `file_name`
    async fn file(&self, file_name: &str) -> Result<Vec<u8>, CertificateApiError>;
}
