#![cfg_attr(feature = "strict", deny(warnings))]

use std::sync::Arc;

use config::core_config::ClientConfig;
use provider::certificate_api::CertificateApi;
use provider::certificate_api::http::HTTPCertificateApi;
use provider::http_client;
use provider::http_client::reqwest_client::ReqwestClient;
use service::application_form::ApplicationFormController;

pub mod config;
pub mod model;
pub mod provider;
pub mod service;

/// Everything needed to talk to the certificate service, wired from one [`ClientConfig`]
#[derive(Clone)]
pub struct CertClient {
    pub certificate_api: Arc<dyn CertificateApi>,
    config: ClientConfig,
}

impl CertClient {
    pub fn new(config: ClientConfig) -> Result<Self, http_client::Error> {
        let http_client = ReqwestClient::with_timeout(config.request_timeout)?;

        let certificate_api = Arc::new(HTTPCertificateApi::new(
            Arc::new(http_client),
            config.base_url.to_owned(),
        ));

        tracing::debug!(base_url = %config.base_url, "Certificate client created");

        Ok(Self::with_api(certificate_api, config))
    }

    /// Uses `certificate_api` instead of the HTTP implementation
    pub fn with_api(certificate_api: Arc<dyn CertificateApi>, config: ClientConfig) -> Self {
        Self {
            certificate_api,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn application_form_controller(&self) -> ApplicationFormController {
        ApplicationFormController::new(self.certificate_api.clone(), self.config.form.to_owned())
    }
}
