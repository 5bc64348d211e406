use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use shared_types::CertificateId;
use url::Url;

use super::CertificateApi;
use super::error::CertificateApiError;
use crate::model::application::ApplicationPayload;
use crate::model::certificate::{Certificate, CertificateFile};
use crate::provider::http_client::{
    APPLICATION_JSON, CONTENT_TYPE, Headers, HttpClient, Method, Response,
};

const CERTIFICATES_PATH: &str = "/certificates";
const ONE_CLICK_PATH: &str = "/certificates/one-click";
const DOWNLOAD_PATH: &str = "/certificates/download";
const FILES_PATH: &str = "/certificates/file";

const CONTENT_DISPOSITION: &str = "Content-Disposition";

/// Per-call overrides for [`HTTPCertificateApi::request`].
///
/// Merging is shallow: a set option replaces the default as a whole. Passing
/// `headers` therefore drops the default `Content-Type` unless it is repeated.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub headers: Option<Headers>,
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    pub fn default_options() -> Self {
        Self {
            method: Some(Method::Get),
            headers: Some(Headers::from([(
                CONTENT_TYPE.to_owned(),
                APPLICATION_JSON.to_owned(),
            )])),
            body: None,
        }
    }

    fn merged_over(self, defaults: Self) -> Self {
        Self {
            method: self.method.or(defaults.method),
            headers: self.headers.or(defaults.headers),
            body: self.body.or(defaults.body),
        }
    }
}

pub struct HTTPCertificateApi {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
}

impl HTTPCertificateApi {
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    /// Sends `options` (merged over the defaults) to `{base_url}{path}` and parses the JSON
    /// answer. Every failure is logged before it is returned.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, CertificateApiError> {
        let result = async {
            let response = self.exchange(self.endpoint(path)?, options, None::<&()>).await?;
            Ok::<T, CertificateApiError>(response.json()?)
        }
        .await;

        logged(path, result)
    }

    /// Like [`Self::request`], with `body` serialized as the JSON request body
    pub async fn request_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        options: RequestOptions,
        body: &B,
    ) -> Result<T, CertificateApiError> {
        let result = async {
            let response = self.exchange(self.endpoint(path)?, options, Some(body)).await?;
            Ok::<T, CertificateApiError>(response.json()?)
        }
        .await;

        logged(path, result)
    }

    /// Performs one exchange; only a 2xx answer is returned
    async fn exchange<B: Serialize + Sync>(
        &self,
        url: Url,
        options: RequestOptions,
        json: Option<&B>,
    ) -> Result<Response, CertificateApiError> {
        let options = options.merged_over(RequestOptions::default_options());

        let mut builder = match options.method.unwrap_or_default() {
            Method::Get => self.http_client.get(url.as_str()),
            Method::Post => self.http_client.post(url.as_str()),
        }
        .headers(options.headers.unwrap_or_default());

        if let Some(body) = options.body {
            builder = builder.body(body);
        }
        if let Some(json) = json {
            builder = builder.json(json)?;
        }

        Ok(builder.send().await?.error_for_status()?)
    }

    async fn fetch_file(
        &self,
        path: &str,
        url: Result<Url, CertificateApiError>,
    ) -> Result<CertificateFile, CertificateApiError> {
        let result = async {
            let response = self
                .exchange(url?, RequestOptions::default(), None::<&()>)
                .await?;

            Ok::<_, CertificateApiError>(CertificateFile {
                file_name: attachment_file_name(&response),
                content: response.body,
            })
        }
        .await;

        logged(path, result)
    }

    fn endpoint(&self, path: &str) -> Result<Url, CertificateApiError> {
        let url = format!("{}{path}", self.base_url.trim_end_matches('/'));

        Url::parse(&url).map_err(|e| CertificateApiError::InvalidUrl {
            url,
            reason: e.to_string(),
        })
    }

    /// `{base_url}{path}/{segment}` with `segment` percent-encoded as one path segment
    fn endpoint_with_segment(&self, path: &str, segment: &str) -> Result<Url, CertificateApiError> {
        let mut url = self.endpoint(path)?;

        url.path_segments_mut()
            .map_err(|_| CertificateApiError::InvalidUrl {
                url: self.base_url.to_owned(),
                reason: "cannot be a base".to_owned(),
            })?
            .push(segment);

        Ok(url)
    }
}

fn logged<T>(
    path: &str,
    result: Result<T, CertificateApiError>,
) -> Result<T, CertificateApiError> {
    if let Err(error) = &result {
        tracing::error!(%error, path, "Certificate API request failed");
    }

    result
}

/// `filename` parameter of an `attachment` disposition
fn attachment_file_name(response: &Response) -> Option<String> {
    response
        .header(CONTENT_DISPOSITION)?
        .split(';')
        .find_map(|part| part.trim().strip_prefix("filename="))
        .map(|name| name.trim().trim_matches('"').to_owned())
        .filter(|name| !name.is_empty())
}

#[async_trait::async_trait]
impl CertificateApi for HTTPCertificateApi {
    async fn list(&self) -> Result<Vec<Certificate>, CertificateApiError> {
        self.request(CERTIFICATES_PATH, RequestOptions::default())
            .await
    }

    async fn get_by_id(&self, id: CertificateId) -> Result<Certificate, CertificateApiError> {
        self.request(&format!("{CERTIFICATES_PATH}/{id}"), RequestOptions::default())
            .await
    }

    async fn apply(
        &self,
        payload: ApplicationPayload,
    ) -> Result<Certificate, CertificateApiError> {
        self.request_json(
            CERTIFICATES_PATH,
            RequestOptions {
                method: Some(Method::Post),
                ..Default::default()
            },
            &payload,
        )
        .await
    }

    async fn one_click_apply(
        &self,
        payload: ApplicationPayload,
    ) -> Result<Certificate, CertificateApiError> {
        self.request_json(
            ONE_CLICK_PATH,
            RequestOptions {
                method: Some(Method::Post),
                ..Default::default()
            },
            &payload,
        )
        .await
    }

    async fn download(&self, id: CertificateId) -> Result<CertificateFile, CertificateApiError> {
        let path = format!("{DOWNLOAD_PATH}/{id}");
        self.fetch_file(&path, self.endpoint(&path)).await
    }

    async fn file(&self, file_name: &str) -> Result<Vec<u8>, CertificateApiError> {
        let path = format!("{FILES_PATH}/{file_name}");
        let url = self.endpoint_with_segment(FILES_PATH, file_name);

        Ok(self.fetch_file(&path, url).await?.content)
    }
}

#[cfg(test)]
mod test;
