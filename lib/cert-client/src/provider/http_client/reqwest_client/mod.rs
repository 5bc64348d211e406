use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::{Error, Headers, HttpClient, Method, Request, RequestBuilder, Response, StatusCode};

/// [`HttpClient`] over a shared `reqwest::Client`
#[derive(Clone, Default)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Client with an overall per-request timeout; `None` waits indefinitely
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::new(client))
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> RequestBuilder {
        RequestBuilder::new(Arc::new(self.clone()), Method::Get, url)
    }

    fn post(&self, url: &str) -> RequestBuilder {
        RequestBuilder::new(Arc::new(self.clone()), Method::Post, url)
    }

    async fn send(&self, request: Request) -> Result<Response, Error> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .headers(to_header_map(&request.headers)?);
        if let Some(body) = &request.body {
            builder = builder.body(body.to_owned());
        }

        let response = builder.send().await.map_err(network_error)?;

        let status = StatusCode(response.status().as_u16());
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                let value = value.to_str().map_err(|e| Error::Other(e.to_string()))?;
                Ok((name.as_str().to_owned(), value.to_owned()))
            })
            .collect::<Result<Headers, Error>>()?;
        let body = response.bytes().await.map_err(network_error)?.to_vec();

        Ok(Response {
            status,
            headers,
            body,
            request,
        })
    }
}

fn network_error(error: reqwest::Error) -> Error {
    Error::HttpError(error.to_string())
}

fn to_header_map(headers: &Headers) -> Result<HeaderMap, Error> {
    headers
        .iter()
        .map(|(name, value)| {
            let name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::Other(e.to_string()))?;
            let value = HeaderValue::from_str(value).map_err(|e| Error::Other(e.to_string()))?;

            Ok((name, value))
        })
        .collect()
}
