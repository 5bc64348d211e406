pub mod reqwest_client;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;

use itertools::Itertools;
use serde::Serialize;
use serde::de::DeserializeOwned;
use strum::Display;
use thiserror::Error;

/// Transport underneath the certificate API
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str) -> RequestBuilder;
    fn post(&self, url: &str) -> RequestBuilder;

    /// Performs `request` as is. Any status the server answers with is a [`Response`].
    async fn send(&self, request: Request) -> Result<Response, Error>;
}

pub type Headers = HashMap<String, String>;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// Anything in the 2xx range; every other status is treated as a failure
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Headers,
    pub body: Vec<u8>,

    pub request: Request,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Network error: {0}")]
    HttpError(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Other HTTP client error: {0}")]
    Other(String),
    #[error("HTTP error! status: {0}")]
    StatusCodeIsError(StatusCode),
}

impl Error {
    fn logged(self, request: &Request, location: &Location<'_>) -> Self {
        tracing::error!(
            method = %request.method,
            url = %request.url,
            error = %self,
            %location,
            "HTTP request failed"
        );
        self
    }
}

impl Response {
    #[track_caller]
    pub fn error_for_status(self) -> Result<Self, Error> {
        if self.status.is_success() {
            return Ok(self);
        }

        let location = Location::caller();
        Err(Error::StatusCodeIsError(self.status).logged(&self.request, location))
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find_map(|(key, value)| key.eq_ignore_ascii_case(name).then_some(value.as_str()))
    }

    #[track_caller]
    pub fn json<T: DeserializeOwned>(self) -> Result<T, Error> {
        let location = Location::caller();

        serde_json::from_slice(&self.body)
            .map_err(|error| Error::JsonError(error).logged(&self.request, location))
    }
}

pub struct RequestBuilder {
    client: Arc<dyn HttpClient>,
    request: Request,
}

impl RequestBuilder {
    pub fn new(client: Arc<dyn HttpClient>, method: Method, url: &str) -> Self {
        Self {
            client,
            request: Request {
                method,
                url: url.to_owned(),
                headers: Headers::new(),
                body: None,
            },
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.request
            .headers
            .insert(name.to_owned(), value.to_owned());
        self
    }

    /// Replaces every header set so far
    pub fn headers(mut self, headers: Headers) -> Self {
        self.request.headers = headers;
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.request.body = Some(body);
        self
    }

    /// Serialized `value` as body, plus the JSON content type
    #[track_caller]
    pub fn json(self, value: impl Serialize) -> Result<Self, Error> {
        let location = Location::caller();

        match serde_json::to_vec(&value) {
            Ok(body) => Ok(self.header(CONTENT_TYPE, APPLICATION_JSON).body(body)),
            Err(error) => Err(Error::JsonError(error).logged(&self.request, location)),
        }
    }

    #[track_caller]
    pub fn send(self) -> impl Future<Output = Result<Response, Error>> + Send {
        let location = Location::caller();

        async move {
            let Self { client, request } = self;
            trace_request(&request, location);

            match client.send(request.clone()).await {
                Ok(response) => {
                    log_response(&response, location);
                    Ok(response)
                }
                Err(error) => Err(error.logged(&request, location)),
            }
        }
    }
}

fn trace_request(request: &Request, location: &Location<'_>) {
    tracing::trace!(
        method = %request.method,
        url = %request.url,
        headers = %format_headers(&request.headers),
        body = %format_body(request.body.as_deref()),
        %location,
        "Sending request"
    );
}

fn log_response(response: &Response, location: &Location<'_>) {
    tracing::debug!(
        method = %response.request.method,
        url = %response.request.url,
        status = %response.status,
        %location,
        "Request completed"
    );
    tracing::trace!(
        headers = %format_headers(&response.headers),
        body = %format_body(Some(&response.body)),
        %location,
        "Response"
    );
}

fn format_headers(headers: &Headers) -> String {
    if headers.is_empty() {
        return "<none>".to_owned();
    }

    headers
        .iter()
        .sorted()
        .map(|(name, value)| format!("{name}: {value}"))
        .join(", ")
}

fn format_body(body: Option<&[u8]>) -> String {
    let Some(body) = body else {
        return "<none>".to_owned();
    };

    match std::str::from_utf8(body) {
        Ok(text) => text.to_owned(),
        Err(_) => format!("<{} bytes of binary>", body.len()),
    }
}
