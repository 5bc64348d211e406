use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use figment::Figment;
#[cfg(feature = "config_env")]
use figment::providers::Env;
#[cfg(feature = "config_json")]
use figment::providers::Json;
#[cfg(feature = "config_yaml")]
use figment::providers::Yaml;
use figment::providers::{Data, Format};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};

use super::ConfigParsingError;
use crate::model::application::FormDescription;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_FORM_ID: &str = "certificateForm";
pub const DEFAULT_LIST_PATH: &str = "/list.html";
#[cfg(feature = "config_env")]
pub const ENV_PREFIX: &str = "CERT_";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoCustomConfig;

#[derive(Deserialize)]
struct AppSection<Custom> {
    #[serde(default)]
    app: Custom,
}

/// Client settings plus an application specific `app` section
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig<Custom> {
    pub client: ClientConfig,
    pub app: Custom,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Prefix of every certificate endpoint, e.g. `https://certs.example.com/api`
    pub base_url: String,
    /// Overall per-request timeout, unlimited when absent
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    pub request_timeout: Option<Duration>,
    pub form: FormConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            request_timeout: None,
            form: FormConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormConfig {
    pub form_id: String,
    pub fields: FormDescription,
    pub submit_label: String,
    pub submitting_label: String,
    pub success_message: String,
    pub failure_prefix: String,
    pub empty_field_message: String,
    pub invalid_email_message: String,
    pub list_path: String,
    /// Run field validation on submit and refuse to send an invalid form
    pub validate_before_submit: bool,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            form_id: DEFAULT_FORM_ID.to_owned(),
            fields: FormDescription::default(),
            submit_label: "Submit application".to_owned(),
            submitting_label: "Submitting...".to_owned(),
            success_message: "Certificate application submitted successfully!".to_owned(),
            failure_prefix: "Submission failed: ".to_owned(),
            empty_field_message: "This field cannot be empty".to_owned(),
            invalid_email_message: "Please enter a valid email address".to_owned(),
            list_path: DEFAULT_LIST_PATH.to_owned(),
            validate_before_submit: true,
        }
    }
}

/// One configuration layer
pub enum ConfigSource {
    #[cfg(feature = "config_yaml")]
    Yaml(Data<Yaml>),
    #[cfg(feature = "config_json")]
    Json(Data<Json>),
}

impl ConfigSource {
    /// Format is chosen by extension: `.yml`/`.yaml` or `.json`, as far as enabled
    pub fn file(path: &Path) -> Result<Self, ConfigParsingError> {
        match path.extension().and_then(OsStr::to_str) {
            #[cfg(feature = "config_yaml")]
            Some("yml" | "yaml") => Ok(Self::Yaml(Yaml::file(path))),
            #[cfg(feature = "config_json")]
            Some("json") => Ok(Self::Json(Json::file(path))),
            _ => Err(ConfigParsingError::UnsupportedFile(path.to_path_buf())),
        }
    }

    #[cfg(feature = "config_yaml")]
    pub fn yaml(content: &str) -> Self {
        Self::Yaml(Yaml::string(content))
    }

    #[cfg(feature = "config_json")]
    pub fn json(content: &str) -> Self {
        Self::Json(Json::string(content))
    }
}

impl<Custom> AppConfig<Custom>
where
    Custom: DeserializeOwned + Default,
{
    pub fn from_files(files: &[impl AsRef<Path>]) -> Result<Self, ConfigParsingError> {
        let sources = files
            .iter()
            .map(|path| ConfigSource::file(path.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Self::load(sources)
    }

    #[cfg(feature = "config_yaml")]
    pub fn from_yaml<'a>(
        contents: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ConfigParsingError> {
        Self::load(contents.into_iter().map(ConfigSource::yaml))
    }

    /// Built-in defaults, overridden by `sources` in order, then by `CERT_` environment
    /// variables when enabled (`__` separates nested keys)
    pub fn load(sources: impl IntoIterator<Item = ConfigSource>) -> Result<Self, ConfigParsingError> {
        let figment = sources
            .into_iter()
            .fold(Figment::new(), |figment, source| match source {
                #[cfg(feature = "config_yaml")]
                ConfigSource::Yaml(data) => figment.merge(data),
                #[cfg(feature = "config_json")]
                ConfigSource::Json(data) => figment.merge(data),
            });

        #[cfg(feature = "config_env")]
        let figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(false));

        let client: ClientConfig = figment.extract()?;
        let AppSection { app } = figment.extract::<AppSection<Custom>>()?;

        Ok(Self { client, app })
    }
}
