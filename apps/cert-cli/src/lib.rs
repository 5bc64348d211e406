#![cfg_attr(feature = "strict", deny(warnings))]

use serde::{Deserialize, Serialize};

pub mod command;
pub mod terminal;

/// `app` section of the configuration
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CliConfig {
    pub trace_level: Option<String>,
    pub trace_json: Option<bool>,
}
