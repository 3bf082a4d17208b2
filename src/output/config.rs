use std::env;

use crate::telemetry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl OutputConfig {
    /// `--json` wins over `BUZZ_OUTPUT_FORMAT`.
    pub fn from_env() -> Self {
        let mut cfg = Self::from_vars(|k| env::var(k).ok());
        if telemetry::config::json_mode() {
            cfg.format = OutputFormat::Json;
        }
        cfg
    }

    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let format = match get("BUZZ_OUTPUT_FORMAT").as_deref() {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        };
        let pretty = match get("BUZZ_OUTPUT_PRETTY").as_deref() {
            Some(v) if v.eq_ignore_ascii_case("1") || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes") => true,
            _ => false,
        };
        OutputConfig { format, pretty }
    }
}
