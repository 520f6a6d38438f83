//! Configuration for activity telemetry

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult};
use crate::pages::RouteNames;

/// Environment variable overriding [`SinkConfig::rest_url`]
pub const ENV_SINK_URL: &str = "ACTIVITY_SINK_URL";
/// Environment variable overriding [`SinkConfig::api_key`]
pub const ENV_SINK_KEY: &str = "ACTIVITY_SINK_KEY";
/// Environment variable overriding [`SinkConfig::table`]
pub const ENV_SINK_TABLE: &str = "ACTIVITY_SINK_TABLE";
/// Environment variable overriding [`TrackerConfig::enabled`]
pub const ENV_TRACKING_ENABLED: &str = "ACTIVITY_TRACKING_ENABLED";

/// Main tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Master switch. When false, `track` does nothing.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Where records go
    #[serde(default)]
    pub sink: SinkConfig,

    /// Device fields reported with every record
    #[serde(default)]
    pub device: DeviceConfig,

    /// Display names for page views
    #[serde(default)]
    pub routes: RouteNames,
}

fn default_true() -> bool { true }

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sink: SinkConfig::default(),
            device: DeviceConfig::default(),
            routes: RouteNames::default(),
        }
    }
}

impl TrackerConfig {
    /// Parse from a JSON document
    pub fn from_json(json: &str) -> TrackerResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> TrackerResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TrackerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Apply `ACTIVITY_*` environment overrides
    pub fn with_env_overrides(self) -> TrackerResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> TrackerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SINK_URL) {
            self.sink.rest_url = Some(url);
            self.sink.sink_type = SinkType::Rest;
        }
        if let Some(key) = lookup(ENV_SINK_KEY) {
            self.sink.api_key = Some(key);
        }
        if let Some(table) = lookup(ENV_SINK_TABLE) {
            self.sink.table = table;
        }
        if let Some(flag) = lookup(ENV_TRACKING_ENABLED) {
            self.enabled = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(TrackerError::Config(format!(
                        "{} must be a boolean, got {:?}",
                        ENV_TRACKING_ENABLED, other
                    )))
                }
            };
        }
        self.validate()?;
        Ok(self)
    }

    /// Check that the selected sink has what it needs
    pub fn validate(&self) -> TrackerResult<()> {
        if self.sink.sink_type == SinkType::Rest && self.sink.rest_url.is_none() {
            return Err(TrackerError::Config("rest sink requires sink.rest_url".to_string()));
        }
        if self.sink.sink_type == SinkType::File && self.sink.file_path.is_none() {
            return Err(TrackerError::Config("file sink requires sink.file_path".to_string()));
        }
        validate_table(&self.sink.table)?;
        validate_timeout(self.sink.timeout_ms)
    }
}

/// Table names end up in the insert URL path, so only identifier
/// characters are allowed.
pub(crate) fn validate_table(table: &str) -> TrackerResult<()> {
    if table.is_empty() {
        return Err(TrackerError::Config("sink.table must not be empty".to_string()));
    }
    if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(TrackerError::Config(format!(
            "sink.table must contain only letters, digits and '_', got {:?}",
            table
        )));
    }
    Ok(())
}

pub(crate) fn validate_timeout(timeout_ms: u64) -> TrackerResult<()> {
    if timeout_ms == 0 {
        return Err(TrackerError::Config(
            "sink.timeout_ms must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink type
    #[serde(default)]
    pub sink_type: SinkType,

    /// Backend base URL (for REST sink)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_url: Option<String>,

    /// Backend API key (for REST sink)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Table the records are appended to
    #[serde(default = "default_table")]
    pub table: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Output file (for file sink)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

fn default_table() -> String { "user_activities".to_string() }
fn default_timeout() -> u64 { 10_000 }

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            sink_type: SinkType::Log,
            rest_url: None,
            api_key: None,
            table: default_table(),
            timeout_ms: default_timeout(),
            file_path: None,
        }
    }
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkType {
    /// In-process buffer
    Memory,
    /// Diagnostic log only
    #[default]
    Log,
    /// JSON lines file
    File,
    /// Hosted backend over HTTP
    Rest,
}

/// Device configuration
///
/// Unset string fields are filled from the host at startup. The screen
/// size defaults to 0x0, which is what a headless host reports; hosts with
/// a display should set it and keep it current with
/// [`HostEnvironment::resize`](crate::environment::HostEnvironment::resize).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(default)]
    pub screen_width: u32,

    #[serde(default)]
    pub screen_height: u32,
}
