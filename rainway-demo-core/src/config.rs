use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Storage key of the persisted API key
pub const API_KEY_STORAGE_KEY: &str = "api-key";

/// Storage key of the persisted peer id field of a widget
pub fn peer_id_storage_key(widget: usize) -> String {
    format!("peer-id-{}", widget)
}

/// Severity of SDK log messages
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Information,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "Trace",
            LogLevel::Debug => "Debug",
            LogLevel::Information => "Information",
            LogLevel::Warning => "Warning",
            LogLevel::Error => "Error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" | "information" => Ok(LogLevel::Information),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(ConfigError::Invalid {
                field: "minimumLogLevel",
                reason: format!("unknown log level '{}'", other),
            }),
        }
    }
}

/// Errors that can occur when loading the demo configuration
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Parse(String),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Demo configuration, read once at startup from `local-config.json`
///
/// Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DemoConfig {
    /// Fallback API key when none is stored in the browser
    pub api_key: Option<String>,

    /// Peer id pre-filled in the connect form
    pub peer_id: Option<String>,

    /// External id reported to the gateway
    pub external_id: String,

    /// SDK messages below this level are dropped
    pub minimum_log_level: LogLevel,

    /// Forward SDK log messages to the console
    #[serde(alias = "rainwayLogsInConsole")]
    pub sdk_logs_in_console: bool,

    /// Record transport statistics while streaming
    pub log_transport_stats: bool,

    /// Log per-frame video statistics
    pub log_video_stats: bool,

    /// Ask before accepting inbound connection requests
    pub prompt_on_connection_request: bool,

    /// Interval at which the UI drains queued SDK events
    pub poll_interval_ms: u64,

    /// Number of peer connect forms shown
    pub widget_count: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            peer_id: None,
            external_id: "web-demo-rust".to_string(),
            minimum_log_level: LogLevel::Debug,
            sdk_logs_in_console: true,
            log_transport_stats: false,
            log_video_stats: false,
            prompt_on_connection_request: false,
            poll_interval_ms: 100,
            widget_count: 1,
        }
    }
}

impl DemoConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: DemoConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration document, falling back to defaults on any error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring local configuration: {}", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "pollIntervalMs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.widget_count == 0 {
            return Err(ConfigError::Invalid {
                field: "widgetCount",
                reason: "at least one widget is required".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = external_id.into();
        self
    }

    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_prompt_on_connection_request(mut self, prompt: bool) -> Self {
        self.prompt_on_connection_request = prompt;
        self
    }

    /// JSON schema of the configuration file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DemoConfig)
    }
}

/// String key/value storage (browser `localStorage` in the front end)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store for tests and non-browser hosts
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.borrow_mut().remove(key);
    }
}

/// Values the session bar and a connect form start with
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InitialFields {
    pub api_key: String,
    pub peer_id: String,
}

/// Resolve the initial form values of `widget`
///
/// API key: stored value, then config, then empty.
/// Peer id: config, then stored value, then empty.
/// Empty values count as missing at every step.
pub fn resolve_initial_fields(
    config: &DemoConfig,
    store: &dyn KeyValueStore,
    widget: usize,
) -> InitialFields {
    let api_key = non_empty(store.get(API_KEY_STORAGE_KEY))
        .or_else(|| non_empty(config.api_key.clone()))
        .unwrap_or_default();

    let peer_id = non_empty(config.peer_id.clone())
        .or_else(|| non_empty(store.get(&peer_id_storage_key(widget))))
        .unwrap_or_default();

    InitialFields { api_key, peer_id }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
