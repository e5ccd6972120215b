use rainway_demo_core::{DemoConfig, LogLevel};

/// Forwards SDK log messages to `tracing`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdkLogSink {
    minimum: LogLevel,
    enabled: bool,
}

impl SdkLogSink {
    pub fn new(minimum: LogLevel, enabled: bool) -> Self {
        Self { minimum, enabled }
    }

    pub fn from_config(config: &DemoConfig) -> Self {
        Self::new(config.minimum_log_level, config.sdk_logs_in_console)
    }

    /// Whether a message of `level` would be forwarded
    pub fn accepts(&self, level: LogLevel) -> bool {
        self.enabled && level >= self.minimum
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if !self.accepts(level) {
            return;
        }

        match level {
            LogLevel::Trace => tracing::trace!(target: "rainway_sdk", "{}", message),
            LogLevel::Debug => tracing::debug!(target: "rainway_sdk", "{}", message),
            LogLevel::Information => tracing::info!(target: "rainway_sdk", "{}", message),
            LogLevel::Warning => tracing::warn!(target: "rainway_sdk", "{}", message),
            LogLevel::Error => tracing::error!(target: "rainway_sdk", "{}", message),
        }
    }
}

impl Default for SdkLogSink {
    fn default() -> Self {
        Self::from_config(&DemoConfig::default())
    }
}
