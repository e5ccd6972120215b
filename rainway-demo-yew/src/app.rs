use crate::pages::{DemoScreen, QuickConnect};
use crate::providers::DemoProvider;
use gloo::net::http::Request;
use rainway_demo_core::{ConfigError, DemoConfig, LogLevel};
use yew::prelude::*;

/// Location of the optional configuration file, relative to the page
const CONFIG_URL: &str = "local-config.json";

/// Errors that can occur while fetching the configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Could not fetch local-config.json: {0}")]
    Fetch(String),

    #[error("local-config.json returned HTTP {0}")]
    Status(u16),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Fetch and parse `local-config.json`
pub async fn load_config() -> Result<DemoConfig, ConfigLoadError> {
    let response = Request::get(CONFIG_URL)
        .send()
        .await
        .map_err(|e| ConfigLoadError::Fetch(e.to_string()))?;

    if !response.ok() {
        return Err(ConfigLoadError::Status(response.status()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| ConfigLoadError::Fetch(e.to_string()))?;

    Ok(DemoConfig::from_json(&body)?)
}

/// Console verbosity matching the SDK log level
pub fn tracing_level(level: LogLevel) -> tracing::Level {
    match level {
        LogLevel::Trace => tracing::Level::TRACE,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Information => tracing::Level::INFO,
        LogLevel::Warning => tracing::Level::WARN,
        LogLevel::Error => tracing::Level::ERROR,
    }
}

/// Extract api_key from URL query parameters
fn get_api_key_from_url() -> Option<String> {
    let window = web_sys::window()?;
    let href = window.location().href().ok()?;
    let url = web_sys::Url::new(&href).ok()?;

    url.search_params()
        .get("api_key")
        .filter(|key| !key.trim().is_empty())
}

#[derive(Properties, PartialEq)]
pub struct AppProps {
    #[prop_or_default]
    pub config: DemoConfig,
}

#[function_component(App)]
pub fn app(props: &AppProps) -> Html {
    let quick_key = use_memo((), |_| {
        let key = get_api_key_from_url();
        if key.is_some() {
            tracing::info!("Found api_key in URL, using quick connect");
        }
        key
    });

    html! {
        <div class="app">
            <DemoProvider config={props.config.clone()}>
                {match &*quick_key {
                    Some(api_key) => html! {
                        <QuickConnect api_key={AttrValue::from(api_key.clone())} />
                    },
                    None => html! { <DemoScreen /> },
                }}
            </DemoProvider>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_level_mapping() {
        assert_eq!(tracing_level(LogLevel::Trace), tracing::Level::TRACE);
        assert_eq!(tracing_level(LogLevel::Information), tracing::Level::INFO);
        assert_eq!(tracing_level(LogLevel::Error), tracing::Level::ERROR);
    }

    #[test]
    fn test_load_error_messages() {
        assert_eq!(
            ConfigLoadError::Status(404).to_string(),
            "local-config.json returned HTTP 404"
        );

        let invalid = ConfigLoadError::from(ConfigError::Parse("expected value".to_string()));
        assert_eq!(invalid.to_string(), "Invalid configuration JSON: expected value");
    }

    #[test]
    fn test_app_props_default_config() {
        let props = yew::props!(AppProps {});
        assert_eq!(props.config, DemoConfig::default());
    }
}
