use rainway_demo_yew::{load_config, tracing_level, App, AppProps};
use tracing_wasm::WASMLayerConfigBuilder;

fn main() {
    wasm_bindgen_futures::spawn_local(async {
        let loaded = load_config().await;
        let config = loaded.as_ref().cloned().unwrap_or_default();

        // Initialize tracing for WASM
        tracing_wasm::set_as_global_default_with_config(
            WASMLayerConfigBuilder::new()
                .set_max_level(tracing_level(config.minimum_log_level))
                .build(),
        );

        if let Err(e) = &loaded {
            tracing::warn!("⚠️  {}; using default configuration", e);
        }

        tracing::info!(
            "Starting Rainway web demo v{} ({} widget(s))",
            rainway_demo_yew::VERSION,
            config.widget_count
        );

        yew::Renderer::<App>::with_props(AppProps { config }).render();
    });
}

