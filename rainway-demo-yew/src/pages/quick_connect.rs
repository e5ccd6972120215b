use crate::hooks::use_demo;
use rainway_demo_core::SessionState;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct QuickConnectProps {
    pub api_key: AttrValue,
}

/// Single line shown while the page connects on its own
fn quick_status(session: SessionState, error: Option<&str>) -> String {
    match (session, error) {
        (SessionState::Connected, _) => "Connected.".to_string(),
        (SessionState::Disconnected, Some(error)) => error.to_string(),
        _ => "Connecting…".to_string(),
    }
}

/// Connects with the API key from the URL and reports the outcome
#[function_component(QuickConnect)]
pub fn quick_connect(props: &QuickConnectProps) -> Html {
    let demo = use_demo();
    let state = demo.state();

    {
        let demo = demo.clone();
        use_effect_with(props.api_key.clone(), move |api_key| {
            tracing::info!("🚀 Quick connect with API key from URL");
            let api_key = api_key.to_string();
            demo.run("Quick connect", move |session| async move {
                session.connect(&api_key).await
            });
            || ()
        });
    }

    html! {
        <div class="rainway-quick-connect">
            {quick_status(state.session(), state.session_error())}
        </div>
    }
}
