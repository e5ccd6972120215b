use crate::components::{BadgeTone, StatusBadge};
use rainway_demo_core::SessionState;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct SessionBarProps {
    pub api_key: AttrValue,
    pub session: SessionState,
    /// "Connected as <id>" or the session state
    pub status: AttrValue,
    #[prop_or_default]
    pub error: Option<AttrValue>,
    pub on_api_key_change: Callback<String>,
    pub on_connect: Callback<()>,
    pub on_disconnect: Callback<()>,
}

/// Whether the connect button is enabled
fn can_connect(session: SessionState, api_key: &str) -> bool {
    session == SessionState::Disconnected && !api_key.trim().is_empty()
}

/// API key input, session status and connect/disconnect buttons
#[function_component(SessionBar)]
pub fn session_bar(props: &SessionBarProps) -> Html {
    let on_input = {
        let on_change = props.on_api_key_change.clone();
        Callback::from(move |e: InputEvent| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            on_change.emit(input.value());
        })
    };

    let on_connect = {
        let callback = props.on_connect.clone();
        Callback::from(move |_: MouseEvent| callback.emit(()))
    };

    let on_disconnect = {
        let callback = props.on_disconnect.clone();
        Callback::from(move |_: MouseEvent| callback.emit(()))
    };

    html! {
        <div class="rainway-session-bar">
            <label class="rainway-session-bar__label">
                {"API Key"}
                <input
                    class="rainway-session-bar__input"
                    type="password"
                    placeholder="pk_..."
                    value={props.api_key.clone()}
                    oninput={on_input}
                />
            </label>

            <StatusBadge
                label={props.status.clone()}
                tone={BadgeTone::for_session(props.session)}
            />

            <button
                class="rainway-session-bar__button"
                onclick={on_connect}
                disabled={!can_connect(props.session, &props.api_key)}
            >
                {"Connect"}
            </button>
            <button
                class="rainway-session-bar__button"
                onclick={on_disconnect}
                disabled={props.session == SessionState::Disconnected}
            >
                {"Disconnect"}
            </button>

            {if let Some(error) = &props.error {
                html! { <div class="rainway-session-bar__error">{error}</div> }
            } else {
                html! {}
            }}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_needs_key_and_idle_session() {
        assert!(can_connect(SessionState::Disconnected, "pk_test_abc"));
        assert!(!can_connect(SessionState::Disconnected, "  "));
        assert!(!can_connect(SessionState::Connecting, "pk_test_abc"));
        assert!(!can_connect(SessionState::Connected, "pk_test_abc"));
    }

    #[test]
    fn test_session_bar_props() {
        let props = yew::props!(SessionBarProps {
            api_key: "pk_test_abc",
            session: SessionState::Connected,
            status: "Connected as 42",
            on_api_key_change: Callback::from(|_: String| {}),
            on_connect: Callback::from(|_: ()| {}),
            on_disconnect: Callback::from(|_: ()| {}),
        });

        assert!(props.error.is_none());
        assert_eq!(props.status, "Connected as 42");
    }
}
