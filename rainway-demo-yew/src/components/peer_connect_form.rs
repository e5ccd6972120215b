use crate::hooks::use_persisted;
use rainway_demo_core::{peer_id_storage_key, PeerId};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct PeerConnectFormProps {
    /// Index of the form, selects the persisted peer id
    pub widget: usize,

    #[prop_or_default]
    pub initial_peer_id: String,

    pub session_connected: bool,

    /// Peers with a connection attempt in flight
    #[prop_or_default]
    pub pending: Vec<PeerId>,

    /// Reasons of failed attempts, by peer
    #[prop_or_default]
    pub connect_errors: Vec<(PeerId, AttrValue)>,

    pub on_connect: Callback<PeerId>,
    pub on_cancel: Callback<PeerId>,
}

/// Peer id of the input, if it is valid and being connected to
fn pending_attempt(input: &str, pending: &[PeerId]) -> Option<PeerId> {
    input
        .parse::<PeerId>()
        .ok()
        .filter(|peer_id| pending.contains(peer_id))
}

/// Why the last attempt to the input's peer failed
fn attempt_error(input: &str, errors: &[(PeerId, AttrValue)]) -> Option<AttrValue> {
    let peer_id = input.parse::<PeerId>().ok()?;
    errors
        .iter()
        .find(|(id, _)| *id == peer_id)
        .map(|(_, reason)| reason.clone())
}

/// Peer id input with connect and cancel buttons
#[function_component(PeerConnectForm)]
pub fn peer_connect_form(props: &PeerConnectFormProps) -> Html {
    let (peer_id, set_peer_id) =
        use_persisted(peer_id_storage_key(props.widget), props.initial_peer_id.clone());
    let parse_error = use_state(|| None::<String>);

    let attempt = pending_attempt(&peer_id, &props.pending);

    let on_input = {
        let parse_error = parse_error.clone();
        Callback::from(move |e: InputEvent| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            parse_error.set(None);
            set_peer_id.emit(input.value());
        })
    };

    let on_connect = {
        let peer_id = peer_id.clone();
        let parse_error = parse_error.clone();
        let callback = props.on_connect.clone();
        Callback::from(move |_: MouseEvent| match peer_id.parse::<PeerId>() {
            Ok(id) => callback.emit(id),
            Err(e) => parse_error.set(Some(e.to_string())),
        })
    };

    let on_cancel = {
        let callback = props.on_cancel.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(id) = attempt {
                callback.emit(id);
            }
        })
    };

    let error = (*parse_error)
        .clone()
        .map(AttrValue::from)
        .or_else(|| attempt_error(&peer_id, &props.connect_errors));

    html! {
        <div class="rainway-connect-form">
            <label class="rainway-connect-form__label">
                {"Peer ID"}
                <input
                    class="rainway-connect-form__input"
                    type="text"
                    placeholder="remote peer id"
                    value={(*peer_id).clone()}
                    oninput={on_input}
                    disabled={attempt.is_some()}
                />
            </label>

            {if attempt.is_some() {
                html! {
                    <button class="rainway-connect-form__button" onclick={on_cancel}>
                        {"Cancel"}
                    </button>
                }
            } else {
                html! {
                    <button
                        class="rainway-connect-form__button"
                        onclick={on_connect}
                        disabled={!props.session_connected}
                    >
                        {"Connect"}
                    </button>
                }
            }}

            {if let Some(error) = error {
                html! { <div class="rainway-connect-form__error">{error}</div> }
            } else {
                html! {}
            }}
        </div>
    }
}
