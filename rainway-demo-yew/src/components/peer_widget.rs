use crate::components::{BadgeTone, ChatBox, StatusBadge, StreamView};
use rainway_demo_core::{
    ChatEntry, PeerId, RosterEntry, StreamAnnouncement, StreamControl, WidgetState,
};
use rainway_demo_sdk::infrastructure::web::{WebPeer, WebStream};
use yew::prelude::*;

/// What a widget renders of a roster entry
#[derive(Debug, Clone, PartialEq)]
pub struct PeerView {
    pub peer_id: PeerId,
    pub state: WidgetState,
    pub online: bool,
    pub requesting: bool,
    pub chat: Vec<ChatEntry>,
    pub announcements: Vec<StreamAnnouncement>,
    pub stream: Option<WebStream>,
    pub stream_stops: u32,
}

impl PeerView {
    pub fn from_entry(entry: &RosterEntry<WebPeer, WebStream>) -> Self {
        Self {
            peer_id: entry.peer_id(),
            state: entry.state(),
            online: entry.is_online(),
            requesting: entry.is_requesting_stream(),
            chat: entry.chat_history().to_vec(),
            announcements: entry.announcements().to_vec(),
            stream: entry.stream().map(|s| s.handle.clone()),
            stream_stops: entry.stream_stop_count(),
        }
    }
}

/// User intent raised by a widget
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetAction {
    Cancel,
    Disconnect,
    Reconnect,
    Close,
    RequestStream,
    JoinStream(StreamAnnouncement),
    LeaveStream,
    Control(StreamControl),
    SendChat(String),
}

#[derive(Properties, PartialEq)]
pub struct PeerWidgetProps {
    pub view: PeerView,
    pub on_action: Callback<(PeerId, WidgetAction)>,
}

/// Header text of a widget
fn widget_title(view: &PeerView) -> String {
    if view.stream_stops > 0 && !view.state.is_streaming() {
        format!("{} (stream stopped {}x)", view.peer_id, view.stream_stops)
    } else {
        view.peer_id.to_string()
    }
}

/// One remote peer: status, stream surface, stream controls and chat
#[function_component(PeerWidget)]
pub fn peer_widget(props: &PeerWidgetProps) -> Html {
    let paused = use_state(|| false);
    let stats_overlay = use_state(|| false);
    let gestures = use_state(|| true);

    let view = &props.view;
    let controls = view.state.controls();

    let emit = {
        let on_action = props.on_action.clone();
        let peer_id = view.peer_id;
        move |action: WidgetAction| {
            let on_action = on_action.clone();
            Callback::from(move |_: MouseEvent| on_action.emit((peer_id, action.clone())))
        }
    };

    let on_send = {
        let on_action = props.on_action.clone();
        let peer_id = view.peer_id;
        Callback::from(move |message: String| {
            on_action.emit((peer_id, WidgetAction::SendChat(message)))
        })
    };

    let on_pause_toggle = {
        let paused = paused.clone();
        let on_action = props.on_action.clone();
        let peer_id = view.peer_id;
        Callback::from(move |_: MouseEvent| {
            let control = if *paused {
                StreamControl::Play
            } else {
                StreamControl::Pause
            };
            on_action.emit((peer_id, WidgetAction::Control(control)));
            paused.set(!*paused);
        })
    };

    let on_stats_toggle = {
        let stats_overlay = stats_overlay.clone();
        let on_action = props.on_action.clone();
        let peer_id = view.peer_id;
        Callback::from(move |_: MouseEvent| {
            let enabled = !*stats_overlay;
            on_action.emit((
                peer_id,
                WidgetAction::Control(StreamControl::StatsOverlay(enabled)),
            ));
            stats_overlay.set(enabled);
        })
    };

    let on_gestures_toggle = {
        let gestures = gestures.clone();
        let on_action = props.on_action.clone();
        let peer_id = view.peer_id;
        Callback::from(move |_: MouseEvent| {
            let enabled = !*gestures;
            on_action.emit((
                peer_id,
                WidgetAction::Control(StreamControl::Gestures(enabled)),
            ));
            gestures.set(enabled);
        })
    };

    // A new stream starts playing with default settings
    {
        let paused = paused.clone();
        let stats_overlay = stats_overlay.clone();
        let gestures = gestures.clone();
        use_effect_with(view.stream.clone(), move |_| {
            paused.set(false);
            stats_overlay.set(false);
            gestures.set(true);
        });
    }

    let connection_button = if view.state == WidgetState::ConnectingToHost {
        html! {
            <button class="rainway-widget__button" onclick={emit(WidgetAction::Cancel)}>
                {"Cancel"}
            </button>
        }
    } else if view.online {
        html! {
            <button
                class="rainway-widget__button"
                onclick={emit(WidgetAction::Disconnect)}
                disabled={!controls.when_host_or_connecting}
            >
                {"Disconnect"}
            </button>
        }
    } else {
        html! {
            <>
                <button
                    class="rainway-widget__button"
                    onclick={emit(WidgetAction::Reconnect)}
                    disabled={!controls.when_no_host}
                >
                    {"Reconnect"}
                </button>
                <button class="rainway-widget__button" onclick={emit(WidgetAction::Close)}>
                    {"Close"}
                </button>
            </>
        }
    };

    html! {
        <div class={classes!("rainway-widget", view.online.then_some("online"))}>
            <div class="rainway-widget__header">
                <span class="rainway-widget__title">{widget_title(view)}</span>
                <StatusBadge
                    label={view.state.description()}
                    tone={BadgeTone::for_widget(view.state)}
                />
                {connection_button}
            </div>

            {if let Some(stream) = &view.stream {
                html! { <StreamView stream={stream.clone()} /> }
            } else {
                html! {}
            }}

            <div class="rainway-widget__stream-controls">
                <button
                    class="rainway-widget__button"
                    onclick={emit(WidgetAction::RequestStream)}
                    disabled={!controls.when_ready_to_stream || view.requesting}
                >
                    {if view.requesting { "Requesting..." } else { "Start Stream" }}
                </button>
                <button
                    class="rainway-widget__button"
                    onclick={emit(WidgetAction::LeaveStream)}
                    disabled={!controls.when_streaming}
                >
                    {"Stop Stream"}
                </button>
                <button
                    class="rainway-widget__button"
                    onclick={emit(WidgetAction::Control(StreamControl::Fullscreen))}
                    disabled={!controls.when_streaming}
                >
                    {"Fullscreen"}
                </button>
                <button
                    class="rainway-widget__button"
                    onclick={on_pause_toggle}
                    disabled={!controls.when_streaming}
                >
                    {if *paused { "Play" } else { "Pause" }}
                </button>
                <button
                    class="rainway-widget__button"
                    onclick={on_stats_toggle}
                    disabled={!controls.when_streaming}
                >
                    {if *stats_overlay { "Hide Stats" } else { "Show Stats" }}
                </button>
                <button
                    class="rainway-widget__button"
                    onclick={on_gestures_toggle}
                    disabled={!controls.when_streaming}
                >
                    {if *gestures { "Disable Gestures" } else { "Enable Gestures" }}
                </button>
            </div>

            {if view.announcements.is_empty() {
                html! {}
            } else {
                html! {
                    <ul class="rainway-widget__announcements">
                        {for view.announcements.iter().map(|announcement| {
                            html! {
                                <li class="rainway-widget__announcement">
                                    <span>{announcement.label()}</span>
                                    <button
                                        class="rainway-widget__button"
                                        onclick={emit(WidgetAction::JoinStream(announcement.clone()))}
                                        disabled={!controls.when_ready_to_stream || view.requesting}
                                    >
                                        {"Join"}
                                    </button>
                                </li>
                            }
                        })}
                    </ul>
                }
            }}

            <ChatBox
                peer_id={view.peer_id}
                entries={view.chat.clone()}
                enabled={controls.when_host}
                on_send={on_send}
            />
        </div>
    }
}
