use crate::components::{PeerConnectForm, PeerView, PeerWidget, SessionBar, WidgetAction};
use crate::hooks::{use_demo, use_persisted, DemoContext};
use crate::storage::LocalStorageStore;
use crate::VERSION;
use gloo::file::{Blob, ObjectUrl};
use rainway_demo_core::{resolve_initial_fields, PeerId, API_KEY_STORAGE_KEY};
use yew::prelude::*;

/// Forward a widget action to the session
fn handle_action(demo: &DemoContext, peer_id: PeerId, action: WidgetAction) {
    tracing::debug!("Widget {} action: {:?}", peer_id, action);

    match action {
        WidgetAction::Cancel => demo.run("Cancel connection", move |session| async move {
            session.cancel_connection_attempt(peer_id)
        }),
        WidgetAction::Disconnect => demo.run("Disconnect peer", move |session| async move {
            session.disconnect_from_peer(peer_id)
        }),
        WidgetAction::Reconnect => demo.run("Reconnect", move |session| async move {
            session.connect_to_peer(peer_id).await
        }),
        WidgetAction::Close => demo.run("Close widget", move |session| async move {
            session.remove_peer(peer_id)
        }),
        WidgetAction::RequestStream => demo.run("Request stream", move |session| async move {
            session.request_stream(peer_id).await
        }),
        WidgetAction::JoinStream(announcement) => {
            demo.run("Join stream", move |session| async move {
                session.join_announced_stream(peer_id, &announcement).await
            })
        }
        WidgetAction::LeaveStream => demo.run("Leave stream", move |session| async move {
            session.release_stream(peer_id)
        }),
        WidgetAction::Control(control) => demo.run("Stream control", move |session| async move {
            session.stream_control(peer_id, control)
        }),
        WidgetAction::SendChat(message) => demo.run("Send chat", move |session| async move {
            session.send_chat(peer_id, &message)
        }),
    }
}

/// Full demo: session bar, connect forms and one widget per known peer
#[function_component(DemoScreen)]
pub fn demo_screen() -> Html {
    let demo = use_demo();
    let state = demo.state();
    let config = demo.session.config().clone();

    let initial = use_memo(config.clone(), |config| {
        (0..config.widget_count.max(1))
            .map(|widget| resolve_initial_fields(config, &LocalStorageStore, widget))
            .collect::<Vec<_>>()
    });

    let (api_key, set_api_key) = use_persisted(
        API_KEY_STORAGE_KEY.to_string(),
        initial
            .first()
            .map(|fields| fields.api_key.clone())
            .unwrap_or_default(),
    );

    let report = demo.session.stats_report();
    let report_url = use_memo(report, |report| {
        report
            .as_deref()
            .map(|report| ObjectUrl::from(Blob::new(report)))
    });

    let on_connect = {
        let demo = demo.clone();
        let api_key = api_key.clone();
        Callback::from(move |_: ()| {
            let api_key = (*api_key).clone();
            demo.run("Connect", move |session| async move {
                session.connect(&api_key).await
            });
        })
    };

    let on_disconnect = {
        let demo = demo.clone();
        Callback::from(move |_: ()| {
            demo.run("Disconnect", |session| async move {
                session.disconnect();
                Ok(())
            });
        })
    };

    let on_peer_connect = {
        let demo = demo.clone();
        Callback::from(move |peer_id: PeerId| {
            demo.run("Connect to peer", move |session| async move {
                session.connect_to_peer(peer_id).await
            });
        })
    };

    let on_peer_cancel = {
        let demo = demo.clone();
        Callback::from(move |peer_id: PeerId| {
            demo.run("Cancel connection", move |session| async move {
                session.cancel_connection_attempt(peer_id)
            });
        })
    };

    let on_action = {
        let demo = demo.clone();
        Callback::from(move |(peer_id, action): (PeerId, WidgetAction)| {
            handle_action(&demo, peer_id, action)
        })
    };

    let roster = state.roster();
    let pending: Vec<PeerId> = roster.pending_peers().collect();
    let connect_errors: Vec<(PeerId, AttrValue)> = roster
        .connect_errors()
        .map(|(peer_id, reason)| (peer_id, AttrValue::from(reason.to_string())))
        .collect();
    let session_connected = state.session().is_connected();

    html! {
        <div class="rainway-demo">
            <header class="rainway-demo__header">
                <h1 class="rainway-demo__title">{"Rainway Web Demo"}</h1>
                <span class="rainway-demo__version">{format!("v{}", VERSION)}</span>
            </header>

            <SessionBar
                api_key={(*api_key).clone()}
                session={state.session()}
                status={state.status_line()}
                error={state.session_error().map(|e| AttrValue::from(e.to_string()))}
                on_api_key_change={set_api_key}
                on_connect={on_connect}
                on_disconnect={on_disconnect}
            />

            <div class="rainway-demo__forms">
                {for initial.iter().enumerate().map(|(widget, fields)| {
                    html! {
                        <PeerConnectForm
                            key={widget}
                            widget={widget}
                            initial_peer_id={fields.peer_id.clone()}
                            session_connected={session_connected}
                            pending={pending.clone()}
                            connect_errors={connect_errors.clone()}
                            on_connect={on_peer_connect.clone()}
                            on_cancel={on_peer_cancel.clone()}
                        />
                    }
                })}
            </div>

            <div class="rainway-demo__widgets">
                {for roster.entries().iter().map(|entry| {
                    html! {
                        <PeerWidget
                            key={entry.peer_id().to_string()}
                            view={PeerView::from_entry(entry)}
                            on_action={on_action.clone()}
                        />
                    }
                })}
            </div>

            {if let Some(url) = &*report_url {
                html! {
                    <a
                        class="rainway-demo__stats-report"
                        href={url.to_string()}
                        download="transport-stats.txt"
                    >
                        {"Download transport stats"}
                    </a>
                }
            } else {
                html! {}
            }}
        </div>
    }
}
