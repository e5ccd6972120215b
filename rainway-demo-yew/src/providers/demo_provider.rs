use crate::hooks::{drain_events, DemoContext};
use crate::WebSession;
use futures::StreamExt;
use rainway_demo_core::{DemoConfig, PeerId};
use rainway_demo_sdk::infrastructure::web::WebConnector;
use rainway_demo_sdk::{AcceptPolicy, DemoSession};
use std::cell::Cell;
use std::rc::Rc;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct DemoProviderProps {
    pub config: DemoConfig,
    pub children: Children,
}

fn build_session(config: &DemoConfig) -> WebSession {
    let policy = if config.prompt_on_connection_request {
        AcceptPolicy::prompt(|peer_id: PeerId| {
            gloo::dialogs::confirm(&format!(
                "Peer {} wants to connect. Accept the connection?",
                peer_id
            ))
        })
    } else {
        AcceptPolicy::AutoAccept
    };

    DemoSession::new(WebConnector::new(), config.clone()).with_policy(policy)
}

#[function_component(DemoProvider)]
pub fn demo_provider(props: &DemoProviderProps) -> Html {
    let session = use_memo(props.config.clone(), |config| Rc::new(build_session(config)));
    let session: Rc<WebSession> = Rc::clone(&session);

    let revision = use_mut_ref(|| 0u64);
    let trigger = use_force_update();

    let refresh = {
        let revision = revision.clone();
        Callback::from(move |_: ()| {
            *revision.borrow_mut() += 1;
            trigger.force_update();
        })
    };

    {
        let session = session.clone();
        let refresh = refresh.clone();

        use_effect_with(props.config.poll_interval_ms, move |interval_ms| {
            let alive = Rc::new(Cell::new(true));
            let running = alive.clone();
            let interval_ms = u32::try_from(*interval_ms).unwrap_or(u32::MAX);

            wasm_bindgen_futures::spawn_local(async move {
                tracing::debug!("🔄 Polling SDK events every {} ms", interval_ms);
                let mut interval = gloo_timers::future::IntervalStream::new(interval_ms);

                while interval.next().await.is_some() {
                    if !running.get() {
                        break;
                    }

                    if drain_events(&session, &refresh) {
                        refresh.emit(());
                    }
                }

                tracing::debug!("Poll loop stopped");
            });

            move || alive.set(false)
        });
    }

    let context = DemoContext {
        session,
        revision: *revision.borrow(),
        refresh,
    };

    html! {
        <ContextProvider<DemoContext> {context}>
            {props.children.clone()}
        </ContextProvider<DemoContext>>
    }
}
