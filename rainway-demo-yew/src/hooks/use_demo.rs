use crate::{WebSession, WebState};
use rainway_demo_sdk::Result;
use std::future::Future;
use std::rc::Rc;
use std::task::Poll;
use yew::prelude::*;

/// Demo session accessible via hook
#[derive(Clone)]
pub struct DemoContext {
    pub session: Rc<WebSession>,

    /// Bumped whenever the session state may have changed
    pub revision: u64,

    pub(crate) refresh: Callback<()>,
}

impl PartialEq for DemoContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.session, &other.session) && self.revision == other.revision
    }
}

impl DemoContext {
    /// Owned copy of the current state
    pub fn state(&self) -> WebState {
        self.session.snapshot()
    }

    /// Re-render every consumer
    pub fn refresh(&self) {
        self.refresh.emit(());
    }

    /// Run a session action in the background
    ///
    /// Consumers re-render once the action reached its first await point and
    /// again when it finished, after draining queued SDK events.
    pub fn run<F, Fut>(&self, label: &'static str, action: F)
    where
        F: FnOnce(Rc<WebSession>) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        let session = Rc::clone(&self.session);
        let refresh = self.refresh.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let mut action = Box::pin(action(Rc::clone(&session)));

            // Runs the synchronous prelude, e.g. entering "Connecting…"
            let first = futures::poll!(action.as_mut());
            refresh.emit(());

            let result = match first {
                Poll::Ready(result) => result,
                Poll::Pending => action.await,
            };
            if let Err(e) = result {
                tracing::warn!("⚠️  {} failed: {}", label, e);
            }
            drain_events(&session, &refresh);
            refresh.emit(());
        });
    }
}

/// Apply queued SDK events and resolve readiness of newly attached peers
///
/// Returns whether anything changed.
pub(crate) fn drain_events(session: &Rc<WebSession>, refresh: &Callback<()>) -> bool {
    let report = session.poll();

    for peer_id in report.awaiting_ready.iter().copied() {
        let session = Rc::clone(session);
        let refresh = refresh.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = session.await_ready(peer_id).await {
                tracing::warn!("⚠️  Readiness of peer {} failed: {}", peer_id, e);
            }
            refresh.emit(());
        });
    }

    report.processed > 0 || !report.awaiting_ready.is_empty()
}

/// Hook to access the demo session
///
/// # Example
///
/// ```rust,no_run
/// use rainway_demo_yew::use_demo;
/// # use yew::prelude::*;
/// # #[function_component]
/// # fn Example() -> Html {
///
/// let demo = use_demo();
/// demo.run("Disconnect", |session| async move {
///     session.disconnect();
///     Ok(())
/// });
/// # html! {}
/// # }
/// ```
#[hook]
pub fn use_demo() -> DemoContext {
    use_context::<DemoContext>().expect("use_demo must be used within a DemoProvider")
}
