use cucumber::World;
use rainway_demo_core::{
    ChatEntry, DemoConfig, PeerId, SessionState, StreamId, WidgetState,
};
use rainway_demo_sdk::infrastructure::mock::{MockConnector, MockNetwork};
use rainway_demo_sdk::{DemoSession, SdkError};
use std::collections::HashMap;

pub type Session = DemoSession<MockConnector>;

#[derive(Debug, World)]
pub struct DemoWorld {
    /// Simulated gateway shared by every host and client
    pub network: MockNetwork,

    /// Demo session (the system under test)
    pub session: Session,

    /// Error of the last failed operation
    pub last_error: Option<SdkError>,

    /// Stream ids announced by name
    pub announced: HashMap<String, StreamId>,
}

impl Default for DemoWorld {
    fn default() -> Self {
        Self::with_config(DemoConfig::default())
    }
}

impl DemoWorld {
    pub fn with_config(config: DemoConfig) -> Self {
        let network = MockNetwork::new();
        let session = DemoSession::new(MockConnector::new(network.clone()), config);
        Self {
            network,
            session,
            last_error: None,
            announced: HashMap::new(),
        }
    }

    /// Replace the session, keeping the network
    pub fn reconfigure(&mut self, config: DemoConfig) {
        self.session = DemoSession::new(MockConnector::new(self.network.clone()), config);
    }

    /// Store the error of a failed operation
    pub fn record<T>(&mut self, result: Result<T, SdkError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(e) => {
                self.last_error = Some(e);
                None
            }
        }
    }

    /// Drain queued SDK events and resolve readiness of new peers
    pub async fn tick(&mut self) {
        let report = self.session.poll();
        for peer_id in report.awaiting_ready {
            if let Err(e) = self.session.await_ready(peer_id).await {
                tracing::warn!("Readiness of {} failed: {}", peer_id, e);
            }
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.session.session_state()
    }

    pub fn roster_len(&self) -> usize {
        self.session.with_state(|s| s.roster().len())
    }

    pub fn widget_state(&self, peer: u64) -> Option<WidgetState> {
        self.session
            .with_state(|s| s.roster().get(PeerId::new(peer)).map(|e| e.state()))
    }

    pub fn has_stream(&self, peer: u64) -> bool {
        self.session.with_state(|s| {
            s.roster()
                .get(PeerId::new(peer))
                .is_some_and(|e| e.stream().is_some())
        })
    }

    pub fn chat(&self, peer: u64) -> Vec<ChatEntry> {
        self.session.with_state(|s| {
            s.roster()
                .get(PeerId::new(peer))
                .map(|e| e.chat_history().to_vec())
                .unwrap_or_default()
        })
    }

    pub fn last_error_message(&self) -> Option<String> {
        self.last_error.as_ref().map(|e| e.display_message())
    }

    pub fn invariants_hold(&self) -> bool {
        self.session.with_state(|s| s.roster().invariants_hold())
    }
}
