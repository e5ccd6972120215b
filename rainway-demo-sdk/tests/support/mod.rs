use rainway_demo_core::{DemoConfig, PeerId, SessionState, WidgetState};
use rainway_demo_sdk::infrastructure::mock::{MockConnector, MockNetwork};
use rainway_demo_sdk::{DemoSession, Runtime};

pub type Session = DemoSession<MockConnector>;

pub const API_KEY: &str = "pk_test_abc";

/// One simulated gateway with a number of hosts and demo clients
pub struct SessionFixture {
    pub network: MockNetwork,
    pub clients: Vec<Session>,
}

impl SessionFixture {
    /// Create `client_count` connected demo clients and the given hosts
    pub async fn new(client_count: usize, hosts: &[u64]) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let network = MockNetwork::new();
        for id in hosts {
            network.add_host(PeerId::new(*id));
        }

        let mut clients = Vec::new();
        for i in 0..client_count {
            let config = DemoConfig::default().with_external_id(format!("fixture-{}", i + 1));
            let session = DemoSession::new(MockConnector::new(network.clone()), config);
            session
                .connect(API_KEY)
                .await
                .expect("Client should connect to the gateway");
            clients.push(session);
        }

        Self { network, clients }
    }

    pub fn client(&self, index: usize) -> &Session {
        &self.clients[index]
    }

    pub fn own_id(&self, index: usize) -> PeerId {
        self.clients[index]
            .runtime()
            .expect("Client should have a runtime")
            .peer_id()
    }

    /// Poll every client and resolve readiness of newly attached peers
    pub async fn tick(&self) {
        for client in &self.clients {
            let report = client.poll();
            for peer_id in report.awaiting_ready {
                if let Err(e) = client.await_ready(peer_id).await {
                    tracing::warn!("⚠️  Readiness of {} failed: {}", peer_id, e);
                }
            }
        }
    }

    pub fn widget_state(&self, index: usize, peer: u64) -> Option<WidgetState> {
        self.clients[index].with_state(|s| s.roster().get(PeerId::new(peer)).map(|e| e.state()))
    }

    pub fn assert_all_connected(&self) {
        for (i, client) in self.clients.iter().enumerate() {
            assert_eq!(
                client.session_state(),
                SessionState::Connected,
                "Client {} should be connected",
                i + 1
            );
        }
    }

    /// Every client's roster upholds its invariants
    pub fn assert_invariants(&self) {
        for (i, client) in self.clients.iter().enumerate() {
            assert!(
                client.with_state(|s| s.roster().invariants_hold()),
                "Client {} roster invariants violated",
                i + 1
            );
        }
    }
}
