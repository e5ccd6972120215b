use cucumber::{given, then, when};
use rainway_demo_core::{DemoConfig, SessionState};
use rainway_demo_tests::DemoWorld;

pub const API_KEY: &str = "pk_test_abc";

fn parse_session_state(name: &str) -> SessionState {
    match name {
        "Disconnected" => SessionState::Disconnected,
        "Connecting" => SessionState::Connecting,
        "Connected" => SessionState::Connected,
        other => panic!("Unknown session state '{}'", other),
    }
}

// ===== Given Steps =====

#[given(expr = "a demo configured with external id {string}")]
async fn demo_with_external_id(world: &mut DemoWorld, external_id: String) {
    world.reconfigure(DemoConfig::default().with_external_id(external_id));
}

#[given("a connected demo")]
async fn connected_demo(world: &mut DemoWorld) {
    world
        .session
        .connect(API_KEY)
        .await
        .expect("Demo should connect to the gateway");
}

// ===== When Steps =====

#[when(expr = "the user connects with API key {string}")]
async fn connect_with_key(world: &mut DemoWorld, api_key: String) {
    let result = world.session.connect(&api_key).await;
    world.record(result);
}

#[when("the user disconnects the session")]
async fn disconnect_session(world: &mut DemoWorld) {
    world.session.disconnect();
}

#[when("the gateway connection is lost")]
async fn gateway_lost(world: &mut DemoWorld) {
    world.network.lose_gateway();
}

#[when("the demo processes pending events")]
async fn process_events(world: &mut DemoWorld) {
    world.tick().await;
}

// ===== Then Steps =====

#[then(expr = "the session is {word}")]
async fn session_is(world: &mut DemoWorld, state: String) {
    assert_eq!(world.session_state(), parse_session_state(&state));
}

#[then("the status line shows the own peer id")]
async fn status_shows_own_id(world: &mut DemoWorld) {
    let (own, status) = world
        .session
        .with_state(|s| (s.own_peer_id(), s.status_line()));
    let own = own.expect("Session should know its own peer id");

    assert_eq!(status, format!("Connected as {}", own));
}

#[then(expr = "the session error is {string}")]
async fn session_error_is(world: &mut DemoWorld, expected: String) {
    let error = world
        .session
        .with_state(|s| s.session_error().map(str::to_string));
    assert_eq!(error.as_deref(), Some(expected.as_str()));
}

#[then("the session has no runtime")]
async fn no_runtime(world: &mut DemoWorld) {
    assert!(world.session.runtime().is_none());
}

#[then(expr = "the gateway saw {int} runtime(s)")]
async fn gateway_runtimes(world: &mut DemoWorld, count: usize) {
    assert_eq!(world.network.runtime_ids().len(), count);
}

#[then("the last operation failed")]
async fn last_failed(world: &mut DemoWorld) {
    assert!(world.last_error.is_some(), "Expected the last operation to fail");
}

#[then("the last operation succeeded")]
async fn last_succeeded(world: &mut DemoWorld) {
    assert!(
        world.last_error.is_none(),
        "Unexpected error: {:?}",
        world.last_error
    );
}

#[then(expr = "the last error is {string}")]
async fn last_error_is(world: &mut DemoWorld, expected: String) {
    assert_eq!(world.last_error_message(), Some(expected));
}
