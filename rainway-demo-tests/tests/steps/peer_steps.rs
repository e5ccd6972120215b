use super::session_steps::API_KEY;
use cucumber::{given, then, when};
use rainway_demo_core::{PeerId, WidgetState};
use rainway_demo_sdk::infrastructure::mock::MockHost;
use rainway_demo_tests::DemoWorld;

pub fn parse_widget_state(name: &str) -> WidgetState {
    match name {
        "Disconnected" => WidgetState::Disconnected,
        "ConnectingToHost" => WidgetState::ConnectingToHost,
        "ConnectedNoStream" => WidgetState::ConnectedNoStream,
        "ConnectedCantStream" => WidgetState::ConnectedCantStream,
        "ConnectedReadyToStream" => WidgetState::ConnectedReadyToStream,
        "Streaming" => WidgetState::Streaming,
        other => panic!("Unknown widget state '{}'", other),
    }
}

// ===== Given Steps =====

#[given(expr = "a host {int}")]
async fn host(world: &mut DemoWorld, peer: u64) {
    world.network.add_host(PeerId::new(peer));
}

#[given(expr = "a host {int} that cannot stream")]
async fn host_cannot_stream(world: &mut DemoWorld, peer: u64) {
    world.network.add_host_with(
        PeerId::new(peer),
        MockHost {
            can_stream: false,
            ..Default::default()
        },
    );
}

#[given(expr = "a host {int} that refuses connections")]
async fn host_refuses(world: &mut DemoWorld, peer: u64) {
    world.network.add_host_with(
        PeerId::new(peer),
        MockHost {
            accepts: false,
            ..Default::default()
        },
    );
}

#[given(expr = "the user is connected to peer {int}")]
async fn connected_to_peer(world: &mut DemoWorld, peer: u64) {
    world
        .session
        .connect_to_peer(PeerId::new(peer))
        .await
        .expect("Peer connection should succeed");
}

#[given(expr = "the user is connected to {int} hosts")]
async fn connected_to_hosts(world: &mut DemoWorld, count: u64) {
    if world.session.runtime().is_none() {
        world
            .session
            .connect(API_KEY)
            .await
            .expect("Demo should connect to the gateway");
    }

    for i in 1..=count {
        let peer_id = PeerId::new(100 + i);
        world.network.add_host(peer_id);
        world
            .session
            .connect_to_peer(peer_id)
            .await
            .expect("Peer connection should succeed");
    }
}

// ===== When Steps =====

#[when(regex = r"^the user connects to peer (\d+)(?: again)?$")]
async fn connect_to_peer(world: &mut DemoWorld, peer: u64) {
    let result = world.session.connect_to_peer(PeerId::new(peer)).await;
    world.record(result);
}

#[when(expr = "the user enters peer id {string}")]
async fn connect_to_input(world: &mut DemoWorld, input: String) {
    let result = world.session.connect_to_peer_input(&input).await;
    world.record(result);
}

#[when(expr = "the user disconnects from peer {int}")]
async fn disconnect_from_peer(world: &mut DemoWorld, peer: u64) {
    let result = world.session.disconnect_from_peer(PeerId::new(peer));
    world.record(result);
}

#[when(expr = "the user closes the widget of peer {int}")]
async fn close_widget(world: &mut DemoWorld, peer: u64) {
    let result = world.session.remove_peer(PeerId::new(peer));
    world.record(result);
}

#[when(expr = "host {int} drops the connection")]
async fn host_drops(world: &mut DemoWorld, peer: u64) {
    world.network.drop_peer(PeerId::new(peer));
}

#[when(expr = "host {int} dials the demo")]
async fn host_dials(world: &mut DemoWorld, peer: u64) {
    let own = world
        .session
        .with_state(|s| s.own_peer_id())
        .expect("Demo should be connected");
    assert!(world.network.request_connection(PeerId::new(peer), own));
}

// ===== Then Steps =====

#[then(expr = "the roster contains {int} entry/entries")]
async fn roster_contains(world: &mut DemoWorld, count: usize) {
    assert_eq!(world.roster_len(), count);
    assert!(world.invariants_hold());
}

#[then("the roster is empty")]
async fn roster_empty(world: &mut DemoWorld) {
    assert_eq!(world.roster_len(), 0);
}

#[then(expr = "peer {int} is {word}")]
async fn peer_is(world: &mut DemoWorld, peer: u64, state: String) {
    assert_eq!(world.widget_state(peer), Some(parse_widget_state(&state)));
    assert!(world.invariants_hold());
}

#[then(expr = "host {int} was disconnected {int} time(s)")]
async fn host_disconnected(world: &mut DemoWorld, peer: u64, count: usize) {
    assert_eq!(world.network.disconnect_count(PeerId::new(peer)), count);
}
