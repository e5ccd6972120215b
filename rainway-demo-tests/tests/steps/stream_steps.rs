use cucumber::{given, then, when};
use rainway_demo_core::{PeerId, StreamAnnouncement, StreamId};
use rainway_demo_tests::DemoWorld;

#[given(expr = "host {int} announces a stream named {string}")]
async fn host_announces(world: &mut DemoWorld, peer: u64, name: String) {
    let stream_id = StreamId::new();
    world.announced.insert(name.clone(), stream_id);
    world
        .network
        .announce(PeerId::new(peer), StreamAnnouncement::new(stream_id, Some(name)));
}

#[when(expr = "the user requests a stream from peer {int}")]
async fn request_stream(world: &mut DemoWorld, peer: u64) {
    let result = world.session.request_stream(PeerId::new(peer)).await;
    world.record(result);
}

#[when(expr = "the user joins the stream {string} of peer {int}")]
async fn join_stream(world: &mut DemoWorld, name: String, peer: u64) {
    let stream_id = *world
        .announced
        .get(&name)
        .unwrap_or_else(|| panic!("Stream '{}' was not announced", name));
    let announcement = StreamAnnouncement::new(stream_id, Some(name));

    let result = world
        .session
        .join_announced_stream(PeerId::new(peer), &announcement)
        .await;
    world.record(result);
}

#[when(expr = "the user releases the stream of peer {int}")]
async fn release_stream(world: &mut DemoWorld, peer: u64) {
    let result = world.session.release_stream(PeerId::new(peer));
    world.record(result);
}

#[when(expr = "host {int} stops streaming")]
async fn host_stops(world: &mut DemoWorld, peer: u64) {
    world.network.stop_streams(PeerId::new(peer));
}

#[then(expr = "peer {int} has a stream")]
async fn has_stream(world: &mut DemoWorld, peer: u64) {
    assert!(world.has_stream(peer));
}

#[then(expr = "peer {int} has no stream")]
async fn has_no_stream(world: &mut DemoWorld, peer: u64) {
    assert!(!world.has_stream(peer));
}

#[then(expr = "the stream of host {int} was left {int} time(s)")]
async fn stream_left(world: &mut DemoWorld, peer: u64, count: u32) {
    let streams: Vec<_> = world
        .network
        .streams()
        .into_iter()
        .filter(|s| s.host() == PeerId::new(peer))
        .collect();

    assert_eq!(streams.len(), 1, "Expected exactly one stream from host {}", peer);
    assert_eq!(streams[0].snapshot().left, count);
}

#[then(expr = "peer {int} offers {int} stream(s)")]
async fn offers_streams(world: &mut DemoWorld, peer: u64, count: usize) {
    let offered = world.session.with_state(|s| {
        s.roster()
            .get(PeerId::new(peer))
            .map(|e| e.announcements().len())
            .unwrap_or_default()
    });
    assert_eq!(offered, count);
}

#[then(expr = "the stream of peer {int} stopped {int} time(s)")]
async fn stream_stops(world: &mut DemoWorld, peer: u64, count: u32) {
    let stops = world.session.with_state(|s| {
        s.roster()
            .get(PeerId::new(peer))
            .map(|e| e.stream_stop_count())
            .unwrap_or_default()
    });
    assert_eq!(stops, count);
}
