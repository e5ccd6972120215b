use cucumber::gherkin::Step;
use cucumber::{then, when};
use rainway_demo_core::{ChatKind, PeerId, CHAT_CHANNEL};
use rainway_demo_tests::DemoWorld;

fn kind_name(kind: ChatKind) -> &'static str {
    match kind {
        ChatKind::Incoming => "incoming",
        ChatKind::Outgoing => "outgoing",
        ChatKind::Info => "info",
    }
}

#[when(expr = "the user sends {string} to peer {int}")]
async fn send_chat(world: &mut DemoWorld, message: String, peer: u64) {
    let result = world.session.send_chat(PeerId::new(peer), &message);
    world.record(result);
}

#[when(expr = "host {int} sends {string}")]
async fn host_sends(world: &mut DemoWorld, peer: u64, message: String) {
    world.network.send_from(PeerId::new(peer), message.as_bytes());
}

#[then(expr = "the chat log of peer {int} is:")]
async fn chat_log_is(world: &mut DemoWorld, peer: u64, step: &Step) {
    let table = step.table.as_ref().expect("Step should carry a table");

    let expected: Vec<(String, String)> = table
        .rows
        .iter()
        .skip(1)
        .map(|row| (row[0].clone(), row[1].clone()))
        .collect();

    let actual: Vec<(String, String)> = world
        .chat(peer)
        .iter()
        .map(|entry| (kind_name(entry.kind()).to_string(), entry.message().to_string()))
        .collect();

    assert_eq!(actual, expected);
}

#[then(expr = "the chat log of peer {int} is empty")]
async fn chat_log_empty(world: &mut DemoWorld, peer: u64) {
    assert!(world.chat(peer).is_empty());
}

#[then(expr = "host {int} received {string}")]
async fn host_received(world: &mut DemoWorld, peer: u64, message: String) {
    let received: Vec<String> = world
        .network
        .sent_messages()
        .into_iter()
        .filter(|m| m.to == PeerId::new(peer) && m.channel == CHAT_CHANNEL)
        .map(|m| m.text())
        .collect();

    assert_eq!(received, vec![message]);
}

#[then(expr = "host {int} received nothing")]
async fn host_received_nothing(world: &mut DemoWorld, peer: u64) {
    assert!(world
        .network
        .sent_messages()
        .iter()
        .all(|m| m.to != PeerId::new(peer)));
}
