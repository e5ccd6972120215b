use rainway_demo_core::{ChatEntry, ChatKind, PeerId};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ChatBoxProps {
    pub peer_id: PeerId,
    pub entries: Vec<ChatEntry>,

    /// Input and send button are usable
    pub enabled: bool,

    pub on_send: Callback<String>,
}

/// Speaker label of a chat line
fn chat_label(kind: ChatKind, peer_id: PeerId) -> String {
    match kind {
        ChatKind::Incoming => peer_id.nickname(),
        ChatKind::Outgoing => "Me".to_string(),
        ChatKind::Info => "Info".to_string(),
    }
}

fn kind_class(kind: ChatKind) -> &'static str {
    match kind {
        ChatKind::Incoming => "incoming",
        ChatKind::Outgoing => "outgoing",
        ChatKind::Info => "info",
    }
}

/// Chat history of one peer with a message input
#[function_component(ChatBox)]
pub fn chat_box(props: &ChatBoxProps) -> Html {
    let draft = use_state(String::new);

    let send = {
        let draft = draft.clone();
        let on_send = props.on_send.clone();
        Callback::from(move |_: ()| {
            if draft.is_empty() {
                return;
            }
            on_send.emit((*draft).clone());
            draft.set(String::new());
        })
    };

    let on_input = {
        let draft = draft.clone();
        Callback::from(move |e: InputEvent| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            draft.set(input.value());
        })
    };

    let on_keydown = {
        let send = send.clone();
        Callback::from(move |e: KeyboardEvent| {
            if e.key() == "Enter" {
                e.prevent_default();
                send.emit(());
            }
        })
    };

    let on_click = Callback::from(move |_: MouseEvent| send.emit(()));

    html! {
        <div class="rainway-chat">
            <ul class="rainway-chat__history">
                {for props.entries.iter().map(|entry| {
                    html! {
                        <li class={classes!("rainway-chat__entry", kind_class(entry.kind()))}>
                            <span class="rainway-chat__speaker">
                                {chat_label(entry.kind(), props.peer_id)}{": "}
                            </span>
                            <span class="rainway-chat__message">{entry.message()}</span>
                        </li>
                    }
                })}
            </ul>
            <div class="rainway-chat__input-row">
                <input
                    class="rainway-chat__input"
                    type="text"
                    placeholder="message"
                    value={(*draft).clone()}
                    oninput={on_input}
                    onkeydown={on_keydown}
                    disabled={!props.enabled}
                />
                <button
                    class="rainway-chat__send"
                    onclick={on_click}
                    disabled={!props.enabled || draft.is_empty()}
                >
                    {"Send"}
                </button>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_labels() {
        let peer = PeerId::new(900_000_000_000_123_456);

        assert_eq!(chat_label(ChatKind::Incoming, peer), "123456");
        assert_eq!(chat_label(ChatKind::Outgoing, peer), "Me");
        assert_eq!(chat_label(ChatKind::Info, peer), "Info");
    }

    #[test]
    fn test_entries_keep_order() {
        let props = yew::props!(ChatBoxProps {
            peer_id: PeerId::new(1),
            entries: vec![ChatEntry::incoming("hello"), ChatEntry::outgoing("hi")],
            enabled: true,
            on_send: Callback::from(|_: String| {}),
        });

        let messages: Vec<_> = props.entries.iter().map(|e| e.message()).collect();
        assert_eq!(messages, vec!["hello", "hi"]);
    }
}
