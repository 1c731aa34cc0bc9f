//! End-to-end scenarios over the scripted backend: persisted history,
//! session creation, a send cycle, and the persisted result.

use concierge_core::store::{MemoryStore, StateStore};
use concierge_core::transcript::{
    Message, Role, TRANSCRIPT_KEY, Transcript,
};
use concierge_core::{ChatWidget, SEND_FAILED_TEXT};
use concierge_test_backend::{PresetReply, ScriptedBackend};

fn store_with_messages(messages: &[Message]) -> MemoryStore {
    let store = MemoryStore::default();
    store.set(TRANSCRIPT_KEY, &serde_json::to_string(messages).unwrap());
    store
}

#[tokio::test]
async fn test_grounded_reply_flow() {
    let store = store_with_messages(&[Message::model("Hi")]);
    let mut backend = ScriptedBackend::default();
    backend.add_reply(
        PresetReply::with_text("We offer web design and branding.")
            .with_citation("https://studio.example/services", "Our services"),
    );

    let mut widget =
        ChatWidget::open(&backend, "persona", store.clone()).await;
    widget.set_input("What services do you offer?");
    widget.send().await;

    // The session was seeded with the single persisted model turn.
    let histories = backend.session_histories();
    assert_eq!(histories[0].len(), 1);
    assert_eq!(histories[0][0].text, "Hi");

    let messages = widget.transcript().messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], Message::model("Hi"));
    assert_eq!(messages[1], Message::user("What services do you offer?"));
    assert_eq!(messages[2].role, Role::Model);
    assert_eq!(messages[2].content, "We offer web design and branding.");
    let sources = messages[2].sources.as_ref().unwrap();
    assert_eq!(sources[0].uri, "https://studio.example/services");

    // The full exchange round-trips through the persisted store.
    assert_eq!(Transcript::load_from(&store), *widget.transcript());
}

#[tokio::test]
async fn test_failed_send_flow() {
    let store = store_with_messages(&[Message::model("Hi")]);
    let mut backend = ScriptedBackend::default();
    backend.add_reply(PresetReply::failing());

    let mut widget =
        ChatWidget::open(&backend, "persona", store.clone()).await;
    widget.set_input("What services do you offer?");
    widget.send().await;

    let messages = widget.transcript().messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2], Message::error(SEND_FAILED_TEXT));
    assert!(!widget.is_sending());

    // The failed turn is persisted, but a reopened widget does not
    // replay it into the new session.
    let _reopened: ChatWidget<ScriptedBackend, _> =
        ChatWidget::open(&backend, "persona", store).await;
    let histories = backend.session_histories();
    assert_eq!(histories.len(), 2);
    let texts: Vec<&str> =
        histories[1].iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, ["Hi", "What services do you offer?"]);
}

#[tokio::test]
async fn test_n_sends_interleave() {
    let mut backend = ScriptedBackend::default();
    for i in 0..5 {
        backend.add_reply(PresetReply::with_text(format!("reply {i}")));
    }

    let mut widget =
        ChatWidget::open(&backend, "persona", MemoryStore::default()).await;
    for i in 0..5 {
        widget.set_input(format!("message {i}"));
        widget.send().await;
    }

    let messages = widget.transcript().messages();
    let user_count =
        messages.iter().filter(|m| m.role == Role::User).count();
    let reply_count = messages
        .iter()
        .filter(|m| matches!(m.role, Role::Model | Role::Error))
        .count();
    assert_eq!(user_count, 5);
    // 5 replies plus the welcome turn.
    assert_eq!(reply_count, 6);
    for i in 0..5 {
        assert_eq!(messages[1 + i * 2].content, format!("message {i}"));
        assert_eq!(messages[2 + i * 2].content, format!("reply {i}"));
    }
}
