use concierge_model::{ChatBackend, ChatSession, SessionParams};

use crate::speech::VoiceUpdate;
use crate::store::StateStore;
use crate::transcript::{Message, Source, Transcript};

/// Storage key the visibility flag is persisted under.
pub const VISIBILITY_KEY: &str = "concierge.visible";

/// Transcript entry recorded when a send fails.
pub const SEND_FAILED_TEXT: &str =
    "Sorry, something went wrong. Please try again.";

/// Transcript entry recorded when the session cannot be created.
pub const SESSION_INIT_FAILED_TEXT: &str =
    "Sorry, the assistant is unavailable right now. Please try again later.";

/// Transcript entry recorded when microphone access is denied.
pub const MICROPHONE_DENIED_TEXT: &str =
    "Microphone access was denied, so voice input is unavailable.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Stage {
    #[default]
    Idle,
    Sending,
}

/// The embedded chat widget.
///
/// Owns the transcript, the visibility flag, the pending input buffer,
/// and the session handle. The session is created at most once per
/// widget lifetime; there is no re-initialization short of building a
/// new widget.
///
/// Sends are single-flight: while one is in flight, further send
/// attempts are silently rejected rather than queued, which keeps at
/// most one request outstanding against the session.
pub struct ChatWidget<B: ChatBackend, S: StateStore> {
    store: S,
    transcript: Transcript,
    visible: bool,
    input: String,
    stage: Stage,
    session: Option<B::Session>,
}

impl<B, S> ChatWidget<B, S>
where
    B: ChatBackend,
    S: StateStore,
{
    /// Loads persisted state and opens the backend session, seeded with
    /// the history reconstructed from the transcript.
    ///
    /// A session-creation failure is not propagated: it is recorded as
    /// an error turn, the handle stays unset, and every subsequent send
    /// is a silent no-op.
    pub async fn open(backend: &B, system_instruction: &str, store: S) -> Self {
        let transcript = Transcript::load_from(&store);
        let visible = load_visibility(&store);
        let params =
            SessionParams::with_system_instruction(system_instruction)
                .with_history(transcript.history());

        let mut widget = Self {
            store,
            transcript,
            visible,
            input: String::new(),
            stage: Stage::default(),
            session: None,
        };
        match backend.start_session(params).await {
            Ok(session) => widget.session = Some(session),
            Err(err) => {
                warn!("failed to create a session: {err}");
                widget
                    .transcript
                    .append(Message::error(SESSION_INIT_FAILED_TEXT));
                widget.transcript.persist_to(&widget.store);
            }
        }
        widget
    }

    /// Returns the transcript.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns whether the widget is visible.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns whether a send is currently in flight.
    #[inline]
    pub fn is_sending(&self) -> bool {
        self.stage == Stage::Sending
    }

    /// Returns whether the widget holds a usable session.
    #[inline]
    pub fn can_send(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the pending, not-yet-sent input text.
    #[inline]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replaces the pending input text.
    #[inline]
    pub fn set_input<T: Into<String>>(&mut self, text: T) {
        self.input = text.into();
    }

    /// Flips the visibility flag and persists it.
    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
        self.store.set(VISIBILITY_KEY, if self.visible { "true" } else { "false" });
    }

    /// Sends the pending input as a user turn and appends the outcome.
    ///
    /// A deliberate no-op when the trimmed input is empty, a send is
    /// already in flight, or the session was never created. On success
    /// the reply is appended as a model turn, with citation sources
    /// attached only when at least one pair has both a non-empty URI and
    /// title. On failure a single generic error turn is appended; there
    /// is no retry, the user resends manually.
    pub async fn send(&mut self) {
        if self.stage == Stage::Sending {
            return;
        }
        let text = self.input.trim().to_owned();
        if text.is_empty() {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        self.stage = Stage::Sending;
        self.input.clear();
        self.transcript.append(Message::user(text.clone()));
        self.transcript.persist_to(&self.store);

        match session.send(&text).await {
            Ok(reply) => {
                let sources: Vec<Source> = reply
                    .citations
                    .into_iter()
                    .filter(|c| !c.uri.is_empty() && !c.title.is_empty())
                    .map(|c| Source {
                        uri: c.uri,
                        title: c.title,
                    })
                    .collect();
                let message = if sources.is_empty() {
                    Message::model(reply.text)
                } else {
                    Message::model_with_sources(reply.text, sources)
                };
                self.transcript.append(message);
            }
            Err(err) => {
                warn!("send failed: {err}");
                self.transcript.append(Message::error(SEND_FAILED_TEXT));
            }
        }

        self.transcript.persist_to(&self.store);
        self.stage = Stage::Idle;
    }

    /// Applies an update produced by the voice input adapter.
    ///
    /// Recognized text is appended to the pending input, separated by a
    /// single space when there already is content; it is never auto-sent.
    pub fn apply_voice_update(&mut self, update: VoiceUpdate) {
        match update {
            VoiceUpdate::Transcript(text) => {
                if !self.input.is_empty() {
                    self.input.push(' ');
                }
                self.input.push_str(&text);
            }
            VoiceUpdate::PermissionDenied => {
                self.transcript
                    .append(Message::error(MICROPHONE_DENIED_TEXT));
                self.transcript.persist_to(&self.store);
            }
        }
    }
}

fn load_visibility<S: StateStore>(store: &S) -> bool {
    match store.get(VISIBILITY_KEY).as_deref() {
        Some("true") => true,
        Some("false") | None => false,
        Some(other) => {
            warn!("discarding malformed visibility flag: {other:?}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use concierge_test_backend::{PresetReply, ScriptedBackend};

    use crate::store::MemoryStore;
    use crate::transcript::{Role, TRANSCRIPT_KEY, Transcript, WELCOME_TEXT};

    use super::*;

    async fn open_widget(
        backend: &ScriptedBackend,
    ) -> ChatWidget<ScriptedBackend, MemoryStore> {
        ChatWidget::open(backend, "persona", MemoryStore::default()).await
    }

    #[tokio::test]
    async fn test_send_appends_user_and_model_turns() {
        let mut backend = ScriptedBackend::default();
        backend.add_reply(PresetReply::with_text("We offer web design."));
        let mut widget = open_widget(&backend).await;

        widget.set_input("What services do you offer?");
        widget.send().await;

        let messages = widget.transcript().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], Message::model(WELCOME_TEXT));
        assert_eq!(messages[1], Message::user("What services do you offer?"));
        assert_eq!(messages[2], Message::model("We offer web design."));
        assert!(widget.input().is_empty());
        assert!(!widget.is_sending());
    }

    #[tokio::test]
    async fn test_sends_interleave_in_call_order() {
        let mut backend = ScriptedBackend::default();
        backend.add_reply(PresetReply::with_text("First reply"));
        backend.add_reply(PresetReply::failing());
        backend.add_reply(PresetReply::with_text("Third reply"));
        let mut widget = open_widget(&backend).await;

        for text in ["one", "two", "three"] {
            widget.set_input(text);
            widget.send().await;
        }

        let roles: Vec<Role> = widget
            .transcript()
            .messages()
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(
            roles,
            [
                Role::Model, // welcome
                Role::User,
                Role::Model,
                Role::User,
                Role::Error,
                Role::User,
                Role::Model,
            ]
        );
        assert_eq!(backend.sent_messages(), ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_empty_and_whitespace_inputs_are_no_ops() {
        let backend = ScriptedBackend::default();
        let mut widget = open_widget(&backend).await;

        widget.send().await;
        widget.set_input("   \t  ");
        widget.send().await;

        assert_eq!(widget.transcript().messages().len(), 1);
        assert!(backend.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_send_while_in_flight_is_a_no_op() {
        let mut backend = ScriptedBackend::default();
        backend.add_reply(PresetReply::with_text("Hello!"));
        let mut widget = open_widget(&backend).await;

        widget.stage = Stage::Sending;
        widget.set_input("Hi");
        widget.send().await;

        assert_eq!(widget.transcript().messages().len(), 1);
        assert!(backend.sent_messages().is_empty());
        assert_eq!(widget.input(), "Hi");
    }

    #[tokio::test]
    async fn test_send_failure_appends_generic_error() {
        let mut backend = ScriptedBackend::default();
        backend.add_reply(PresetReply::failing());
        let mut widget = open_widget(&backend).await;

        widget.set_input("Hi");
        widget.send().await;

        let messages = widget.transcript().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2], Message::error(SEND_FAILED_TEXT));
        assert!(!widget.is_sending());
    }

    #[tokio::test]
    async fn test_citations_are_filtered_and_attached() {
        let mut backend = ScriptedBackend::default();
        backend.add_reply(
            PresetReply::with_text("Grounded reply")
                .with_citation("https://example.com", "Example")
                .with_citation("", "No URI")
                .with_citation("https://no-title.example", ""),
        );
        let mut widget = open_widget(&backend).await;

        widget.set_input("Hi");
        widget.send().await;

        let reply = &widget.transcript().messages()[2];
        let sources = reply.sources.as_ref().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].uri, "https://example.com");
    }

    #[tokio::test]
    async fn test_all_invalid_citations_means_no_sources() {
        let mut backend = ScriptedBackend::default();
        backend.add_reply(
            PresetReply::with_text("Reply").with_citation("", ""),
        );
        let mut widget = open_widget(&backend).await;

        widget.set_input("Hi");
        widget.send().await;

        assert_eq!(widget.transcript().messages()[2].sources, None);
    }

    #[tokio::test]
    async fn test_session_init_failure_disables_sends() {
        let mut backend = ScriptedBackend::default();
        backend.fail_next_session_starts(1);
        backend.add_reply(PresetReply::with_text("unreachable"));
        let mut widget = open_widget(&backend).await;

        assert!(!widget.can_send());
        let messages = widget.transcript().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], Message::error(SESSION_INIT_FAILED_TEXT));

        widget.set_input("Hi");
        widget.send().await;
        assert_eq!(widget.transcript().messages().len(), 2);
        assert!(backend.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_session_is_seeded_with_filtered_history() {
        let store = MemoryStore::default();
        let mut transcript = Transcript::default();
        transcript.append(Message::user("Hello"));
        transcript.append(Message::error("Sorry, something went wrong."));
        transcript.append(Message::model("Hi!"));
        transcript.persist_to(&store);

        let backend = ScriptedBackend::default();
        let _widget: ChatWidget<_, _> =
            ChatWidget::open(&backend, "persona", store).await;

        let histories = backend.session_histories();
        assert_eq!(histories.len(), 1);
        let texts: Vec<&str> =
            histories[0].iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, [WELCOME_TEXT, "Hello", "Hi!"]);
    }

    #[tokio::test]
    async fn test_transcript_persisted_across_widgets() {
        let store = MemoryStore::default();
        let mut backend = ScriptedBackend::default();
        backend.add_reply(PresetReply::with_text("Hello!"));

        let mut widget =
            ChatWidget::open(&backend, "persona", store.clone()).await;
        widget.set_input("Hi");
        widget.send().await;
        let saved = widget.transcript().clone();

        let reopened: ChatWidget<ScriptedBackend, _> =
            ChatWidget::open(&backend, "persona", store).await;
        assert_eq!(*reopened.transcript(), saved);
    }

    #[tokio::test]
    async fn test_visibility_toggle_is_persisted() {
        let store = MemoryStore::default();
        let backend = ScriptedBackend::default();

        let mut widget =
            ChatWidget::open(&backend, "persona", store.clone()).await;
        assert!(!widget.is_visible());
        widget.toggle_visibility();
        assert!(widget.is_visible());

        let reopened: ChatWidget<ScriptedBackend, _> =
            ChatWidget::open(&backend, "persona", store.clone()).await;
        assert!(reopened.is_visible());

        // A malformed persisted flag falls back to hidden.
        store.set(VISIBILITY_KEY, "maybe");
        let reopened: ChatWidget<ScriptedBackend, _> =
            ChatWidget::open(&backend, "persona", store).await;
        assert!(!reopened.is_visible());
    }

    #[tokio::test]
    async fn test_voice_transcript_appends_to_pending_input() {
        let backend = ScriptedBackend::default();
        let mut widget = open_widget(&backend).await;

        widget.apply_voice_update(VoiceUpdate::Transcript(
            "hello".to_owned(),
        ));
        assert_eq!(widget.input(), "hello");

        widget.apply_voice_update(VoiceUpdate::Transcript(
            "there".to_owned(),
        ));
        assert_eq!(widget.input(), "hello there");

        // Nothing is sent automatically.
        assert!(backend.sent_messages().is_empty());
        assert_eq!(widget.transcript().messages().len(), 1);
    }

    #[tokio::test]
    async fn test_permission_denied_appends_error_turn() {
        let store = MemoryStore::default();
        let backend = ScriptedBackend::default();
        let mut widget =
            ChatWidget::open(&backend, "persona", store.clone()).await;

        widget.apply_voice_update(VoiceUpdate::PermissionDenied);

        let messages = widget.transcript().messages();
        assert_eq!(messages[1], Message::error(MICROPHONE_DENIED_TEXT));
        // The entry is persisted immediately.
        assert!(store.get(TRANSCRIPT_KEY).unwrap().contains("Microphone"));
    }
}
