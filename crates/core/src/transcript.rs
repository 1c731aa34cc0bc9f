//! The ordered, append-only conversation log.

use concierge_model::Turn;
use serde::{Deserialize, Serialize};

use crate::store::StateStore;

/// Storage key the transcript is persisted under.
pub const TRANSCRIPT_KEY: &str = "concierge.transcript";

/// The synthetic welcome turn seeding an empty transcript.
pub const WELCOME_TEXT: &str =
    "Hi there! I'm the studio's assistant. Ask me anything about our services.";

/// Who produced a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Raw user input.
    User,
    /// A generated reply.
    Model,
    /// A human-readable failure description.
    Error,
}

/// A web reference supporting a model reply.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    /// The address of the referenced page.
    pub uri: String,
    /// The title of the referenced page.
    pub title: String,
}

/// A single conversational turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced this turn. Fixed at creation.
    pub role: Role,
    /// The text payload.
    pub content: String,
    /// Citation sources; present only on model turns where the backend
    /// supplied at least one usable pair, omitted otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
}

impl Message {
    /// Creates a user turn.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: None,
        }
    }

    /// Creates a model turn without sources.
    #[inline]
    pub fn model<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
            sources: None,
        }
    }

    /// Creates a model turn with citation sources.
    ///
    /// `sources` must be non-empty; an empty citation list is expressed
    /// by omitting the field, not by an empty sequence.
    #[inline]
    pub fn model_with_sources<S: Into<String>>(
        content: S,
        sources: Vec<Source>,
    ) -> Self {
        debug_assert!(!sources.is_empty());
        Self {
            role: Role::Model,
            content: content.into(),
            sources: Some(sources),
        }
    }

    /// Creates an error turn.
    #[inline]
    pub fn error<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Error,
            content: content.into(),
            sources: None,
        }
    }
}

/// The conversation transcript.
///
/// The transcript is never empty: a default instance carries one
/// synthetic model welcome turn. Entries are append-only, so an entry's
/// index is its chronological position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self {
            messages: vec![Message::model(WELCOME_TEXT)],
        }
    }
}

impl Transcript {
    /// Loads the persisted transcript from a store.
    ///
    /// Absent, malformed, and empty persisted data are treated the same
    /// way: the stored value is discarded in favor of the seeded
    /// default. This method never fails.
    pub fn load_from<S: StateStore>(store: &S) -> Self {
        let Some(raw) = store.get(TRANSCRIPT_KEY) else {
            return Self::default();
        };
        match serde_json::from_str::<Vec<Message>>(&raw) {
            Ok(messages) if !messages.is_empty() => Self { messages },
            Ok(_) => Self::default(),
            Err(err) => {
                warn!("discarding malformed transcript: {err}");
                Self::default()
            }
        }
    }

    /// Persists the transcript to a store. Best-effort.
    pub fn persist_to<S: StateStore>(&self, store: &S) {
        match serde_json::to_string(&self.messages) {
            Ok(encoded) => store.set(TRANSCRIPT_KEY, &encoded),
            Err(err) => warn!("failed to encode transcript: {err}"),
        }
    }

    /// Appends a turn to the transcript.
    #[inline]
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Returns the transcript entries in chronological order.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Reconstructs the history to seed a backend session with.
    ///
    /// Error turns are client-side artifacts and are excluded; the
    /// relative order of the remaining turns is preserved.
    pub fn history(&self) -> Vec<Turn> {
        self.messages
            .iter()
            .filter_map(|msg| match msg.role {
                Role::User => Some(Turn::user(msg.content.clone())),
                Role::Model => Some(Turn::model(msg.content.clone())),
                Role::Error => None,
            })
            .collect()
    }
}
