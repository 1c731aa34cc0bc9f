use serde::{Deserialize, Serialize};

/// The role of a replayed history turn.
///
/// Only user inputs and model replies participate in history
/// reconstruction; transcript entries that record client-side failures
/// are never sent to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// A user input text.
    User,
    /// A model reply text.
    Model,
}

/// A single prior turn replayed to the backend when a session is created.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn.
    pub role: TurnRole,
    /// The text content of the turn.
    pub text: String,
}

impl Turn {
    /// Creates a user turn.
    #[inline]
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    /// Creates a model turn.
    #[inline]
    pub fn model<S: Into<String>>(text: S) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// Parameters for creating a conversational session.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionParams {
    /// Prior turns the session is seeded with, in chronological order.
    pub history: Vec<Turn>,
    /// The fixed system instruction (persona and subject-matter
    /// constraints) the session is configured with.
    pub system_instruction: String,
    /// Whether the backend-side web-grounding search tool is enabled.
    pub web_grounding: bool,
}

impl SessionParams {
    /// Creates session parameters with the given system instruction and
    /// no prior history.
    #[inline]
    pub fn with_system_instruction<S: Into<String>>(instruction: S) -> Self {
        Self {
            history: vec![],
            system_instruction: instruction.into(),
            web_grounding: true,
        }
    }

    /// Sets the prior turns the session is seeded with.
    #[inline]
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }
}
