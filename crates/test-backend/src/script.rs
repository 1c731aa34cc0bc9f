use concierge_model::Citation;
use serde::{Deserialize, Serialize};

/// The scripted outcome for one send.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetReply {
    /// The reply text.
    pub text: String,
    /// Citations attached to the reply.
    pub citations: Vec<Citation>,
    /// If set, the send fails instead of producing a reply.
    pub fails: bool,
}

impl PresetReply {
    /// Creates a successful reply with the specified text.
    #[inline]
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            citations: vec![],
            fails: false,
        }
    }

    /// Attaches a citation to the reply.
    #[inline]
    pub fn with_citation<U, T>(mut self, uri: U, title: T) -> Self
    where
        U: Into<String>,
        T: Into<String>,
    {
        self.citations.push(Citation {
            uri: uri.into(),
            title: title.into(),
        });
        self
    }

    /// Creates a reply that fails the send.
    #[inline]
    pub fn failing() -> Self {
        Self {
            text: String::new(),
            citations: vec![],
            fails: true,
        }
    }
}
