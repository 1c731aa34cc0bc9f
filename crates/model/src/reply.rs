use serde::{Deserialize, Serialize};

/// A web reference the backend supplied to support its reply.
///
/// Pairs are forwarded as the backend produced them; either field may be
/// empty, and it is up to the widget to decide which entries are worth
/// presenting.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    /// The address of the referenced page.
    pub uri: String,
    /// The title of the referenced page.
    pub title: String,
}

/// A completed reply from the backend for a single turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatReply {
    /// The generated reply text.
    pub text: String,
    /// Grounding citations, if the backend supplied any.
    pub citations: Vec<Citation>,
}

impl ChatReply {
    /// Creates a reply with the given text and no citations.
    #[inline]
    pub fn text_only<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            citations: vec![],
        }
    }
}
