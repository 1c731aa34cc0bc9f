use concierge_model::{ChatReply, Citation, Turn, TurnRole};
use serde::{Deserialize, Serialize};

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    #[inline]
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self {
            role: "user".to_owned(),
            parts: vec![Part { text: text.into() }],
        }
    }

    #[inline]
    pub fn model<S: Into<String>>(text: S) -> Self {
        Self {
            role: "model".to_owned(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tool {
    #[serde(rename = "googleSearch")]
    pub google_search: GoogleSearch,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GoogleSearch {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(
        rename = "systemInstruction",
        skip_serializing_if = "Option::is_none"
    )]
    pub system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    #[serde(rename = "groundingMetadata")]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CandidateContent {
    pub parts: Option<Vec<CandidatePart>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GroundingMetadata {
    #[serde(rename = "groundingChunks")]
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GroundingChunk {
    pub web: Option<WebSource>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebSource {
    pub uri: Option<String>,
    pub title: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ErrorWrapper {
    pub error: ErrorBody,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub status: Option<String>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn history_contents(history: &[Turn]) -> Vec<Content> {
    history
        .iter()
        .map(|turn| match turn.role {
            TurnRole::User => Content::user(turn.text.clone()),
            TurnRole::Model => Content::model(turn.text.clone()),
        })
        .collect()
}

#[inline]
pub fn create_request(
    contents: Vec<Content>,
    system_instruction: &str,
    web_grounding: bool,
) -> GenerateContentRequest {
    GenerateContentRequest {
        contents,
        system_instruction: if system_instruction.is_empty() {
            None
        } else {
            Some(SystemInstruction {
                parts: vec![Part {
                    text: system_instruction.to_owned(),
                }],
            })
        },
        tools: if web_grounding {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            vec![]
        },
    }
}

/// Extracts the reply text and citations from a parsed response.
///
/// Returns `None` when no candidate carries text. Citation pairs are
/// forwarded as-is; missing fields become empty strings and are left for
/// the widget to filter.
pub fn extract_reply(resp: GenerateContentResponse) -> Option<ChatReply> {
    let candidate = resp.candidates?.into_iter().next()?;

    let text: String = candidate
        .content?
        .parts?
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    if text.is_empty() {
        return None;
    }

    let citations = candidate
        .grounding_metadata
        .and_then(|meta| meta.grounding_chunks)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|chunk| chunk.web)
        .map(|web| Citation {
            uri: web.uri.unwrap_or_default(),
            title: web.title.unwrap_or_default(),
        })
        .collect();

    Some(ChatReply { text, citations })
}

/// Decodes a `{"error": {...}}` body into a readable message.
pub fn decode_error_body(body: &str) -> Option<String> {
    let wrapper: ErrorWrapper = serde_json::from_str(body).ok()?;
    let message = wrapper.error.message?;
    Some(match wrapper.error.status {
        Some(status) if !status.is_empty() => format!("{status}: {message}"),
        _ => message,
    })
}
