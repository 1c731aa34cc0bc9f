//! A chat backend for the Google generative-language API.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use concierge_model::{
    BackendError, ChatBackend, ChatReply, ChatSession, ErrorKind,
    SessionParams,
};
use mime::Mime;
use reqwest::{Client, StatusCode, header};

pub use config::{GeminiConfig, GeminiConfigBuilder};
use proto::Content;

/// Error type for [`GeminiBackend`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl BackendError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Chat backend for the generative-language `generateContent` API.
#[derive(Clone, Debug)]
pub struct GeminiBackend {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiBackend {
    /// Creates a new `GeminiBackend` with the given configuration.
    #[inline]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ChatBackend for GeminiBackend {
    type Error = Error;
    type Session = GeminiSession;

    fn start_session(
        &self,
        params: SessionParams,
    ) -> impl Future<Output = Result<Self::Session, Self::Error>> + Send {
        let client = self.client.clone();
        let config = Arc::clone(&self.config);

        async move {
            if config.api_key.is_empty() {
                return Err(Error::new(
                    "no API key is configured",
                    ErrorKind::MissingCredential,
                ));
            }

            let SessionParams {
                history,
                system_instruction,
                web_grounding,
            } = params;
            Ok(GeminiSession {
                client,
                config,
                system_instruction,
                web_grounding,
                contents: proto::history_contents(&history),
            })
        }
    }
}

/// An open session against the generative-language API.
///
/// The API itself is stateless; the session keeps the turn history on
/// the client side and replays it with every request. A failed send
/// leaves the history untouched, so the failed turn is never replayed.
#[derive(Debug)]
pub struct GeminiSession {
    client: Client,
    config: Arc<GeminiConfig>,
    system_instruction: String,
    web_grounding: bool,
    contents: Vec<Content>,
}

impl ChatSession for GeminiSession {
    type Error = Error;

    fn send(
        &mut self,
        text: &str,
    ) -> impl Future<Output = Result<ChatReply, Self::Error>> + Send {
        let user_content = Content::user(text);

        async move {
            let mut contents = self.contents.clone();
            contents.push(user_content.clone());
            let request = proto::create_request(
                contents,
                &self.system_instruction,
                self.web_grounding,
            );
            trace!("sending a request: {:?}", request);

            let url = format!(
                "{}/models/{}:generateContent?key={}",
                self.config.base_url, self.config.model, self.config.api_key,
            );
            let resp = match self
                .client
                .post(url)
                .header(header::CONTENT_TYPE, "application/json")
                .json(&request)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(err) => {
                    error!("request failed: {err}");
                    return Err(Error::new(format!("{err}"), ErrorKind::Other));
                }
            };

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(http_error(status, &body));
            }

            let is_valid_content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype() == mime::JSON)
                .unwrap_or(false);
            if !is_valid_content_type {
                return Err(Error::new(
                    "unexpected content type in response",
                    ErrorKind::Other,
                ));
            }

            let parsed: proto::GenerateContentResponse =
                match resp.json().await {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        return Err(Error::new(
                            format!("malformed response: {err}"),
                            ErrorKind::Other,
                        ));
                    }
                };
            let Some(reply) = proto::extract_reply(parsed) else {
                return Err(Error::new(
                    "response contains no candidate text",
                    ErrorKind::Other,
                ));
            };

            // Record the exchange only after a fully successful turn.
            self.contents.push(user_content);
            self.contents.push(Content::model(reply.text.clone()));
            Ok(reply)
        }
    }
}

fn http_error(status: StatusCode, body: &str) -> Error {
    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ErrorKind::MissingCredential
        }
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimitExceeded,
        _ => ErrorKind::Other,
    };
    let message = proto::decode_error_body(body)
        .unwrap_or_else(|| format!("backend returned status {status}"));
    Error::new(message, kind)
}
