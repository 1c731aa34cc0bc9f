//! A local scripted backend for testing purpose.

mod script;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use concierge_model::{
    BackendError, ChatBackend, ChatReply, ChatSession, ErrorKind,
    SessionParams, Turn,
};
use tokio::time::sleep;

pub use script::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
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

#[derive(Debug, Default)]
struct ScriptState {
    replies: VecDeque<PresetReply>,
    init_failures: u64,
    session_histories: Vec<Vec<Turn>>,
    sent_messages: Vec<String>,
}

/// A scripted backend for testing purpose.
///
/// Before opening sessions, set up the script: the replies are consumed
/// in order, one per send, and a send without a remaining scripted reply
/// fails. The backend records the history every session was seeded with
/// and every message forwarded to it, so tests can assert both.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<ScriptState>>,
    delay: Option<Duration>,
}

impl ScriptedBackend {
    /// Appends a scripted reply for the next unanswered send.
    #[inline]
    pub fn add_reply(&mut self, preset: PresetReply) {
        self.lock_state().replies.push_back(preset);
    }

    /// Makes the next `count` session-creation attempts fail.
    #[inline]
    pub fn fail_next_session_starts(&mut self, count: u64) {
        self.lock_state().init_failures = count;
    }

    /// Adds an artificial delay before every send resolves.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the history each opened session was seeded with.
    #[inline]
    pub fn session_histories(&self) -> Vec<Vec<Turn>> {
        self.lock_state().session_histories.clone()
    }

    /// Returns every message forwarded to the backend so far.
    #[inline]
    pub fn sent_messages(&self) -> Vec<String> {
        self.lock_state().sent_messages.clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().expect("script state is poisoned")
    }
}

impl ChatBackend for ScriptedBackend {
    type Error = Error;
    type Session = ScriptedSession;

    fn start_session(
        &self,
        params: SessionParams,
    ) -> impl Future<Output = Result<Self::Session, Self::Error>> + Send {
        let state = Arc::clone(&self.state);
        let delay = self.delay;

        async move {
            {
                let mut guard =
                    state.lock().expect("script state is poisoned");
                if guard.init_failures > 0 {
                    guard.init_failures -= 1;
                    return Err(Error {
                        message: "scripted session-creation failure",
                        kind: ErrorKind::MissingCredential,
                    });
                }
                guard.session_histories.push(params.history);
            }
            Ok(ScriptedSession { state, delay })
        }
    }
}

/// A session opened by [`ScriptedBackend`].
#[derive(Debug)]
pub struct ScriptedSession {
    state: Arc<Mutex<ScriptState>>,
    delay: Option<Duration>,
}

impl ChatSession for ScriptedSession {
    type Error = Error;

    fn send(
        &mut self,
        text: &str,
    ) -> impl Future<Output = Result<ChatReply, Self::Error>> + Send {
        let state = Arc::clone(&self.state);
        let delay = self.delay;
        let text = text.to_owned();

        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }

            let mut guard = state.lock().expect("script state is poisoned");
            guard.sent_messages.push(text);
            let Some(preset) = guard.replies.pop_front() else {
                return Err(Error {
                    message: "no more scripted replies",
                    kind: ErrorKind::RateLimitExceeded,
                });
            };
            if preset.fails {
                return Err(Error {
                    message: "scripted send failure",
                    kind: ErrorKind::Other,
                });
            }
            Ok(ChatReply {
                text: preset.text,
                citations: preset.citations,
            })
        }
    }
}
