use std::error::Error;

use crate::error::ErrorKind;
use crate::reply::ChatReply;
use crate::turn::SessionParams;

/// The error type for a chat backend.
pub trait BackendError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a remote conversational backend, which is an
/// entry for opening sessions against a hosted generative-language
/// service.
///
/// Once the backend is created, it should behave like a stateless
/// object. Conversation state lives in the sessions it opens, never in
/// the backend itself.
pub trait ChatBackend: Send + Sync {
    /// The error type that may be returned by the backend.
    type Error: BackendError;

    /// The session type this backend opens.
    type Session: ChatSession<Error = Self::Error>;

    /// Opens a session seeded with the given parameters.
    ///
    /// Implementations should validate their configuration here, so that
    /// a missing credential surfaces as a session-creation failure
    /// rather than a failure on the first send.
    fn start_session(
        &self,
        params: SessionParams,
    ) -> impl Future<Output = Result<Self::Session, Self::Error>> + Send;
}

/// An open conversational session.
///
/// A session is an exclusive resource: it is owned by a single
/// controller and is not designed for concurrent sends. Callers must
/// ensure at most one `send` is in flight at a time.
pub trait ChatSession: Send + 'static {
    /// The error type that may be returned by the session.
    type Error: BackendError;

    /// Forwards one user turn to the backend and resolves with the
    /// complete reply.
    ///
    /// A failed send is terminal for the turn: implementations must not
    /// retry, and must not record the failed turn into the history that
    /// subsequent sends replay.
    fn send(
        &mut self,
        text: &str,
    ) -> impl Future<Output = Result<ChatReply, Self::Error>> + Send;
}
