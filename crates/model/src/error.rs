/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The backend credential is absent or was rejected.
    MissingCredential,
    /// The backend is rate limited.
    RateLimitExceeded,
    /// Any other errors.
    Other,
}
