use thiserror::Error;

/// Missing or malformed local input, caught before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{0} must not be blank")]
    BlankField(&'static str),
}

/// Failure reported by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an account with this email already exists")]
    DuplicateAccount,
    #[error("session expired, please sign in again")]
    ExpiredToken,
    #[error("authentication service unavailable: {0}")]
    Unavailable(String),
    #[error("authentication rejected: {0}")]
    Rejected(String),
    /// A sign-out arrived while the attempt was in flight.
    #[error("sign-in cancelled by a later sign-out")]
    Superseded,
}

/// A route parameter was absent at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route parameter {0} must not be empty")]
    EmptyParam(&'static str),
    #[error("unknown route: {0}")]
    Unknown(String),
}
