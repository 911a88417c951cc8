use thiserror::Error;

pub type Result<T> = std::result::Result<T, WheelError>;

/// Reasons an init data string is rejected. All of them are the caller's fault
/// and none are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("initData is empty")]
    EmptyToken,

    #[error("initData hash mismatch")]
    InvalidSignature,

    #[error("user data not found")]
    MissingUserField,

    #[error("invalid user data: {0}")]
    MalformedUserJson(String),
}

impl AuthError {
    /// HTTP status a boundary layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::EmptyToken | AuthError::InvalidSignature => 401,
            AuthError::MissingUserField | AuthError::MalformedUserJson(_) => 400,
        }
    }
}

#[derive(Error, Debug)]
pub enum WheelError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Spin log error: {0}")]
    SpinLog(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WheelError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, WheelError::Auth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::EmptyToken.status_code(), 401);
        assert_eq!(AuthError::InvalidSignature.status_code(), 401);
        assert_eq!(AuthError::MissingUserField.status_code(), 400);
        assert_eq!(
            AuthError::MalformedUserJson("missing field `id`".into()).status_code(),
            400
        );
    }

    #[test]
    fn test_auth_error_is_client_error() {
        let err: WheelError = AuthError::InvalidSignature.into();
        assert!(err.is_client_error());
        assert!(!WheelError::config("BOT_TOKEN is not set").is_client_error());
    }
}
