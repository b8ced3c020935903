//! Error types for Skynote

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SkynoteError>;

#[derive(Error, Debug)]
pub enum SkynoteError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Note error: {0}")]
    Note(#[from] NoteError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SkynoteError {
    /// Returns the exit code the host adapter uses when it cannot start.
    ///
    /// Command outcomes never reach this: the dispatcher reports them as
    /// notifications instead.
    pub fn exit_code(&self) -> i32 {
        match self {
            SkynoteError::InvalidInput(_) => 3,
            SkynoteError::Session(e) if e.is_authentication() => 2,
            SkynoteError::Session(_) => 1,
            SkynoteError::Config(_) => 1,
            SkynoteError::Storage(_) => 1,
            SkynoteError::Note(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to write config file: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Local storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Local storage file is corrupt: {0}")]
    Format(#[from] serde_json::Error),

    #[error("OS keyring unavailable: {0}")]
    KeyringUnavailable(String),

    #[error("Keyring operation failed: {0}")]
    Keyring(String),
}

/// Outcome kinds of a Session Client operation that did not succeed.
///
/// Precondition failures carry no payload; the caller decides how to
/// phrase them for the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("identifier or app password is missing")]
    MissingCredential,

    #[error("a session already exists")]
    AlreadyAuthenticated,

    #[error("no session exists")]
    NotAuthenticated,

    #[error("no text selected")]
    EmptySelection,

    #[error("timeline request was not successful")]
    TimelineUnavailable,

    #[error("remote call failed: {0}")]
    Remote(#[from] RemoteError),
}

impl SessionError {
    /// Whether this failure is about credentials or session state
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            SessionError::MissingCredential
                | SessionError::NotAuthenticated
                | SessionError::Remote(RemoteError::Authentication(_))
        )
    }
}

/// Classified failure of a remote AT Protocol call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Request rejected: {0}")]
    Validation(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed: {0}")]
    Request(String),
}

#[derive(Error, Debug)]
pub enum NoteError {
    #[error("Note already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Failed to write note: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = SkynoteError::InvalidInput("Empty identifier".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_authentication_kinds() {
        assert_eq!(
            SkynoteError::Session(SessionError::MissingCredential).exit_code(),
            2
        );
        assert_eq!(
            SkynoteError::Session(SessionError::NotAuthenticated).exit_code(),
            2
        );
        assert_eq!(
            SkynoteError::Session(SessionError::Remote(RemoteError::Authentication(
                "bad password".to_string()
            )))
            .exit_code(),
            2
        );
    }

    #[test]
    fn test_exit_code_other_errors() {
        assert_eq!(
            SkynoteError::Session(SessionError::EmptySelection).exit_code(),
            1
        );
        assert_eq!(
            SkynoteError::Config(ConfigError::MissingField("identifier".to_string())).exit_code(),
            1
        );
        assert_eq!(
            SkynoteError::Storage(StorageError::Keyring("locked".to_string())).exit_code(),
            1
        );
        assert_eq!(
            SkynoteError::Note(NoteError::AlreadyExists(PathBuf::from("a.md"))).exit_code(),
            1
        );
    }

    #[test]
    fn test_error_message_formatting() {
        let error = SkynoteError::Session(SessionError::Remote(RemoteError::Network(
            "connection refused".to_string(),
        )));
        assert_eq!(
            error.to_string(),
            "Session error: remote call failed: Network error: connection refused"
        );

        let error = SkynoteError::Note(NoteError::AlreadyExists(PathBuf::from(
            "timeline_2024-01-02-03-04-05.md",
        )));
        assert_eq!(
            error.to_string(),
            "Note error: Note already exists: timeline_2024-01-02-03-04-05.md"
        );
    }

    #[test]
    fn test_remote_error_converts_into_session_error() {
        let remote = RemoteError::RateLimit("slow down".to_string());
        let session: SessionError = remote.clone().into();
        assert_eq!(session, SessionError::Remote(remote));
    }

    #[test]
    fn test_precondition_errors_are_not_remote() {
        for error in [
            SessionError::AlreadyAuthenticated,
            SessionError::EmptySelection,
            SessionError::TimelineUnavailable,
        ] {
            assert!(!error.is_authentication(), "{error:?}");
        }
    }
}
