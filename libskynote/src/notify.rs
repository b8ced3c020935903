//! User-facing status notifications
//!
//! Every command ends in exactly one [`Notice`]. A [`Notifier`] displays it;
//! delivery is fire-and-forget and can never fail the command.
//!
//! # Example
//!
//! ```
//! use libskynote::notify::{format_notice, Notice, Notifier, RecordingNotifier};
//!
//! let notifier = RecordingNotifier::new();
//! notifier.notify(&Notice::LoginSucceeded.to_string());
//!
//! assert_eq!(notifier.messages(), vec!["login succeed"]);
//! assert_eq!(format_notice("login succeed"), "Skynote: login succeed");
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Tag every displayed message starts with
pub const NOTICE_PREFIX: &str = "Skynote";

/// Outcome messages shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    MissingCredential,
    AlreadyLoggedIn,
    LoginSucceeded,
    LoginFailed,
    NotAuthenticated,
    NoTextSelected,
    PostSucceeded,
    PostFailed,
    TimelineFailed,
    TimelineSaved(PathBuf),
    NoteCreationFailed,
    AppPasswordInitialized,
    IdentifierSaved,
    AppPasswordSaved,
    SettingsFailed,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::MissingCredential => write!(f, "identifier or appPassword must be exist"),
            Notice::AlreadyLoggedIn => write!(f, "you are already logged in"),
            Notice::LoginSucceeded => write!(f, "login succeed"),
            Notice::LoginFailed => write!(f, "login failed"),
            Notice::NotAuthenticated => write!(f, "(Error) not authenticated"),
            Notice::NoTextSelected => write!(f, "texts are not selected"),
            Notice::PostSucceeded => write!(f, "Post message succeeded"),
            Notice::PostFailed => write!(f, "Failed to post"),
            Notice::TimelineFailed => write!(f, "Failed to get Timeline"),
            Notice::TimelineSaved(path) => write!(f, "Timeline saved to {}", path.display()),
            Notice::NoteCreationFailed => write!(f, "Failed to create timeline note"),
            Notice::AppPasswordInitialized => write!(f, "app password initialized"),
            Notice::IdentifierSaved => write!(f, "identifier saved"),
            Notice::AppPasswordSaved => write!(f, "app password saved"),
            Notice::SettingsFailed => write!(f, "Failed to save settings"),
        }
    }
}

/// Prefix a message with the fixed tag
pub fn format_notice(message: &str) -> String {
    format!("{}: {}", NOTICE_PREFIX, message)
}

/// Sink for short-lived status messages
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Writes each message to stderr with the fixed tag
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{}", format_notice(message));
    }
}

/// Keeps every message in order, for assertions
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
