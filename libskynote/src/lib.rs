//! Skynote - publish note selections to Bluesky
//!
//! This library holds the session and credential lifecycle behind the
//! skynote commands: logging in with an app password, posting selected
//! text, and importing a page of the home timeline into a note. The host
//! (editor integration or CLI) supplies storage, the vault and the
//! notification display.

pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod notes;
pub mod notify;
pub mod remote;
pub mod session;
pub mod settings;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use credentials::{Credential, CredentialStore};
pub use dispatcher::{Command, CommandDispatcher, CommandId};
pub use error::{Result, SkynoteError};
pub use lifecycle::{Core, CoreParts, PluginContext};
pub use notify::Notice;
pub use session::SessionClient;
