//! Command dispatcher
//!
//! Maps the user-triggered commands onto the session client and credential
//! store. Each command validates its preconditions before any remote work,
//! runs as a single async chain, and ends in exactly one notification.
//! Nothing propagates past a command: every outcome is a [`Notice`].
//!
//! Commands are independent. Two invocations of the same command may
//! overlap and race on the shared session; no queueing is applied.

use chrono::{Local, NaiveDateTime};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::SessionError;
use crate::lifecycle::PluginContext;
use crate::notes::timeline_filename;
use crate::notify::Notice;

/// Title of the editor context-menu item that posts the selection
pub const EDITOR_MENU_TITLE: &str = "Post selection to Bluesky";

/// Registered command identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    Login,
    PostSelectionText,
    InitAppPassword,
    GetTimelineUnstable,
}

impl CommandId {
    pub const ALL: [CommandId; 4] = [
        CommandId::Login,
        CommandId::PostSelectionText,
        CommandId::InitAppPassword,
        CommandId::GetTimelineUnstable,
    ];

    /// Stable id used for registration
    pub fn id(self) -> &'static str {
        match self {
            CommandId::Login => "login",
            CommandId::PostSelectionText => "post-selection-text",
            CommandId::InitAppPassword => "init-appPassword",
            CommandId::GetTimelineUnstable => "get-timeline-unstable",
        }
    }

    /// Display name shown in the command palette
    pub fn name(self) -> &'static str {
        match self {
            CommandId::Login => "Login",
            CommandId::PostSelectionText => "Post selection text",
            CommandId::InitAppPassword => "Initialize app password",
            CommandId::GetTimelineUnstable => "Add Page of Timeline(experimental)",
        }
    }
}

impl FromStr for CommandId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandId::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| format!("Unknown command: '{}'", s))
    }
}

/// A command invocation with its input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    /// Post the given selection; `None` when nothing could be read
    PostSelection(Option<String>),
    InitAppPassword,
    FetchTimelineToNote,
}

/// Phrase a session failure for the user.
///
/// `remote_failure` is the generic message for the operation that was
/// attempted; remote errors carry no further detail for the user.
pub fn notice_for(error: &SessionError, remote_failure: Notice) -> Notice {
    match error {
        SessionError::MissingCredential => Notice::MissingCredential,
        SessionError::AlreadyAuthenticated => Notice::AlreadyLoggedIn,
        SessionError::NotAuthenticated => Notice::NotAuthenticated,
        SessionError::EmptySelection => Notice::NoTextSelected,
        SessionError::TimelineUnavailable => Notice::TimelineFailed,
        SessionError::Remote(_) => remote_failure,
    }
}

#[derive(Clone)]
pub struct CommandDispatcher {
    context: Arc<PluginContext>,
}

impl CommandDispatcher {
    pub fn new(context: Arc<PluginContext>) -> Self {
        Self { context }
    }

    /// Run a command and return the notice it produced
    pub async fn run(&self, command: Command) -> Notice {
        match command {
            Command::Login => self.login().await,
            Command::PostSelection(text) => self.post_selection(text.as_deref()).await,
            Command::InitAppPassword => self.initialize_app_password(),
            Command::FetchTimelineToNote => self.fetch_timeline_to_note().await,
        }
    }

    /// Log in with the stored identifier and app password
    pub async fn login(&self) -> Notice {
        let credential = self.context.credentials.credential();
        let result = self
            .context
            .session
            .login(&credential.identifier, credential.password().unwrap_or_default())
            .await;

        self.report(match result {
            Ok(()) => Notice::LoginSucceeded,
            Err(e) => notice_for(&e, Notice::LoginFailed),
        })
    }

    /// Post the current selection
    pub async fn post_selection(&self, text: Option<&str>) -> Notice {
        let result = self
            .context
            .session
            .create_post(text.unwrap_or_default())
            .await;

        self.report(match result {
            Ok(_) => Notice::PostSucceeded,
            Err(e) => notice_for(&e, Notice::PostFailed),
        })
    }

    /// Clear the stored app password and forget the in-memory copy
    pub fn initialize_app_password(&self) -> Notice {
        let credentials = &self.context.credentials;

        self.report(match credentials.initialize_password(None) {
            Ok(stored) => {
                credentials.replace_password(stored);
                Notice::AppPasswordInitialized
            }
            Err(e) => {
                tracing::error!("Failed to initialize app password: {}", e);
                Notice::SettingsFailed
            }
        })
    }

    /// Write one page of the timeline into a new timestamped note
    pub async fn fetch_timeline_to_note(&self) -> Notice {
        self.fetch_timeline_to_note_at(Local::now().naive_local()).await
    }

    /// As [`CommandDispatcher::fetch_timeline_to_note`], naming the note after `now`
    pub async fn fetch_timeline_to_note_at(&self, now: NaiveDateTime) -> Notice {
        let texts = match self
            .context
            .session
            .fetch_timeline_page(self.context.timeline_limit)
            .await
        {
            Ok(texts) => texts,
            Err(e) => return self.report(notice_for(&e, Notice::TimelineFailed)),
        };

        let filename = timeline_filename(now);
        let notice = match self
            .context
            .notes
            .create_file(&filename, &texts.join("\n"))
            .await
        {
            Ok(path) => Notice::TimelineSaved(path),
            Err(e) => {
                tracing::error!("Failed to create {}: {}", filename, e);
                Notice::NoteCreationFailed
            }
        };
        self.report(notice)
    }

    fn report(&self, notice: Notice) -> Notice {
        self.context.notifier.notify(&notice.to_string());
        notice
    }
}
