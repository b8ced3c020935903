//! Session client
//!
//! Guards every remote call with its preconditions and reports the outcome
//! as an explicit [`SessionError`] kind. Remote failures are logged here
//! with the raw error; phrasing them for the user is left to the dispatcher.
//!
//! The session moves `Unauthenticated -> Authenticated` on the first
//! successful login and never moves back.

use std::sync::Arc;

use crate::error::SessionError;
use crate::remote::RemoteSession;
use crate::types::PostRecord;

pub type SessionResult<T> = std::result::Result<T, SessionError>;

pub struct SessionClient {
    remote: Arc<dyn RemoteSession>,
}

impl SessionClient {
    pub fn new(remote: Arc<dyn RemoteSession>) -> Self {
        Self { remote }
    }

    /// Whether a session currently exists
    pub fn is_authenticated(&self) -> bool {
        self.remote.has_session()
    }

    /// Create the session.
    ///
    /// Login is create-once: an existing session is reported as
    /// `AlreadyAuthenticated` rather than refreshed.
    pub async fn login(&self, identifier: &str, password: &str) -> SessionResult<()> {
        if identifier.is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredential);
        }
        if self.remote.has_session() {
            return Err(SessionError::AlreadyAuthenticated);
        }

        match self.remote.login(identifier, password).await {
            Ok(()) => {
                tracing::info!("Logged in as {}", identifier);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Login failed for {}: {}", identifier, e);
                Err(e.into())
            }
        }
    }

    /// Publish `text` as a post, returning the record's AT URI
    pub async fn create_post(&self, text: &str) -> SessionResult<String> {
        if !self.remote.has_session() {
            return Err(SessionError::NotAuthenticated);
        }
        // A string has at least one grapheme exactly when it is non-empty
        if text.is_empty() {
            return Err(SessionError::EmptySelection);
        }

        let record = PostRecord::new(text);
        match self.remote.post(&record).await {
            Ok(uri) => {
                tracing::info!("Posted {} characters as {}", text.chars().count(), uri);
                Ok(uri)
            }
            Err(e) => {
                tracing::error!("Post failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Fetch one timeline page as the ordered texts of its entries.
    ///
    /// Entries without text are rendered as empty strings so positions are
    /// preserved when the page is joined.
    pub async fn fetch_timeline_page(&self, limit: u16) -> SessionResult<Vec<String>> {
        let response = match self.remote.get_timeline(limit).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Timeline request failed: {}", e);
                return Err(e.into());
            }
        };

        if !response.success {
            return Err(SessionError::TimelineUnavailable);
        }

        Ok(response
            .feed
            .iter()
            .map(|entry| entry.text().unwrap_or_default().to_string())
            .collect())
    }
}
