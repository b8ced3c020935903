//! Remote AT Protocol session abstraction
//!
//! A [`RemoteSession`] owns the server-issued session for one account and
//! exposes the three calls Skynote needs: log in, create a post, and read a
//! page of the home timeline. The [`crate::session::SessionClient`] layers
//! the precondition checks on top.

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::types::{PostRecord, TimelineResponse};

pub mod bluesky;

// Mock session is available for all builds (not just tests) to support integration tests
pub mod mock;

pub use bluesky::BlueskySession;
pub use mock::{MockConfig, MockSession};

/// Remote session bound to a single service endpoint
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Whether a session currently exists
    fn has_session(&self) -> bool;

    /// Authenticate and keep the resulting session
    ///
    /// # Errors
    ///
    /// Returns the classified remote failure; the session stays absent.
    async fn login(&self, identifier: &str, password: &str) -> Result<(), RemoteError>;

    /// Publish a post record, returning its AT URI
    async fn post(&self, record: &PostRecord) -> Result<String, RemoteError>;

    /// Fetch one page of the home timeline
    ///
    /// A request the server answers with a non-success status is reported
    /// as `success: false`, not as an error.
    async fn get_timeline(&self, limit: u16) -> Result<TimelineResponse, RemoteError>;
}
