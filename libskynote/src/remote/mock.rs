//! Mock remote session for testing
//!
//! Simulates login, posting and timeline reads with configurable outcomes
//! and latency, and counts every call that reaches the "network". Used by
//! the integration tests to verify which operations issue remote calls.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::RemoteError;
use crate::remote::RemoteSession;
use crate::types::{FeedViewPost, PostRecord, TimelineResponse};

/// Configuration for mock session behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Error returned by login; `None` means login succeeds
    pub login_error: Option<RemoteError>,

    /// Error returned by post; `None` means posting succeeds
    pub post_error: Option<RemoteError>,

    /// Feed returned by get_timeline; `None` reports an unsuccessful response
    pub timeline: Option<Vec<FeedViewPost>>,

    /// Error returned by get_timeline, checked before `timeline`
    pub timeline_error: Option<RemoteError>,

    /// Delay before completing operations (simulates network latency)
    pub delay: Duration,

    /// Start with a session already established
    pub authenticated: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            login_error: None,
            post_error: None,
            timeline: Some(Vec::new()),
            timeline_error: None,
            delay: Duration::from_millis(0),
            authenticated: false,
        }
    }
}

#[derive(Default)]
struct Calls {
    login: usize,
    post: usize,
    posted: Vec<PostRecord>,
    timeline_limits: Vec<u16>,
}

/// Mock session; clones share state so tests can keep a handle for assertions
#[derive(Clone)]
pub struct MockSession {
    config: MockConfig,
    session: Arc<AtomicBool>,
    calls: Arc<Mutex<Calls>>,
}

impl MockSession {
    /// Create a new mock session with the given configuration
    pub fn new(config: MockConfig) -> Self {
        Self {
            session: Arc::new(AtomicBool::new(config.authenticated)),
            config,
            calls: Arc::new(Mutex::new(Calls::default())),
        }
    }

    /// A session where every call succeeds
    pub fn success() -> Self {
        Self::new(MockConfig::default())
    }

    /// A session that already holds an authenticated session
    pub fn authenticated() -> Self {
        Self::new(MockConfig {
            authenticated: true,
            ..Default::default()
        })
    }

    /// A session whose login fails
    pub fn login_failure(error: RemoteError) -> Self {
        Self::new(MockConfig {
            login_error: Some(error),
            ..Default::default()
        })
    }

    /// An authenticated session whose posts fail
    pub fn post_failure(error: RemoteError) -> Self {
        Self::new(MockConfig {
            post_error: Some(error),
            authenticated: true,
            ..Default::default()
        })
    }

    /// An authenticated session serving the given timeline texts
    pub fn with_timeline(texts: &[&str]) -> Self {
        Self::new(MockConfig {
            timeline: Some(texts.iter().map(|t| FeedViewPost::with_text(*t)).collect()),
            authenticated: true,
            ..Default::default()
        })
    }

    /// A session that waits `delay` before each operation completes
    pub fn with_delay(delay: Duration) -> Self {
        Self::new(MockConfig {
            delay,
            ..Default::default()
        })
    }

    pub fn login_call_count(&self) -> usize {
        self.calls().login
    }

    pub fn post_call_count(&self) -> usize {
        self.calls().post
    }

    /// Every record that reached `post`
    pub fn posted(&self) -> Vec<PostRecord> {
        self.calls().posted.clone()
    }

    /// The `limit` argument of each timeline request
    pub fn timeline_limits(&self) -> Vec<u16> {
        self.calls().timeline_limits.clone()
    }

    fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }
    }
}

#[async_trait]
impl RemoteSession for MockSession {
    fn has_session(&self) -> bool {
        self.session.load(Ordering::SeqCst)
    }

    async fn login(&self, _identifier: &str, _password: &str) -> Result<(), RemoteError> {
        self.calls().login += 1;
        self.simulate_latency().await;

        match &self.config.login_error {
            Some(error) => Err(error.clone()),
            None => {
                self.session.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    async fn post(&self, record: &PostRecord) -> Result<String, RemoteError> {
        let count = {
            let mut calls = self.calls();
            calls.post += 1;
            calls.posted.push(record.clone());
            calls.post
        };
        self.simulate_latency().await;

        match &self.config.post_error {
            Some(error) => Err(error.clone()),
            None => Ok(format!("at://did:plc:mock/app.bsky.feed.post/{}", count)),
        }
    }

    async fn get_timeline(&self, limit: u16) -> Result<TimelineResponse, RemoteError> {
        {
            self.calls().timeline_limits.push(limit);
        }
        self.simulate_latency().await;

        if let Some(error) = &self.config.timeline_error {
            return Err(error.clone());
        }

        Ok(match &self.config.timeline {
            Some(feed) => TimelineResponse::ok(feed.clone()),
            None => TimelineResponse::unsuccessful(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_login_establishes_session() {
        let mock = MockSession::success();
        assert!(!mock.has_session());

        mock.login("alice.bsky.social", "pw").await.unwrap();
        assert!(mock.has_session());
        assert_eq!(mock.login_call_count(), 1);
    }

    #[tokio::test]
    async fn test_login_failure_keeps_session_absent() {
        let mock = MockSession::login_failure(RemoteError::Authentication("nope".to_string()));

        assert!(mock.login("alice.bsky.social", "pw").await.is_err());
        assert!(!mock.has_session());
    }

    #[tokio::test]
    async fn test_clones_share_counters() {
        let mock = MockSession::authenticated();
        let handle = mock.clone();

        mock.post(&PostRecord::new("hi")).await.unwrap();
        assert_eq!(handle.post_call_count(), 1);
        assert_eq!(handle.posted()[0].text, "hi");
    }

    #[tokio::test]
    async fn test_timeline_unsuccessful() {
        let mock = MockSession::new(MockConfig {
            timeline: None,
            authenticated: true,
            ..Default::default()
        });

        let response = mock.get_timeline(10).await.unwrap();
        assert!(!response.success);
        assert_eq!(mock.timeline_limits(), vec![10]);
    }
}
