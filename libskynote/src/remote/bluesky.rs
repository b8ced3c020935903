//! Bluesky session over XRPC

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

use crate::error::RemoteError;
use crate::remote::RemoteSession;
use crate::types::{PostRecord, TimelinePage, TimelineResponse, POST_RECORD_TYPE};

/// Map an XRPC failure to a `RemoteError`
///
/// Uses the HTTP status first and then the AT Protocol error name from the
/// response body (e.g. "AuthenticationRequired", "InvalidRequest").
///
/// # Arguments
///
/// * `status` - HTTP status code of the response
/// * `body` - Raw response body
/// * `context` - The operation context (e.g., "authentication", "posting")
fn map_bluesky_error(status: u16, body: &str, context: &str) -> RemoteError {
    let detail = match serde_json::from_str::<XrpcErrorBody>(body) {
        Ok(XrpcErrorBody { error, message }) => match message {
            Some(message) => format!("{} ({}): {}", error, status, message),
            None => format!("{} ({})", error, status),
        },
        Err(_) => format!("HTTP {}: {}", status, body.trim()),
    };

    if status == 401
        || status == 403
        || detail.contains("AuthenticationRequired")
        || detail.contains("InvalidToken")
        || detail.contains("ExpiredToken")
        || detail.contains("AccountTakedown")
    {
        return RemoteError::Authentication(format!(
            "Bluesky authentication failed during {}: {}",
            context, detail
        ));
    }

    if status == 429 || detail.contains("RateLimitExceeded") {
        return RemoteError::RateLimit(format!(
            "Bluesky rate limit exceeded during {}: {}",
            context, detail
        ));
    }

    if status == 400 || detail.contains("InvalidRequest") || detail.contains("InvalidRecord") {
        return RemoteError::Validation(format!(
            "Bluesky rejected the request during {}: {}",
            context, detail
        ));
    }

    RemoteError::Request(format!(
        "Bluesky operation failed during {}: {}",
        context, detail
    ))
}

/// Map a transport-level failure (no HTTP response) to a `RemoteError`
fn map_transport_error(error: reqwest::Error, context: &str) -> RemoteError {
    if error.is_connect() || error.is_timeout() || error.is_request() {
        return RemoteError::Network(format!(
            "Network error while connecting to Bluesky PDS during {}: {}",
            context, error
        ));
    }

    RemoteError::Request(format!(
        "Bluesky operation failed during {}: {}",
        context, error
    ))
}

#[derive(Debug, Deserialize)]
struct XrpcErrorBody {
    error: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct CreateSessionInput<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionOutput {
    access_jwt: String,
    did: String,
    handle: String,
}

#[derive(Serialize)]
struct CreateRecordInput<'a> {
    repo: &'a str,
    collection: &'a str,
    record: &'a PostRecord,
}

#[derive(Deserialize)]
struct CreateRecordOutput {
    uri: String,
}

struct SessionTokens {
    did: String,
    access_jwt: SecretString,
}

/// Session against a Bluesky PDS
///
/// The session is created once by [`RemoteSession::login`] and kept for the
/// lifetime of the value. No timeout is configured beyond reqwest's defaults.
pub struct BlueskySession {
    client: reqwest::Client,
    service: String,
    session: RwLock<Option<SessionTokens>>,
}

impl BlueskySession {
    /// Create a client for the given service endpoint (e.g. "https://bsky.social")
    pub fn new(service: &str) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("skynote/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            service: service.trim_end_matches('/').to_string(),
            session: RwLock::new(None),
        })
    }

    fn endpoint(&self, nsid: &str) -> String {
        format!("{}/xrpc/{}", self.service, nsid)
    }

    /// DID and bearer token of the current session
    fn auth(&self) -> Result<(String, String), RemoteError> {
        let session = self.session.read().unwrap_or_else(PoisonError::into_inner);
        session
            .as_ref()
            .map(|s| (s.did.clone(), s.access_jwt.expose_secret().to_string()))
            .ok_or_else(|| RemoteError::Authentication("Not authenticated".to_string()))
    }

    async fn error_from(response: reqwest::Response, context: &str) -> RemoteError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        map_bluesky_error(status, &body, context)
    }
}

#[async_trait]
impl RemoteSession for BlueskySession {
    fn has_session(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<(), RemoteError> {
        tracing::debug!("Creating Bluesky session for identifier: {}", identifier);

        let response = self
            .client
            .post(self.endpoint("com.atproto.server.createSession"))
            .json(&CreateSessionInput {
                identifier,
                password,
            })
            .send()
            .await
            .map_err(|e| map_transport_error(e, "authentication"))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "authentication").await);
        }

        let output: CreateSessionOutput = response
            .json()
            .await
            .map_err(|e| map_transport_error(e, "authentication"))?;

        tracing::debug!("Bluesky session created for {} ({})", output.handle, output.did);
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(SessionTokens {
            did: output.did,
            access_jwt: SecretString::from(output.access_jwt),
        });

        Ok(())
    }

    async fn post(&self, record: &PostRecord) -> Result<String, RemoteError> {
        let (did, token) = self.auth()?;

        tracing::debug!("Posting to Bluesky: {} characters", record.text.chars().count());

        let response = self
            .client
            .post(self.endpoint("com.atproto.repo.createRecord"))
            .bearer_auth(token)
            .json(&CreateRecordInput {
                repo: &did,
                collection: POST_RECORD_TYPE,
                record,
            })
            .send()
            .await
            .map_err(|e| map_transport_error(e, "posting"))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "posting").await);
        }

        let output: CreateRecordOutput = response
            .json()
            .await
            .map_err(|e| map_transport_error(e, "posting"))?;

        tracing::debug!("Posted to Bluesky: {}", output.uri);
        Ok(output.uri)
    }

    async fn get_timeline(&self, limit: u16) -> Result<TimelineResponse, RemoteError> {
        let (_, token) = self.auth()?;

        let response = self
            .client
            .get(self.endpoint("app.bsky.feed.getTimeline"))
            .bearer_auth(token)
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(|e| map_transport_error(e, "timeline"))?;

        if !response.status().is_success() {
            let error = Self::error_from(response, "timeline").await;
            tracing::warn!("Timeline request unsuccessful: {}", error);
            return Ok(TimelineResponse::unsuccessful());
        }

        let page: TimelinePage = response
            .json()
            .await
            .map_err(|e| map_transport_error(e, "timeline"))?;

        tracing::debug!("Fetched {} timeline entries", page.feed.len());
        Ok(TimelineResponse::ok(page.feed))
    }
}
