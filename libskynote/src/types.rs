//! Core data types for Skynote

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Record type tag for a feed post
pub const POST_RECORD_TYPE: &str = "app.bsky.feed.post";

/// Structured rich-text annotation on a post.
///
/// Skynote never produces any; the type exists so the record
/// serializes with an explicit empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub index: ByteSlice,
    pub features: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteSlice {
    pub byte_start: usize,
    pub byte_end: usize,
}

/// A post built from the current selection; constructed per invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub text: String,
    pub facets: Vec<Facet>,
    pub created_at: String,
}

impl PostRecord {
    /// Build a plain-text post stamped with the current time
    pub fn new(text: impl Into<String>) -> Self {
        Self::at(text, Utc::now())
    }

    /// Build a plain-text post stamped with `created_at`
    pub fn at(text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            record_type: POST_RECORD_TYPE.to_string(),
            text: text.into(),
            facets: Vec::new(),
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Result of a timeline fetch as reported by the remote collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineResponse {
    pub success: bool,
    pub feed: Vec<FeedViewPost>,
}

impl TimelineResponse {
    pub fn ok(feed: Vec<FeedViewPost>) -> Self {
        Self {
            success: true,
            feed,
        }
    }

    pub fn unsuccessful() -> Self {
        Self::default()
    }
}

/// `app.bsky.feed.getTimeline` output body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePage {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub feed: Vec<FeedViewPost>,
}

/// One timeline entry; only the record text is of interest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedViewPost {
    #[serde(default)]
    pub post: PostView,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    #[serde(default)]
    pub record: Option<FeedRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRecord {
    #[serde(default)]
    pub text: Option<String>,
}

impl FeedViewPost {
    /// Entry whose record carries `text`
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            post: PostView {
                record: Some(FeedRecord {
                    text: Some(text.into()),
                }),
            },
        }
    }

    /// Textual content of the entry, if the record has any
    pub fn text(&self) -> Option<&str> {
        self.post.record.as_ref()?.text.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_post_record_wire_format() {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let record = PostRecord::at("hello", created_at);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "$type": "app.bsky.feed.post",
                "text": "hello",
                "facets": [],
                "createdAt": "2024-01-02T03:04:05.000Z",
            })
        );
    }

    #[test]
    fn test_post_record_has_no_facets() {
        assert!(PostRecord::new("anything").facets.is_empty());
    }

    #[test]
    fn test_feed_entry_text() {
        let page: TimelinePage = serde_json::from_value(serde_json::json!({
            "cursor": "abc",
            "feed": [
                {"post": {"uri": "at://x", "record": {"$type": "app.bsky.feed.post", "text": "t1"}}},
                {"post": {"record": {"$type": "app.bsky.feed.repost"}}},
                {"post": {}},
            ]
        }))
        .unwrap();

        let texts: Vec<Option<&str>> = page.feed.iter().map(FeedViewPost::text).collect();
        assert_eq!(texts, vec![Some("t1"), None, None]);
        assert_eq!(page.cursor.as_deref(), Some("abc"));
    }

    #[test]
    fn test_unsuccessful_response_is_empty() {
        let response = TimelineResponse::unsuccessful();
        assert!(!response.success);
        assert!(response.feed.is_empty());
    }
}
