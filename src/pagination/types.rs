//! Pagination types
//!
//! The typed shape of one comments page, the cursor carried between pages,
//! and the rule deciding whether another page exists.

use crate::error::{Error, Result};
use crate::http::RequestConfig;
use crate::types::{MediaId, OptionStringExt, Record};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Query parameter carrying the forward token
pub const FORWARD_PARAM: &str = "min_id";

/// Query parameter carrying the backward token
pub const BACKWARD_PARAM: &str = "max_id";

/// Opaque continuation state between two pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Sent as the min boundary on the next request
    pub forward_token: Option<String>,
    /// Sent as the max boundary on the next request
    pub backward_token: Option<String>,
    /// Whether the page that produced this cursor reported more
    pub has_more: bool,
}

impl Cursor {
    /// The empty cursor used for the first page
    pub fn initial() -> Self {
        Self::default()
    }

    /// True when no token has been received yet
    pub fn is_initial(&self) -> bool {
        self.forward_token.is_none() && self.backward_token.is_none()
    }

    /// Add the present tokens to a request
    pub fn apply(&self, config: RequestConfig) -> RequestConfig {
        config
            .query_opt(FORWARD_PARAM, self.forward_token.as_deref())
            .query_opt(BACKWARD_PARAM, self.backward_token.as_deref())
    }
}

/// Result of inspecting a drained page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Fetch again with this cursor
    Continue(Cursor),
    /// The resource is exhausted
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// One page of the comments endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct CommentsPage {
    /// Records on this page, in arrival order
    pub comments: Vec<RawComment>,

    /// Declared total number of comments on the post
    #[serde(default)]
    pub comment_count: Option<u64>,

    #[serde(default)]
    pub has_more_comments: Option<bool>,

    #[serde(default)]
    pub has_more_headload_comments: Option<bool>,

    #[serde(default)]
    pub next_min_id: Option<String>,

    #[serde(default)]
    pub next_max_id: Option<String>,

    /// Post caption; only read for the owner handle
    #[serde(default)]
    pub caption: Option<Value>,
}

impl CommentsPage {
    /// Decode a page body
    ///
    /// A missing `comments` list or a non-string cursor token is a
    /// malformed response, never a silent default.
    pub fn from_value(body: Value) -> Result<Self> {
        serde_json::from_value(body)
            .map_err(|e| Error::malformed(format!("unexpected comments page shape: {e}")))
    }

    /// Owner handle from the caption, if the page carries it
    pub fn owner(&self) -> Option<&str> {
        self.caption
            .as_ref()?
            .get("user")?
            .get("username")?
            .as_str()
            .filter(|s| !s.is_empty())
    }

    /// Whether the remote flags more comments
    pub fn more_flagged(&self) -> bool {
        self.has_more_comments.unwrap_or(false) || self.has_more_headload_comments.unwrap_or(false)
    }

    /// Decide what follows this page given the cursor that fetched it
    ///
    /// More pages exist when a flag says so or when a token differs from the
    /// one just sent. Continuing also needs a token that moves the cursor:
    /// re-sending the same boundaries would replay records already consumed.
    pub fn next_page(&self, current: &Cursor) -> NextPage {
        let forward_token = self.next_min_id.clone().none_if_empty();
        let backward_token = self.next_max_id.clone().none_if_empty();

        let new_forward = forward_token.is_some() && forward_token != current.forward_token;
        let new_backward = backward_token.is_some() && backward_token != current.backward_token;
        let has_more = self.more_flagged() || new_forward || new_backward;

        if !has_more {
            return NextPage::Done;
        }

        if !(new_forward || new_backward) {
            warn!("Remote reports more comments but returned no new cursor token; stopping");
            return NextPage::Done;
        }

        NextPage::Continue(Cursor {
            forward_token,
            backward_token,
            has_more,
        })
    }
}

/// Comment as the remote sends it
#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    pub pk: StringOrNumber,

    #[serde(default)]
    pub user: Option<RawUser>,

    #[serde(default)]
    pub text: Option<String>,

    pub created_at_utc: i64,

    #[serde(default)]
    pub comment_like_count: Option<u64>,
}

/// Comment author as the remote sends it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Identifiers arrive as either JSON strings or numbers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StringOrNumber {
    String(String),
    Number(u64),
}

impl std::fmt::Display for StringOrNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl RawComment {
    /// Convert into the record shape written to the sink
    pub fn into_record(self, media_id: &MediaId) -> Record {
        let user = self.user.unwrap_or_default();
        Record {
            id: self.pk.to_string(),
            parent_resource_id: media_id.clone(),
            author_handle: user.username.unwrap_or_default(),
            author_display_name: user.full_name.unwrap_or_default(),
            text: self.text.unwrap_or_default(),
            created_at_utc: self.created_at_utc,
            like_count: self.comment_like_count.unwrap_or(0),
        }
    }
}
