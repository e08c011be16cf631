use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod duration;
pub mod feed;
pub mod signals;

pub use duration::parse_duration;
pub use feed::{
    ChannelVideosPage, CommentsResponse, HomeFeed, PageSlice, RelatedResponse, SearchPage,
    ShortsFeed,
};
pub use signals::{BehaviorSignals, BlockedChannel, HiddenVideo};

/// Length of a well-formed upstream video ID (e.g. "dQw4w9WgXcQ")
pub const VIDEO_ID_LEN: usize = 11;

/// Longest duration (in seconds) still classified as short-form
pub const SHORT_MAX_SECONDS: u64 = 60;

/// Returns true when `id` has the provider's fixed-length video-ID shape
pub fn is_valid_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Where a candidate entered the feed from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentOrigin {
    /// Popular pool (trending)
    Trending,
    /// Personalized pool (seeded searches)
    Personalized,
    /// Suggested by the related-video graph
    AiSuggested,
}

/// A video candidate as seen by the ranking core
///
/// `id` is the deduplication key across every pool and every page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_name: String,
    /// Human display form, e.g. "12:34"
    #[serde(default)]
    pub duration: String,
    /// Machine form, e.g. "PT12M34S"
    #[serde(default)]
    pub iso_duration: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub views: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub origin: Option<ContentOrigin>,
}

impl Video {
    /// Duration in seconds, reconciled from both duration forms
    pub fn duration_seconds(&self) -> u64 {
        parse_duration(&self.iso_duration, &self.duration)
    }

    /// Short-form classification
    ///
    /// Derived on demand: anything up to a minute long, or anything whose
    /// title carries the `#shorts` tag.
    pub fn is_short(&self) -> bool {
        let seconds = self.duration_seconds();
        (seconds > 0 && seconds <= SHORT_MAX_SECONDS)
            || self.title.to_lowercase().contains("#shorts")
    }

    /// Channel identity for diversity spacing
    ///
    /// Some upstream listings carry only a channel name; those fall back to
    /// the name so unrelated channels do not share one empty key.
    pub fn channel_key(&self) -> &str {
        if self.channel_id.is_empty() {
            &self.channel_name
        } else {
            &self.channel_id
        }
    }

    pub fn with_origin(mut self, origin: ContentOrigin) -> Self {
        self.origin = Some(origin);
        self
    }
}

/// Channel reference (subscriptions, search results)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub subscriber_count: Option<String>,
}

/// Playlist reference from search results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaylistRef {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub video_count: u64,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CommentAuthor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub thumbnails: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub comment_id: String,
    pub text: String,
    #[serde(default)]
    pub published_time: String,
    pub author: CommentAuthor,
    #[serde(default)]
    pub like_count: String,
    #[serde(default)]
    pub reply_count: String,
    #[serde(default)]
    pub is_pinned: bool,
}

/// Anything with a stable deduplication key
pub trait Identified {
    fn key(&self) -> &str;
}

impl Identified for Video {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Identified for Comment {
    fn key(&self) -> &str {
        &self.comment_id
    }
}

/// Opaque continuation token handed out by the upstream provider
///
/// Deliberately not `Clone`: a cursor is consumed by exactly one next-page
/// fetch and cannot be replayed.
#[derive(Debug, PartialEq, Eq)]
pub struct Continuation(String);

impl Continuation {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Continuation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One upstream page plus the cursor for the next one, if any
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub continuation: Option<Continuation>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, continuation: Option<Continuation>) -> Self {
        Self {
            items,
            continuation,
        }
    }

    /// A terminal page with no continuation
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    pub fn has_more(&self) -> bool {
        self.continuation.is_some()
    }
}

/// First page of an upstream search
#[derive(Debug, Default)]
pub struct SearchResults {
    pub videos: Vec<Video>,
    pub shorts: Vec<Video>,
    pub channels: Vec<ChannelRef>,
    pub playlists: Vec<PlaylistRef>,
    pub continuation: Option<Continuation>,
}

impl SearchResults {
    pub fn has_more(&self) -> bool {
        self.continuation.is_some()
    }
}
