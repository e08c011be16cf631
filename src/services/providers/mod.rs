/// Upstream content provider abstraction
///
/// The ranking and aggregation code only ever talks to this trait. Concrete
/// providers normalise whatever the upstream returns into `Video`, `Comment`
/// and `Continuation` values at this boundary.
use crate::{
    error::AppResult,
    models::{Comment, Continuation, Page, SearchResults, Video},
};

pub mod http;

pub use http::HttpContentProvider;

/// Trait for upstream content providers
///
/// Every listing operation comes in pairs: an initial fetch returning the
/// first page plus an optional cursor, and a resume operation consuming that
/// cursor by value. A cursor is never reused.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContentProvider: Send + Sync {
    /// First page of search results for a query
    async fn search(&self, query: &str) -> AppResult<SearchResults>;

    async fn continue_search(&self, continuation: Continuation) -> AppResult<SearchResults>;

    /// Trending listing; `None` is the default category
    async fn trending(&self, category: Option<String>) -> AppResult<Vec<Video>>;

    /// Watch-next candidates for a video
    async fn video_related(&self, video_id: &str) -> AppResult<Page<Video>>;

    async fn continue_related(&self, continuation: Continuation) -> AppResult<Page<Video>>;

    async fn comments(&self, video_id: &str) -> AppResult<Page<Comment>>;

    async fn continue_comments(&self, continuation: Continuation) -> AppResult<Page<Comment>>;

    /// First page of a channel's uploads
    async fn channel_videos(&self, channel_id: &str) -> AppResult<Page<Video>>;

    async fn continue_channel_videos(&self, continuation: Continuation)
        -> AppResult<Page<Video>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
