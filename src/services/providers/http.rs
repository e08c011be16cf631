/// HTTP content bridge provider
///
/// Talks to a JSON bridge in front of the video platform. The bridge exposes
/// one endpoint per listing and accepts a `continuation` query parameter in
/// place of the listing's own arguments for resume calls:
///
/// - `/api/search?q=` → `{ videos, shorts, channels, playlists, continuation? }`
/// - `/api/trending?category=` → `{ videos }`
/// - `/api/video?id=` → `{ watch_next_feed | related | videos, continuation? }`
/// - `/api/comments?id=` → `{ comments, continuation? }`
/// - `/api/channel?id=` → `{ videos, continuation? }`
///
/// Response shapes drift between bridge versions, so every listing is read
/// through `serde_json::Value` and normalised here. Items missing an ID are
/// dropped one by one rather than failing the whole page.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde_json::Value;

use crate::{
    cached,
    config::Config,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        ChannelRef, Comment, CommentAuthor, Continuation, Page, PlaylistRef, SearchResults, Video,
    },
    services::providers::ContentProvider,
};

const TRENDING_CACHE_TTL: u64 = 900; // 15 minutes

#[derive(Clone)]
pub struct HttpContentProvider {
    http_client: HttpClient,
    api_url: String,
    language: String,
    region: String,
    cache: Cache,
}

impl HttpContentProvider {
    pub fn new(
        http_client: HttpClient,
        api_url: String,
        language: String,
        region: String,
        cache: Cache,
    ) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            language,
            region,
            cache,
        }
    }

    /// Builds a provider with a timeout-bounded client from configuration
    pub fn from_config(config: &Config, cache: Cache) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()?;

        Ok(Self::new(
            http_client,
            config.upstream_api_url.clone(),
            config.upstream_language.clone(),
            config.upstream_region.clone(),
            cache,
        ))
    }

    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> AppResult<Value> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .query(&[("hl", self.language.as_str()), ("gl", self.region.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Upstream {} returned status {}: {}",
                path, status, body
            )));
        }

        let value: Value = response.json().await?;
        Ok(value)
    }

    async fn fetch_video_page(&self, params: &[(&str, &str)]) -> AppResult<Page<Video>> {
        let body = self.get_json("/api/video", params).await?;
        Ok(Page::new(parse_related(&body), continuation_of(&body)))
    }

    async fn fetch_comment_page(&self, params: &[(&str, &str)]) -> AppResult<Page<Comment>> {
        let body = self.get_json("/api/comments", params).await?;
        Ok(Page::new(parse_comments(&body), continuation_of(&body)))
    }

    async fn fetch_channel_page(&self, params: &[(&str, &str)]) -> AppResult<Page<Video>> {
        let body = self.get_json("/api/channel", params).await?;
        Ok(Page::new(
            parse_videos(&body, "videos"),
            continuation_of(&body),
        ))
    }

    async fn fetch_search(&self, params: &[(&str, &str)]) -> AppResult<SearchResults> {
        let body = self.get_json("/api/search", params).await?;
        Ok(parse_search(&body))
    }
}

#[async_trait::async_trait]
impl ContentProvider for HttpContentProvider {
    async fn search(&self, query: &str) -> AppResult<SearchResults> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let results = self.fetch_search(&[("q", query)]).await?;

        tracing::info!(
            query = %query,
            videos = results.videos.len(),
            shorts = results.shorts.len(),
            has_more = results.has_more(),
            provider = self.name(),
            "Search completed"
        );

        Ok(results)
    }

    async fn continue_search(&self, continuation: Continuation) -> AppResult<SearchResults> {
        self.fetch_search(&[("continuation", continuation.as_str())])
            .await
    }

    async fn trending(&self, category: Option<String>) -> AppResult<Vec<Video>> {
        let category = category.unwrap_or_default();

        cached!(
            self.cache,
            CacheKey::Trending(category.clone()),
            TRENDING_CACHE_TTL,
            async {
                let params: Vec<(&str, &str)> = if category.is_empty() {
                    Vec::new()
                } else {
                    vec![("category", category.as_str())]
                };
                let body = self.get_json("/api/trending", &params).await?;
                let videos = parse_videos(&body, "videos");

                tracing::info!(
                    category = %category,
                    videos = videos.len(),
                    provider = self.name(),
                    "Trending fetched"
                );

                Ok::<_, AppError>(videos)
            }
        )
    }

    async fn video_related(&self, video_id: &str) -> AppResult<Page<Video>> {
        self.fetch_video_page(&[("id", video_id)]).await
    }

    async fn continue_related(&self, continuation: Continuation) -> AppResult<Page<Video>> {
        self.fetch_video_page(&[("continuation", continuation.as_str())])
            .await
    }

    async fn comments(&self, video_id: &str) -> AppResult<Page<Comment>> {
        self.fetch_comment_page(&[("id", video_id)]).await
    }

    async fn continue_comments(&self, continuation: Continuation) -> AppResult<Page<Comment>> {
        self.fetch_comment_page(&[("continuation", continuation.as_str())])
            .await
    }

    async fn channel_videos(&self, channel_id: &str) -> AppResult<Page<Video>> {
        self.fetch_channel_page(&[("id", channel_id)]).await
    }

    async fn continue_channel_videos(
        &self,
        continuation: Continuation,
    ) -> AppResult<Page<Video>> {
        self.fetch_channel_page(&[("continuation", continuation.as_str())])
            .await
    }

    fn name(&self) -> &'static str {
        "http-bridge"
    }
}

// Normalisation

/// Reads a display string that may be plain or wrapped as `{ "text": ... }`
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("text").and_then(text_of),
        _ => None,
    }
}

fn non_empty(value: &Value) -> Option<String> {
    value.as_str().filter(|s| !s.is_empty()).map(str::to_string)
}

fn url_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items.first().and_then(url_of),
        Value::Object(map) => map.get("url").and_then(non_empty),
        _ => None,
    }
}

fn thumbnail_of(item: &Value) -> Option<String> {
    ["thumbnails", "thumbnail", "thumbnail_url"]
        .iter()
        .find_map(|key| item.get(*key).and_then(url_of))
}

/// Items of a listing, wherever this bridge version put them
///
/// Accepts a flat array under `key`, a `contents[0].contents` section list,
/// or a flat `contents` array.
fn items_of<'a>(body: &'a Value, key: &str) -> &'a [Value] {
    if let Some(items) = body.get(key).and_then(Value::as_array) {
        return items;
    }
    if let Some(items) = body
        .pointer("/contents/0/contents")
        .and_then(Value::as_array)
    {
        return items;
    }
    body.get("contents")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn continuation_of(body: &Value) -> Option<Continuation> {
    body.get("continuation")
        .and_then(non_empty)
        .map(Continuation::new)
}

fn normalize_list<T>(items: &[Value], kind: &str, normalize: fn(&Value) -> Option<T>) -> Vec<T> {
    let out: Vec<T> = items.iter().filter_map(normalize).collect();
    let dropped = items.len() - out.len();
    if dropped > 0 {
        tracing::debug!(kind, dropped, "Dropped malformed upstream items");
    }
    out
}

fn normalize_video(item: &Value) -> Option<Video> {
    let id = item
        .get("id")
        .and_then(non_empty)
        .or_else(|| item.get("video_id").and_then(non_empty))?;

    let (channel_id, channel_name) = match item.get("author") {
        Some(Value::String(name)) => (String::new(), name.clone()),
        Some(author @ Value::Object(_)) => (
            author.get("id").and_then(non_empty).unwrap_or_default(),
            author.get("name").and_then(text_of).unwrap_or_default(),
        ),
        _ => (String::new(), String::new()),
    };
    let channel_id = item
        .get("channel_id")
        .and_then(non_empty)
        .unwrap_or(channel_id);
    let channel_name = item
        .get("channel_name")
        .and_then(text_of)
        .unwrap_or(channel_name);

    Some(Video {
        id,
        title: item.get("title").and_then(text_of).unwrap_or_default(),
        channel_id,
        channel_name,
        duration: item.get("duration").and_then(text_of).unwrap_or_default(),
        iso_duration: item
            .get("iso_duration")
            .and_then(non_empty)
            .unwrap_or_default(),
        thumbnail_url: thumbnail_of(item),
        views: ["view_count", "short_view_count", "views"]
            .iter()
            .find_map(|key| item.get(*key).and_then(text_of)),
        uploaded_at: ["published", "uploaded_at"]
            .iter()
            .find_map(|key| item.get(*key).and_then(text_of)),
        origin: None,
    })
}

fn normalize_comment(item: &Value) -> Option<Comment> {
    // Threads wrap the comment itself under `comment`
    let node = item.get("comment").unwrap_or(item);
    let comment_id = node.get("comment_id").and_then(non_empty)?;

    let author = node
        .get("author")
        .map(|author| CommentAuthor {
            id: author.get("id").and_then(non_empty).unwrap_or_default(),
            name: author
                .get("name")
                .and_then(text_of)
                .or_else(|| text_of(author))
                .unwrap_or_default(),
            thumbnails: author
                .get("thumbnails")
                .and_then(Value::as_array)
                .map(|thumbs| thumbs.iter().filter_map(url_of).collect())
                .unwrap_or_default(),
        })
        .unwrap_or_default();

    Some(Comment {
        comment_id,
        text: node
            .get("content")
            .or_else(|| node.get("text"))
            .and_then(text_of)
            .unwrap_or_default(),
        published_time: node
            .get("published_time")
            .and_then(text_of)
            .unwrap_or_default(),
        author,
        like_count: node
            .get("like_count")
            .and_then(text_of)
            .unwrap_or_else(|| "0".to_string()),
        reply_count: node
            .get("reply_count")
            .and_then(text_of)
            .unwrap_or_else(|| "0".to_string()),
        is_pinned: node
            .get("is_pinned")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn normalize_channel(item: &Value) -> Option<ChannelRef> {
    let author = item.get("author");
    let id = item
        .get("id")
        .and_then(non_empty)
        .or_else(|| item.get("channel_id").and_then(non_empty))
        .or_else(|| author.and_then(|a| a.get("id")).and_then(non_empty))?;

    Some(ChannelRef {
        id,
        name: item
            .get("name")
            .and_then(text_of)
            .or_else(|| author.and_then(|a| a.get("name")).and_then(text_of))
            .unwrap_or_default(),
        avatar_url: thumbnail_of(item)
            .or_else(|| item.get("avatar").and_then(url_of))
            .or_else(|| author.and_then(thumbnail_of)),
        subscriber_count: ["subscriber_count", "subscribers"]
            .iter()
            .find_map(|key| item.get(*key).and_then(text_of)),
    })
}

fn normalize_playlist(item: &Value) -> Option<PlaylistRef> {
    let id = item
        .get("id")
        .and_then(non_empty)
        .or_else(|| item.get("playlist_id").and_then(non_empty))?;

    let video_count = match item.get("video_count") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(other) => text_of(other)
            .map(|text| {
                text.chars()
                    .filter(char::is_ascii_digit)
                    .collect::<String>()
                    .parse()
                    .unwrap_or(0)
            })
            .unwrap_or(0),
        None => 0,
    };

    let author = match item.get("author") {
        Some(Value::String(name)) => Some(name.clone()),
        Some(author) => author.get("name").and_then(text_of),
        None => None,
    };

    Some(PlaylistRef {
        id,
        title: item.get("title").and_then(text_of).unwrap_or_default(),
        thumbnail_url: thumbnail_of(item),
        video_count,
        author,
    })
}

fn parse_videos(body: &Value, key: &str) -> Vec<Video> {
    normalize_list(items_of(body, key), "video", normalize_video)
}

fn parse_related(body: &Value) -> Vec<Video> {
    let key = ["watch_next_feed", "related", "videos"]
        .into_iter()
        .find(|key| body.get(*key).is_some_and(Value::is_array))
        .unwrap_or("videos");
    parse_videos(body, key)
}

fn parse_comments(body: &Value) -> Vec<Comment> {
    normalize_list(items_of(body, "comments"), "comment", normalize_comment)
}

fn parse_search(body: &Value) -> SearchResults {
    let array = |key: &str| {
        body.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    };

    SearchResults {
        videos: parse_videos(body, "videos"),
        shorts: normalize_list(array("shorts"), "short", normalize_video),
        channels: normalize_list(array("channels"), "channel", normalize_channel),
        playlists: normalize_list(array("playlists"), "playlist", normalize_playlist),
        continuation: continuation_of(body),
    }
}
