use std::collections::HashSet;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use xrai_feed::{
    api::{create_router, AppState},
    config::RankingConfig,
    error::{AppError, AppResult},
    models::{Comment, CommentAuthor, Continuation, Page, SearchResults, ShortsFeed, Video},
    services::{session::SessionLimits, ContentProvider},
};

/// In-memory upstream with fixed listings
#[derive(Default)]
struct FakeProvider {
    trending: Vec<Video>,
    search_videos: Vec<Video>,
    search_shorts: Vec<Video>,
    channel_pages: Vec<Vec<Video>>,
    comments: Vec<Comment>,
    failing: bool,
}

impl FakeProvider {
    fn check(&self) -> AppResult<()> {
        if self.failing {
            return Err(AppError::ExternalApi("upstream unavailable".to_string()));
        }
        Ok(())
    }

    fn channel_page(&self, index: usize) -> Page<Video> {
        let items = self.channel_pages.get(index).cloned().unwrap_or_default();
        let continuation = (index + 1 < self.channel_pages.len())
            .then(|| Continuation::new(format!("channel:{}", index + 1)));
        Page::new(items, continuation)
    }
}

#[async_trait::async_trait]
impl ContentProvider for FakeProvider {
    async fn search(&self, _query: &str) -> AppResult<SearchResults> {
        self.check()?;
        Ok(SearchResults {
            videos: self.search_videos.clone(),
            shorts: self.search_shorts.clone(),
            ..Default::default()
        })
    }

    async fn continue_search(&self, _continuation: Continuation) -> AppResult<SearchResults> {
        self.check()?;
        Ok(SearchResults::default())
    }

    async fn trending(&self, _category: Option<String>) -> AppResult<Vec<Video>> {
        self.check()?;
        Ok(self.trending.clone())
    }

    async fn video_related(&self, _video_id: &str) -> AppResult<Page<Video>> {
        self.check()?;
        Ok(Page::last(self.search_videos.clone()))
    }

    async fn continue_related(&self, _continuation: Continuation) -> AppResult<Page<Video>> {
        self.check()?;
        Ok(Page::last(vec![]))
    }

    async fn comments(&self, _video_id: &str) -> AppResult<Page<Comment>> {
        self.check()?;
        Ok(Page::last(self.comments.clone()))
    }

    async fn continue_comments(&self, _continuation: Continuation) -> AppResult<Page<Comment>> {
        self.check()?;
        Ok(Page::last(vec![]))
    }

    async fn channel_videos(&self, _channel_id: &str) -> AppResult<Page<Video>> {
        self.check()?;
        Ok(self.channel_page(0))
    }

    async fn continue_channel_videos(&self, continuation: Continuation) -> AppResult<Page<Video>> {
        self.check()?;
        let index = continuation
            .as_str()
            .strip_prefix("channel:")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| AppError::ExternalApi("bad cursor".to_string()))?;
        Ok(self.channel_page(index))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn video(id: &str, title: &str, channel: &str, duration: &str) -> Video {
    Video {
        id: id.to_string(),
        title: title.to_string(),
        channel_id: format!("UC-{}", channel),
        channel_name: channel.to_string(),
        duration: duration.to_string(),
        iso_duration: String::new(),
        thumbnail_url: None,
        views: None,
        uploaded_at: None,
        origin: None,
    }
}

fn catalog(prefix: &str, n: usize, duration: &str) -> Vec<Video> {
    (0..n)
        .map(|i| {
            video(
                &format!("{}{:08}", prefix, i),
                &format!("{} clip {}", prefix, i),
                &format!("{}-ch{}", prefix, i),
                duration,
            )
        })
        .collect()
}

fn stocked_provider() -> FakeProvider {
    FakeProvider {
        trending: [catalog("trl", 40, "12:00"), catalog("trs", 40, "0:30")].concat(),
        search_videos: catalog("srl", 40, "9:00"),
        search_shorts: catalog("srs", 20, "0:45"),
        channel_pages: vec![catalog("chv", 30, "5:00")],
        comments: (0..5)
            .map(|i| Comment {
                comment_id: format!("cm{}", i),
                text: "hello".to_string(),
                published_time: String::new(),
                author: CommentAuthor::default(),
                like_count: "0".to_string(),
                reply_count: "0".to_string(),
                is_pinned: false,
            })
            .collect(),
        failing: false,
    }
}

fn create_test_server(provider: FakeProvider) -> TestServer {
    let state = AppState::new(
        Arc::new(provider),
        RankingConfig::default(),
        SessionLimits {
            capacity: 100,
            ..Default::default()
        },
    );
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn ids(value: &Value, key: &str) -> Vec<String> {
    value[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect()
}

fn channel_ids(value: &Value, key: &str) -> Vec<String> {
    value[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["channel_id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(FakeProvider::default());
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_home_feed_cold_start() {
    let server = create_test_server(stocked_provider());

    let response = server.post("/feed/home").json(&json!({})).await;
    response.assert_status_ok();
    assert!(!response.header("x-feed-session").is_empty());

    let body: Value = response.json();
    let videos = ids(&body, "videos");
    let shorts = ids(&body, "shorts");
    assert!(!videos.is_empty());
    assert!(!shorts.is_empty());

    let all: Vec<&String> = videos.iter().chain(&shorts).collect();
    let unique: HashSet<&String> = all.iter().copied().collect();
    assert_eq!(unique.len(), all.len());
}

#[tokio::test]
async fn test_home_feed_excludes_ng_keywords_hidden_and_blocked() {
    let mut provider = stocked_provider();
    provider.trending.push(video("spoiler0001", "Finale SPOILER talk", "talk", "15:00"));
    let server = create_test_server(provider);

    let response = server
        .post("/feed/home")
        .json(&json!({
            "signals": {
                "ng_keywords": ["spoiler"],
                "hidden_videos": [{ "id": "trl00000000", "title": "" }],
                "ng_channels": [{ "id": "UC-srl-ch1", "name": "blocked" }]
            }
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let mut all_ids = ids(&body, "videos");
    all_ids.extend(ids(&body, "shorts"));
    let mut all_channels = channel_ids(&body, "videos");
    all_channels.extend(channel_ids(&body, "shorts"));

    assert!(!all_ids.contains(&"spoiler0001".to_string()));
    assert!(!all_ids.contains(&"trl00000000".to_string()));
    assert!(!all_channels.contains(&"UC-srl-ch1".to_string()));
}

#[tokio::test]
async fn test_all_sources_failing_is_service_unavailable() {
    let server = create_test_server(FakeProvider {
        failing: true,
        ..Default::default()
    });

    let response = server.post("/feed/home").json(&json!({})).await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("No content available"));

    let response = server.post("/feed/shorts").json(&json!({})).await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_shorts_feed_session_never_repeats() {
    let server = create_test_server(stocked_provider());

    let first = server.post("/feed/shorts").json(&json!({ "page": 1 })).await;
    first.assert_status_ok();
    let session = first.header("x-feed-session");
    let first_feed: ShortsFeed = tokio_test::assert_ok!(serde_json::from_value(first.json()));
    assert!(!first_feed.videos.is_empty());

    let second = server
        .post("/feed/shorts")
        .add_header(HeaderName::from_static("x-feed-session"), session.clone())
        .json(&json!({ "page": 2 }))
        .await;
    second.assert_status_ok();
    assert_eq!(second.header("x-feed-session"), session);
    let second_feed: ShortsFeed = tokio_test::assert_ok!(serde_json::from_value(second.json()));

    let shown: HashSet<&str> = first_feed.videos.iter().map(|v| v.id.as_str()).collect();
    assert!(second_feed.videos.iter().all(|v| !shown.contains(v.id.as_str())));
    assert!(second_feed.videos.iter().all(Video::is_short));
}

#[tokio::test]
async fn test_shorts_feed_honours_client_seen_ids() {
    let server = create_test_server(stocked_provider());
    let seen: Vec<String> = catalog("trs", 10, "0:30").into_iter().map(|v| v.id).collect();

    let response = server
        .post("/feed/shorts")
        .add_header(
            HeaderName::from_static("x-feed-session"),
            HeaderValue::from_static("not-a-uuid"),
        )
        .json(&json!({ "seen_ids": seen }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let returned = ids(&body, "videos");
    assert!(returned.iter().all(|id| !seen.contains(id)));
}

#[tokio::test]
async fn test_channel_page_two_after_exhaustion() {
    let server = create_test_server(stocked_provider());

    let first = server.get("/channels/UC-chv/videos").await;
    first.assert_status_ok();
    let body: Value = first.json();
    assert_eq!(body["videos"].as_array().unwrap().len(), 30);
    assert!(body.get("next_page_token").is_none());

    let second = server
        .get("/channels/UC-chv/videos")
        .add_query_param("page", 2)
        .await;
    second.assert_status_ok();
    let body: Value = second.json();
    assert!(body["videos"].as_array().unwrap().is_empty());
    assert!(body.get("next_page_token").is_none());
}

#[tokio::test]
async fn test_channel_pages_follow_continuations() {
    let mut provider = stocked_provider();
    provider.channel_pages = vec![catalog("pga", 30, "5:00"), catalog("pgb", 30, "5:00")];
    let server = create_test_server(provider);

    let first = server.get("/channels/UC-chv/videos").await;
    let body: Value = first.json();
    assert_eq!(body["next_page_token"], "2");

    let second = server
        .get("/channels/UC-chv/videos")
        .add_query_param("page", 2)
        .await;
    let body: Value = second.json();
    assert_eq!(ids(&body, "videos")[0], "pgb00000000");
}

#[tokio::test]
async fn test_empty_search_query_is_bad_request() {
    let server = create_test_server(stocked_provider());
    let response = server.get("/search").add_query_param("q", "  ").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_first_page() {
    let server = create_test_server(stocked_provider());
    let response = server.get("/search").add_query_param("q", "lofi").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["videos"].as_array().unwrap().len(), 20);
    assert_eq!(body["shorts"].as_array().unwrap().len(), 20);
    assert_eq!(body["next_page_token"], "2");
}

#[tokio::test]
async fn test_related_rejects_malformed_id() {
    let server = create_test_server(stocked_provider());
    let response = server.get("/videos/bad/related").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_related_and_comments() {
    let server = create_test_server(stocked_provider());

    let related = server.get("/videos/dQw4w9WgXcQ/related").await;
    related.assert_status_ok();
    let body: Value = related.json();
    assert_eq!(body["videos"].as_array().unwrap().len(), 40);

    let comments = server.get("/videos/dQw4w9WgXcQ/comments").await;
    comments.assert_status_ok();
    let body: Value = comments.json();
    assert_eq!(body["comments"].as_array().unwrap().len(), 5);
}
