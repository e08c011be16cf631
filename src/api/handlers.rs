use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    models::{
        BehaviorSignals, ChannelVideosPage, CommentsResponse, HomeFeed, RelatedResponse,
        SearchPage, ShortsFeed,
    },
    services::{
        channel::channel_videos_page,
        get_xrai_recommendations, get_xrai_shorts,
        session::{FeedKind, FeedSessionId},
        title_search::search_page,
        video::{related_videos, video_comments},
    },
};

use super::AppState;

// Request types

fn first_page() -> usize {
    1
}

#[derive(Debug, Deserialize)]
pub struct HomeFeedRequest {
    #[serde(default)]
    pub signals: BehaviorSignals,
    #[serde(default = "first_page")]
    pub page: usize,
}

#[derive(Debug, Deserialize)]
pub struct ShortsFeedRequest {
    #[serde(default)]
    pub signals: BehaviorSignals,
    #[serde(default = "first_page")]
    pub page: usize,
    /// Already shown on the client, merged with the session's own record
    #[serde(default)]
    pub seen_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    pub page: usize,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "first_page")]
    pub page: usize,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Next page of the home feed for this session
pub async fn home_feed(
    State(state): State<AppState>,
    Extension(session): Extension<FeedSessionId>,
    Json(request): Json<HomeFeedRequest>,
) -> AppResult<Json<HomeFeed>> {
    let mut rng = StdRng::from_entropy();
    let feed = get_xrai_recommendations(
        state.provider.as_ref(),
        &request.signals,
        request.page.max(1),
        &state.ranking,
        &mut rng,
    )
    .await?;

    let videos = state
        .sessions
        .record(session, FeedKind::Home, feed.videos)
        .await;
    let shorts = state
        .sessions
        .record(session, FeedKind::Home, feed.shorts)
        .await;

    Ok(Json(HomeFeed { videos, shorts }))
}

/// Next batch of the shorts feed for this session
pub async fn shorts_feed(
    State(state): State<AppState>,
    Extension(session): Extension<FeedSessionId>,
    Json(request): Json<ShortsFeedRequest>,
) -> AppResult<Json<ShortsFeed>> {
    let mut seen = state.sessions.seen_ids(session, FeedKind::Shorts).await;
    seen.extend(request.seen_ids);

    let mut rng = StdRng::from_entropy();
    let videos = get_xrai_shorts(
        state.provider.as_ref(),
        &request.signals,
        request.page.max(1),
        &seen,
        &state.ranking,
        &mut rng,
    )
    .await?;

    let videos = state
        .sessions
        .record(session, FeedKind::Shorts, videos)
        .await;

    Ok(Json(ShortsFeed { videos }))
}

pub async fn related(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<Json<RelatedResponse>> {
    let videos = related_videos(state.provider.as_ref(), &video_id, &state.ranking).await?;
    Ok(Json(RelatedResponse { videos }))
}

pub async fn comments(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<Json<CommentsResponse>> {
    let comments = video_comments(state.provider.as_ref(), &video_id, &state.ranking).await?;
    Ok(Json(CommentsResponse { comments }))
}

pub async fn channel_videos(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<ChannelVideosPage>> {
    let slice = channel_videos_page(
        state.provider.as_ref(),
        &channel_id,
        params.page,
        &state.ranking,
    )
    .await?;
    Ok(Json(slice.into()))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchPage>> {
    let page = search_page(state.provider.as_ref(), &params.q, params.page, &state.ranking).await?;
    Ok(Json(page))
}
