use tracing::instrument;

use crate::{
    config::RankingConfig,
    error::{AppError, AppResult},
    models::{is_valid_video_id, Comment, ContentOrigin, Video},
    services::{
        aggregator::{aggregate, has_key, AggregationBudget},
        providers::ContentProvider,
    },
};

fn ensure_video_id(video_id: &str) -> AppResult<()> {
    if !is_valid_video_id(video_id) {
        return Err(AppError::InvalidInput(format!(
            "Malformed video id: {}",
            video_id
        )));
    }
    Ok(())
}

/// Watch-next candidates for a video, topped up through continuations
///
/// Entries without a well-formed video ID are dropped, as is the source
/// video itself. A failed initial fetch is an error; a failed continuation
/// only ends the walk.
#[instrument(skip(provider, config))]
pub async fn related_videos(
    provider: &dyn ContentProvider,
    video_id: &str,
    config: &RankingConfig,
) -> AppResult<Vec<Video>> {
    ensure_video_id(video_id)?;

    let first = provider.video_related(video_id).await?;
    let aggregated = aggregate(
        first,
        AggregationBudget::new(config.related_target, config.related_max_continuations),
        |v: &Video| is_valid_video_id(&v.id) && v.id != video_id,
        |cursor| provider.continue_related(cursor),
    )
    .await;

    tracing::info!(
        collected = aggregated.items.len(),
        stop = ?aggregated.stop,
        "Related videos aggregated"
    );

    Ok(aggregated
        .items
        .into_iter()
        .take(config.related_target)
        .map(|v| v.with_origin(ContentOrigin::AiSuggested))
        .collect())
}

/// Comments for a video, collected across continuation pages
#[instrument(skip(provider, config))]
pub async fn video_comments(
    provider: &dyn ContentProvider,
    video_id: &str,
    config: &RankingConfig,
) -> AppResult<Vec<Comment>> {
    ensure_video_id(video_id)?;

    let first = provider.comments(video_id).await?;
    let mut aggregated = aggregate(
        first,
        AggregationBudget::new(config.comments_target, config.comments_max_continuations),
        has_key,
        |cursor| provider.continue_comments(cursor),
    )
    .await;

    tracing::info!(
        collected = aggregated.items.len(),
        stop = ?aggregated.stop,
        "Comments aggregated"
    );

    aggregated.items.truncate(config.comments_target);
    Ok(aggregated.items)
}
