use tracing::instrument;

use crate::{
    config::RankingConfig,
    error::{AppError, AppResult},
    models::{PageSlice, Video},
    services::{
        aggregator::{aggregate, has_key, slice_page, AggregationBudget},
        providers::ContentProvider,
    },
};

/// Page `page` (1-based) of a channel's uploads
///
/// Walks the channel listing forward from its first page until
/// `page * page_size` uploads are known, then cuts out the requested slice.
#[instrument(skip(provider, config))]
pub async fn channel_videos_page(
    provider: &dyn ContentProvider,
    channel_id: &str,
    page: usize,
    config: &RankingConfig,
) -> AppResult<PageSlice<Video>> {
    if channel_id.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Channel id cannot be empty".to_string(),
        ));
    }
    if page == 0 {
        return Err(AppError::InvalidInput("Pages start at 1".to_string()));
    }

    let page_size = config.channel_page_size;
    let target = page.saturating_mul(page_size);

    let first = provider.channel_videos(channel_id).await?;
    let aggregated = aggregate(first, AggregationBudget::until(target), has_key, |cursor| {
        provider.continue_channel_videos(cursor)
    })
    .await;

    tracing::debug!(
        collected = aggregated.items.len(),
        stop = ?aggregated.stop,
        "Channel listing walked"
    );

    Ok(slice_page(aggregated, page, page_size))
}
