use tracing::instrument;

use crate::{
    config::RankingConfig,
    error::{AppError, AppResult},
    models::{Page, SearchPage},
    services::{
        aggregator::{aggregate, has_key, slice_page, AggregationBudget},
        providers::ContentProvider,
    },
};

/// Page `page` (1-based) of search results for `query`
///
/// Long-form results are walked and sliced like any page-indexed listing.
/// Shorts, channels and playlists come from the first upstream page only and
/// are returned on page 1.
#[instrument(skip(provider, config))]
pub async fn search_page(
    provider: &dyn ContentProvider,
    query: &str,
    page: usize,
    config: &RankingConfig,
) -> AppResult<SearchPage> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }
    if page == 0 {
        return Err(AppError::InvalidInput("Pages start at 1".to_string()));
    }

    let page_size = config.search_page_size;
    let first = provider.search(query).await?;
    let (shorts, channels, playlists) = if page == 1 {
        (first.shorts, first.channels, first.playlists)
    } else {
        Default::default()
    };

    let aggregated = aggregate(
        Page::new(first.videos, first.continuation),
        AggregationBudget::until(page.saturating_mul(page_size)),
        has_key,
        |cursor| async move {
            let next = provider.continue_search(cursor).await?;
            Ok::<_, AppError>(Page::new(next.videos, next.continuation))
        },
    )
    .await;

    let slice = slice_page(aggregated, page, page_size);

    Ok(SearchPage {
        videos: slice.items,
        shorts,
        channels,
        playlists,
        next_page_token: slice.next_page_token,
    })
}
