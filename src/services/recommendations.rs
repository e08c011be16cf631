//! Home and shorts feed assembly.
//!
//! Two independent strategies live here. The home feed is a light ratio mix
//! over filtered pools; the shorts feed runs the full affinity, scorer and
//! selector pipeline. Each call fetches its sources concurrently and treats
//! a failed source as an empty one. Only when every source fails does the
//! call itself fail.

use futures::future::join_all;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::instrument;

use crate::{
    config::RankingConfig,
    error::{AppError, AppResult},
    models::{BehaviorSignals, ContentOrigin, HomeFeed, SearchResults, Video},
    services::{
        affinity::AffinityVector,
        filter::FilterStage,
        keywords::strip_decorations,
        providers::ContentProvider,
        scorer::{ScoreWeights, Scorer},
        selector::{select, shuffled, SelectionParams},
    },
};

const GENERIC_HOME_SEEDS: [&str; 3] = ["Music", "Gaming", "Vlog"];
const GENERIC_SHORTS_SEEDS: [&str; 2] = ["Funny #shorts", "Trending #shorts"];
const SEARCH_TITLE_WORDS: usize = 4;

/// Tally of source outcomes for one feed build
#[derive(Debug, Default)]
struct SourceTally {
    attempted: usize,
    failed: usize,
}

impl SourceTally {
    /// Unwraps a source result, degrading a failure to an empty contribution
    fn settle<T: Default>(&mut self, source: &str, result: AppResult<T>) -> T {
        self.attempted += 1;
        match result {
            Ok(value) => value,
            Err(e) => {
                self.failed += 1;
                tracing::warn!(source = %source, error = %e, "Feed source failed, continuing without it");
                T::default()
            }
        }
    }

    fn ensure_any_succeeded(&self, feed: &str) -> AppResult<()> {
        if self.attempted > 0 && self.failed == self.attempted {
            return Err(AppError::NoContent(format!(
                "all {} sources of the {} feed failed",
                self.attempted, feed
            )));
        }
        Ok(())
    }
}

/// Builds the long-form home feed plus a small shorts shelf
///
/// Pools come from the trending listing and from personalized searches
/// seeded by watch history or subscriptions. Everything is split by
/// duration first, filtered with a hard negative-signal cut, then mixed at
/// a fixed trending/personalized ratio. The shorts shelf is a plain
/// shuffle-and-cap without cooldown gating.
#[instrument(skip_all, fields(page = page, provider = provider.name()))]
pub async fn get_xrai_recommendations<R: Rng>(
    provider: &dyn ContentProvider,
    signals: &BehaviorSignals,
    page: usize,
    config: &RankingConfig,
    rng: &mut R,
) -> AppResult<HomeFeed> {
    let seeds = home_seeds(signals, config, rng);

    let (trending, searches) = futures::join!(
        provider.trending(None),
        join_all(seeds.iter().map(|query| search_at_page(provider, query, page)))
    );

    let mut tally = SourceTally::default();
    let trending = tally.settle("trending", trending);

    let mut trending_videos = Vec::new();
    let mut trending_shorts = Vec::new();
    for video in trending {
        if video.is_short() {
            trending_shorts.push(video);
        } else {
            trending_videos.push(video);
        }
    }

    let mut personalized_videos = Vec::new();
    let mut personalized_shorts = Vec::new();
    for (query, result) in seeds.iter().zip(searches) {
        let results = tally.settle(query, result);
        personalized_shorts.extend(results.shorts);
        for video in results.videos {
            if video.is_short() {
                personalized_shorts.push(video);
            } else {
                personalized_videos.push(video);
            }
        }
    }

    tally.ensure_any_succeeded("home")?;

    let mut stage = FilterStage::new(signals, Some(config.home_negative_threshold));
    let trending_videos = stage.filter(trending_videos);
    let personalized_videos = stage.filter(personalized_videos);
    let trending_shorts = stage.filter(trending_shorts);
    let personalized_shorts = stage.filter(personalized_shorts);

    let trending_slots =
        (config.home_target_videos as f64 * config.home_trending_ratio.clamp(0.0, 1.0)).floor()
            as usize;
    let personalized_slots = config.home_target_videos.saturating_sub(trending_slots);

    let mut videos = tag(
        shuffled(trending_videos, rng).into_iter().take(trending_slots),
        ContentOrigin::Trending,
    );
    videos.extend(tag(
        shuffled(personalized_videos, rng)
            .into_iter()
            .take(personalized_slots),
        ContentOrigin::Personalized,
    ));
    let videos = shuffled(videos, rng);

    let mut shorts = tag(shuffled(trending_shorts, rng), ContentOrigin::Trending);
    shorts.extend(tag(
        shuffled(personalized_shorts, rng),
        ContentOrigin::Personalized,
    ));
    let mut shorts = shuffled(shorts, rng);
    shorts.truncate(config.home_target_shorts);

    tracing::info!(
        seeds = seeds.len(),
        failed_sources = tally.failed,
        videos = videos.len(),
        shorts = shorts.len(),
        "Home feed assembled"
    );

    Ok(HomeFeed { videos, shorts })
}

/// Builds one batch of the short-form feed
///
/// `seen_ids` are items already shown earlier in the same scroll session;
/// they extend the dedup set together with the hidden videos and the
/// caller's shorts history.
#[instrument(skip_all, fields(page = page, seen = seen_ids.len(), provider = provider.name()))]
pub async fn get_xrai_shorts<R: Rng>(
    provider: &dyn ContentProvider,
    signals: &BehaviorSignals,
    page: usize,
    seen_ids: &[String],
    config: &RankingConfig,
    rng: &mut R,
) -> AppResult<Vec<Video>> {
    let affinity = AffinityVector::build(signals, config);
    let seeds = shorts_seeds(&affinity, config);

    let (trending, searches) = futures::join!(
        provider.trending(None),
        join_all(seeds.iter().map(|query| search_at_page(provider, query, page)))
    );

    let mut tally = SourceTally::default();
    let popular_raw: Vec<Video> = tally
        .settle("trending", trending)
        .into_iter()
        .filter(Video::is_short)
        .collect();

    let mut personalized_raw = Vec::new();
    for (query, result) in seeds.iter().zip(searches) {
        let results = tally.settle(query, result);
        personalized_raw.extend(
            results
                .videos
                .into_iter()
                .chain(results.shorts)
                .filter(Video::is_short),
        );
    }

    tally.ensure_any_succeeded("shorts")?;

    let mut stage = FilterStage::new(signals, config.shorts_negative_threshold);
    stage.mark_seen(signals.shorts_history.iter().map(|v| v.id.clone()));
    stage.mark_seen(seen_ids.iter().cloned());
    let popular = stage.filter(popular_raw);
    let personalized = stage.filter(personalized_raw);

    let (ranked_popular, ranked_personalized) = {
        let mut scorer = Scorer::for_signals(&affinity, signals, ScoreWeights::from(config), rng);
        (scorer.rank(popular), scorer.rank(personalized))
    };

    let feed = select(
        &ranked_popular,
        &ranked_personalized,
        &SelectionParams::shorts(config),
        rng,
    );

    tracing::info!(
        seeds = seeds.len(),
        failed_sources = tally.failed,
        affinity_keywords = affinity.len(),
        popular = ranked_popular.len(),
        personalized = ranked_personalized.len(),
        selected = feed.len(),
        "Shorts batch assembled"
    );

    Ok(feed)
}

/// Fetches page `page` (1-based) of a search by walking its continuations
///
/// A page past the end of the listing is empty rather than an error. Only
/// the initial search can fail the source; a failed continuation ends the
/// walk and the requested page reads as past the end.
async fn search_at_page(
    provider: &dyn ContentProvider,
    query: &str,
    page: usize,
) -> AppResult<SearchResults> {
    let mut results = provider.search(query).await?;
    for walked in 1..page.max(1) {
        let Some(cursor) = results.continuation.take() else {
            return Ok(SearchResults::default());
        };
        results = match provider.continue_search(cursor).await {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!(
                    query = %query,
                    page,
                    walked,
                    error = %e,
                    "Search continuation failed, treating page as past the end"
                );
                return Ok(SearchResults::default());
            }
        };
    }
    Ok(results)
}

fn tag(videos: impl IntoIterator<Item = Video>, origin: ContentOrigin) -> Vec<Video> {
    videos.into_iter().map(|v| v.with_origin(origin)).collect()
}

/// Reduces a video title to a short search query
///
/// Bracketed decorations are removed and only the first few words kept.
pub fn clean_title_for_search(title: &str) -> String {
    strip_decorations(title)
        .split_whitespace()
        .take(SEARCH_TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Search queries for the home feed's personalized pools
///
/// Sampled watch-history titles first, then sampled subscriptions, then a
/// fixed generic set, so the feed always has something to search for.
pub fn home_seeds<R: Rng + ?Sized>(
    signals: &BehaviorSignals,
    config: &RankingConfig,
    rng: &mut R,
) -> Vec<String> {
    if signals.is_cold_start() {
        return generic_home_seeds();
    }

    let from_history: Vec<String> = signals
        .watch_history
        .choose_multiple(rng, config.home_history_seeds)
        .map(|v| clean_title_for_search(&v.title))
        .filter(|title| !title.is_empty())
        .map(|title| format!("{} related", title))
        .collect();
    if !from_history.is_empty() {
        return from_history;
    }

    let from_subscriptions: Vec<String> = signals
        .subscribed_channels
        .choose_multiple(rng, config.home_subscription_seeds)
        .filter(|c| !c.name.trim().is_empty())
        .map(|c| format!("{} videos", c.name.trim()))
        .collect();
    if !from_subscriptions.is_empty() {
        return from_subscriptions;
    }

    generic_home_seeds()
}

fn generic_home_seeds() -> Vec<String> {
    GENERIC_HOME_SEEDS.iter().map(|s| s.to_string()).collect()
}

/// Search queries for the shorts feed's personalized pool
pub fn shorts_seeds(affinity: &AffinityVector, config: &RankingConfig) -> Vec<String> {
    let keywords = affinity.top_keywords(config.shorts_seed_keywords);
    let seeds: Vec<String> = if keywords.is_empty() {
        GENERIC_SHORTS_SEEDS.iter().map(|s| s.to_string()).collect()
    } else {
        keywords.iter().map(|k| format!("{} #shorts", k)).collect()
    };
    seeds.into_iter().take(config.shorts_seed_queries).collect()
}
