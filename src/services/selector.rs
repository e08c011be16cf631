//! Mixing of the popular and personalized pools under a ratio and a
//! per-channel cooldown.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};

use crate::{
    config::RankingConfig,
    models::{ContentOrigin, Video},
    services::scorer::Scored,
};

/// Returns a shuffled copy, leaving nothing else touched
pub fn shuffled<T, R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Vec<T> {
    items.shuffle(rng);
    items
}

/// Per-channel cooldown counters, scoped to one assembly
///
/// A channel may be appended only while its counter is zero. Appending
/// resets it to `length` and ticks every other positive counter down by one,
/// so no channel repeats within any `length`-item window.
#[derive(Debug, Clone)]
pub struct ChannelCooldown {
    counters: HashMap<String, u32>,
    length: u32,
}

impl ChannelCooldown {
    pub fn new(length: u32) -> Self {
        Self {
            counters: HashMap::new(),
            length,
        }
    }

    pub fn is_ready(&self, channel_id: &str) -> bool {
        self.counters.get(channel_id).copied().unwrap_or(0) == 0
    }

    /// Admits the channel if it is off cooldown, updating every counter
    pub fn try_admit(&mut self, channel_id: &str) -> bool {
        if !self.is_ready(channel_id) {
            return false;
        }
        for (other, counter) in self.counters.iter_mut() {
            if other != channel_id && *counter > 0 {
                *counter -= 1;
            }
        }
        self.counters.insert(channel_id.to_string(), self.length);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionParams {
    pub target_size: usize,
    /// Share of `target_size` drawn from the popular pool
    pub popular_ratio: f64,
    /// Lower bound on how deep into the popular ranking the shuffle samples
    pub popular_sample_floor: usize,
    pub cooldown: u32,
    /// Candidates scoring below this are never appended
    pub score_floor: Option<f64>,
}

impl SelectionParams {
    pub fn shorts(config: &RankingConfig) -> Self {
        Self {
            target_size: config.shorts_batch_size,
            popular_ratio: config.shorts_popular_ratio,
            popular_sample_floor: config.popular_sample_floor,
            cooldown: config.channel_cooldown,
            score_floor: Some(config.shorts_score_floor),
        }
    }

    /// `(popular, personalized)` slot counts
    pub fn targets(&self) -> (usize, usize) {
        let ratio = self.popular_ratio.clamp(0.0, 1.0);
        let popular = ((self.target_size as f64 * ratio).ceil() as usize).min(self.target_size);
        (popular, self.target_size - popular)
    }
}

/// Output under construction: cooldown gate, score floor and ID dedup
struct Assembly {
    picks: Vec<Video>,
    used: HashSet<String>,
    cooldown: ChannelCooldown,
    score_floor: Option<f64>,
}

impl Assembly {
    fn new(params: &SelectionParams) -> Self {
        Self {
            picks: Vec::with_capacity(params.target_size),
            used: HashSet::new(),
            cooldown: ChannelCooldown::new(params.cooldown),
            score_floor: params.score_floor,
        }
    }

    fn try_push(&mut self, item: &Scored, origin: ContentOrigin) -> bool {
        if self.score_floor.is_some_and(|floor| item.score < floor) {
            return false;
        }
        if self.used.contains(&item.video.id) {
            return false;
        }
        if !self.cooldown.try_admit(item.video.channel_key()) {
            return false;
        }
        self.used.insert(item.video.id.clone());
        self.picks.push(item.video.clone().with_origin(origin));
        true
    }
}

/// Interleaves two ranked pools into one feed batch
///
/// Popular slots are a shuffled sample from the top of the popular ranking;
/// personalized slots are taken in rank order. Every pick passes the channel
/// cooldown, shortfalls are backfilled from the rest of the popular ranking,
/// and the batch is shuffled at the end without breaking the cooldown
/// spacing. Both pools empty gives an empty batch.
pub fn select<R: Rng + ?Sized>(
    popular: &[Scored],
    personalized: &[Scored],
    params: &SelectionParams,
    rng: &mut R,
) -> Vec<Video> {
    let (popular_target, personalized_target) = params.targets();
    let mut assembly = Assembly::new(params);

    let sample_depth = params.popular_sample_floor.max(popular_target * 2);
    let sample: Vec<&Scored> = popular.iter().take(sample_depth).collect();
    for item in shuffled(sample, rng).into_iter().take(popular_target) {
        assembly.try_push(item, ContentOrigin::Trending);
    }

    for item in personalized.iter().take(personalized_target) {
        assembly.try_push(item, ContentOrigin::Personalized);
    }

    if assembly.picks.len() < params.target_size {
        let before = assembly.picks.len();
        for item in popular {
            if assembly.picks.len() >= params.target_size {
                break;
            }
            assembly.try_push(item, ContentOrigin::Trending);
        }
        tracing::debug!(
            backfilled = assembly.picks.len() - before,
            total = assembly.picks.len(),
            "Backfilled from popular pool"
        );
    }

    shuffle_with_cooldown(assembly.picks, params.cooldown, rng)
}

/// Shuffles a cooldown-valid sequence while keeping it cooldown-valid
///
/// Greedily rebuilds the shuffled order, always taking the first item whose
/// channel is ready. If that ever dead-ends, the original order (which is
/// valid by construction) is returned instead.
fn shuffle_with_cooldown<R: Rng + ?Sized>(picks: Vec<Video>, cooldown: u32, rng: &mut R) -> Vec<Video> {
    let mut pending = shuffled(picks.clone(), rng);
    let mut gate = ChannelCooldown::new(cooldown);
    let mut out = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let Some(pos) = pending.iter().position(|v| gate.is_ready(v.channel_key())) else {
            return picks;
        };
        let video = pending.remove(pos);
        gate.try_admit(video.channel_key());
        out.push(video);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scored(id: &str, channel: &str, score: f64) -> Scored {
        Scored {
            video: Video {
                id: id.to_string(),
                title: format!("title {}", id),
                channel_id: channel.to_string(),
                channel_name: channel.to_string(),
                duration: "0:30".to_string(),
                iso_duration: String::new(),
                thumbnail_url: None,
                views: None,
                uploaded_at: None,
                origin: None,
            },
            score,
        }
    }

    fn pool(prefix: &str, n: usize, channels: usize) -> Vec<Scored> {
        (0..n)
            .map(|i| {
                scored(
                    &format!("{}{:04}", prefix, i),
                    &format!("{}-ch{}", prefix, i % channels),
                    (n - i) as f64,
                )
            })
            .collect()
    }

    fn params(target: usize, ratio: f64) -> SelectionParams {
        SelectionParams {
            target_size: target,
            popular_ratio: ratio,
            popular_sample_floor: 50,
            cooldown: 3,
            score_floor: Some(-50.0),
        }
    }

    fn assert_cooldown_spacing(feed: &[Video], window: usize) {
        for (i, a) in feed.iter().enumerate() {
            for b in feed.iter().skip(i + 1).take(window - 1) {
                assert_ne!(a.channel_key(), b.channel_key(), "channel repeated inside window");
            }
        }
    }

    fn assert_unique_ids(feed: &[Video]) {
        let unique: HashSet<&str> = feed.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(unique.len(), feed.len());
    }

    #[test]
    fn test_cooldown_counter_semantics() {
        let mut gate = ChannelCooldown::new(3);
        assert!(gate.try_admit("a"));
        assert!(!gate.try_admit("a"));
        assert!(gate.try_admit("b"));
        assert!(gate.try_admit("c"));
        assert!(!gate.try_admit("a"));
        assert!(gate.try_admit("d"));
        assert!(gate.try_admit("a"));
    }

    #[test]
    fn test_targets_round_popular_up() {
        assert_eq!(params(20, 0.85).targets(), (17, 3));
        assert_eq!(params(10, 0.33).targets(), (4, 6));
        assert_eq!(params(5, 1.5).targets(), (5, 0));
        assert_eq!(params(0, 0.85).targets(), (0, 0));
    }

    #[test]
    fn test_empty_pools_yield_empty_batch() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select(&[], &[], &params(20, 0.85), &mut rng).is_empty());
    }

    #[test]
    fn test_ratio_approximation() {
        let popular = pool("pop", 200, 60);
        let personalized = pool("per", 200, 60);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let feed = select(&popular, &personalized, &params(20, 0.85), &mut rng);
            assert_eq!(feed.len(), 20);
            let from_popular = feed
                .iter()
                .filter(|v| v.origin == Some(ContentOrigin::Trending))
                .count();
            let share = from_popular as f64 / feed.len() as f64;
            assert!((share - 0.85).abs() <= 0.15, "popular share {}", share);
        }
    }

    #[test]
    fn test_cooldown_invariant_under_heavy_collisions() {
        // Three channels only: at most one pick per channel in any window of 3
        let popular = pool("pop", 120, 3);
        let personalized = pool("per", 30, 2);

        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let feed = select(&popular, &personalized, &params(20, 0.85), &mut rng);
            assert!(!feed.is_empty());
            assert_cooldown_spacing(&feed, 3);
            assert_unique_ids(&feed);
        }
    }

    #[test]
    fn test_backfill_covers_shortfall() {
        // Popular sample collides heavily on one channel, backfill brings variety
        let mut popular: Vec<Scored> = (0..60)
            .map(|i| scored(&format!("same{:04}", i), "mono", 100.0 - i as f64))
            .collect();
        popular.extend((0..30).map(|i| scored(&format!("var{:04}", i), &format!("v{}", i), 1.0)));

        let mut rng = StdRng::seed_from_u64(5);
        let feed = select(&popular, &[], &params(10, 1.0), &mut rng);
        assert_eq!(feed.len(), 10);
        assert_cooldown_spacing(&feed, 3);
        assert_unique_ids(&feed);
    }

    #[test]
    fn test_score_floor_excludes_buried_candidates() {
        let popular = vec![scored("buried00001", "a", -80.0), scored("fine0000001", "b", 1.0)];
        let mut rng = StdRng::seed_from_u64(2);
        let feed = select(&popular, &[], &params(5, 1.0), &mut rng);
        let ids: Vec<&str> = feed.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["fine0000001"]);
    }

    #[test]
    fn test_channels_without_id_are_spaced_by_name() {
        let popular: Vec<Scored> = (0..6)
            .map(|i| {
                let mut item = scored(&format!("noid{:07}", i), "", 10.0 - i as f64);
                item.video.channel_name = format!("named channel {}", i);
                item
            })
            .collect();
        let mut rng = StdRng::seed_from_u64(6);
        let feed = select(&popular, &[], &params(6, 1.0), &mut rng);
        assert_eq!(feed.len(), 6);
        assert_cooldown_spacing(&feed, 3);
    }

    #[test]
    fn test_same_id_in_both_pools_selected_once() {
        let popular = vec![scored("shared00001", "a", 10.0)];
        let personalized = vec![scored("shared00001", "a", 10.0), scored("own00000001", "b", 5.0)];
        let mut rng = StdRng::seed_from_u64(9);
        let feed = select(&popular, &personalized, &params(4, 0.5), &mut rng);
        assert_unique_ids(&feed);
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn test_personalized_taken_in_rank_order() {
        let personalized = pool("per", 10, 10);
        let mut rng = StdRng::seed_from_u64(4);
        let feed = select(&[], &personalized, &params(3, 0.0), &mut rng);
        let mut ids: Vec<&str> = feed.iter().map(|v| v.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["per0000", "per0001", "per0002"]);
    }

    #[test]
    fn test_shuffled_is_permutation() {
        let mut rng = StdRng::seed_from_u64(11);
        let original: Vec<u32> = (0..50).collect();
        let mut out = shuffled(original.clone(), &mut rng);
        out.sort();
        assert_eq!(out, original);
    }

    #[test]
    fn test_shuffled_is_reproducible_with_seed() {
        let a = shuffled((0..20).collect::<Vec<u32>>(), &mut StdRng::seed_from_u64(42));
        let b = shuffled((0..20).collect::<Vec<u32>>(), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
