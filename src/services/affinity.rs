use std::collections::{HashMap, HashSet};

use crate::{config::RankingConfig, models::BehaviorSignals, services::keywords::extract_keywords};

/// Sparse keyword → weight map built from one signal snapshot
///
/// Contributions are strictly additive. The magnitude is computed once at
/// build time and only ever used as a normalizing denominator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffinityVector {
    weights: HashMap<String, f64>,
    magnitude: f64,
}

impl AffinityVector {
    /// Folds subscriptions, shorts history and watch history into a vector
    ///
    /// Subscribed channel names get the single highest per-item weight.
    /// History items decay with recency rank as `exp(-rank / decay)`, and the
    /// channel name of an item always outweighs its title. Shorts history
    /// counts more than regular watch history.
    pub fn build(signals: &BehaviorSignals, config: &RankingConfig) -> Self {
        let mut weights: HashMap<String, f64> = HashMap::new();
        let mut add = |text: &str, weight: f64| {
            for keyword in extract_keywords(text) {
                *weights.entry(keyword).or_insert(0.0) += weight;
            }
        };

        for channel in &signals.subscribed_channels {
            add(&channel.name, config.subscription_weight);
        }

        for (rank, video) in signals
            .shorts_history
            .iter()
            .take(config.shorts_history_window)
            .enumerate()
        {
            let decay = recency_decay(rank, config.recency_decay);
            add(&video.title, config.shorts_title_weight * decay);
            add(&video.channel_name, config.shorts_channel_weight * decay);
        }

        for (rank, video) in signals
            .watch_history
            .iter()
            .take(config.watch_history_window)
            .enumerate()
        {
            let decay = recency_decay(rank, config.recency_decay);
            add(&video.title, config.watch_title_weight * decay);
            add(&video.channel_name, config.watch_channel_weight * decay);
        }

        Self::from_weights(weights)
    }

    /// Wraps an existing weight map, computing its magnitude
    pub fn from_weights(weights: HashMap<String, f64>) -> Self {
        let magnitude = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        Self { weights, magnitude }
    }

    pub fn weight(&self, keyword: &str) -> f64 {
        self.weights.get(keyword).copied().unwrap_or(0.0)
    }

    /// Euclidean norm over all weights
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Sum of this vector's weights over `keywords`, plus how many overlapped
    pub fn dot(&self, keywords: &HashSet<String>) -> (f64, usize) {
        keywords
            .iter()
            .filter_map(|k| self.weights.get(k))
            .fold((0.0, 0), |(sum, hits), w| (sum + w, hits + 1))
    }

    /// Highest-weighted keywords, heaviest first
    ///
    /// Ties break alphabetically so the order is stable for a given vector.
    pub fn top_keywords(&self, n: usize) -> Vec<String> {
        let mut entries: Vec<(&String, &f64)> = self.weights.iter().collect();
        entries.sort_by(|a, b| {
            b.1.partial_cmp(a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        entries.into_iter().take(n).map(|(k, _)| k.clone()).collect()
    }
}

fn recency_decay(rank: usize, scale: f64) -> f64 {
    if scale <= 0.0 {
        return 1.0;
    }
    (-(rank as f64) / scale).exp()
}
