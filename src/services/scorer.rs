use rand::Rng;
use std::collections::{HashMap, HashSet};

use crate::{
    config::RankingConfig,
    models::{BehaviorSignals, Video},
    services::{affinity::AffinityVector, keywords::candidate_keywords},
};

/// A candidate with its relevance score for one feed build
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub video: Video,
    pub score: f64,
}

/// Score constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub content_match_scale: f64,
    pub subscription_bonus: f64,
    pub negative_penalty: f64,
    /// Upper bound of the uniform exploration noise; 0 disables it
    pub exploration_noise: f64,
}

impl From<&RankingConfig> for ScoreWeights {
    fn from(config: &RankingConfig) -> Self {
        Self {
            content_match_scale: config.content_match_scale,
            subscription_bonus: config.subscription_bonus,
            negative_penalty: config.negative_penalty,
            exploration_noise: config.exploration_noise,
        }
    }
}

/// Relevance scorer over one affinity vector
///
/// Score = content match + subscription bonus - negative penalty + noise.
/// The noise term makes ordering among near-equal candidates intentionally
/// non-deterministic unless the RNG is seeded or the noise is zero.
pub struct Scorer<'a, R> {
    affinity: &'a AffinityVector,
    negative: &'a HashMap<String, f64>,
    subscribed: HashSet<&'a str>,
    weights: ScoreWeights,
    rng: &'a mut R,
}

impl<'a, R: Rng> Scorer<'a, R> {
    pub fn new(
        affinity: &'a AffinityVector,
        negative: &'a HashMap<String, f64>,
        subscribed: HashSet<&'a str>,
        weights: ScoreWeights,
        rng: &'a mut R,
    ) -> Self {
        Self {
            affinity,
            negative,
            subscribed,
            weights,
            rng,
        }
    }

    /// Scorer wired from a signal snapshot
    pub fn for_signals(
        affinity: &'a AffinityVector,
        signals: &'a BehaviorSignals,
        weights: ScoreWeights,
        rng: &'a mut R,
    ) -> Self {
        let subscribed = signals
            .subscribed_channels
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        Self::new(affinity, &signals.negative_keywords, subscribed, weights, rng)
    }

    pub fn score(&mut self, video: &Video) -> f64 {
        let keywords = candidate_keywords(&video.title, &video.channel_name);
        let mut score = 0.0;

        // Cosine-style content match; an empty profile contributes nothing
        let magnitude = self.affinity.magnitude();
        let (dot, overlap) = self.affinity.dot(&keywords);
        if overlap > 0 && magnitude > 0.0 {
            let norm = magnitude * (keywords.len() as f64).sqrt();
            score += dot / norm * self.weights.content_match_scale;
        }

        if self.subscribed.contains(video.channel_id.as_str()) {
            score += self.weights.subscription_bonus;
        }

        score -= negative_weight(self.negative, &keywords) * self.weights.negative_penalty;

        if self.weights.exploration_noise > 0.0 {
            score += self.rng.gen_range(0.0..self.weights.exploration_noise);
        }

        score
    }

    /// Scores every candidate and sorts best first
    pub fn rank(&mut self, candidates: Vec<Video>) -> Vec<Scored> {
        let mut scored: Vec<Scored> = candidates
            .into_iter()
            .map(|video| {
                let score = self.score(&video);
                Scored { video, score }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored
    }
}

/// Accumulated "not interested" weight over a keyword set
pub fn negative_weight(negative: &HashMap<String, f64>, keywords: &HashSet<String>) -> f64 {
    keywords.iter().filter_map(|k| negative.get(k)).sum()
}
