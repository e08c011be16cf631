use std::collections::{HashMap, HashSet};

use crate::{
    models::{BehaviorSignals, Video},
    services::{keywords::candidate_keywords, scorer::negative_weight},
};

/// Exclusion and deduplication stage for one feed build
///
/// The seen set starts from the caller's hidden videos (plus any extra IDs
/// the caller already showed) and grows with every survivor, so this stage
/// is also the cross-pool dedup: first occurrence wins.
#[derive(Debug, Clone)]
pub struct FilterStage {
    seen: HashSet<String>,
    blocked_channels: HashSet<String>,
    ng_keywords: Vec<String>,
    negative: HashMap<String, f64>,
    negative_threshold: Option<f64>,
}

impl FilterStage {
    /// Builds the stage from a signal snapshot
    ///
    /// `negative_threshold` is a hard cut on accumulated negative weight;
    /// `None` leaves negative signals to the scorer's penalty.
    pub fn new(signals: &BehaviorSignals, negative_threshold: Option<f64>) -> Self {
        Self {
            seen: signals.hidden_videos.iter().map(|v| v.id.clone()).collect(),
            blocked_channels: signals.ng_channels.iter().map(|c| c.id.clone()).collect(),
            ng_keywords: signals
                .ng_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            negative: signals.negative_keywords.clone(),
            negative_threshold,
        }
    }

    /// Extends the seen set without replacing it
    pub fn mark_seen<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seen.extend(ids.into_iter().map(Into::into));
    }

    pub fn is_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Removes disallowed and already-seen candidates, marking survivors seen
    pub fn filter(&mut self, candidates: Vec<Video>) -> Vec<Video> {
        let incoming = candidates.len();
        let survivors: Vec<Video> = candidates
            .into_iter()
            .filter(|video| self.admit(video))
            .collect();

        tracing::debug!(
            incoming,
            kept = survivors.len(),
            "Filter stage applied"
        );

        survivors
    }

    fn admit(&mut self, video: &Video) -> bool {
        if video.id.is_empty() || self.seen.contains(&video.id) {
            return false;
        }
        if self.blocked_channels.contains(&video.channel_id) {
            return false;
        }
        if self.matches_ng_keyword(video) {
            return false;
        }
        if let Some(threshold) = self.negative_threshold {
            let keywords = candidate_keywords(&video.title, &video.channel_name);
            if negative_weight(&self.negative, &keywords) > threshold {
                return false;
            }
        }

        self.seen.insert(video.id.clone());
        true
    }

    fn matches_ng_keyword(&self, video: &Video) -> bool {
        if self.ng_keywords.is_empty() {
            return false;
        }
        let full_text = format!("{} {}", video.title, video.channel_name).to_lowercase();
        self.ng_keywords.iter().any(|ng| full_text.contains(ng.as_str()))
    }
}
