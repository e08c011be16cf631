use serde::Deserialize;

use crate::services::session::SessionLimits;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Base URL of the upstream content bridge
    #[serde(default = "default_upstream_api_url")]
    pub upstream_api_url: String,

    /// Per-request timeout for upstream calls, in seconds
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    /// Language hint forwarded to the upstream
    #[serde(default = "default_upstream_language")]
    pub upstream_language: String,

    /// Region hint forwarded to the upstream
    #[serde(default = "default_upstream_region")]
    pub upstream_region: String,

    /// Maximum number of feed sessions tracked at once
    #[serde(default = "default_session_capacity")]
    pub session_capacity: usize,

    /// Item IDs remembered per feed session
    #[serde(default = "default_session_max_seen")]
    pub session_max_seen: usize,

    /// Minutes of inactivity after which a feed session is forgotten
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: i64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_upstream_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    10
}

fn default_upstream_language() -> String {
    "ja".to_string()
}

fn default_upstream_region() -> String {
    "JP".to_string()
}

fn default_session_capacity() -> usize {
    10_000
}

fn default_session_max_seen() -> usize {
    5_000
}

fn default_session_idle_minutes() -> i64 {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            capacity: self.session_capacity,
            max_seen: self.session_max_seen,
            idle_ttl: chrono::Duration::minutes(self.session_idle_minutes.max(1)),
        }
    }
}

/// Tunable ranking constants
///
/// Absolute values are tunable; the ratios between the affinity weights are
/// what shape the feed. Every field can be overridden with a `RANKING_`
/// prefixed environment variable (e.g. `RANKING_SHORTS_POPULAR_RATIO=0.8`).
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RankingConfig {
    // Home feed
    pub home_target_videos: usize,
    pub home_trending_ratio: f64,
    pub home_target_shorts: usize,
    pub home_negative_threshold: f64,
    pub home_history_seeds: usize,
    pub home_subscription_seeds: usize,

    // Shorts feed
    pub shorts_batch_size: usize,
    pub shorts_popular_ratio: f64,
    pub shorts_seed_keywords: usize,
    pub shorts_seed_queries: usize,
    pub shorts_score_floor: f64,
    /// Hard negative-signal cut for shorts; unset means penalty only
    pub shorts_negative_threshold: Option<f64>,

    // Selector
    pub popular_sample_floor: usize,
    pub channel_cooldown: u32,

    // Affinity weights
    pub subscription_weight: f64,
    pub shorts_title_weight: f64,
    pub shorts_channel_weight: f64,
    pub watch_title_weight: f64,
    pub watch_channel_weight: f64,
    pub recency_decay: f64,
    pub shorts_history_window: usize,
    pub watch_history_window: usize,

    // Scorer
    pub content_match_scale: f64,
    pub subscription_bonus: f64,
    pub negative_penalty: f64,
    pub exploration_noise: f64,

    // Continuation budgets
    pub related_target: usize,
    pub related_max_continuations: usize,
    pub comments_target: usize,
    pub comments_max_continuations: usize,
    pub channel_page_size: usize,
    pub search_page_size: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            home_target_videos: 50,
            home_trending_ratio: 0.40,
            home_target_shorts: 20,
            home_negative_threshold: 2.0,
            home_history_seeds: 5,
            home_subscription_seeds: 3,

            shorts_batch_size: 20,
            shorts_popular_ratio: 0.85,
            shorts_seed_keywords: 4,
            shorts_seed_queries: 2,
            shorts_score_floor: -50.0,
            shorts_negative_threshold: None,

            popular_sample_floor: 50,
            channel_cooldown: 3,

            subscription_weight: 5.0,
            shorts_title_weight: 3.0,
            shorts_channel_weight: 4.0,
            watch_title_weight: 1.5,
            watch_channel_weight: 2.0,
            recency_decay: 10.0,
            shorts_history_window: 30,
            watch_history_window: 20,

            content_match_scale: 100.0,
            subscription_bonus: 50.0,
            negative_penalty: 20.0,
            exploration_noise: 15.0,

            related_target: 50,
            related_max_continuations: 2,
            comments_target: 300,
            comments_max_continuations: 5,
            channel_page_size: 30,
            search_page_size: 20,
        }
    }
}

impl RankingConfig {
    /// Load ranking overrides from `RANKING_*` environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::prefixed("RANKING_")
            .from_env::<RankingConfig>()
            .map_err(|e| anyhow::anyhow!("Failed to load ranking config: {}", e))
    }

    /// Same constants with the exploration noise switched off
    pub fn deterministic(mut self) -> Self {
        self.exploration_noise = 0.0;
        self
    }
}
