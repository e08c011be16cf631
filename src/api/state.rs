use std::sync::Arc;

use crate::{
    config::RankingConfig,
    services::{
        providers::ContentProvider,
        session::{SessionLimits, SessionStore},
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn ContentProvider>,
    pub ranking: Arc<RankingConfig>,
    /// Scroll sessions owned by the HTTP layer
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        ranking: RankingConfig,
        session_limits: SessionLimits,
    ) -> Self {
        Self {
            provider,
            ranking: Arc::new(ranking),
            sessions: Arc::new(SessionStore::new(session_limits)),
        }
    }
}
