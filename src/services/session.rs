//! Caller-owned scroll sessions.
//!
//! The feed services are stateless; the HTTP layer keeps what each scroll
//! session has already been shown here and passes it back in on the next
//! page. Nothing in the ranking code reads or writes this store.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::Video;

/// Identifies one client scroll session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedSessionId(pub Uuid);

impl FeedSessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for FeedSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FeedSessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Home,
    Shorts,
}

/// What one session has been shown, oldest first
///
/// An item ID is recorded at most once. Past `max_seen` IDs the oldest are
/// forgotten, so a very long scroll can eventually resurface them.
#[derive(Debug, Clone)]
pub struct FeedSession {
    shown: VecDeque<String>,
    index: HashSet<String>,
    max_seen: usize,
    touched_at: DateTime<Utc>,
}

impl FeedSession {
    pub fn new(max_seen: usize) -> Self {
        Self {
            shown: VecDeque::new(),
            index: HashSet::new(),
            max_seen: max_seen.max(1),
            touched_at: Utc::now(),
        }
    }

    /// Appends the unseen items and returns exactly those, in input order
    pub fn extend(&mut self, items: Vec<Video>) -> Vec<Video> {
        self.touched_at = Utc::now();
        let fresh: Vec<Video> = items
            .into_iter()
            .filter(|video| {
                if self.index.insert(video.id.clone()) {
                    self.shown.push_back(video.id.clone());
                    true
                } else {
                    false
                }
            })
            .collect();

        while self.shown.len() > self.max_seen {
            if let Some(oldest) = self.shown.pop_front() {
                self.index.remove(&oldest);
            }
        }
        fresh
    }

    pub fn seen_ids(&self) -> Vec<String> {
        self.shown.iter().cloned().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    pub fn len(&self) -> usize {
        self.shown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }

    /// True once the session has gone untouched for longer than `idle_ttl`
    pub fn is_idle(&self, now: DateTime<Utc>, idle_ttl: Duration) -> bool {
        now - self.touched_at > idle_ttl
    }
}

/// Limits applied to every tracked session
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Maximum number of live sessions
    pub capacity: usize,
    /// IDs remembered per session
    pub max_seen: usize,
    /// Sessions idle longer than this are dropped
    pub idle_ttl: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            max_seen: 5_000,
            idle_ttl: Duration::minutes(30),
        }
    }
}

struct Sessions {
    entries: HashMap<(FeedSessionId, FeedKind), (u64, FeedSession)>,
    /// Monotonic use counter; the lowest stamp is the least recently used
    clock: u64,
}

/// Bounded map of live sessions
///
/// Idle sessions expire; past capacity the least recently used is evicted.
pub struct SessionStore {
    sessions: RwLock<Sessions>,
    limits: SessionLimits,
}

impl SessionStore {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            sessions: RwLock::new(Sessions {
                entries: HashMap::new(),
                clock: 0,
            }),
            limits: SessionLimits {
                capacity: limits.capacity.max(1),
                ..limits
            },
        }
    }

    /// IDs already shown in this session, oldest first
    ///
    /// An idle session reads as empty even before it is pruned.
    pub async fn seen_ids(&self, id: FeedSessionId, kind: FeedKind) -> Vec<String> {
        let now = Utc::now();
        self.sessions
            .read()
            .await
            .entries
            .get(&(id, kind))
            .filter(|(_, session)| !session.is_idle(now, self.limits.idle_ttl))
            .map(|(_, session)| session.seen_ids())
            .unwrap_or_default()
    }

    /// Records a freshly assembled batch, returning only what is new to the session
    pub async fn record(&self, id: FeedSessionId, kind: FeedKind, items: Vec<Video>) -> Vec<Video> {
        let mut guard = self.sessions.write().await;
        let sessions = &mut *guard;
        prune_idle(sessions, Utc::now(), self.limits.idle_ttl);
        sessions.clock += 1;
        let stamp = sessions.clock;

        if !sessions.entries.contains_key(&(id, kind))
            && sessions.entries.len() >= self.limits.capacity
        {
            let oldest = sessions
                .entries
                .iter()
                .min_by_key(|(_, (used, _))| *used)
                .map(|(key, _)| *key);
            if let Some(key) = oldest {
                sessions.entries.remove(&key);
                tracing::debug!(session = %key.0, "Evicted least recently used feed session");
            }
        }

        let max_seen = self.limits.max_seen;
        let (used, session) = sessions
            .entries
            .entry((id, kind))
            .or_insert_with(|| (0, FeedSession::new(max_seen)));
        *used = stamp;
        session.extend(items)
    }

    /// Drops every session idle at `now`, returning how many were removed
    pub async fn prune_idle(&self, now: DateTime<Utc>) -> usize {
        let mut guard = self.sessions.write().await;
        prune_idle(&mut guard, now, self.limits.idle_ttl)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.entries.is_empty()
    }
}

fn prune_idle(sessions: &mut Sessions, now: DateTime<Utc>, idle_ttl: Duration) -> usize {
    let before = sessions.entries.len();
    sessions
        .entries
        .retain(|_, (_, session)| !session.is_idle(now, idle_ttl));
    let pruned = before - sessions.entries.len();
    if pruned > 0 {
        tracing::debug!(pruned, "Expired idle feed sessions");
    }
    pruned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str) -> Video {
        Video {
            id: id.to_string(),
            title: String::new(),
            channel_id: String::new(),
            channel_name: String::new(),
            duration: String::new(),
            iso_duration: String::new(),
            thumbnail_url: None,
            views: None,
            uploaded_at: None,
            origin: None,
        }
    }

    fn limits(capacity: usize) -> SessionLimits {
        SessionLimits {
            capacity,
            ..Default::default()
        }
    }

    fn ids(videos: &[Video]) -> Vec<&str> {
        videos.iter().map(|v| v.id.as_str()).collect()
    }

    #[test]
    fn test_extend_returns_only_unseen() {
        let mut session = FeedSession::new(100);
        let first = session.extend(vec![video("a"), video("b"), video("a")]);
        let second = session.extend(vec![video("b"), video("c")]);

        assert_eq!(ids(&first), vec!["a", "b"]);
        assert_eq!(ids(&second), vec!["c"]);
        assert_eq!(session.seen_ids(), ["a", "b", "c"]);
        assert!(session.contains("c"));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated_by_id_and_kind() {
        let store = SessionStore::new(limits(10));
        let one = FeedSessionId::new();
        let two = FeedSessionId::new();

        store.record(one, FeedKind::Shorts, vec![video("x")]).await;

        assert_eq!(store.seen_ids(one, FeedKind::Shorts).await, vec!["x"]);
        assert!(store.seen_ids(one, FeedKind::Home).await.is_empty());
        assert!(store.seen_ids(two, FeedKind::Shorts).await.is_empty());
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let store = SessionStore::new(limits(2));
        let first = FeedSessionId::new();
        let second = FeedSessionId::new();
        let third = FeedSessionId::new();

        store.record(first, FeedKind::Home, vec![video("a")]).await;
        store.record(second, FeedKind::Home, vec![video("b")]).await;
        store.record(first, FeedKind::Home, vec![video("c")]).await;
        store.record(third, FeedKind::Home, vec![video("d")]).await;

        assert_eq!(store.len().await, 2);
        assert_eq!(store.seen_ids(first, FeedKind::Home).await, vec!["a", "c"]);
        assert!(store.seen_ids(second, FeedKind::Home).await.is_empty());
    }

    #[test]
    fn test_seen_list_is_capped() {
        let mut session = FeedSession::new(3);
        session.extend(vec![video("a"), video("b"), video("c")]);
        let fresh = session.extend(vec![video("d"), video("e")]);

        assert_eq!(ids(&fresh), vec!["d", "e"]);
        assert_eq!(session.len(), 3);
        assert_eq!(session.seen_ids(), vec!["c", "d", "e"]);
        assert!(!session.contains("a"));
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let store = SessionStore::new(SessionLimits {
            capacity: 10,
            max_seen: 100,
            idle_ttl: Duration::minutes(30),
        });
        let id = FeedSessionId::new();
        store.record(id, FeedKind::Shorts, vec![video("x")]).await;

        assert_eq!(store.prune_idle(Utc::now()).await, 0);
        assert_eq!(store.seen_ids(id, FeedKind::Shorts).await, vec!["x"]);

        assert_eq!(store.prune_idle(Utc::now() + Duration::hours(1)).await, 1);
        assert!(store.is_empty().await);
    }
}
