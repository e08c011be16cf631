use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{ChannelRef, Video};

/// A channel the user explicitly blocked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockedChannel {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A video the user explicitly hid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HiddenVideo {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// Snapshot of the caller's behavioral signals for one feed build
///
/// Loaded by the caller from its own storage. The ranking core only reads
/// it and never keeps it past the call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BehaviorSignals {
    /// Most recent first
    #[serde(default)]
    pub search_history: Vec<String>,
    /// Most recent first
    #[serde(default)]
    pub watch_history: Vec<Video>,
    /// Most recent first
    #[serde(default)]
    pub shorts_history: Vec<Video>,
    #[serde(default)]
    pub subscribed_channels: Vec<ChannelRef>,
    #[serde(default)]
    pub ng_keywords: Vec<String>,
    #[serde(default)]
    pub ng_channels: Vec<BlockedChannel>,
    #[serde(default)]
    pub hidden_videos: Vec<HiddenVideo>,
    /// Keyword → accumulated "not interested" weight
    #[serde(default)]
    pub negative_keywords: HashMap<String, f64>,
}

impl BehaviorSignals {
    /// True when there is nothing to personalize from
    pub fn is_cold_start(&self) -> bool {
        self.watch_history.is_empty()
            && self.shorts_history.is_empty()
            && self.subscribed_channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_deserializes() {
        let signals: BehaviorSignals = serde_json::from_str("{}").unwrap();
        assert!(signals.is_cold_start());
        assert!(signals.negative_keywords.is_empty());
    }

    #[test]
    fn test_subscriptions_end_cold_start() {
        let signals: BehaviorSignals = serde_json::from_str(
            r#"{"subscribed_channels":[{"id":"UC1","name":"Lofi Girl"}]}"#,
        )
        .unwrap();
        assert!(!signals.is_cold_start());
        assert_eq!(signals.subscribed_channels[0].name, "Lofi Girl");
    }

    #[test]
    fn test_negative_keywords_deserialize() {
        let signals: BehaviorSignals =
            serde_json::from_str(r#"{"negative_keywords":{"prank":1.5}}"#).unwrap();
        assert_eq!(signals.negative_keywords.get("prank"), Some(&1.5));
    }
}
