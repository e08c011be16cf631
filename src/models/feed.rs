use serde::{Deserialize, Serialize};

use super::{ChannelRef, Comment, PlaylistRef, Video};

/// Long-form plus short-form home feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HomeFeed {
    pub videos: Vec<Video>,
    pub shorts: Vec<Video>,
}

impl HomeFeed {
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty() && self.shorts.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ShortsFeed {
    pub videos: Vec<Video>,
}

/// One page of a page-indexed listing
///
/// `next_page_token` is `page + 1` when more items are known to exist
/// beyond this slice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchPage {
    pub videos: Vec<Video>,
    pub shorts: Vec<Video>,
    pub channels: Vec<ChannelRef>,
    pub playlists: Vec<PlaylistRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelatedResponse {
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentsResponse {
    pub comments: Vec<Comment>,
}

/// One page of a channel's uploads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelVideosPage {
    pub videos: Vec<Video>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl From<PageSlice<Video>> for ChannelVideosPage {
    fn from(slice: PageSlice<Video>) -> Self {
        Self {
            videos: slice.items,
            next_page_token: slice.next_page_token,
        }
    }
}
