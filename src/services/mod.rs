pub mod affinity;
pub mod aggregator;
pub mod channel;
pub mod filter;
pub mod keywords;
pub mod providers;
pub mod recommendations;
pub mod scorer;
pub mod selector;
pub mod session;
pub mod title_search;
pub mod video;

pub use providers::{ContentProvider, HttpContentProvider};
pub use recommendations::{get_xrai_recommendations, get_xrai_shorts};
pub use session::{FeedKind, FeedSessionId, SessionLimits, SessionStore};
