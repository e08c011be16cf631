pub mod feed_session;

pub use feed_session::{feed_session_middleware, make_span_with_session, FEED_SESSION_HEADER};
