use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::services::session::FeedSessionId;

/// HTTP header carrying the scroll-session ID
pub const FEED_SESSION_HEADER: &str = "x-feed-session";

/// Extracts the feed session from the request header or starts a new one.
///
/// The ID is stored in the request extensions for handlers and echoed on
/// the response so the client can send it back with the next page. A
/// missing or unparseable header starts a fresh session.
pub async fn feed_session_middleware(mut request: Request, next: Next) -> Response {
    let session_id = request
        .headers()
        .get(FEED_SESSION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .map(FeedSessionId)
        .unwrap_or_default();

    request.extensions_mut().insert(session_id);

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&session_id.as_str()) {
        response
            .headers_mut()
            .insert(FEED_SESSION_HEADER, header_value);
    }

    response
}

/// Tracing span for one request, tagged with its feed session
pub fn make_span_with_session(request: &Request<Body>) -> tracing::Span {
    let session = request
        .extensions()
        .get::<FeedSessionId>()
        .map(|id| id.as_str())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        feed_session = %session,
    )
}
