use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use crate::cache::CacheSnapshot;

pub const RSS_CONTENT_TYPE: &str = "application/xml";

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Serialize a snapshot as the combined feed.
///
/// Always answers 200: a serialization failure is logged and sent as an
/// empty body.
pub fn rss_document(snapshot: &CacheSnapshot) -> Response {
    let body = match snapshot.to_xml() {
        Ok(body) => {
            debug!("writing {} items", snapshot.items.len());
            body
        }
        Err(err) => {
            error!("error serializing cache: {}", err);
            Vec::new()
        }
    };

    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, RSS_CONTENT_TYPE)],
        body,
    )
        .into_response();

    if let Some(refreshed_at) = snapshot.refreshed_at {
        let stamp = refreshed_at.format(HTTP_DATE).to_string();
        if let Ok(value) = HeaderValue::from_str(&stamp) {
            response.headers_mut().insert(header::LAST_MODIFIED, value);
        }
    }

    response
}
