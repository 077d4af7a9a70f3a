//! Engine.IO connection URL construction.
//!
//! Transliterated from `original_source/engineio/client.py`'s
//! `_get_engineio_url`/`_get_url_timestamp` into idiomatic Rust: scheme
//! upgrade (http→ws, https→wss), a stripped endpoint path, the original
//! query string preserved with a conditional `&` separator, and a
//! cache-busting timestamp query parameter appended to every polling GET.

use crate::error::Error;
use crate::transport::TransportKind;

impl TransportKind {
    fn query_name(self) -> &'static str {
        match self {
            TransportKind::Polling => "polling",
            TransportKind::WebSocket => "websocket",
        }
    }
}

/// Build the base connection URL for `transport`, per §4.1 of the spec:
/// `scheme://netloc/path/?query&transport=<t>&EIO=3`.
pub fn build_engineio_url(
    url: &str,
    path: &str,
    transport: TransportKind,
) -> Result<String, Error> {
    let parsed = url::Url::parse(url)?;
    let path = path.trim_matches('/');

    let mut scheme = match transport {
        TransportKind::Polling => "http",
        TransportKind::WebSocket => "ws",
    }
    .to_string();
    if matches!(parsed.scheme(), "https" | "wss") {
        scheme.push('s');
    }

    let netloc = match parsed.port() {
        Some(port) => format!("{}:{}", parsed.host_str().unwrap_or_default(), port),
        None => parsed.host_str().unwrap_or_default().to_string(),
    };

    let query = parsed.query().unwrap_or("");
    let sep = if query.is_empty() { "" } else { "&" };

    Ok(format!(
        "{scheme}://{netloc}/{path}/?{query}{sep}transport={transport}&EIO=3",
        transport = transport.query_name(),
    ))
}

/// A cache-busting `&t=<timestamp>` query parameter, appended to every
/// polling GET (handshake and subsequent reads alike).
pub fn url_timestamp() -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format!("&t={}", now.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_polling_url_http() {
        let url = build_engineio_url("http://example.com", "engine.io", TransportKind::Polling)
            .unwrap();
        assert_eq!(url, "http://example.com/engine.io/?transport=polling&EIO=3");
    }

    #[test]
    fn builds_websocket_url_upgrades_scheme() {
        let url = build_engineio_url(
            "https://example.com",
            "/engine.io/",
            TransportKind::WebSocket,
        )
        .unwrap();
        assert_eq!(url, "wss://example.com/engine.io/?transport=websocket&EIO=3");
    }

    #[test]
    fn preserves_existing_query_with_separator() {
        let url = build_engineio_url(
            "http://example.com?foo=bar",
            "engine.io",
            TransportKind::Polling,
        )
        .unwrap();
        assert_eq!(
            url,
            "http://example.com/engine.io/?foo=bar&transport=polling&EIO=3"
        );
    }

    #[test]
    fn preserves_port() {
        let url = build_engineio_url(
            "http://example.com:8080",
            "engine.io",
            TransportKind::Polling,
        )
        .unwrap();
        assert_eq!(
            url,
            "http://example.com:8080/engine.io/?transport=polling&EIO=3"
        );
    }

    #[test]
    fn timestamp_is_a_query_fragment() {
        let ts = url_timestamp();
        assert!(ts.starts_with("&t="));
    }
}
