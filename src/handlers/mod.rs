pub mod districts;
pub mod orders;

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    response::Json,
};
use serde_json::json;

use crate::db;
use crate::errors::ServiceError;
use crate::AppState;

/// Client address as the proxy forwarded it, falling back to the socket peer.
/// The service is expected to run behind a proxy that sets these headers.
pub(crate) fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
        })
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

pub async fn service_banner() -> &'static str {
    "courier-api up"
}

/// Liveness probe backed by a database ping; 500 when the pool is gone.
pub async fn health(State(state): State<AppState>) -> Result<&'static str, ServiceError> {
    db::check_connection(state.db.as_ref()).await?;
    Ok("OK")
}

/// Echo the caller's address back; returns null when it cannot be determined.
pub async fn get_ip(
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> Json<serde_json::Value> {
    let ip = client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    Json(json!({ "ip_address": ip }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_header_wins_over_peer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        let peer = Some("192.168.1.1:4242".parse().unwrap());
        assert_eq!(client_ip(&headers, peer).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn falls_back_to_peer_address() {
        let headers = HeaderMap::new();
        let peer = Some("192.168.1.1:4242".parse().unwrap());
        assert_eq!(client_ip(&headers, peer).as_deref(), Some("192.168.1.1"));
    }

    #[test]
    fn no_source_yields_none() {
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }
}
