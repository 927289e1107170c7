//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Static resources are consulted
//! first; only requests they do not consume continue to the remaining routes.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hyper::{Method, Request};

use crate::config::{AppState, HealthConfig};
use crate::consumer::OpenedResource;
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};

/// Outcome of routing a single request
pub struct Routed {
    pub response: HttpResponse,
    pub static_hit: bool,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<HttpResponse, Infallible> {
    let started = Instant::now();
    let routed = route_request(req.method(), req.uri().path(), &state).await;

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.query = req.uri().query().map(ToString::to_string);
        entry.http_version = version_label(req.version()).to_string();
        entry.status = routed.response.status().as_u16();
        entry.body_bytes = response_length(&routed.response);
        entry.user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        entry.static_hit = routed.static_hit;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(routed.response)
}

/// Route request based on method and path
pub async fn route_request(method: &Method, path: &str, state: &AppState) -> Routed {
    if let Some(response) = check_http_method(method) {
        return Routed {
            response,
            static_hit: false,
        };
    }

    match state.static_resources.open(path).await {
        Ok(Some(OpenedResource {
            location,
            size,
            stream,
        })) => {
            let response = if *method == Method::HEAD {
                http::build_head_response(size)
            } else {
                http::build_resource_response(stream, size, location)
            };
            Routed {
                response,
                static_hit: true,
            }
        }
        Ok(None) => Routed {
            response: fallback_route(path, &state.config.health),
            static_hit: false,
        },
        Err(e) => {
            logger::log_error(&format!("Static resource failure for '{path}': {e}"));
            Routed {
                response: http::build_500_response(),
                static_hit: e.is_streaming_failure(),
            }
        }
    }
}

/// Only GET and HEAD reach the static resource layer
fn check_http_method(method: &Method) -> Option<HttpResponse> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Routes for requests no static root consumed
fn fallback_route(path: &str, health: &HealthConfig) -> HttpResponse {
    if health.enabled && (path == health.liveness_path || path == health.readiness_path) {
        return http::build_health_response("ok");
    }
    http::build_404_response()
}

fn response_length(response: &HttpResponse) -> usize {
    response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::consumer::RequestStaticResourceConsumer;
    use crate::registry::StaticResourceRegistry;
    use http_body_util::BodyExt;
    use hyper::body::Bytes;
    use hyper::StatusCode;
    use std::fs;

    fn state_with(registry: StaticResourceRegistry) -> AppState {
        let mut config = Config::load_from("/definitely/not/a/config/file").unwrap();
        config.logging.access_log = false;
        AppState::new(
            config,
            RequestStaticResourceConsumer::new(Arc::new(registry)),
        )
    }

    async fn body_of(routed: Routed) -> Bytes {
        routed.response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_packaged_root_serves_index() {
        let mut registry = StaticResourceRegistry::new();
        registry.configure_packaged_root("public").unwrap();
        let state = state_with(registry);

        let routed = route_request(&Method::GET, "/", &state).await;
        assert!(routed.static_hit);
        assert_eq!(routed.response.status(), StatusCode::OK);
        assert_eq!(
            body_of(routed).await,
            &include_bytes!("../../assets/public/index.html")[..]
        );
    }

    #[tokio::test]
    async fn test_external_root_after_packaged() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.js"), "console.log('hi');").unwrap();

        let mut registry = StaticResourceRegistry::new();
        registry.configure_packaged_root("public").unwrap();
        registry
            .configure_external_root(&dir.path().to_string_lossy())
            .unwrap();
        let state = state_with(registry);

        let routed = route_request(&Method::GET, "/app.js", &state).await;
        assert!(routed.static_hit);
        assert_eq!(body_of(routed).await, "console.log('hi');");
    }

    #[tokio::test]
    async fn test_unconsumed_request_falls_through() {
        let state = state_with(StaticResourceRegistry::new());

        let routed = route_request(&Method::GET, "/healthz", &state).await;
        assert!(!routed.static_hit);
        assert_eq!(routed.response.status(), StatusCode::OK);

        let routed = route_request(&Method::GET, "/index.html", &state).await;
        assert_eq!(routed.response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_file_shadows_health_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("healthz"), "static").unwrap();

        let mut registry = StaticResourceRegistry::new();
        registry
            .configure_external_root(&dir.path().to_string_lossy())
            .unwrap();
        let state = state_with(registry);

        let routed = route_request(&Method::GET, "/healthz", &state).await;
        assert!(routed.static_hit);
        assert_eq!(body_of(routed).await, "static");
    }

    #[tokio::test]
    async fn test_head_request() {
        let mut registry = StaticResourceRegistry::new();
        registry.configure_packaged_root("public").unwrap();
        let state = state_with(registry);

        let routed = route_request(&Method::HEAD, "/css/site.css", &state).await;
        assert!(routed.static_hit);
        let expected_len = include_bytes!("../../assets/public/css/site.css").len();
        assert_eq!(response_length(&routed.response), expected_len);
        assert!(body_of(routed).await.is_empty());
    }

    #[tokio::test]
    async fn test_other_methods_are_not_consumed() {
        let mut registry = StaticResourceRegistry::new();
        registry.configure_packaged_root("public").unwrap();
        let state = state_with(registry);

        let routed = route_request(&Method::POST, "/", &state).await;
        assert!(!routed.static_hit);
        assert_eq!(routed.response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let routed = route_request(&Method::OPTIONS, "/", &state).await;
        assert_eq!(routed.response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_handle_request_with_access_log() {
        let mut registry = StaticResourceRegistry::new();
        registry.configure_packaged_root("public").unwrap();
        let mut state = state_with(registry);
        state.config.logging.access_log = true;

        let req = Request::get("/docs/?lang=en").body(()).unwrap();
        let peer: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let response = handle_request(req, peer, Arc::new(state)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_large_external_file_is_streamed_whole() {
        let dir = tempfile::tempdir().unwrap();
        let content: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(dir.path().join("big.bin"), &content).unwrap();

        let mut registry = StaticResourceRegistry::new();
        registry
            .configure_external_root(&dir.path().to_string_lossy())
            .unwrap();
        let state = state_with(registry);

        let routed = route_request(&Method::GET, "/big.bin", &state).await;
        assert_eq!(response_length(&routed.response), content.len());
        assert_eq!(body_of(routed).await, content);
    }

    #[test]
    fn test_version_label() {
        assert_eq!(version_label(hyper::Version::HTTP_10), "1.0");
        assert_eq!(version_label(hyper::Version::HTTP_11), "1.1");
        assert_eq!(version_label(hyper::Version::HTTP_2), "2");
    }
}
