//! # HTTP Server
//!
//! Serves the calculate endpoint alongside liveness, readiness and
//! Prometheus routes on a single hyper listener. Every accepted
//! connection runs on its own task; requests share no mutable state.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tracing::{debug, info, Instrument};

use crate::api;
use crate::errors::{error_logging, AppResult};
use crate::estimator::EmissionStrategy;
use crate::observability::{
    check_request_size, http_span, record_error_metrics, record_request_metrics, MAX_REQUEST_SIZE,
};

/// Shared, read-only state handed to every connection
pub struct AppState {
    strategy: Box<dyn EmissionStrategy>,
    metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(strategy: Box<dyn EmissionStrategy>, metrics: Option<PrometheusHandle>) -> Self {
        Self { strategy, metrics }
    }

    pub fn strategy(&self) -> &dyn EmissionStrategy {
        self.strategy.as_ref()
    }
}

/// Bind the listening socket
pub async fn bind(addr: SocketAddr) -> AppResult<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "Server listening");
    Ok(listener)
}

/// Accept connections until the task is dropped
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> AppResult<()> {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                let state = Arc::clone(&state);

                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = hyper::service::service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, Infallible>(route(req, &state).await) }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        let peer = peer_addr.to_string();
                        error_logging::log_network_error(&err, "serve_connection", Some(&peer));
                    }
                });
            }
            Err(e) => {
                record_error_metrics("accept", "http");
                error_logging::log_network_error(&e, "accept", None);
            }
        }
    }
}

/// Metric label for a request path; unknown paths share one label
pub fn route_label(path: &str) -> &'static str {
    match path {
        "/calculate" => "/calculate",
        "/health/live" => "/health/live",
        "/health/ready" => "/health/ready",
        "/metrics" => "/metrics",
        _ => "other",
    }
}

/// Dispatch one request and record its metrics
pub async fn route(req: Request<Incoming>, state: &AppState) -> Response<String> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = async {
        match (&method, path.as_str()) {
            (&Method::POST, "/calculate") => calculate(req, state).await,
            (_, "/calculate") => {
                let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
                response
                    .headers_mut()
                    .insert(ALLOW, HeaderValue::from_static("POST"));
                response
            }
            (&Method::GET, "/health/live") | (&Method::GET, "/health/ready") => {
                text_response(StatusCode::OK, "OK")
            }
            (&Method::GET, "/metrics") => match &state.metrics {
                Some(handle) => text_response(StatusCode::OK, handle.render()),
                None => text_response(StatusCode::NOT_FOUND, "Not Found"),
            },
            _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
        }
    }
    .instrument(http_span(method.as_str(), &path))
    .await;

    debug!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %started.elapsed().as_millis(),
        "Request handled"
    );
    record_request_metrics(
        method.as_str(),
        route_label(&path),
        response.status().as_u16(),
        started.elapsed(),
    );
    response
}

async fn calculate(req: Request<Incoming>, state: &AppState) -> Response<String> {
    if !check_request_size(&req) {
        record_error_metrics("payload_too_large", "http");
        return text_response(StatusCode::PAYLOAD_TOO_LARGE, "Request too large");
    }

    let body = match collect_limited(req.into_body()).await {
        Ok(body) => body,
        Err(BodyError::TooLarge) => {
            record_error_metrics("payload_too_large", "http");
            return text_response(StatusCode::PAYLOAD_TOO_LARGE, "Request too large");
        }
        Err(BodyError::Unreadable(e)) => {
            // An unreadable body carries no text
            record_error_metrics("body_read", "http");
            debug!(error = %e, "Failed to read request body");
            Bytes::new()
        }
    };

    let (status, payload) = api::respond(&body, state.strategy());
    json_response(status, payload)
}

/// Why a request body could not be collected
#[derive(Debug)]
enum BodyError {
    TooLarge,
    Unreadable(String),
}

/// Collect a body, failing once it grows past `MAX_REQUEST_SIZE`
async fn collect_limited<B>(body: B) -> Result<Bytes, BodyError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, MAX_REQUEST_SIZE as usize).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(BodyError::TooLarge),
        Err(e) => Err(BodyError::Unreadable(e.to_string())),
    }
}

fn text_response(status: StatusCode, body: impl Into<String>) -> Response<String> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response
}

fn json_response(status: StatusCode, body: String) -> Response<String> {
    let mut response = text_response(status, body);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_route_label() {
        assert_eq!(route_label("/calculate"), "/calculate");
        assert_eq!(route_label("/health/live"), "/health/live");
        assert_eq!(route_label("/health/ready"), "/health/ready");
        assert_eq!(route_label("/metrics"), "/metrics");
        assert_eq!(route_label("/calculate/extra"), "other");
        assert_eq!(route_label("/junk42"), "other");
    }

    #[test]
    fn test_unknown_paths_share_one_series() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            for i in 0..50 {
                let path = format!("/junk{}", i);
                record_request_metrics(
                    "GET",
                    route_label(&path),
                    404,
                    std::time::Duration::from_millis(1),
                );
            }
        });

        let rendered = handle.render();
        let series = rendered
            .lines()
            .filter(|line| line.starts_with("http_requests_total{"))
            .count();
        assert_eq!(series, 1, "rendered metrics:\n{}", rendered);
    }

    #[tokio::test]
    async fn test_collect_limited_within_limit() {
        let body = Full::new(Bytes::from_static(br#"{"text": "rice - 1"}"#));
        let collected = collect_limited(body).await.unwrap();
        assert_eq!(&collected[..], br#"{"text": "rice - 1"}"#);
    }

    #[tokio::test]
    async fn test_collect_limited_rejects_oversized_stream() {
        let body = Full::new(Bytes::from(vec![b'a'; MAX_REQUEST_SIZE as usize + 1]));
        assert!(matches!(
            collect_limited(body).await,
            Err(BodyError::TooLarge)
        ));
    }

    #[test]
    fn test_json_response_headers() {
        let response = json_response(StatusCode::BAD_REQUEST, "{}".to_string());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(response.body(), "{}");
    }

    #[test]
    fn test_text_response() {
        let response = text_response(StatusCode::NOT_FOUND, "Not Found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }
}
