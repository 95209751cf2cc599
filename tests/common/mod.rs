#![allow(dead_code)]

use axum::extract::ConnectInfo;
use axum_test::TestServer;
use link_shortener::domain::entities::{Link, NewLink};
use link_shortener::domain::repositories::LinkRepository;
use link_shortener::domain::visit_event::VisitEvent;
use link_shortener::routes::router;
use link_shortener::state::{AppState, Backends};
use chrono::{Duration, Utc};
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tower::Layer;

pub const BASE_URL: &str = "https://sho.rt";
pub const CACHE_TTL: u64 = 86_400;

/// In-process stores and cache, plus the receiving end of the visit queue.
pub fn create_memory_state() -> (AppState, mpsc::Receiver<VisitEvent>, Backends) {
    let backends = Backends::in_memory(1_000, CACHE_TTL);
    let (tx, rx) = mpsc::channel(100);
    let state = AppState::new(&backends, tx, BASE_URL, CACHE_TTL);

    (state, rx, backends)
}

/// Full router (no rate limiting) with a fake peer address.
pub fn create_test_server(state: AppState) -> TestServer {
    TestServer::new(router(state).layer(MockConnectInfoLayer)).unwrap()
}

pub async fn create_link(backends: &Backends, code: &str, url: &str) -> Link {
    backends
        .links
        .create(NewLink {
            original_url: url.to_string(),
            short_code: code.to_string(),
            expires_at: None,
        })
        .await
        .unwrap()
}

pub async fn create_expired_link(backends: &Backends, code: &str, url: &str) -> Link {
    backends
        .links
        .create(NewLink {
            original_url: url.to_string(),
            short_code: code.to_string(),
            expires_at: Some(Utc::now() - Duration::hours(1)),
        })
        .await
        .unwrap()
}

/// Inserts `ConnectInfo` the way `into_make_service_with_connect_info` would.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
