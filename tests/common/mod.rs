//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;
use registry_proxy::config::{ActiveConfig, ProxyConfig, SharedConfig};
use registry_proxy::http::UpstreamDispatcher;
use registry_proxy::{HttpServer, Shutdown};
use tokio::net::TcpListener;

/// Host header clients use to reach the proxy in tests.
pub const ORIGIN: &str = "mirror.example.test";

/// A running proxy. Dropping it stops the server.
///
/// The listener is bound before this is returned, so requests queue even if
/// the accept loop has not been polled yet.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub config: SharedConfig,
    shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `router` as a mock upstream on an ephemeral port.
pub async fn start_upstream(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Config that proxies to `upstream` over plain http.
pub fn config_for(upstream: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.hostname = upstream.to_string();
    config.upstream.protocol = "http".to_string();
    config
}

/// Start the proxy with `config` on an ephemeral port.
pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let shared = ActiveConfig::compile(config).unwrap().into_shared();
    // Ignore any HTTP_PROXY in the test environment.
    let dispatcher = UpstreamDispatcher::with_client(
        reqwest::Client::builder().no_proxy().build().unwrap(),
    );
    let server = HttpServer::with_dispatcher(shared.clone(), dispatcher);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy {
        addr,
        config: shared,
        shutdown,
    }
}

/// Client that talks to the proxy directly and never follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
