//! Failure injection tests: unreachable and misbehaving upstreams.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::{header, StatusCode};
use registry_proxy::config::ActiveConfig;
use tokio::net::TcpListener;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

mod common;
use common::ORIGIN;

/// Counts warn-and-above events emitted by the proxy crate.
#[derive(Clone, Default)]
struct ProxyAlerts {
    count: Arc<AtomicUsize>,
    fetch_errors: Arc<AtomicUsize>,
}

impl<S: Subscriber> Layer<S> for ProxyAlerts {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !meta.target().starts_with("registry_proxy") || *meta.level() > Level::WARN {
            return;
        }
        self.count.fetch_add(1, Ordering::SeqCst);
        if *meta.level() == Level::ERROR {
            self.fetch_errors.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Collects the message of every error event emitted by the proxy crate.
#[derive(Clone, Default)]
struct ErrorMessages(Arc<Mutex<Vec<String>>>);

struct MessageField<'a>(&'a mut String);

impl Visit for MessageField<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for ErrorMessages {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !meta.target().starts_with("registry_proxy") || *meta.level() != Level::ERROR {
            return;
        }
        let mut message = String::new();
        event.record(&mut MessageField(&mut message));
        self.0.lock().unwrap().push(message);
    }
}

// Current-thread runtime: the proxy tasks run on this thread and see the
// thread-local subscriber.
#[tokio::test]
async fn test_unreachable_upstream_returns_500_and_logs_once() {
    let alerts = ProxyAlerts::default();
    let subscriber = tracing_subscriber::registry().with(alerts.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let upstream = common::unused_addr().await;
    let proxy = common::start_proxy(common::config_for(upstream)).await;

    let response = common::client()
        .get(proxy.url("/v2/library/alpine/manifests/latest"))
        .header(header::HOST, ORIGIN)
        .header(header::USER_AGENT, "docker/24.0.7")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text().await.unwrap(), "Internal Server Error");
    assert_eq!(alerts.count.load(Ordering::SeqCst), 1);
    assert_eq!(alerts.fetch_errors.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_upstream_is_not_retried() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            // Hang up without answering.
            drop(socket);
        }
    });

    let proxy = common::start_proxy(common::config_for(upstream)).await;
    let response = common::client()
        .get(proxy.url("/v2/"))
        .header(header::HOST, ORIGIN)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_denial_is_logged_as_warning_not_error() {
    let alerts = ProxyAlerts::default();
    let subscriber = tracing_subscriber::registry().with(alerts.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let upstream = common::unused_addr().await;
    let mut config = common::config_for(upstream);
    config.policy.ua_whitelist_regex = "^docker/".to_string();
    let proxy = common::start_proxy(config).await;

    let response = common::client()
        .get(proxy.url("/v2/"))
        .header(header::USER_AGENT, "Mozilla/5.0")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(alerts.count.load(Ordering::SeqCst), 1);
    assert_eq!(alerts.fetch_errors.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_proxy_recovers_after_upstream_failure() {
    let upstream = common::unused_addr().await;
    let proxy = common::start_proxy(common::config_for(upstream)).await;
    let client = common::client();

    let failed = client.get(proxy.url("/v2/")).send().await.unwrap();
    assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The port is free again; bring a real upstream up on it.
    let listener = TcpListener::bind(upstream).await.unwrap();
    tokio::spawn(async move {
        let router = axum::Router::new().route("/v2/", axum::routing::get(|| async { "{}" }));
        let _ = axum::serve(listener, router).await;
    });

    let recovered = client.get(proxy.url("/v2/")).send().await.unwrap();
    assert_eq!(recovered.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_uncompiled_pattern_reported_as_policy_error() {
    let messages = ErrorMessages::default();
    let subscriber = tracing_subscriber::registry().with(messages.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let upstream = common::unused_addr().await;
    let proxy = common::start_proxy(common::config_for(upstream)).await;

    // A pattern the compiled cache has never seen.
    let mut active = ActiveConfig::compile(common::config_for(upstream)).unwrap();
    active.config.policy.pathname_regex = "^/v2/".to_string();
    proxy.config.store(Arc::new(active));

    let response = common::client()
        .get(proxy.url("/v2/"))
        .header(header::HOST, ORIGIN)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        *messages.0.lock().unwrap(),
        vec!["Policy evaluation failed".to_string()]
    );
}
