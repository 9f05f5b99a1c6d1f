//! HTTP server setup and the proxy pipeline.
//!
//! # Responsibilities
//! - Create the Axum router; every method and path goes to one handler
//! - Wire up middleware (request ID, tracing)
//! - Run each request through resolve → gate → forward → rewrite
//! - Serve until the shutdown trigger fires, draining in-flight requests

use std::borrow::Cow;
use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, request::Parts, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ActiveConfig, SharedConfig};
use crate::error::ProxyError;
use crate::http::denial;
use crate::http::request::{build_outbound_headers, origin_hostname, outbound_body, request_id};
use crate::http::response::{build_response, rewrite_body, rewrite_headers, ResponsePayload};
use crate::http::upstream::UpstreamDispatcher;
use crate::lifecycle::shutdown::wait as shutdown_requested;
use crate::observability::{metrics, RequestContext};
use crate::routing::{resolve, UpstreamTarget};
use crate::security::access_control::client_ip_string;
use crate::security::{AccessGate, Decision, GateRequest};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: SharedConfig,
    pub dispatcher: UpstreamDispatcher,
}

/// HTTP server for the registry proxy.
pub struct HttpServer {
    router: Router,
    config: SharedConfig,
}

impl HttpServer {
    /// Create a server reading from a handle that may be swapped by a watcher.
    pub fn with_shared(config: SharedConfig) -> Result<Self, ProxyError> {
        Ok(Self::with_dispatcher(config, UpstreamDispatcher::new()?))
    }

    /// Create a server with a preconfigured upstream client.
    pub fn with_dispatcher(config: SharedConfig, dispatcher: UpstreamDispatcher) -> Self {
        let state = AppState {
            config: config.clone(),
            dispatcher,
        };
        Self {
            router: Self::build_router(state),
            config,
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        {
            let active = self.config.load();
            tracing::info!(
                address = %addr,
                upstream = %active.config.upstream.hostname,
                protocol = %active.config.upstream.protocol,
                debug = active.config.debug,
                "HTTP server starting"
            );
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_requested(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// The proxy pipeline. Every request runs against one configuration snapshot.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let active = state.config.load_full();
    let (parts, body) = request.into_parts();

    let ctx = RequestContext {
        request_id: request_id(&parts.headers).to_string(),
        client_ip: client_ip_string(peer.ip()),
        user_agent: parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        url: parts.uri.to_string(),
    };
    let method = parts.method.as_str().to_string();

    tracing::debug!(
        request_id = %ctx.request_id,
        method = %method,
        url = %ctx.url,
        "Proxying request"
    );

    let target = resolve(parts.uri.path(), parts.uri.query(), &active.config.upstream);

    let gate = AccessGate::new(&active.config.policy, &active.patterns);
    let gate_request = GateRequest {
        path: parts.uri.path(),
        user_agent: &ctx.user_agent,
        client_ip: &ctx.client_ip,
    };
    let decision = gate.evaluate(&gate_request, &target);

    let response = match decision {
        Ok(Decision::Allow) => {
            match forward(&state.dispatcher, &active, parts, body, &target).await {
                Ok(response) => response,
                Err(e) => {
                    ctx.log_failure(&e);
                    metrics::record_upstream_failure();
                    e.into_response()
                }
            }
        }
        Ok(Decision::Deny(reason)) => {
            ctx.log_denied(reason);
            metrics::record_denied(reason.as_str());
            denial::render(&active.config.policy.redirect_url)
        }
        // Nothing was sent upstream.
        Err(e) => {
            ctx.log_policy_error(&e);
            metrics::record_policy_error();
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), &target.hostname, start);
    response
}

/// Send the request upstream and turn the answer into the client response.
async fn forward(
    dispatcher: &UpstreamDispatcher,
    active: &ActiveConfig,
    parts: Parts,
    body: Body,
    target: &UpstreamTarget,
) -> Result<Response, ProxyError> {
    let origin = origin_hostname(&parts.headers, &parts.uri);
    let url = target.url()?;

    let headers = build_outbound_headers(&parts.headers, &origin, &target.hostname);
    let body = outbound_body(&parts.method, body);

    let upstream = dispatcher.dispatch(url, parts.method, headers, body).await?;
    let (status, headers, payload) = upstream.into_payload().await?;
    let headers = rewrite_headers(&headers, &target.hostname, &origin, active.config.debug);

    let payload = match payload {
        ResponsePayload::Text(text) => {
            let rewritten =
                match rewrite_body(&text, &target.hostname, active.path_suffix(), &origin) {
                    Cow::Owned(rewritten) => Some(rewritten),
                    Cow::Borrowed(_) => None,
                };
            ResponsePayload::Text(rewritten.unwrap_or(text))
        }
        stream => stream,
    };

    Ok(build_response(status, headers, payload))
}
