//! Error types for the request pipeline.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors that abort a proxied request.
///
/// Policy denials are not errors; they are rendered by [`crate::http::denial`].
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    #[error("failed to read upstream body: {0}")]
    UpstreamBody(#[source] reqwest::Error),

    #[error("invalid upstream url {url}: {source}")]
    InvalidUpstreamUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("pattern {0:?} is not compiled")]
    MalformedPattern(String),

    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status_code(), "Internal Server Error").into_response()
    }
}
