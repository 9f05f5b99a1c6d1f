//! Responses for denied requests.
//!
//! A denial never looks like an error: either a plain redirect or a stock
//! web-server welcome page.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};

const DECOY_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Welcome to nginx!</title>
<style>
body { width: 35em; margin: 0 auto; font-family: Tahoma, Verdana, Arial, sans-serif; }
</style>
</head>
<body>
<h1>Welcome to nginx!</h1>
<p>If you see this page, the nginx web server is successfully installed and working. Further configuration is required.</p>
<p><em>Thank you for using nginx.</em></p>
</body>
</html>
"#;

/// Render the denial response for `redirect_url` (empty = decoy page).
pub fn render(redirect_url: &str) -> Response {
    if redirect_url.is_empty() {
        return decoy_page();
    }
    match HeaderValue::from_str(redirect_url) {
        Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(_) => {
            tracing::warn!(redirect_url, "Redirect target is not a valid header value, serving decoy page");
            decoy_page()
        }
    }
}

fn decoy_page() -> Response {
    Html(DECOY_PAGE).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_when_configured() {
        let response = render("https://example.com/");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "https://example.com/");
    }

    #[tokio::test]
    async fn test_decoy_page_otherwise() {
        let response = render("");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Welcome to nginx!"));
        assert!(!body.to_lowercase().contains("proxy"));
    }

    #[test]
    fn test_invalid_redirect_falls_back_to_decoy() {
        let response = render("https://example.com/\r\n");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
