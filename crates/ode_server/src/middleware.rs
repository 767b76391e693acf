//! Request extractors and middleware

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};

/// Extract the key from an `Authorization: Token <key>` or `Bearer <key>` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Token ")
                .or_else(|| value.strip_prefix("Bearer "))
        })
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

/// The session credential carried in the `Authorization` header, if any
#[derive(Debug, Clone, Default)]
pub struct SessionToken(pub Option<String>);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(extract_bearer_token(&parts.headers).map(str::to_string)))
    }
}

/// Log every response that ends in a 5xx
pub async fn log_server_errors(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    if response.status().is_server_error() {
        tracing::error!("{} {} failed with {}", method, uri, response.status());
    }
    response
}
