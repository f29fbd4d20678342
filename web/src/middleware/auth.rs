use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::jwt;
use log::*;

/// Pulls the bearer token out of an `Authorization` header value. Clients that
/// lost their token sometimes send the literal strings "null" or "undefined";
/// those count as missing.
fn bearer_token(header_value: &str) -> Option<&str> {
    let token = header_value
        .strip_prefix("Bearer ")
        .or_else(|| header_value.strip_prefix("bearer "))?
        .trim();

    match token {
        "" | "null" | "undefined" => None,
        token => Some(token),
    }
}

/// Authentication middleware that returns 401 Unauthorized for requests without a
/// valid bearer token. On success the caller's [`jwt::Identity`] is stored in the
/// request extensions for the `AuthenticatedUser` extractor.
pub async fn require_auth(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token);

    let Some(token) = token else {
        debug!("Rejecting request to {} without a bearer token", request.uri());
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    };

    match jwt::decode_identity(app_state.config(), token) {
        Ok(identity) => {
            trace!("Authenticated user {}", identity.user_id);
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            warn!("Rejecting request with invalid bearer token: {e:?}");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}
