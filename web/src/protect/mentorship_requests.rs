use crate::protect::{authorize, Predicate, UserIsAdmin};
use crate::{extractors::authenticated_user::AuthenticatedUser, AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};

/// Listing every mentorship request on the platform is an administrative view.
pub(crate) async fn index(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    let checks = vec![Predicate::new(UserIsAdmin, vec![])];
    authorize(&app_state, identity, request, next, checks).await
}
