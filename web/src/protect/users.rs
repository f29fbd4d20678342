use crate::protect::{authorize, Predicate, UserIsSelfOrAdmin};
use crate::{extractors::authenticated_user::AuthenticatedUser, AppState};
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::IntoResponse,
};
use domain::Id;

/// Checks that the authenticated user is the user named in the path, or an admin.
/// Intended to be given to axum::middleware::from_fn_with_state in the router
pub(crate) async fn read(
    State(app_state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(user_id): Path<Id>,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    let checks = vec![Predicate::new(UserIsSelfOrAdmin, vec![user_id])];
    authorize(&app_state, identity, request, next, checks).await
}
