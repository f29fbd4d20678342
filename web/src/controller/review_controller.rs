use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::review::CreateParams;
use crate::{AppState, Error};
use domain::{review as ReviewApi, Id};
use log::*;
use service::config::ApiVersion;

/// GET the Reviews left on a Mentorship Request
#[utoipa::path(
    get,
    path = "/mentorship_requests/{id}/reviews",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Mentorship Request id"),
    ),
    responses(
        (status = 200, description = "Reviews of the Mentorship Request, newest first", body = [domain::mentorship_reviews::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a participant of this Mentorship Request"),
        (status = 404, description = "Mentorship Request not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Reviews for Mentorship Request {id}");

    let reviews =
        ReviewApi::find_by_mentorship_request(app_state.db_conn_ref(), id, user.user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), reviews)))
}

/// POST a Review of a completed or chat-closed Mentorship Request. Students only, once per request.
#[utoipa::path(
    post,
    path = "/mentorship_requests/{id}/reviews",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Mentorship Request id"),
    ),
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully submitted a Review", body = [domain::mentorship_reviews::Model]),
        (status = 400, description = "Rating must be between 1 and 5"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the student of this Mentorship Request may review it"),
        (status = 404, description = "Mentorship Request not found"),
        (status = 409, description = "Already reviewed (returned as `existing`)"),
        (status = 422, description = "Mentorship is not finished yet"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Review of Mentorship Request {id} by {}: {params:?}", user.user_id);

    let review = ReviewApi::submit(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        id,
        user.user_id,
        params.rating,
        params.comment,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), review)))
}
