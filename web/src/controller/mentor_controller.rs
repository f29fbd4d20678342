use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::{AppState, Error};
use domain::{mentorship_request as MentorshipRequestApi, review as ReviewApi, Id};
use log::*;
use service::config::ApiVersion;

/// GET how many mentees a mentor has accepted and whether they can take more
#[utoipa::path(
    get,
    path = "/mentors/{mentor_id}/capacity",
    params(
        ApiVersion,
        ("mentor_id" = Uuid, Path, description = "Mentor's user id"),
    ),
    responses(
        (status = 200, description = "accepted, capacity and full for the mentor"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn capacity(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(_user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(mentor_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET capacity of mentor {mentor_id}");

    let capacity = MentorshipRequestApi::mentor_capacity(app_state.db_conn_ref(), mentor_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), capacity)))
}

/// GET every Review left for a mentor along with the average rating
#[utoipa::path(
    get,
    path = "/mentors/{mentor_id}/reviews",
    params(
        ApiVersion,
        ("mentor_id" = Uuid, Path, description = "Mentor's user id"),
    ),
    responses(
        (status = 200, description = "average, count and reviews for the mentor"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reviews(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(_user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(mentor_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET reviews of mentor {mentor_id}");

    let reviews = ReviewApi::mentor_reviews(app_state.db_conn_ref(), mentor_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), reviews)))
}
