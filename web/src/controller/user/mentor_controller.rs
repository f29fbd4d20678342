use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{mentorship_request as MentorshipRequestApi, Id};
use service::config::ApiVersion;

use log::*;

/// GET a student's current mentors, i.e. their accepted Mentorship Requests
#[utoipa::path(
    get,
    path = "/users/{user_id}/mentors",
    params(
        ApiVersion,
        ("user_id" = Uuid, Path, description = "Student's user id"),
    ),
    responses(
        (status = 200, description = "Successfully retrieved the student's accepted Mentorship Requests", body = [domain::mentorship_requests::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(_user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(user_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET mentors of student {user_id}");

    let mentorship_requests =
        MentorshipRequestApi::find_mentors_of(app_state.db_conn_ref(), user_id).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        mentorship_requests,
    )))
}
