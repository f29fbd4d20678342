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

/// GET how many active requests a student has and how many more they may send
#[utoipa::path(
    get,
    path = "/users/{user_id}/mentorship_usage",
    params(
        ApiVersion,
        ("user_id" = Uuid, Path, description = "Student's user id"),
    ),
    responses(
        (status = 200, description = "active, limit and remaining for the student"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn read(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(_user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(user_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET active request usage of student {user_id}");

    let usage = MentorshipRequestApi::student_usage(app_state.db_conn_ref(), user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), usage)))
}
