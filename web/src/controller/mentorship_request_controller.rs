use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::mentorship_request::{
    CloseChatParams, CreateParams, IndexParams, UpdateStatusParams,
};
use crate::{AppState, Error};
use domain::{mentorship_request as MentorshipRequestApi, Id};
use log::*;
use service::config::ApiVersion;

/// POST create a new Mentorship Request from the authenticated student to a mentor
#[utoipa::path(
    post,
    path = "/mentorship_requests",
    params(ApiVersion),
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully created a new pending Mentorship Request", body = [domain::mentorship_requests::Model]),
        (status = 400, description = "Missing field of interest or a request to oneself"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Mentor not found"),
        (status = 409, description = "Capacity exceeded, or an open request already exists for this mentor (returned as `existing`)"),
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
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a new Mentorship Request from {}: {params:?}", user.user_id);

    let mentorship_request = MentorshipRequestApi::create(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        user.user_id,
        params.into(),
    )
    .await?;

    debug!("New Mentorship Request: {mentorship_request:?}");

    Ok(Json(ApiResponse::new(
        StatusCode::CREATED.into(),
        mentorship_request,
    )))
}

/// GET all Mentorship Requests, optionally filtered by student, mentor or status
#[utoipa::path(
    get,
    path = "/mentorship_requests",
    params(
        ApiVersion,
        IndexParams,
    ),
    responses(
        (status = 200, description = "Successfully retrieved all Mentorship Requests", body = [domain::mentorship_requests::Model]),
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
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Mentorship Requests");
    debug!("Filter Params: {params:?}");

    let mentorship_requests =
        MentorshipRequestApi::find_by(app_state.db_conn_ref(), params.apply_sort_defaults())
            .await?;

    debug!("Found {} Mentorship Requests", mentorship_requests.len());

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        mentorship_requests,
    )))
}

/// GET a particular Mentorship Request specified by its id.
#[utoipa::path(
    get,
    path = "/mentorship_requests/{id}",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Mentorship Request id to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved a Mentorship Request", body = [domain::mentorship_requests::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a participant of this Mentorship Request"),
        (status = 404, description = "Mentorship Request not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn read(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Mentorship Request by id: {id}");

    let mentorship_request =
        MentorshipRequestApi::find_for_participant(app_state.db_conn_ref(), id, &user).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        mentorship_request,
    )))
}

/// PUT the status of a Mentorship Request. Only its mentor may accept, decline or complete it.
#[utoipa::path(
    put,
    path = "/mentorship_requests/{id}/status",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Id of the Mentorship Request to update"),
    ),
    request_body = UpdateStatusParams,
    responses(
        (status = 200, description = "Successfully updated the Mentorship Request's status", body = [domain::mentorship_requests::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the mentor of this Mentorship Request"),
        (status = 404, description = "Mentorship Request not found"),
        (status = 409, description = "Mentor is at full capacity"),
        (status = 422, description = "Transition not allowed from the current status"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_status(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<UpdateStatusParams>,
) -> Result<impl IntoResponse, Error> {
    info!(
        "PUT Mentorship Request {id} status to {} by {}",
        params.status, user.user_id
    );

    let mentorship_request = MentorshipRequestApi::transition_status(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        id,
        user.user_id,
        params.status,
    )
    .await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        mentorship_request,
    )))
}

/// PUT close the chat of an accepted or completed Mentorship Request, recording a reason.
#[utoipa::path(
    put,
    path = "/mentorship_requests/{id}/close_chat",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Id of the Mentorship Request whose chat to close"),
    ),
    request_body = CloseChatParams,
    responses(
        (status = 200, description = "Successfully closed the chat", body = [domain::mentorship_requests::Model]),
        (status = 400, description = "A reason is required"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the mentor of this Mentorship Request"),
        (status = 404, description = "Mentorship Request not found"),
        (status = 422, description = "Chat already closed or the request was never accepted"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn close_chat(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<CloseChatParams>,
) -> Result<impl IntoResponse, Error> {
    info!("PUT close chat of Mentorship Request {id} by {}", user.user_id);

    let mentorship_request = MentorshipRequestApi::close_chat(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        id,
        user.user_id,
        params.reason,
    )
    .await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        mentorship_request,
    )))
}
