use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::message::CreateParams;
use crate::{AppState, Error};
use domain::{conversation as ConversationApi, Id};
use log::*;
use service::config::ApiVersion;

/// GET the conversation of a Mentorship Request along with its chat state
#[utoipa::path(
    get,
    path = "/mentorship_requests/{id}/messages",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Mentorship Request id"),
    ),
    responses(
        (status = 200, description = "Messages in the order they were posted, plus status, chat_closed_reason and chat_closed_at"),
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
    debug!("GET Messages for Mentorship Request {id}");

    let conversation =
        ConversationApi::list_messages(app_state.db_conn_ref(), id, user.user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), conversation)))
}

/// POST a new Message to an accepted Mentorship Request whose chat is open
#[utoipa::path(
    post,
    path = "/mentorship_requests/{id}/messages",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Mentorship Request id"),
    ),
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully posted a Message", body = [domain::messages::Model]),
        (status = 400, description = "Message text is required"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a participant of this Mentorship Request"),
        (status = 404, description = "Mentorship Request not found"),
        (status = 422, description = "Chat is not open"),
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
    debug!("POST Message to Mentorship Request {id} from {}", user.user_id);

    let message = ConversationApi::post_message(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        id,
        user.user_id,
        params.content,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), message)))
}

/// PUT mark every Message the other participant sent as read
#[utoipa::path(
    put,
    path = "/mentorship_requests/{id}/messages/read",
    params(
        ApiVersion,
        ("id" = Uuid, Path, description = "Mentorship Request id"),
    ),
    responses(
        (status = 200, description = "Number of Messages marked as read"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a participant of this Mentorship Request"),
        (status = 404, description = "Mentorship Request not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_read(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT mark Messages read on Mentorship Request {id} for {}", user.user_id);

    let updated = ConversationApi::mark_read(app_state.db_conn_ref(), id, user.user_id).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        json!({ "updated": updated }),
    )))
}
