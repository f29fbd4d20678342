use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use domain::error::{
    Conflict, DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind,
    InternalErrorKind, MentorshipErrorKind,
};

extern crate log;
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

fn error_body(status: StatusCode, error: &str, message: impl Into<String>) -> Value {
    json!({
        "status_code": status.as_u16(),
        "error": error,
        "message": message.into(),
    })
}

fn mentorship_response(kind: MentorshipErrorKind) -> (StatusCode, Value) {
    match kind {
        MentorshipErrorKind::InvalidArgument(message) => (
            StatusCode::BAD_REQUEST,
            error_body(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", message),
        ),
        MentorshipErrorKind::PermissionDenied(message) => (
            StatusCode::FORBIDDEN,
            error_body(StatusCode::FORBIDDEN, "PERMISSION_DENIED", message),
        ),
        MentorshipErrorKind::NotFound(message) => (
            StatusCode::NOT_FOUND,
            error_body(StatusCode::NOT_FOUND, "NOT_FOUND", message),
        ),
        MentorshipErrorKind::FailedPrecondition(message) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_body(
                StatusCode::UNPROCESSABLE_ENTITY,
                "FAILED_PRECONDITION",
                message,
            ),
        ),
        MentorshipErrorKind::CapacityExceeded(limit) => (
            StatusCode::CONFLICT,
            error_body(StatusCode::CONFLICT, "CAPACITY_EXCEEDED", limit.to_string()),
        ),
        MentorshipErrorKind::AlreadyExists(conflict) => {
            // The existing record is returned so the client can pick up where it left off
            let (message, existing) = match conflict {
                Conflict::MentorshipRequest(request) => (
                    "You already have a mentorship request with this mentor",
                    json!(request),
                ),
                Conflict::Review(review) => (
                    "You have already reviewed this mentorship",
                    json!(review),
                ),
            };
            let mut body = error_body(StatusCode::CONFLICT, "ALREADY_EXISTS", message);
            body["existing"] = existing;
            (StatusCode::CONFLICT, body)
        }
        MentorshipErrorKind::InvalidTransition { from, to } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_body(
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_TRANSITION",
                format!("Cannot change a {from} request to {to}"),
            ),
        ),
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.0.error_kind {
            DomainErrorKind::Mentorship(mentorship_error_kind) => {
                let (status, body) = mentorship_response(mentorship_error_kind);
                (status, Json(body)).into_response()
            }
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Entity(entity_error_kind) => match entity_error_kind {
                    EntityErrorKind::NotFound => {
                        (StatusCode::NOT_FOUND, "NOT FOUND").into_response()
                    }
                    EntityErrorKind::Invalid => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE ENTITY").into_response()
                    }
                    EntityErrorKind::Conflict => {
                        (StatusCode::CONFLICT, "CONFLICT").into_response()
                    }
                    EntityErrorKind::DbTransaction | EntityErrorKind::Other(_) => {
                        error!("Database error: {:?}", self.0.source);
                        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                    }
                },
                InternalErrorKind::Config | InternalErrorKind::Other(_) => {
                    error!("Internal error: {:?}", self.0.source);
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::Network => {
                    (StatusCode::BAD_GATEWAY, "BAD GATEWAY").into_response()
                }
                ExternalErrorKind::Unauthenticated => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED").into_response()
                }
                ExternalErrorKind::Other(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
            },
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
