//! Error types for the `domain` layer.
use entity::mentorship_status::MentorshipStatus;
use entity::{mentorship_requests, mentorship_reviews};
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. The intent is to translate errors between layers while maintaining
/// layer boundaries. Ex. `domain` is dependent on `entity_api`, and `web` is dependent on `domain`.
/// but `web` should not be dependent, directly, on `entity_api`. Ultimately the various
/// `error_kind`s are used by `web` to return appropriate HTTP status codes and messages to the client.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
    /// Expected, user-facing outcomes of the mentorship lifecycle rules.
    Mentorship(MentorshipErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    Config,
    Other(String),
}

/// Enum representing the various kinds of entity errors that can bubble up from the "Entity" layer (`entity_api` and `entity`).
/// These errors are translated from the `entity_api` layer to the `domain` layer and reduced to a subset of error kinds
/// that are relevant to the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    Invalid,
    Conflict,
    DbTransaction,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Unauthenticated,
    Other(String),
}

/// Rule violations of the mentorship lifecycle. Each carries enough context
/// for a client to explain the outcome without a second call.
#[derive(Debug, PartialEq)]
pub enum MentorshipErrorKind {
    /// Malformed input such as an empty message or a rating outside 1..=5.
    InvalidArgument(String),
    /// The caller is not the participant the action belongs to.
    PermissionDenied(String),
    /// The referenced request or mentor does not exist.
    NotFound(String),
    /// The action is not valid in the request's current state.
    FailedPrecondition(String),
    CapacityExceeded(CapacityLimit),
    AlreadyExists(Conflict),
    InvalidTransition {
        from: MentorshipStatus,
        to: MentorshipStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityLimit {
    /// The student already has the maximum number of pending/accepted requests.
    StudentActiveRequests { limit: u64 },
    /// The mentor already has the maximum number of accepted mentees.
    MentorAccepted { limit: u64 },
}

impl fmt::Display for CapacityLimit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CapacityLimit::StudentActiveRequests { limit } => write!(
                f,
                "You already have {limit} active mentorship requests. Wait for a response or close one before requesting another mentor."
            ),
            CapacityLimit::MentorAccepted { limit } => write!(
                f,
                "This mentor is at full capacity ({limit} active mentees)."
            ),
        }
    }
}

/// The record that already occupies the slot a caller tried to fill.
#[derive(Debug, PartialEq)]
pub enum Conflict {
    MentorshipRequest(Box<mentorship_requests::Model>),
    Review(Box<mentorship_reviews::Model>),
}

impl Error {
    pub(crate) fn mentorship(error_kind: MentorshipErrorKind) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Mentorship(error_kind),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::mentorship(MentorshipErrorKind::InvalidArgument(message.into()))
    }

    pub(crate) fn permission_denied(message: impl Into<String>) -> Self {
        Self::mentorship(MentorshipErrorKind::PermissionDenied(message.into()))
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::mentorship(MentorshipErrorKind::NotFound(message.into()))
    }

    pub(crate) fn failed_precondition(message: impl Into<String>) -> Self {
        Self::mentorship(MentorshipErrorKind::FailedPrecondition(message.into()))
    }

    pub(crate) fn config() -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }

    /// True when the underlying entity error says the record was absent.
    pub(crate) fn is_entity_not_found(&self) -> bool {
        self.error_kind
            == DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
    }

    pub(crate) fn is_entity_conflict(&self) -> bool {
        self.error_kind
            == DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Conflict))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let entity_error_kind = match err.error_kind {
            EntityApiErrorKind::RecordNotFound => EntityErrorKind::NotFound,
            EntityApiErrorKind::InvalidQueryTerm | EntityApiErrorKind::ValidationError => {
                EntityErrorKind::Invalid
            }
            EntityApiErrorKind::RecordAlreadyExists => EntityErrorKind::Conflict,
            EntityApiErrorKind::SystemError | EntityApiErrorKind::RecordNotUpdated => {
                EntityErrorKind::DbTransaction
            }
            EntityApiErrorKind::Other => EntityErrorKind::Other("EntityErrorKind".to_string()),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)),
        }
    }
}

// Transaction begin/commit failures surface directly as `DbErr`.
impl From<sea_orm::DbErr> for Error {
    fn from(err: sea_orm::DbErr) -> Self {
        EntityApiError::from(err).into()
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Errors that result from issues building the reqwest::Client instance. This
        // type of error will occur prior to any network calls being made.
        if err.is_builder() {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Failed to build reqwest client".to_string(),
                )),
            }
        // Errors that result from issues with the network call itself.
        } else {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::External(ExternalErrorKind::Unauthenticated),
        }
    }
}
