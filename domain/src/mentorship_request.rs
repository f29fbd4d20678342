//! Matching Engine: admission control and the status state machine for
//! mentorship requests.
//!
//! Capacity counts are re-derived from rows on every call. Any count that
//! decides a write is taken while holding the advisory lock of the participant
//! it counts for, inside the transaction that performs the write.

use crate::error::{CapacityLimit, Conflict, Error, MentorshipErrorKind};
use crate::jwt::Identity;
use crate::mentorship_requests::Model;
use crate::mentorship_status::MentorshipStatus;
use crate::{profile, Id};
use entity_api::query::{IntoQueryFilterMap, QuerySort};
use entity_api::{mentorship_request, mentorship_requests, query, user};
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};

pub use entity_api::mentorship_request::{decline_duplicates, find_by_id};

/// Maximum number of `pending` + `accepted` requests a student may hold.
pub const STUDENT_ACTIVE_LIMIT: u64 = 5;

/// Maximum number of `accepted` requests a mentor may hold.
pub const MENTOR_CAPACITY: u64 = 5;

/// Who is attempting a status transition, relative to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Student,
    Mentor,
}

use MentorshipStatus::*;

/// Every allowed status transition. Anything not listed is rejected.
const TRANSITIONS: [(MentorshipStatus, Actor, MentorshipStatus); 3] = [
    (Pending, Actor::Mentor, Accepted),
    (Pending, Actor::Mentor, Declined),
    (Accepted, Actor::Mentor, Completed),
];

/// Checks a transition against the table.
///
/// A transition that exists for some other actor is a permission problem; one
/// that exists for nobody is an invalid transition. Same-state "transitions"
/// are invalid, never no-ops. Nothing leaves a terminal state, whoever asks.
pub fn validate_transition(
    from: MentorshipStatus,
    actor: Actor,
    to: MentorshipStatus,
) -> Result<(), Error> {
    if from.is_terminal() {
        return Err(Error::mentorship(MentorshipErrorKind::InvalidTransition {
            from,
            to,
        }));
    }

    if TRANSITIONS.contains(&(from, actor, to)) {
        return Ok(());
    }

    if TRANSITIONS
        .iter()
        .any(|(table_from, _, table_to)| *table_from == from && *table_to == to)
    {
        return Err(Error::permission_denied(format!(
            "Only the mentor may move a request from {from} to {to}"
        )));
    }

    Err(Error::mentorship(MentorshipErrorKind::InvalidTransition {
        from,
        to,
    }))
}

/// The caller's role on `request`, if any.
pub fn actor_for(request: &Model, caller_id: Id) -> Option<Actor> {
    if request.is_mentor(caller_id) {
        Some(Actor::Mentor)
    } else if request.student_id == caller_id {
        Some(Actor::Student)
    } else {
        None
    }
}

/// Fields a student supplies when asking a mentor for mentorship.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NewMentorshipRequest {
    pub mentor_id: Id,
    pub field_of_interest: String,
    pub description: Option<String>,
    pub goals: Option<String>,
    pub preferred_time: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MentorCapacity {
    pub accepted: u64,
    pub capacity: u64,
    pub full: bool,
}

impl MentorCapacity {
    fn from_accepted(accepted: u64) -> Self {
        Self {
            accepted,
            capacity: MENTOR_CAPACITY,
            full: accepted >= MENTOR_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StudentUsage {
    pub active: u64,
    pub limit: u64,
    pub remaining: u64,
}

impl StudentUsage {
    fn from_active(active: u64) -> Self {
        Self {
            active,
            limit: STUDENT_ACTIVE_LIMIT,
            remaining: STUDENT_ACTIVE_LIMIT.saturating_sub(active),
        }
    }
}

/// Trims optional free text, turning blank values into `None`.
fn normalize(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn to_event_value(request: &Model) -> serde_json::Value {
    serde_json::to_value(request).unwrap_or_default()
}

/// Creates a `pending` request from `student_id` to `new_request.mentor_id`.
///
/// Checks run in a fixed order and the first failure wins: the mentor must
/// exist, both participants get a profile, the student must be under their
/// active limit, the mentor must be under capacity, and the pair must not
/// already have an open request. In the last case the existing request is
/// returned inside the error so the client can resume it.
pub async fn create(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    student_id: Id,
    new_request: NewMentorshipRequest,
) -> Result<Model, Error> {
    let field_of_interest = new_request.field_of_interest.trim().to_string();
    if field_of_interest.is_empty() {
        return Err(Error::invalid_argument("A field of interest is required"));
    }
    let mentor_id = new_request.mentor_id;
    if mentor_id == student_id {
        return Err(Error::invalid_argument(
            "You cannot request mentorship from yourself",
        ));
    }

    let mentor = user::find_by_id(db, mentor_id).await.map_err(|err| {
        let err: Error = err.into();
        if err.is_entity_not_found() {
            warn!("Mentorship request to unknown mentor {mentor_id}");
            Error::not_found(format!("Mentor {mentor_id} not found"))
        } else {
            err
        }
    })?;

    let student = user::find_by_id(db, student_id).await.map_err(|err| {
        let err: Error = err.into();
        if err.is_entity_not_found() {
            Error::failed_precondition(format!(
                "Could not create a profile for unknown user {student_id}"
            ))
        } else {
            err
        }
    })?;
    profile::ensure_participant(db, &student).await?;
    profile::ensure_participant(db, &mentor).await?;

    let txn = db.begin().await?;
    mentorship_request::lock_participants(&txn, &[student_id, mentor_id]).await?;

    let active = mentorship_request::count_active_for_student(&txn, student_id).await?;
    if active >= STUDENT_ACTIVE_LIMIT {
        warn!("Student {student_id} is at the active request limit ({active})");
        return Err(Error::mentorship(MentorshipErrorKind::CapacityExceeded(
            CapacityLimit::StudentActiveRequests {
                limit: STUDENT_ACTIVE_LIMIT,
            },
        )));
    }

    let accepted = mentorship_request::count_accepted_for_mentor(&txn, mentor_id).await?;
    if accepted >= MENTOR_CAPACITY {
        warn!("Mentor {mentor_id} is at full capacity ({accepted})");
        return Err(Error::mentorship(MentorshipErrorKind::CapacityExceeded(
            CapacityLimit::MentorAccepted {
                limit: MENTOR_CAPACITY,
            },
        )));
    }

    if let Some(existing) =
        mentorship_request::find_open_for_pair(&txn, student_id, mentor_id).await?
    {
        info!(
            "Student {student_id} already has request {} ({}) with mentor {mentor_id}",
            existing.id, existing.status
        );
        return Err(Error::mentorship(MentorshipErrorKind::AlreadyExists(
            Conflict::MentorshipRequest(Box::new(existing)),
        )));
    }

    let now = chrono::Utc::now();
    let request = mentorship_request::create(
        &txn,
        Model {
            id: Id::nil(),
            student_id,
            mentor_id: Some(mentor_id),
            field_of_interest,
            description: normalize(new_request.description),
            goals: normalize(new_request.goals),
            preferred_time: normalize(new_request.preferred_time),
            status: MentorshipStatus::Pending,
            chat_closed_reason: None,
            chat_closed_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        },
    )
    .await?;

    txn.commit().await?;
    info!(
        "Created mentorship request {} from student {student_id} to mentor {mentor_id}",
        request.id
    );

    event_publisher
        .publish(DomainEvent::MentorshipRequestCreated {
            mentorship_request: to_event_value(&request),
            notify_user_ids: vec![mentor_id],
        })
        .await;

    Ok(request)
}

/// Moves a request to `new_status` on behalf of `caller_id`.
///
/// Acceptance re-checks the mentor's capacity under the mentor's advisory
/// lock, so concurrent accepts and creates cannot push a mentor past the limit.
pub async fn transition_status(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    request_id: Id,
    caller_id: Id,
    new_status: MentorshipStatus,
) -> Result<Model, Error> {
    let txn = db.begin().await?;
    let request = find_locked(&txn, request_id).await?;

    let actor = actor_for(&request, caller_id).ok_or_else(|| {
        warn!("User {caller_id} tried to change status of request {request_id}");
        Error::permission_denied("Only the mentor of this request may change its status")
    })?;
    let previous_status = request.status;
    validate_transition(previous_status, actor, new_status)?;

    if new_status == Accepted {
        let mentor_id = request.mentor_id.unwrap_or(caller_id);
        mentorship_request::lock_participants(&txn, &[mentor_id]).await?;
        let accepted = mentorship_request::count_accepted_for_mentor(&txn, mentor_id).await?;
        if accepted >= MENTOR_CAPACITY {
            warn!("Mentor {mentor_id} cannot accept request {request_id}: at capacity");
            return Err(Error::mentorship(MentorshipErrorKind::CapacityExceeded(
                CapacityLimit::MentorAccepted {
                    limit: MENTOR_CAPACITY,
                },
            )));
        }
    }

    let updated = mentorship_request::update_status(&txn, request, new_status).await?;
    txn.commit().await?;
    info!("Mentorship request {request_id} moved from {previous_status} to {new_status}");

    event_publisher
        .publish(DomainEvent::MentorshipRequestStatusChanged {
            mentorship_request: to_event_value(&updated),
            previous_status: previous_status.to_string(),
            notify_user_ids: vec![updated.student_id],
        })
        .await;

    Ok(updated)
}

/// Closes the conversation on a request. Only the mentor may do this, and only
/// once the request has been accepted. `status` is left unchanged.
pub async fn close_chat(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    request_id: Id,
    caller_id: Id,
    reason: String,
) -> Result<Model, Error> {
    let txn = db.begin().await?;
    let request = find_locked(&txn, request_id).await?;

    if !request.is_mentor(caller_id) {
        warn!("User {caller_id} tried to close chat on request {request_id}");
        return Err(Error::permission_denied(
            "Only the mentor of this request may close its chat",
        ));
    }

    let reason = reason.trim().to_string();
    if reason.is_empty() {
        return Err(Error::invalid_argument("A reason is required to close the chat"));
    }

    if request.is_chat_closed() {
        return Err(Error::failed_precondition("The chat is already closed"));
    }
    if !matches!(request.status, Accepted | Completed) {
        return Err(Error::failed_precondition(format!(
            "Cannot close the chat of a {} request",
            request.status
        )));
    }

    let closed = mentorship_request::close_chat(&txn, request, reason).await?;
    txn.commit().await?;
    info!("Mentor {caller_id} closed chat on mentorship request {request_id}");

    event_publisher
        .publish(DomainEvent::MentorshipChatClosed {
            mentorship_request: to_event_value(&closed),
            notify_user_ids: vec![closed.student_id],
        })
        .await;

    Ok(closed)
}

async fn find_locked(txn: &sea_orm::DatabaseTransaction, request_id: Id) -> Result<Model, Error> {
    mentorship_request::find_by_id_for_update(txn, request_id)
        .await
        .map_err(|err| not_found_or(err, request_id))
}

/// Maps a missing request to the user-facing `NotFound` kind.
pub(crate) fn not_found_or(err: entity_api::error::Error, request_id: Id) -> Error {
    let err: Error = err.into();
    if err.is_entity_not_found() {
        Error::not_found(format!("Mentorship request {request_id} not found"))
    } else {
        err
    }
}

/// Loads a request the caller takes part in. Admins may read any request.
pub async fn find_for_participant(
    db: &DatabaseConnection,
    request_id: Id,
    caller: &Identity,
) -> Result<Model, Error> {
    let request = mentorship_request::find_by_id(db, request_id)
        .await
        .map_err(|err| not_found_or(err, request_id))?;

    if request.is_participant(caller.user_id) || caller.is_admin() {
        Ok(request)
    } else {
        Err(Error::permission_denied(
            "You are not a participant of this mentorship request",
        ))
    }
}

/// Requests the student sent, newest first.
pub async fn find_by_student(db: &DatabaseConnection, student_id: Id) -> Result<Vec<Model>, Error> {
    Ok(mentorship_request::find_by_student(db, student_id).await?)
}

/// Requests addressed to the mentor, newest first.
pub async fn find_by_mentor(db: &DatabaseConnection, mentor_id: Id) -> Result<Vec<Model>, Error> {
    Ok(mentorship_request::find_by_mentor(db, mentor_id).await?)
}

/// The student's accepted requests, i.e. their current mentors.
pub async fn find_mentors_of(db: &DatabaseConnection, student_id: Id) -> Result<Vec<Model>, Error> {
    Ok(mentorship_request::find_by_student_and_status(db, student_id, Accepted).await?)
}

pub async fn find_by<P>(db: &DatabaseConnection, params: P) -> Result<Vec<Model>, Error>
where
    P: IntoQueryFilterMap + QuerySort<mentorship_requests::Column>,
{
    let requests =
        query::find_by::<mentorship_requests::Entity, mentorship_requests::Column, P>(db, params)
            .await?;
    Ok(requests)
}

pub async fn mentor_capacity(db: &DatabaseConnection, mentor_id: Id) -> Result<MentorCapacity, Error> {
    let accepted = mentorship_request::count_accepted_for_mentor(db, mentor_id).await?;
    Ok(MentorCapacity::from_accepted(accepted))
}

pub async fn student_usage(db: &DatabaseConnection, student_id: Id) -> Result<StudentUsage, Error> {
    let active = mentorship_request::count_active_for_student(db, student_id).await?;
    Ok(StudentUsage::from_active(active))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainErrorKind;

    fn kind(result: Result<(), Error>) -> Option<MentorshipErrorKind> {
        match result {
            Ok(()) => None,
            Err(Error {
                error_kind: DomainErrorKind::Mentorship(kind),
                ..
            }) => Some(kind),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn mentor_may_accept_or_decline_pending_and_complete_accepted() {
        assert!(validate_transition(Pending, Actor::Mentor, Accepted).is_ok());
        assert!(validate_transition(Pending, Actor::Mentor, Declined).is_ok());
        assert!(validate_transition(Accepted, Actor::Mentor, Completed).is_ok());
    }

    #[test]
    fn pending_cannot_jump_to_completed() {
        assert_eq!(
            kind(validate_transition(Pending, Actor::Mentor, Completed)),
            Some(MentorshipErrorKind::InvalidTransition {
                from: Pending,
                to: Completed
            })
        );
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        for from in [Declined, Completed] {
            for actor in [Actor::Mentor, Actor::Student] {
                for to in [Pending, Accepted, Declined, Completed] {
                    assert_eq!(
                        kind(validate_transition(from, actor, to)),
                        Some(MentorshipErrorKind::InvalidTransition { from, to })
                    );
                }
            }
        }
    }

    #[test]
    fn same_state_transitions_are_not_no_ops() {
        assert!(validate_transition(Accepted, Actor::Mentor, Accepted).is_err());
        assert!(validate_transition(Pending, Actor::Mentor, Pending).is_err());
    }

    #[test]
    fn students_cannot_drive_mentor_transitions() {
        assert!(matches!(
            kind(validate_transition(Pending, Actor::Student, Accepted)),
            Some(MentorshipErrorKind::PermissionDenied(_))
        ));
        assert!(matches!(
            kind(validate_transition(Accepted, Actor::Student, Completed)),
            Some(MentorshipErrorKind::PermissionDenied(_))
        ));
    }

    #[test]
    fn capacity_summaries() {
        assert_eq!(
            MentorCapacity::from_accepted(5),
            MentorCapacity {
                accepted: 5,
                capacity: 5,
                full: true
            }
        );
        assert!(!MentorCapacity::from_accepted(4).full);
        assert_eq!(StudentUsage::from_active(2).remaining, 3);
        assert_eq!(StudentUsage::from_active(7).remaining, 0);
    }

    #[test]
    fn blank_optional_text_is_dropped() {
        assert_eq!(normalize(Some("  ".to_string())), None);
        assert_eq!(
            normalize(Some(" evenings ".to_string())),
            Some("evenings".to_string())
        );
    }
}
