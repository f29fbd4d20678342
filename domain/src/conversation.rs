//! Conversation Gate: chat scoped to one mentorship request.
//!
//! A message may be posted only while the request is `accepted` and its chat
//! has not been closed by the mentor. The gate is evaluated against the
//! request row read `FOR SHARE` in the same transaction as the insert, so a
//! concurrent completion or chat close cannot slip a message past it.

use crate::error::Error;
use crate::mentorship_request::not_found_or;
use crate::mentorship_requests;
use crate::mentorship_status::MentorshipStatus;
use crate::messages::Model;
use crate::Id;
use chrono::{DateTime, FixedOffset};
use entity_api::{mentorship_request, message};
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;

/// Messages of a request together with the state that decides whether more
/// may be posted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Conversation {
    pub messages: Vec<Model>,
    pub status: MentorshipStatus,
    pub chat_closed_reason: Option<String>,
    pub chat_closed_at: Option<DateTime<FixedOffset>>,
}

/// Whether `request` currently accepts new messages.
pub fn chat_gate(request: &mentorship_requests::Model) -> Result<(), Error> {
    if request.status != MentorshipStatus::Accepted {
        return Err(Error::failed_precondition(
            "Chat is allowed only after the mentor accepts the request",
        ));
    }
    if request.is_chat_closed() {
        return Err(Error::failed_precondition(
            "The mentor has closed this chat",
        ));
    }
    Ok(())
}

fn ensure_participant(request: &mentorship_requests::Model, user_id: Id) -> Result<(), Error> {
    if request.is_participant(user_id) {
        Ok(())
    } else {
        warn!(
            "User {user_id} is not a participant of mentorship request {}",
            request.id
        );
        Err(Error::permission_denied(
            "You are not a participant of this mentorship request",
        ))
    }
}

/// The participant who is not `user_id`.
fn counterpart(request: &mentorship_requests::Model, user_id: Id) -> Option<Id> {
    if request.student_id == user_id {
        request.mentor_id
    } else {
        Some(request.student_id)
    }
}

pub async fn post_message(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    request_id: Id,
    sender_id: Id,
    content: String,
) -> Result<Model, Error> {
    let content = content.trim().to_string();
    if content.is_empty() {
        return Err(Error::invalid_argument("Message text is required"));
    }

    let txn = db.begin().await?;
    let request = mentorship_request::find_by_id_for_share(&txn, request_id)
        .await
        .map_err(|err| not_found_or(err, request_id))?;

    ensure_participant(&request, sender_id)?;
    chat_gate(&request)?;

    let message = message::create(&txn, request_id, sender_id, content).await?;
    txn.commit().await?;
    debug!("Message {} posted to mentorship request {request_id}", message.id);

    event_publisher
        .publish(DomainEvent::MessagePosted {
            mentorship_request_id: request_id,
            message: serde_json::to_value(&message).unwrap_or_default(),
            notify_user_ids: counterpart(&request, sender_id).into_iter().collect(),
        })
        .await;

    Ok(message)
}

/// All messages of a request in the order they were posted.
pub async fn list_messages(
    db: &DatabaseConnection,
    request_id: Id,
    caller_id: Id,
) -> Result<Conversation, Error> {
    let request = mentorship_request::find_by_id(db, request_id)
        .await
        .map_err(|err| not_found_or(err, request_id))?;
    ensure_participant(&request, caller_id)?;

    let messages = message::find_by_mentorship_request(db, request_id).await?;

    Ok(Conversation {
        messages,
        status: request.status,
        chat_closed_reason: request.chat_closed_reason,
        chat_closed_at: request.chat_closed_at,
    })
}

/// Marks every message the other participant sent as read. Returns how many
/// messages changed.
pub async fn mark_read(db: &DatabaseConnection, request_id: Id, reader_id: Id) -> Result<u64, Error> {
    let request = mentorship_request::find_by_id(db, request_id)
        .await
        .map_err(|err| not_found_or(err, request_id))?;
    ensure_participant(&request, reader_id)?;

    Ok(message::mark_read(db, request_id, reader_id).await?)
}


#[cfg(test)]
#[cfg(feature = "mock")]
mod mock_tests {
    use super::tests::request;
    use super::*;
    use crate::error::{DomainErrorKind, MentorshipErrorKind};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn message(request_id: Id, sender_id: Id, content: &str, offset: i64) -> Model {
        Model {
            id: Id::new_v4(),
            mentorship_request_id: request_id,
            sender_id,
            content: content.to_string(),
            is_read: false,
            created_at: (chrono::Utc::now() + chrono::Duration::seconds(offset)).fixed_offset(),
        }
    }

    fn mentorship_kind(err: Error) -> MentorshipErrorKind {
        match err.error_kind {
            DomainErrorKind::Mentorship(kind) => kind,
            other => panic!("expected a mentorship error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_messages_are_rejected_before_touching_the_database() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = post_message(&db, &EventPublisher::new(), Id::new_v4(), Id::new_v4(), "   ".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            mentorship_kind(err),
            MentorshipErrorKind::InvalidArgument(_)
        ));
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn posting_to_a_pending_request_fails() {
        let pending = request(MentorshipStatus::Pending);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![pending.clone()]])
            .into_connection();

        let err = post_message(&db, &EventPublisher::new(), pending.id, pending.student_id, "hi".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            mentorship_kind(err),
            MentorshipErrorKind::FailedPrecondition(_)
        ));
    }

    #[tokio::test]
    async fn posting_to_an_accepted_request_stores_trimmed_content() -> Result<(), Error> {
        let accepted = request(MentorshipStatus::Accepted);
        let stored = message(accepted.id, accepted.student_id, "hello", 0);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![accepted.clone()]])
            .append_query_results(vec![vec![stored.clone()]])
            .into_connection();

        let result = post_message(
            &db,
            &EventPublisher::new(),
            accepted.id,
            accepted.student_id,
            "  hello  ".to_string(),
        )
        .await?;
        assert_eq!(result, stored);

        let log = db.into_transaction_log();
        let statements = log[0].statements();
        assert!(statements.iter().any(|s| s.sql.ends_with("FOR SHARE")));
        let insert = statements
            .iter()
            .find(|s| s.sql.starts_with(r#"INSERT INTO "mentorship_platform"."messages""#))
            .unwrap();
        let values = insert.values.as_ref().map(|v| v.0.clone()).unwrap_or_default();
        assert!(values.contains(&sea_orm::Value::String(Some(Box::new("hello".to_string())))));

        Ok(())
    }

    #[tokio::test]
    async fn closed_chat_blocks_posting_even_while_accepted() {
        let mut closed = request(MentorshipStatus::Accepted);
        closed.chat_closed_reason = Some("ended".to_string());
        closed.chat_closed_at = Some(chrono::Utc::now().fixed_offset());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![closed.clone()]])
            .into_connection();

        let err = post_message(
            &db,
            &EventPublisher::new(),
            closed.id,
            closed.mentor_id.unwrap(),
            "one more thing".to_string(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            mentorship_kind(err),
            MentorshipErrorKind::FailedPrecondition(_)
        ));
    }

    #[tokio::test]
    async fn outsiders_cannot_post() {
        let accepted = request(MentorshipStatus::Accepted);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![accepted.clone()]])
            .into_connection();

        let err = post_message(&db, &EventPublisher::new(), accepted.id, Id::new_v4(), "hi".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            mentorship_kind(err),
            MentorshipErrorKind::PermissionDenied(_)
        ));
    }

    #[tokio::test]
    async fn list_messages_returns_gating_state_alongside_messages() -> Result<(), Error> {
        let mut closed = request(MentorshipStatus::Accepted);
        closed.chat_closed_reason = Some("ended".to_string());
        closed.chat_closed_at = Some(chrono::Utc::now().fixed_offset());
        let messages = vec![
            message(closed.id, closed.student_id, "first", 0),
            message(closed.id, closed.mentor_id.unwrap(), "second", 1),
        ];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![closed.clone()]])
            .append_query_results(vec![messages.clone()])
            .into_connection();

        let conversation = list_messages(&db, closed.id, closed.student_id).await?;
        assert_eq!(conversation.messages, messages);
        assert_eq!(conversation.status, MentorshipStatus::Accepted);
        assert_eq!(conversation.chat_closed_reason.as_deref(), Some("ended"));
        assert_eq!(conversation.chat_closed_at, closed.chat_closed_at);

        Ok(())
    }
}
