//! Review Ledger: one rating per finished mentorship, left by the student.

use crate::error::{Conflict, Error, MentorshipErrorKind};
use crate::mentorship_request::not_found_or;
use crate::mentorship_requests;
use crate::mentorship_reviews::Model;
use crate::mentorship_status::MentorshipStatus;
use crate::Id;
use entity_api::{mentorship_request, mentorship_review};
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Read-side aggregate over every review of a mentor's requests.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MentorReviews {
    /// Mean rating, `0.0` when there are no reviews.
    pub average: f64,
    pub count: u64,
    pub reviews: Vec<Model>,
}

impl MentorReviews {
    pub fn from_reviews(reviews: Vec<Model>) -> Self {
        let count = reviews.len() as u64;
        let average = if reviews.is_empty() {
            0.0
        } else {
            reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>() / count as f64
        };

        Self {
            average,
            count,
            reviews,
        }
    }
}

pub fn validate_rating(rating: i32) -> Result<(), Error> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )))
    }
}

/// A request can be reviewed once it is completed or its chat was closed.
pub fn is_reviewable(request: &mentorship_requests::Model) -> bool {
    request.status == MentorshipStatus::Completed || request.is_chat_closed()
}

pub async fn submit(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    request_id: Id,
    reviewer_id: Id,
    rating: i32,
    comment: Option<String>,
) -> Result<Model, Error> {
    validate_rating(rating)?;
    let comment = comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let txn = db.begin().await?;
    let request = mentorship_request::find_by_id_for_share(&txn, request_id)
        .await
        .map_err(|err| not_found_or(err, request_id))?;

    if request.student_id != reviewer_id {
        warn!("User {reviewer_id} tried to review mentorship request {request_id}");
        return Err(Error::permission_denied(
            "Only the student of this mentorship may review it",
        ));
    }

    if !is_reviewable(&request) {
        return Err(Error::failed_precondition(
            "A review is available only after the mentorship ends",
        ));
    }

    if let Some(existing) =
        mentorship_review::find_by_mentorship_request_and_reviewer(&txn, request_id, reviewer_id)
            .await?
    {
        return Err(already_reviewed(existing));
    }

    let created = mentorship_review::create(
        &txn,
        Model {
            id: Id::nil(),
            mentorship_request_id: request_id,
            reviewer_id,
            rating,
            comment,
            created_at: chrono::Utc::now().into(),
        },
    )
    .await;

    let review = match created {
        Ok(review) => review,
        Err(err) => {
            let err: Error = err.into();
            if !err.is_entity_conflict() {
                return Err(err);
            }
            // Lost a race with a concurrent submission; the unique index kept one.
            txn.rollback().await?;
            return match mentorship_review::find_by_mentorship_request_and_reviewer(
                db,
                request_id,
                reviewer_id,
            )
            .await?
            {
                Some(existing) => Err(already_reviewed(existing)),
                None => Err(err),
            };
        }
    };
    txn.commit().await?;
    info!("Student {reviewer_id} rated mentorship request {request_id} with {rating}");

    event_publisher
        .publish(DomainEvent::MentorshipReviewSubmitted {
            mentorship_request_id: request_id,
            review: serde_json::to_value(&review).unwrap_or_default(),
            notify_user_ids: request.mentor_id.into_iter().collect(),
        })
        .await;

    Ok(review)
}

fn already_reviewed(existing: Model) -> Error {
    Error::mentorship(MentorshipErrorKind::AlreadyExists(Conflict::Review(
        Box::new(existing),
    )))
}

pub async fn mentor_reviews(db: &DatabaseConnection, mentor_id: Id) -> Result<MentorReviews, Error> {
    let reviews = mentorship_review::find_by_mentor(db, mentor_id).await?;
    Ok(MentorReviews::from_reviews(reviews))
}

/// Reviews of one request, visible to its participants.
pub async fn find_by_mentorship_request(
    db: &DatabaseConnection,
    request_id: Id,
    caller_id: Id,
) -> Result<Vec<Model>, Error> {
    let request = mentorship_request::find_by_id(db, request_id)
        .await
        .map_err(|err| not_found_or(err, request_id))?;

    if !request.is_participant(caller_id) {
        return Err(Error::permission_denied(
            "You are not a participant of this mentorship request",
        ));
    }

    Ok(mentorship_review::find_by_mentorship_request(db, request_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(super) fn review(rating: i32) -> Model {
        Model {
            id: Id::new_v4(),
            mentorship_request_id: Id::new_v4(),
            reviewer_id: Id::new_v4(),
            rating,
            comment: None,
            created_at: chrono::Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn ratings_outside_one_to_five_are_invalid() {
        for rating in [0, 6, -1, 100] {
            assert!(validate_rating(rating).is_err());
        }
        for rating in 1..=5 {
            assert!(validate_rating(rating).is_ok());
        }
    }

    #[test]
    fn average_is_exact_and_zero_when_empty() {
        let empty = MentorReviews::from_reviews(vec![]);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.average, 0.0);

        let summary = MentorReviews::from_reviews(vec![review(4), review(5)]);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, 4.5);
    }
}
