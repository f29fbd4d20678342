//! Review Ledger storage. Aggregates are computed by the caller from the rows
//! returned here; nothing is cached.

use super::error::Error;
use chrono::Utc;
use entity::mentorship_reviews::{ActiveModel, Column, Entity, Model};
use entity::{mentorship_requests, Id};
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, JoinType, QueryOrder, QuerySelect, Set};

/// Inserts a review. A second review by the same reviewer for the same request
/// violates the unique index and surfaces as `RecordAlreadyExists`.
pub async fn create(db: &impl ConnectionTrait, review_model: Model) -> Result<Model, Error> {
    debug!("New Mentorship Review Model to be inserted: {review_model:?}");

    let active_model = ActiveModel {
        mentorship_request_id: Set(review_model.mentorship_request_id),
        reviewer_id: Set(review_model.reviewer_id),
        rating: Set(review_model.rating),
        comment: Set(review_model.comment),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    Ok(active_model.insert(db).await?)
}

pub async fn find_by_mentorship_request_and_reviewer(
    db: &impl ConnectionTrait,
    mentorship_request_id: Id,
    reviewer_id: Id,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::MentorshipRequestId.eq(mentorship_request_id))
        .filter(Column::ReviewerId.eq(reviewer_id))
        .one(db)
        .await?)
}

pub async fn find_by_mentorship_request(
    db: &impl ConnectionTrait,
    mentorship_request_id: Id,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::MentorshipRequestId.eq(mentorship_request_id))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?)
}

/// Every review left on any of the mentor's requests, newest first.
pub async fn find_by_mentor(db: &impl ConnectionTrait, mentor_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .join(JoinType::InnerJoin, entity::mentorship_reviews::Relation::MentorshipRequests.def())
        .filter(mentorship_requests::Column::MentorId.eq(mentor_id))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn review(rating: i32) -> Model {
        Model {
            id: Id::new_v4(),
            mentorship_request_id: Id::new_v4(),
            reviewer_id: Id::new_v4(),
            rating,
            comment: Some("great mentor".to_string()),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn find_by_mentor_joins_through_requests() -> Result<(), Error> {
        let reviews = vec![review(4), review(5)];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![reviews.clone()])
            .into_connection();

        assert_eq!(find_by_mentor(&db, Id::new_v4()).await?, reviews);

        let log = db.into_transaction_log();
        let sql = &log[0].statements()[0].sql;
        assert!(sql.contains(r#"INNER JOIN "mentorship_platform"."mentorship_requests""#));
        assert!(sql.contains(r#""mentorship_requests"."mentor_id" = "#));

        Ok(())
    }

    #[tokio::test]
    async fn find_by_mentorship_request_and_reviewer_returns_none_when_absent(
    ) -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<Model>::new()])
            .into_connection();

        let found =
            find_by_mentorship_request_and_reviewer(&db, Id::new_v4(), Id::new_v4()).await?;
        assert!(found.is_none());

        Ok(())
    }
}
