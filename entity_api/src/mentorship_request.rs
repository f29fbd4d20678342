//! Request Store: durable access to mentorship requests.
//!
//! Counts here are always derived from current rows. Callers that act on a
//! count must hold the participant advisory lock (see [`lock_participants`])
//! inside the same transaction.

use super::error::Error;
use chrono::Utc;
use entity::mentorship_requests::{ActiveModel, Column, Entity, Model};
use entity::mentorship_status::MentorshipStatus;
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*, ConnectionTrait, DbBackend, QueryOrder, QuerySelect, Set, Statement,
};

pub async fn create(db: &impl ConnectionTrait, request_model: Model) -> Result<Model, Error> {
    debug!("New Mentorship Request Model to be inserted: {request_model:?}");

    let now = Utc::now();
    let active_model = ActiveModel {
        student_id: Set(request_model.student_id),
        mentor_id: Set(request_model.mentor_id),
        field_of_interest: Set(request_model.field_of_interest),
        description: Set(request_model.description),
        goals: Set(request_model.goals),
        preferred_time: Set(request_model.preferred_time),
        status: Set(MentorshipStatus::Pending),
        chat_closed_reason: Set(None),
        chat_closed_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

/// Reads the request with `SELECT ... FOR UPDATE`; must be called inside a transaction.
pub async fn find_by_id_for_update(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .lock_exclusive()
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

/// Reads the request with `SELECT ... FOR SHARE`; must be called inside a transaction.
pub async fn find_by_id_for_share(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .lock_shared()
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

/// Number of the student's requests that are `pending` or `accepted`.
pub async fn count_active_for_student(
    db: &impl ConnectionTrait,
    student_id: Id,
) -> Result<u64, Error> {
    Ok(Entity::find()
        .filter(Column::StudentId.eq(student_id))
        .filter(Column::Status.is_in(MentorshipStatus::ACTIVE))
        .count(db)
        .await?)
}

/// Number of the mentor's `accepted` requests, i.e. the mentor's used capacity.
pub async fn count_accepted_for_mentor(
    db: &impl ConnectionTrait,
    mentor_id: Id,
) -> Result<u64, Error> {
    Ok(Entity::find()
        .filter(Column::MentorId.eq(mentor_id))
        .filter(Column::Status.eq(MentorshipStatus::Accepted))
        .count(db)
        .await?)
}

/// The most recent request for the pair that is still pending, accepted or completed.
pub async fn find_open_for_pair(
    db: &impl ConnectionTrait,
    student_id: Id,
    mentor_id: Id,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::StudentId.eq(student_id))
        .filter(Column::MentorId.eq(mentor_id))
        .filter(Column::Status.is_in(MentorshipStatus::OPEN_PAIRING))
        .order_by_desc(Column::CreatedAt)
        .one(db)
        .await?)
}

pub async fn find_by_student(db: &impl ConnectionTrait, student_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::StudentId.eq(student_id))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn find_by_student_and_status(
    db: &impl ConnectionTrait,
    student_id: Id,
    status: MentorshipStatus,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::StudentId.eq(student_id))
        .filter(Column::Status.eq(status))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn find_by_mentor(db: &impl ConnectionTrait, mentor_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::MentorId.eq(mentor_id))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn update_status(
    db: &impl ConnectionTrait,
    request: Model,
    status: MentorshipStatus,
) -> Result<Model, Error> {
    debug!(
        "Updating status of mentorship request {} from {} to {}",
        request.id, request.status, status
    );

    let mut active_model: ActiveModel = request.into();
    active_model.status = Set(status);
    active_model.updated_at = Set(Utc::now().into());

    Ok(active_model.update(db).await?)
}

pub async fn close_chat(
    db: &impl ConnectionTrait,
    request: Model,
    reason: String,
) -> Result<Model, Error> {
    let now = Utc::now();
    let mut active_model: ActiveModel = request.into();
    active_model.chat_closed_reason = Set(Some(reason));
    active_model.chat_closed_at = Set(Some(now.into()));
    active_model.updated_at = Set(now.into());

    Ok(active_model.update(db).await?)
}

/// Takes a transaction-scoped PostgreSQL advisory lock for each participant id.
///
/// Locks are acquired in ascending key order, deduplicated by key, so two
/// transactions locking overlapping participants cannot deadlock even when two
/// ids share a key. They are released on commit or rollback.
pub async fn lock_participants(db: &impl ConnectionTrait, ids: &[Id]) -> Result<(), Error> {
    let mut keys: Vec<i64> = ids.iter().map(advisory_key).collect();
    keys.sort_unstable();
    keys.dedup();

    for key in keys {
        trace!("Acquiring participant advisory lock {key}");
        db.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT pg_advisory_xact_lock($1)",
            [key.into()],
        ))
        .await?;
    }

    Ok(())
}

/// The 64-bit advisory lock key for a participant: both halves of the id folded together.
fn advisory_key(id: &Id) -> i64 {
    let (high, low) = id.as_u64_pair();
    (high ^ low) as i64
}

const RANKED_DUPLICATES: &str = r#"
WITH ranked AS (
    SELECT id,
           ROW_NUMBER() OVER (
               PARTITION BY student_id, mentor_id
               ORDER BY CASE status WHEN 'accepted' THEN 0 WHEN 'pending' THEN 1 ELSE 2 END,
                        created_at DESC
           ) AS pair_rank
    FROM mentorship_platform.mentorship_requests
    WHERE status IN ('pending', 'accepted') AND mentor_id IS NOT NULL
)"#;

/// Declines every active request that duplicates a better one for the same
/// student/mentor pair. The newest `accepted` row wins, otherwise the newest
/// `pending` row. With `dry_run` nothing is written.
///
/// Returns the number of rows declined, or that would be declined.
pub async fn decline_duplicates(db: &impl ConnectionTrait, dry_run: bool) -> Result<u64, Error> {
    if dry_run {
        let sql = format!(
            "{RANKED_DUPLICATES} SELECT COUNT(*) AS num_items FROM ranked WHERE pair_rank > 1"
        );
        let row = db
            .query_one(Statement::from_string(DbBackend::Postgres, sql))
            .await?;
        let count = match row {
            Some(row) => row.try_get::<i64>("", "num_items")?,
            None => 0,
        };
        return Ok(u64::try_from(count).unwrap_or_default());
    }

    let sql = format!(
        "{RANKED_DUPLICATES} UPDATE mentorship_platform.mentorship_requests AS requests \
         SET status = 'declined', updated_at = now() \
         FROM ranked WHERE requests.id = ranked.id AND ranked.pair_rank > 1"
    );
    let result = db
        .execute(Statement::from_string(DbBackend::Postgres, sql))
        .await?;

    info!(
        "Declined {} duplicate mentorship requests",
        result.rows_affected()
    );

    Ok(result.rows_affected())
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::EntityApiErrorKind;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction, Value};
    use std::collections::BTreeMap;

    fn request(status: MentorshipStatus) -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            student_id: Id::new_v4(),
            mentor_id: Some(Id::new_v4()),
            field_of_interest: "Distributed systems".to_string(),
            description: None,
            goals: None,
            preferred_time: None,
            status,
            chat_closed_reason: None,
            chat_closed_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn count_row(count: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::from(count))])
    }

    #[tokio::test]
    async fn create_always_inserts_a_pending_request() -> Result<(), Error> {
        let mut submitted = request(MentorshipStatus::Accepted);
        submitted.chat_closed_reason = Some("ignored".to_string());
        let stored = request(MentorshipStatus::Pending);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![stored.clone()]])
            .into_connection();

        let created = create(&db, submitted).await?;
        assert_eq!(created.status, MentorshipStatus::Pending);

        let log = db.into_transaction_log();
        let insert = &log[0].statements()[0];
        assert!(insert.sql.starts_with(r#"INSERT INTO "mentorship_platform"."mentorship_requests""#));
        let values = insert.values.as_ref().map(|v| v.0.clone()).unwrap_or_default();
        assert!(values.contains(&Value::String(Some(Box::new("pending".to_string())))));
        assert!(!values.contains(&Value::String(Some(Box::new("ignored".to_string())))));

        Ok(())
    }

    #[tokio::test]
    async fn find_by_id_returns_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<Model>::new()])
            .into_connection();

        let result = find_by_id(&db, Id::new_v4()).await;
        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn find_by_id_for_update_locks_the_row() -> Result<(), Error> {
        let existing = request(MentorshipStatus::Pending);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![existing.clone()]])
            .into_connection();

        assert_eq!(find_by_id_for_update(&db, existing.id).await?, existing);

        let log = db.into_transaction_log();
        assert!(log[0].statements()[0].sql.ends_with("FOR UPDATE"));

        Ok(())
    }

    #[tokio::test]
    async fn find_by_id_for_share_takes_a_shared_lock() -> Result<(), Error> {
        let existing = request(MentorshipStatus::Accepted);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![existing.clone()]])
            .into_connection();

        find_by_id_for_share(&db, existing.id).await?;

        let log = db.into_transaction_log();
        assert!(log[0].statements()[0].sql.ends_with("FOR SHARE"));

        Ok(())
    }

    #[tokio::test]
    async fn count_active_for_student_counts_pending_and_accepted() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![count_row(3)]])
            .into_connection();

        assert_eq!(count_active_for_student(&db, Id::new_v4()).await?, 3);

        let log = db.into_transaction_log();
        let statement = &log[0].statements()[0];
        assert!(statement.sql.contains(r#""mentorship_requests"."student_id" = "#));
        assert!(statement.sql.contains(r#""mentorship_requests"."status" IN "#));

        Ok(())
    }

    #[tokio::test]
    async fn count_accepted_for_mentor_filters_on_accepted() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![count_row(5)]])
            .into_connection();

        assert_eq!(count_accepted_for_mentor(&db, Id::new_v4()).await?, 5);

        let log = db.into_transaction_log();
        let statement = &log[0].statements()[0];
        assert!(statement.sql.contains(r#""mentorship_requests"."mentor_id" = "#));
        let values = statement.values.as_ref().map(|v| v.0.clone()).unwrap_or_default();
        assert!(values.contains(&Value::String(Some(Box::new("accepted".to_string())))));

        Ok(())
    }

    #[tokio::test]
    async fn find_open_for_pair_returns_newest_open_request() -> Result<(), Error> {
        let existing = request(MentorshipStatus::Pending);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![existing.clone()]])
            .into_connection();

        let found = find_open_for_pair(&db, existing.student_id, Id::new_v4()).await?;
        assert_eq!(found, Some(existing));

        let log = db.into_transaction_log();
        assert!(log[0].statements()[0]
            .sql
            .contains(r#"ORDER BY "mentorship_requests"."created_at" DESC"#));

        Ok(())
    }

    #[tokio::test]
    async fn update_status_refreshes_updated_at() -> Result<(), Error> {
        let existing = request(MentorshipStatus::Pending);
        let mut updated = existing.clone();
        updated.status = MentorshipStatus::Accepted;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![updated.clone()]])
            .into_connection();

        let result = update_status(&db, existing, MentorshipStatus::Accepted).await?;
        assert_eq!(result.status, MentorshipStatus::Accepted);

        let log = db.into_transaction_log();
        let sql = &log[0].statements()[0].sql;
        assert!(sql.starts_with(r#"UPDATE "mentorship_platform"."mentorship_requests""#));
        assert!(sql.contains(r#""updated_at" = "#));

        Ok(())
    }

    #[tokio::test]
    async fn lock_participants_locks_in_ascending_key_order_once_per_key() -> Result<(), Error> {
        let low = Id::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
        let high = Id::parse_str("7fffffff-0000-0000-0000-000000000001").unwrap();
        // Same key as `low`: the halves are swapped.
        let twin = Id::parse_str("00000000-0000-0001-0000-000000000000").unwrap();
        assert_eq!(advisory_key(&low), advisory_key(&twin));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        lock_participants(&db, &[high, twin, low, high]).await?;

        assert_eq!(
            db.into_transaction_log(),
            [
                Transaction::from_sql_and_values(
                    DatabaseBackend::Postgres,
                    "SELECT pg_advisory_xact_lock($1)",
                    [1i64.into()]
                ),
                Transaction::from_sql_and_values(
                    DatabaseBackend::Postgres,
                    "SELECT pg_advisory_xact_lock($1)",
                    [advisory_key(&high).into()]
                ),
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn decline_duplicates_dry_run_only_counts() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![count_row(2)]])
            .into_connection();

        assert_eq!(decline_duplicates(&db, true).await?, 2);

        let log = db.into_transaction_log();
        let sql = &log[0].statements()[0].sql;
        assert!(sql.contains("SELECT COUNT(*) AS num_items FROM ranked"));
        assert!(!sql.contains("UPDATE"));

        Ok(())
    }

    #[tokio::test]
    async fn decline_duplicates_reports_rows_declined() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 4,
            }])
            .into_connection();

        assert_eq!(decline_duplicates(&db, false).await?, 4);

        Ok(())
    }
}
