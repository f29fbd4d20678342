use super::error::Error;
use entity::messages::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, sea_query::Expr, ConnectionTrait, QueryOrder, Set};

/// Inserts a message. `created_at` is left to the database clock so that
/// messages from different app servers share one timeline.
pub async fn create(
    db: &impl ConnectionTrait,
    mentorship_request_id: Id,
    sender_id: Id,
    content: String,
) -> Result<Model, Error> {
    debug!("New message for mentorship request {mentorship_request_id} from {sender_id}");

    let active_model = ActiveModel {
        mentorship_request_id: Set(mentorship_request_id),
        sender_id: Set(sender_id),
        content: Set(content),
        is_read: Set(false),
        ..Default::default()
    };

    Ok(active_model.insert(db).await?)
}

/// All messages of a request, oldest first.
pub async fn find_by_mentorship_request(
    db: &impl ConnectionTrait,
    mentorship_request_id: Id,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::MentorshipRequestId.eq(mentorship_request_id))
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(db)
        .await?)
}

/// Marks unread messages sent to `reader_id` as read. Returns the number of
/// messages updated.
pub async fn mark_read(
    db: &impl ConnectionTrait,
    mentorship_request_id: Id,
    reader_id: Id,
) -> Result<u64, Error> {
    let result = Entity::update_many()
        .col_expr(Column::IsRead, Expr::value(true))
        .filter(Column::MentorshipRequestId.eq(mentorship_request_id))
        .filter(Column::SenderId.ne(reader_id))
        .filter(Column::IsRead.eq(false))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn create_lets_the_database_stamp_created_at() -> Result<(), Error> {
        let stored = Model {
            id: Id::new_v4(),
            mentorship_request_id: Id::new_v4(),
            sender_id: Id::new_v4(),
            content: "See you Tuesday".to_string(),
            is_read: false,
            created_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![stored.clone()]])
            .into_connection();

        let created = create(
            &db,
            stored.mentorship_request_id,
            stored.sender_id,
            stored.content.clone(),
        )
        .await?;
        assert_eq!(created, stored);

        let log = db.into_transaction_log();
        let sql = &log[0].statements()[0].sql;
        assert!(sql.starts_with(
            r#"INSERT INTO "mentorship_platform"."messages" ("mentorship_request_id", "sender_id", "content", "is_read") VALUES"#
        ));

        Ok(())
    }

    #[tokio::test]
    async fn find_by_mentorship_request_returns_messages_in_creation_order() -> Result<(), Error> {
        let request_id = Id::new_v4();
        let now = Utc::now();
        let messages: Vec<Model> = (0..3)
            .map(|n| Model {
                id: Id::new_v4(),
                mentorship_request_id: request_id,
                sender_id: Id::new_v4(),
                content: format!("message {n}"),
                is_read: false,
                created_at: (now + chrono::Duration::seconds(n)).into(),
            })
            .collect();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![messages.clone()])
            .into_connection();

        assert_eq!(find_by_mentorship_request(&db, request_id).await?, messages);

        let log = db.into_transaction_log();
        assert!(log[0].statements()[0]
            .sql
            .contains(r#"ORDER BY "messages"."created_at" ASC"#));

        Ok(())
    }

    #[tokio::test]
    async fn mark_read_only_touches_messages_from_the_other_participant() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();

        assert_eq!(mark_read(&db, Id::new_v4(), Id::new_v4()).await?, 2);

        let log = db.into_transaction_log();
        let sql = &log[0].statements()[0].sql;
        assert!(sql.starts_with(r#"UPDATE "mentorship_platform"."messages" SET "is_read" = "#));
        assert!(sql.contains(r#""messages"."sender_id" <> "#));

        Ok(())
    }
}
