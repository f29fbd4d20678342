use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE IF NOT EXISTS mentorship_platform.messages (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    mentorship_request_id UUID NOT NULL
                        REFERENCES mentorship_platform.mentorship_requests (id) ON DELETE CASCADE,
                    sender_id UUID NOT NULL,
                    content TEXT NOT NULL CHECK (length(btrim(content)) > 0),
                    is_read BOOLEAN NOT NULL DEFAULT FALSE,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
                );
                "#,
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("messages_mentorship_request_id_created_at")
                    .table((Alias::new("mentorship_platform"), Alias::new("messages")))
                    .col(Alias::new("mentorship_request_id"))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS mentorship_platform.messages;")
            .await?;

        Ok(())
    }
}
