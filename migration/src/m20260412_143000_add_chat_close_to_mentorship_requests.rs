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
                ALTER TABLE mentorship_platform.mentorship_requests
                    ADD COLUMN IF NOT EXISTS chat_closed_reason TEXT,
                    ADD COLUMN IF NOT EXISTS chat_closed_at TIMESTAMPTZ;
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                ALTER TABLE mentorship_platform.mentorship_requests
                    DROP COLUMN IF EXISTS chat_closed_at,
                    DROP COLUMN IF EXISTS chat_closed_reason;
                "#,
            )
            .await?;

        Ok(())
    }
}
