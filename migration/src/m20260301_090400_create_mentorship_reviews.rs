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
                CREATE TABLE IF NOT EXISTS mentorship_platform.mentorship_reviews (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    mentorship_request_id UUID NOT NULL
                        REFERENCES mentorship_platform.mentorship_requests (id) ON DELETE CASCADE,
                    reviewer_id UUID NOT NULL,
                    rating INTEGER NOT NULL CONSTRAINT mentorship_reviews_rating_check
                        CHECK (rating BETWEEN 1 AND 5),
                    comment TEXT,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
                );
                "#,
            )
            .await?;

        // One review per student per mentorship
        manager
            .create_index(
                Index::create()
                    .name("mentorship_reviews_request_reviewer_unique")
                    .table((
                        Alias::new("mentorship_platform"),
                        Alias::new("mentorship_reviews"),
                    ))
                    .col(Alias::new("mentorship_request_id"))
                    .col(Alias::new("reviewer_id"))
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS mentorship_platform.mentorship_reviews;")
            .await?;

        Ok(())
    }
}
