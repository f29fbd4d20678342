use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TYPE mentorship_platform.mentorship_status AS ENUM \
             ('pending', 'accepted', 'declined', 'completed');",
        )
        .await?;

        // Participants reference profiles so a request can never point at a
        // user without a directory row.
        db.execute_unprepared(
            r#"
            CREATE TABLE IF NOT EXISTS mentorship_platform.mentorship_requests (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                student_id UUID NOT NULL
                    REFERENCES mentorship_platform.profiles (user_id) ON DELETE CASCADE,
                mentor_id UUID
                    REFERENCES mentorship_platform.profiles (user_id) ON DELETE SET NULL,
                field_of_interest TEXT NOT NULL,
                description TEXT,
                goals TEXT,
                preferred_time TEXT,
                status mentorship_platform.mentorship_status NOT NULL DEFAULT 'pending',
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            "#,
        )
        .await?;

        manager
            .create_index(
                Index::create()
                    .name("mentorship_requests_student_id_status")
                    .table((
                        Alias::new("mentorship_platform"),
                        Alias::new("mentorship_requests"),
                    ))
                    .col(Alias::new("student_id"))
                    .col(Alias::new("status"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("mentorship_requests_mentor_id_status")
                    .table((
                        Alias::new("mentorship_platform"),
                        Alias::new("mentorship_requests"),
                    ))
                    .col(Alias::new("mentor_id"))
                    .col(Alias::new("status"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("mentorship_requests_created_at")
                    .table((
                        Alias::new("mentorship_platform"),
                        Alias::new("mentorship_requests"),
                    ))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP TABLE IF EXISTS mentorship_platform.mentorship_requests;")
            .await?;
        db.execute_unprepared("DROP TYPE IF EXISTS mentorship_platform.mentorship_status;")
            .await?;

        Ok(())
    }
}
