use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TYPE mentorship_platform.role AS ENUM ('student', 'alumni', 'admin');",
        )
        .await?;

        // Identity rows are written by the authentication service.
        db.execute_unprepared(
            r#"
            CREATE TABLE IF NOT EXISTS mentorship_platform.users (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                email VARCHAR(255) NOT NULL UNIQUE,
                display_name VARCHAR(255),
                role mentorship_platform.role NOT NULL DEFAULT 'student',
                is_verified BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE IF NOT EXISTS mentorship_platform.profiles (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL UNIQUE
                    REFERENCES mentorship_platform.users (id) ON DELETE CASCADE,
                name VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL,
                role mentorship_platform.role NOT NULL,
                is_verified BOOLEAN NOT NULL DEFAULT FALSE,
                is_mentor_available BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP TABLE IF EXISTS mentorship_platform.profiles;")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS mentorship_platform.users;")
            .await?;
        db.execute_unprepared("DROP TYPE IF EXISTS mentorship_platform.role;")
            .await?;

        Ok(())
    }
}
