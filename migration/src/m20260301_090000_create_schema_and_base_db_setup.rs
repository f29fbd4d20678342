use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create the platform's schema
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS mentorship_platform;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO mentorship_platform, public;")
            .await?;

        // Grant the application DB user access to everything in the schema
        manager
            .get_connection()
            .execute_unprepared(r#"
                DO $$ BEGIN
                    GRANT ALL PRIVILEGES ON DATABASE mentorship TO mentorship;
                    GRANT ALL ON SCHEMA mentorship_platform TO mentorship;

                    ALTER DEFAULT PRIVILEGES IN SCHEMA mentorship_platform GRANT ALL ON TABLES TO mentorship;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA mentorship_platform GRANT ALL ON SEQUENCES TO mentorship;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA mentorship_platform GRANT ALL ON FUNCTIONS TO mentorship;
                END $$;
            "#)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(r#"
                DO $$ BEGIN
                    ALTER DEFAULT PRIVILEGES IN SCHEMA mentorship_platform REVOKE ALL ON FUNCTIONS FROM mentorship;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA mentorship_platform REVOKE ALL ON SEQUENCES FROM mentorship;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA mentorship_platform REVOKE ALL ON TABLES FROM mentorship;
                    REVOKE ALL ON SCHEMA mentorship_platform FROM mentorship;
                    REVOKE ALL PRIVILEGES ON DATABASE mentorship FROM mentorship;
                END $$;
            "#)
            .await?;

        // Drop the schema (CASCADE will remove all objects in it)
        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS mentorship_platform CASCADE;")
            .await?;

        Ok(())
    }
}
