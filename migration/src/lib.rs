pub use sea_orm_migration::prelude::*;

mod m20260301_090000_create_schema_and_base_db_setup;
mod m20260301_090100_create_users_and_profiles;
mod m20260301_090200_create_mentorship_requests;
mod m20260301_090300_create_messages;
mod m20260301_090400_create_mentorship_reviews;
mod m20260412_143000_add_chat_close_to_mentorship_requests;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_090000_create_schema_and_base_db_setup::Migration),
            Box::new(m20260301_090100_create_users_and_profiles::Migration),
            Box::new(m20260301_090200_create_mentorship_requests::Migration),
            Box::new(m20260301_090300_create_messages::Migration),
            Box::new(m20260301_090400_create_mentorship_reviews::Migration),
            Box::new(m20260412_143000_add_chat_close_to_mentorship_requests::Migration),
        ]
    }
}
