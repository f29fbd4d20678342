//! Profile Directory adapter. Every participant of a mentorship request must
//! have a minimal profile row before the request references them.

use crate::error::Error;
use crate::users;
use entity_api::profile;
use log::*;
use sea_orm::ConnectionTrait;

pub use entity_api::profile::find_by_user_id;

/// Idempotently creates the minimal profile for `user`. Any failure is
/// reported as a failed precondition of the calling operation.
pub async fn ensure_participant(db: &impl ConnectionTrait, user: &users::Model) -> Result<(), Error> {
    match profile::ensure_exists(db, user).await {
        Ok(_) => Ok(()),
        Err(err) => {
            warn!("Could not ensure a profile for user {}: {err}", user.id);
            let mut error = Error::failed_precondition(format!(
                "Could not create a profile for user {}",
                user.id
            ));
            error.source = Some(Box::new(err));
            Err(error)
        }
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, MentorshipErrorKind};
    use crate::Id;
    use entity::roles::Role;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

    fn user() -> users::Model {
        let now = chrono::Utc::now().fixed_offset();
        users::Model {
            id: Id::new_v4(),
            email: "ada@student.example.edu".to_string(),
            display_name: Some("Ada".to_string()),
            role: Role::Student,
            is_verified: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn ensure_participant_succeeds_when_the_profile_already_exists() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        ensure_participant(&db, &user()).await
    }

    #[tokio::test]
    async fn ensure_participant_maps_failures_to_failed_precondition() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors(vec![DbErr::Custom("profiles table missing".to_string())])
            .into_connection();

        let err = ensure_participant(&db, &user()).await.unwrap_err();
        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Mentorship(MentorshipErrorKind::FailedPrecondition(_))
        ));
    }
}
