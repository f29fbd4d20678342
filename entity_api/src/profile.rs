//! Entity API for the minimal participant directory.

use super::error::Error;
use chrono::Utc;
use entity::profiles::{ActiveModel, Column, Entity, Model};
use entity::{users, Id};
use log::*;
use sea_orm::{entity::prelude::*, sea_query::OnConflict, ConnectionTrait, Set};

pub async fn find_by_user_id(db: &impl ConnectionTrait, user_id: Id) -> Result<Model, Error> {
    Entity::find()
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

/// Inserts a minimal profile for `user` unless one already exists.
///
/// Idempotent: a concurrent or repeated call is absorbed by the unique
/// `user_id` constraint (`ON CONFLICT DO NOTHING`). Returns the number of rows
/// inserted, which is 0 when the profile was already present.
pub async fn ensure_exists(db: &impl ConnectionTrait, user: &users::Model) -> Result<u64, Error> {
    let now = Utc::now();
    let name = user
        .display_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| default_name(&user.email));

    let active_model = ActiveModel {
        user_id: Set(user.id),
        name: Set(name),
        email: Set(user.email.clone()),
        role: Set(user.role.clone()),
        is_verified: Set(user.is_verified),
        is_mentor_available: Set(false),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    let inserted = Entity::insert(active_model)
        .on_conflict(OnConflict::column(Column::UserId).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;

    if inserted > 0 {
        debug!("Created minimal profile for user {}", user.id);
    }

    Ok(inserted)
}

/// Local part of an e-mail address, used when an identity has no display name.
fn default_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name_uses_the_local_part_of_the_email() {
        assert_eq!(default_name("ada.lovelace@example.edu"), "ada.lovelace");
        assert_eq!(default_name("no-at-sign"), "no-at-sign");
    }
}
