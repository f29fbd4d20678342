use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, Value};
use std::collections::HashMap;

pub use entity::{
    mentorship_requests, mentorship_reviews, mentorship_status, messages, profiles, roles, users,
    Id,
};

pub mod error;
pub mod mentorship_request;
pub mod mentorship_review;
pub mod message;
pub mod profile;
pub mod query;
pub mod user;

/// `QueryFilterMap` is a data structure that serves as a bridge for translating filter parameters
/// between different layers of the application. It is essentially a wrapper around a `HashMap`
/// where the keys are filter parameter names (as `String`) and the values are optional `Value` types
/// from `sea_orm`.
///
/// # Example
///
/// ```
/// use sea_orm::Value;
/// use entity_api::QueryFilterMap;
///
/// let mut query_filter_map = QueryFilterMap::new();
/// query_filter_map.insert("mentor_id".to_string(), Some(Value::String(Some(Box::new("a_mentor_id".to_string())))));
/// let filter_value = query_filter_map.get("mentor_id");
/// ```
pub struct QueryFilterMap {
    map: HashMap<String, Option<Value>>,
}

impl QueryFilterMap {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        // HashMap.get returns an Option and so we need to "flatten" this to a single Option
        self.map
            .get(key)
            .and_then(|inner_option| inner_option.clone())
    }

    pub fn insert(&mut self, key: String, value: Option<Value>) {
        self.map.insert(key, value);
    }
}

impl Default for QueryFilterMap {
    fn default() -> Self {
        Self::new()
    }
}

/// `IntoQueryFilterMap` is a trait that provides a method for converting a struct into a `QueryFilterMap`.
/// This is particularly useful for translating data between different layers of the application,
/// such as from web request parameters to database query filters.
///
/// # Example
///
/// ```
/// use entity_api::QueryFilterMap;
/// use entity_api::IntoQueryFilterMap;
///
/// #[derive(Debug)]
/// struct MyParams {
///     student_id: String,
/// }
///
/// impl IntoQueryFilterMap for MyParams {
///     fn into_query_filter_map(self) -> QueryFilterMap {
///         let mut query_filter_map = QueryFilterMap::new();
///         query_filter_map.insert(
///             "student_id".to_string(),
///             Some(sea_orm::Value::String(Some(Box::new(self.student_id)))),
///         );
///         query_filter_map
///     }
/// }
/// ```
pub trait IntoQueryFilterMap {
    fn into_query_filter_map(self) -> QueryFilterMap;
}

/// Populates an empty database with a small mentoring community: one admin,
/// two alumni mentors and three students, with requests in every state.
pub async fn seed_database(db: &DatabaseConnection) -> Result<(), error::Error> {
    let now = Utc::now();

    let seed_user = |email: &str, name: &str, role: roles::Role| users::ActiveModel {
        email: Set(email.to_owned()),
        display_name: Set(Some(name.to_owned())),
        role: Set(role),
        is_verified: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    let admin = seed_user("admin@alumni.example.edu", "Admin User", roles::Role::Admin)
        .insert(db)
        .await?;
    let grace = seed_user("grace@alumni.example.edu", "Grace Hopper", roles::Role::Alumni)
        .insert(db)
        .await?;
    let alan = seed_user("alan@alumni.example.edu", "Alan Turing", roles::Role::Alumni)
        .insert(db)
        .await?;
    let ada = seed_user("ada@student.example.edu", "Ada Lovelace", roles::Role::Student)
        .insert(db)
        .await?;
    let linus = seed_user("linus@student.example.edu", "Linus T", roles::Role::Student)
        .insert(db)
        .await?;
    let margaret = seed_user(
        "margaret@student.example.edu",
        "Margaret Hamilton",
        roles::Role::Student,
    )
    .insert(db)
    .await?;

    for user in [&admin, &grace, &alan, &ada, &linus, &margaret] {
        profile::ensure_exists(db, user).await?;
    }

    let seed_request = |student: &users::Model,
                        mentor: &users::Model,
                        field: &str,
                        status: mentorship_status::MentorshipStatus| {
        mentorship_requests::ActiveModel {
            student_id: Set(student.id),
            mentor_id: Set(Some(mentor.id)),
            field_of_interest: Set(field.to_owned()),
            description: Set(Some(format!("Looking for guidance in {field}"))),
            goals: Set(None),
            preferred_time: Set(Some("Weekday evenings".to_owned())),
            status: Set(status),
            chat_closed_reason: Set(None),
            chat_closed_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
    };

    use mentorship_status::MentorshipStatus::*;

    // Grace is mentoring Ada and has a pending request from Linus.
    let ada_grace = seed_request(&ada, &grace, "Compilers", Accepted)
        .insert(db)
        .await?;
    seed_request(&linus, &grace, "Operating systems", Pending)
        .insert(db)
        .await?;

    // Alan finished mentoring Margaret and declined Ada.
    let margaret_alan = seed_request(&margaret, &alan, "Cryptography", Completed)
        .insert(db)
        .await?;
    seed_request(&ada, &alan, "Machine learning", Declined)
        .insert(db)
        .await?;

    message::create(db, ada_grace.id, ada.id, "Hi Grace, thanks for accepting!".to_owned())
        .await?;
    message::create(db, ada_grace.id, grace.id, "Happy to help. Where shall we start?".to_owned())
        .await?;

    mentorship_review::create(
        db,
        mentorship_reviews::Model {
            id: Id::new_v4(),
            mentorship_request_id: margaret_alan.id,
            reviewer_id: margaret.id,
            rating: 5,
            comment: Some("Patient and insightful".to_owned()),
            created_at: now.into(),
        },
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_filter_map_flattens_missing_and_null_values() {
        let mut map = QueryFilterMap::new();
        map.insert("mentor_id".to_string(), None);
        assert!(map.get("mentor_id").is_none());
        assert!(map.get("student_id").is_none());
    }
}
