use crate::mentorship_status::MentorshipStatus;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(schema_name = "mentorship_platform", table_name = "mentorship_requests")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    #[schema(value_type = Uuid)]
    pub student_id: Id,
    #[schema(value_type = Option<Uuid>)]
    pub mentor_id: Option<Id>,
    pub field_of_interest: String,
    pub description: Option<String>,
    pub goals: Option<String>,
    pub preferred_time: Option<String>,
    pub status: MentorshipStatus,
    pub chat_closed_reason: Option<String>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub chat_closed_at: Option<DateTimeWithTimeZone>,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn is_mentor(&self, user_id: Id) -> bool {
        self.mentor_id == Some(user_id)
    }

    pub fn is_participant(&self, user_id: Id) -> bool {
        self.student_id == user_id || self.is_mentor(user_id)
    }

    pub fn is_chat_closed(&self) -> bool {
        self.chat_closed_at.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::messages::Entity")]
    Messages,
    #[sea_orm(has_many = "super::mentorship_reviews::Entity")]
    MentorshipReviews,
}

impl Related<super::messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl Related<super::mentorship_reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MentorshipReviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
