use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(schema_name = "mentorship_platform", table_name = "mentorship_reviews")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    #[schema(value_type = Uuid)]
    pub mentorship_request_id: Id,
    /// Always the request's student.
    #[schema(value_type = Uuid)]
    pub reviewer_id: Id,
    /// 1 through 5 inclusive.
    pub rating: i32,
    pub comment: Option<String>,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mentorship_requests::Entity",
        from = "Column::MentorshipRequestId",
        to = "super::mentorship_requests::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    MentorshipRequests,
}

impl Related<super::mentorship_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MentorshipRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
