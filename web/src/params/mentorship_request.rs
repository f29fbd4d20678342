use sea_orm::{ActiveEnum, Order, Value};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::sort::SortOrder;
use domain::mentorship_request::NewMentorshipRequest;
use domain::{
    mentorship_requests, mentorship_status::MentorshipStatus, Id, IntoQueryFilterMap,
    QueryFilterMap, QuerySort,
};

/// Sortable fields for mentorship requests
#[derive(Debug, Deserialize, ToSchema, PartialEq)]
#[schema(example = "created_at")]
pub(crate) enum MentorshipRequestSortField {
    #[serde(rename = "created_at")]
    CreatedAt,
    #[serde(rename = "updated_at")]
    UpdatedAt,
    #[serde(rename = "status")]
    Status,
}

/// Filters for the administrative listing of mentorship requests.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct IndexParams {
    #[param(value_type = Option<Uuid>)]
    pub(crate) student_id: Option<Id>,
    #[param(value_type = Option<Uuid>)]
    pub(crate) mentor_id: Option<Id>,
    pub(crate) status: Option<MentorshipStatus>,
    pub(crate) sort_by: Option<MentorshipRequestSortField>,
    pub(crate) sort_order: Option<SortOrder>,
}

impl IndexParams {
    /// Oldest first unless the caller asked for something else.
    pub(crate) fn apply_sort_defaults(mut self) -> Self {
        if self.sort_by.is_none() {
            self.sort_by = Some(MentorshipRequestSortField::CreatedAt);
        }
        if self.sort_order.is_none() {
            self.sort_order = Some(SortOrder::Asc);
        }
        self
    }
}

impl IntoQueryFilterMap for IndexParams {
    fn into_query_filter_map(self) -> QueryFilterMap {
        let mut query_filter_map = QueryFilterMap::new();

        if let Some(student_id) = self.student_id {
            query_filter_map.insert(
                "student_id".to_string(),
                Some(Value::Uuid(Some(Box::new(student_id)))),
            );
        }
        if let Some(mentor_id) = self.mentor_id {
            query_filter_map.insert(
                "mentor_id".to_string(),
                Some(Value::Uuid(Some(Box::new(mentor_id)))),
            );
        }
        if let Some(status) = self.status {
            query_filter_map.insert("status".to_string(), Some(Value::from(status.to_value())));
        }

        query_filter_map
    }
}

impl QuerySort<mentorship_requests::Column> for IndexParams {
    fn get_sort_column(&self) -> Option<mentorship_requests::Column> {
        self.sort_by.as_ref().map(|field| match field {
            MentorshipRequestSortField::CreatedAt => mentorship_requests::Column::CreatedAt,
            MentorshipRequestSortField::UpdatedAt => mentorship_requests::Column::UpdatedAt,
            MentorshipRequestSortField::Status => mentorship_requests::Column::Status,
        })
    }

    fn get_sort_order(&self) -> Option<Order> {
        self.sort_order.as_ref().map(Order::from)
    }
}

/// Body of `POST /mentorship_requests`. The student is always the caller.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateParams {
    #[schema(value_type = Uuid)]
    pub mentor_id: Id,
    pub field_of_interest: String,
    pub description: Option<String>,
    pub goals: Option<String>,
    pub preferred_time: Option<String>,
}

impl From<CreateParams> for NewMentorshipRequest {
    fn from(params: CreateParams) -> Self {
        NewMentorshipRequest {
            mentor_id: params.mentor_id,
            field_of_interest: params.field_of_interest,
            description: params.description,
            goals: params.goals,
            preferred_time: params.preferred_time,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusParams {
    pub status: MentorshipStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CloseChatParams {
    pub reason: String,
}
