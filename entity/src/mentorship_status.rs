use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle state of a mentorship request.
///
/// `Declined` and `Completed` are terminal: no status transition leaves them.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    EnumIter,
    Deserialize,
    Default,
    Serialize,
    DeriveActiveEnum,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "mentorship_status"
)]
pub enum MentorshipStatus {
    /// Submitted by the student, awaiting the mentor's decision
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    /// Mentor agreed; the conversation is open unless chat was closed
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Mentor refused the request
    #[sea_orm(string_value = "declined")]
    Declined,
    /// Mentor marked the engagement as done
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl MentorshipStatus {
    /// States that count against a student's active-request limit.
    pub const ACTIVE: [MentorshipStatus; 2] = [MentorshipStatus::Pending, MentorshipStatus::Accepted];

    /// States that block a new request for the same student/mentor pair.
    pub const OPEN_PAIRING: [MentorshipStatus; 3] = [
        MentorshipStatus::Pending,
        MentorshipStatus::Accepted,
        MentorshipStatus::Completed,
    ];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MentorshipStatus::Declined | MentorshipStatus::Completed)
    }
}

impl std::fmt::Display for MentorshipStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MentorshipStatus::Pending => write!(fmt, "pending"),
            MentorshipStatus::Accepted => write!(fmt, "accepted"),
            MentorshipStatus::Declined => write!(fmt, "declined"),
            MentorshipStatus::Completed => write!(fmt, "completed"),
        }
    }
}
