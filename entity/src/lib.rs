use uuid::Uuid;

pub mod mentorship_requests;
pub mod mentorship_reviews;
pub mod mentorship_status;
pub mod messages;
pub mod profiles;
pub mod roles;
pub mod users;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
