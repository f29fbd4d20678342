pub(crate) mod mentor_controller;
pub(crate) mod mentorship_request_controller;
pub(crate) mod usage_controller;
