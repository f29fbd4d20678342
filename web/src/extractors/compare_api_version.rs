use crate::extractors::RejectionType;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use log::*;
use service::config::ApiVersion;

/// Rejects requests whose `x-version` header does not name a supported API version.
pub(crate) struct CompareApiVersion(pub String);

impl<S> FromRequestParts<S> for CompareApiVersion
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let version = parts
            .headers
            .get(ApiVersion::field_name())
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("Missing {} header", ApiVersion::field_name()),
                )
            })?;

        if ApiVersion::versions().iter().any(|supported| *supported == version) {
            Ok(CompareApiVersion(version.to_string()))
        } else {
            warn!("Rejecting request for unsupported API version {version}");
            Err((
                StatusCode::BAD_REQUEST,
                format!("Unsupported API version {version}"),
            ))
        }
    }
}
