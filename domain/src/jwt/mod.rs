//! Identity Resolver: turns a bearer token into the caller's [`Identity`].
//!
//! Tokens are HS256 JWTs signed by the authentication service with the
//! configured `jwt_secret`. This module only verifies them; `issue_token`
//! exists for seeding and tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use domain::jwt::decode_identity;
//! use service::config::Config;
//!
//! fn example(config: &Config, token: &str) {
//!     match decode_identity(config, token) {
//!         Ok(identity) => println!("Caller: {}", identity.user_id),
//!         Err(e) => eprintln!("Rejected token: {:?}", e),
//!     }
//! }
//! ```

use crate::error::Error;
use chrono::{Duration, Utc};
use claims::IdentityClaims;
use entity::{roles::Role, Id};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::Serialize;
use service::config::Config;

pub(crate) mod claims;

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub user_id: Id,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<IdentityClaims> for Identity {
    fn from(claims: IdentityClaims) -> Self {
        Identity {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
            is_verified: claims.is_verified,
        }
    }
}

/// Verifies `token` and returns the identity it carries. Expired, malformed or
/// wrongly signed tokens are rejected as unauthenticated.
pub fn decode_identity(config: &Config, token: &str) -> Result<Identity, Error> {
    let secret = config.jwt_secret().ok_or_else(|| {
        error!("No JWT secret configured, cannot verify bearer tokens");
        Error::config()
    })?;

    let token_data = decode::<IdentityClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .inspect_err(|err| debug!("Bearer token rejected: {err}"))?;

    Ok(token_data.claims.into())
}

/// Signs a token for `identity` that expires after `valid_for`.
pub fn issue_token(config: &Config, identity: &Identity, valid_for: Duration) -> Result<String, Error> {
    let secret = config.jwt_secret().ok_or_else(|| {
        warn!("No JWT secret configured, cannot issue bearer tokens");
        Error::config()
    })?;

    let claims = IdentityClaims {
        user_id: identity.user_id,
        email: identity.email.clone(),
        role: identity.role.clone(),
        is_verified: identity.is_verified,
        exp: usize::try_from((Utc::now() + valid_for).timestamp()).unwrap_or_default(),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, ExternalErrorKind, InternalErrorKind};
    use clap::Parser;

    fn config_with_secret(secret: &str) -> Config {
        Config::parse_from(["mentorship_platform_rs"]).set_jwt_secret(secret.to_string())
    }

    fn identity() -> Identity {
        Identity {
            user_id: Id::new_v4(),
            email: "ada@student.example.edu".to_string(),
            role: Role::Student,
            is_verified: true,
        }
    }

    #[test]
    fn issued_tokens_decode_to_the_same_identity() -> Result<(), Error> {
        let config = config_with_secret("test-secret");
        let identity = identity();

        let token = issue_token(&config, &identity, Duration::hours(1))?;
        assert_eq!(decode_identity(&config, &token)?, identity);

        Ok(())
    }

    #[test]
    fn expired_tokens_are_unauthenticated() -> Result<(), Error> {
        let config = config_with_secret("test-secret");
        let token = issue_token(&config, &identity(), Duration::hours(-2))?;

        let err = decode_identity(&config, &token).unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Unauthenticated)
        );

        Ok(())
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() -> Result<(), Error> {
        let token = issue_token(&config_with_secret("one"), &identity(), Duration::hours(1))?;
        assert!(decode_identity(&config_with_secret("two"), &token).is_err());
        Ok(())
    }

    #[test]
    fn garbage_is_rejected() {
        let config = config_with_secret("test-secret");
        assert!(decode_identity(&config, "undefined").is_err());
    }

    #[test]
    fn only_the_admin_role_is_admin() {
        let mut caller = identity();
        assert!(!caller.is_admin());
        caller.role = Role::Admin;
        assert!(caller.is_admin());
    }

    #[test]
    fn missing_secret_is_a_config_error() {
        let config = Config::parse_from(["mentorship_platform_rs"]);
        if config.jwt_secret().is_none() {
            let err = decode_identity(&config, "token").unwrap_err();
            assert_eq!(err.error_kind, DomainErrorKind::Internal(InternalErrorKind::Config));
        }
    }
}
