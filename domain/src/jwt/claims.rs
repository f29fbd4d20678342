//! Claims carried by the bearer tokens the authentication service issues.
//!
//! The token format is shared with the JavaScript frontend, so claim names are
//! camel-cased on the wire.

use entity::{roles::Role, Id};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IdentityClaims {
    pub(crate) user_id: Id,
    pub(crate) email: String,
    pub(crate) role: Role,
    #[serde(default)]
    pub(crate) is_verified: bool,
    pub(crate) exp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_use_camel_case_names() {
        let claims = IdentityClaims {
            user_id: Id::nil(),
            email: "ada@student.example.edu".to_string(),
            role: Role::Student,
            is_verified: true,
            exp: 1_900_000_000,
        };

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], Id::nil().to_string());
        assert_eq!(json["isVerified"], true);
        assert_eq!(json["role"], "student");
    }

    #[test]
    fn missing_is_verified_defaults_to_false() {
        let claims: IdentityClaims = serde_json::from_value(serde_json::json!({
            "userId": Id::nil(),
            "email": "grace@alumni.example.edu",
            "role": "alumni",
            "exp": 1_900_000_000usize
        }))
        .unwrap();
        assert!(!claims.is_verified);
    }
}
