//! This module provides protection mechanisms for various resources in the web application.
//!
//! It includes submodules for authorizing access to resources. Each submodule contains the necessary logic to protect
//! the corresponding resources, ensuring that only authorized users can access or modify them.
//!
//! Participant checks on individual mentorship requests live in the `domain` layer, since the
//! request row has to be read under the same transaction that acts on it. The rules here cover
//! access that can be decided from the caller's identity and the path alone.

pub(crate) mod mentorship_requests;
pub(crate) mod users;

use crate::AppState;
use async_trait::async_trait;
use axum::{extract::Request, http::StatusCode, middleware::Next, response::IntoResponse};
use domain::{jwt::Identity, Id};

/// Trait representing a single authorization rule.
///
/// Implementors answer **“is the authenticated user allowed to proceed?”**.
/// The rule receives:
/// * shared application state (`AppState`)
/// * the authenticated caller's [`Identity`]
/// * any additional [`Id`] parameters supplied by the caller.
///
/// Example:
/// ```rust,ignore
/// #[async_trait]
/// impl Check for UserIsAdmin {
///     async fn eval(&self, _app: &AppState, identity: &Identity, _args: Vec<Id>) -> bool {
///         identity.is_admin()
///     }
/// }
/// ```
#[async_trait]
pub trait Check: Send + Sync {
    async fn eval(&self, app: &AppState, identity: &Identity, args: Vec<Id>) -> bool;
}

/// Pairs a [`Check`] implementation with the concrete arguments that the rule
/// should receive when evaluated.
///
/// ```rust,ignore
/// let checks = vec![Predicate::new(UserIsSelfOrAdmin, vec![user_id])];
/// ```
/// The vector of predicates can then be passed to [`authorize`] middleware.
pub(crate) struct Predicate {
    predicate: Box<dyn Check>,
    args: Vec<Id>,
}

impl Predicate {
    pub(crate) fn new<C: Check + 'static>(predicate: C, args: Vec<Id>) -> Self {
        Self {
            predicate: Box::new(predicate),
            args,
        }
    }

    pub(crate) async fn check(&self, app_state: &AppState, identity: &Identity) -> bool {
        self.predicate
            .eval(app_state, identity, self.args.clone())
            .await
    }
}

/// Axum middleware that enforces one or more [`Predicate`]s.
///
/// Each predicate is evaluated in the order supplied; if any rule returns
/// `false` the request is aborted with **403 FORBIDDEN**.  When all rules
/// pass the wrapped handler (`next`) is executed.
pub(crate) async fn authorize(
    app_state: &AppState,
    identity: Identity,
    request: Request,
    next: Next,
    checks: Vec<Predicate>,
) -> impl IntoResponse {
    for check in checks {
        if !check.check(app_state, &identity).await {
            return (StatusCode::FORBIDDEN, "FORBIDDEN").into_response();
        }
    }
    next.run(request).await
}

pub struct UserIsAdmin;

#[async_trait]
impl Check for UserIsAdmin {
    async fn eval(&self, _app_state: &AppState, identity: &Identity, _args: Vec<Id>) -> bool {
        identity.is_admin()
    }
}

/// Passes when the caller is the user named by `args[0]`, or an admin.
pub struct UserIsSelfOrAdmin;

#[async_trait]
impl Check for UserIsSelfOrAdmin {
    async fn eval(&self, _app_state: &AppState, identity: &Identity, args: Vec<Id>) -> bool {
        match args.first() {
            Some(user_id) => identity.user_id == *user_id || identity.is_admin(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::app_state;
    use domain::roles::Role;
    use sea_orm::DatabaseConnection;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: Id::new_v4(),
            email: "someone@alumni-network.org".to_string(),
            role,
            is_verified: true,
        }
    }

    #[tokio::test]
    async fn user_is_admin_only_passes_admins() {
        let app_state = app_state(DatabaseConnection::Disconnected);
        assert!(UserIsAdmin.eval(&app_state, &identity(Role::Admin), vec![]).await);
        assert!(!UserIsAdmin.eval(&app_state, &identity(Role::Alumni), vec![]).await);
    }

    #[tokio::test]
    async fn user_is_self_or_admin_compares_the_path_user() {
        let app_state = app_state(DatabaseConnection::Disconnected);
        let student = identity(Role::Student);

        assert!(
            UserIsSelfOrAdmin
                .eval(&app_state, &student, vec![student.user_id])
                .await
        );
        assert!(
            !UserIsSelfOrAdmin
                .eval(&app_state, &student, vec![Id::new_v4()])
                .await
        );
        assert!(
            UserIsSelfOrAdmin
                .eval(&app_state, &identity(Role::Admin), vec![student.user_id])
                .await
        );
        assert!(!UserIsSelfOrAdmin.eval(&app_state, &student, vec![]).await);
    }
}
