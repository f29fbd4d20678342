use crate::{
    controller::health_check_controller, middleware::auth::require_auth, params, protect, AppState,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use crate::controller::{
    mentor_controller, mentorship_request_controller, message_controller, review_controller, user,
};

use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Mentorship Platform API"
        ),
        paths(
            health_check_controller::health_check,
            mentorship_request_controller::create,
            mentorship_request_controller::index,
            mentorship_request_controller::read,
            mentorship_request_controller::update_status,
            mentorship_request_controller::close_chat,
            message_controller::index,
            message_controller::create,
            message_controller::mark_read,
            review_controller::index,
            review_controller::create,
            mentor_controller::capacity,
            mentor_controller::reviews,
            user::mentorship_request_controller::student_index,
            user::mentorship_request_controller::mentor_index,
            user::mentor_controller::index,
            user::usage_controller::read,
        ),
        components(
            schemas(
                domain::mentorship_requests::Model,
                domain::mentorship_reviews::Model,
                domain::messages::Model,
                domain::mentorship_status::MentorshipStatus,
                params::mentorship_request::CreateParams,
                params::mentorship_request::UpdateStatusParams,
                params::mentorship_request::CloseChatParams,
                params::message::CreateParams,
                params::review::CreateParams,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "mentorship_platform", description = "Alumni Mentorship API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines the bearer token authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(mentorship_request_routes(app_state.clone()))
        .merge(message_routes(app_state.clone()))
        .merge(review_routes(app_state.clone()))
        .merge(mentor_routes(app_state.clone()))
        .merge(user_mentorship_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn mentorship_request_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/mentorship_requests",
            post(mentorship_request_controller::create),
        )
        .route(
            "/mentorship_requests/{id}",
            get(mentorship_request_controller::read),
        )
        .route(
            "/mentorship_requests/{id}/status",
            put(mentorship_request_controller::update_status),
        )
        .route(
            "/mentorship_requests/{id}/close_chat",
            put(mentorship_request_controller::close_chat),
        )
        .merge(
            // GET /mentorship_requests
            Router::new()
                .route(
                    "/mentorship_requests",
                    get(mentorship_request_controller::index),
                )
                .route_layer(from_fn_with_state(
                    app_state.clone(),
                    protect::mentorship_requests::index,
                )),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn message_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/mentorship_requests/{id}/messages",
            get(message_controller::index).post(message_controller::create),
        )
        .route(
            "/mentorship_requests/{id}/messages/read",
            put(message_controller::mark_read),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn review_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/mentorship_requests/{id}/reviews",
            get(review_controller::index).post(review_controller::create),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn mentor_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/mentors/{mentor_id}/capacity",
            get(mentor_controller::capacity),
        )
        .route(
            "/mentors/{mentor_id}/reviews",
            get(mentor_controller::reviews),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn user_mentorship_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/users/{user_id}/mentorship_requests/student",
            get(user::mentorship_request_controller::student_index),
        )
        .route(
            "/users/{user_id}/mentorship_requests/mentor",
            get(user::mentorship_request_controller::mentor_index),
        )
        .route(
            "/users/{user_id}/mentors",
            get(user::mentor_controller::index),
        )
        .route(
            "/users/{user_id}/mentorship_usage",
            get(user::usage_controller::read),
        )
        .route_layer(from_fn_with_state(app_state.clone(), protect::users::read))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}


#[cfg(test)]
#[cfg(feature = "mock")]
mod mock_tests {
    use super::*;
    use crate::test_support::{app_state, bearer_for};
    use axum::{
        body::{to_bytes, Body},
        http::{header::AUTHORIZATION, header::CONTENT_TYPE, Request, StatusCode},
    };
    use chrono::Utc;
    use domain::{
        mentorship_requests, mentorship_status::MentorshipStatus, roles::Role, Id,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::Value;
    use service::config::ApiVersion;
    use std::collections::BTreeMap;
    use tower::ServiceExt;

    fn request_model(student_id: Id, mentor_id: Id, status: MentorshipStatus) -> mentorship_requests::Model {
        let now = Utc::now();
        mentorship_requests::Model {
            id: Id::new_v4(),
            student_id,
            mentor_id: Some(mentor_id),
            field_of_interest: "Distributed systems".to_string(),
            description: None,
            goals: None,
            preferred_time: None,
            status,
            chat_closed_reason: None,
            chat_closed_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn count_row(count: i64) -> BTreeMap<&'static str, sea_orm::Value> {
        BTreeMap::from([("num_items", sea_orm::Value::from(count))])
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn participant_reads_their_request() -> anyhow::Result<()> {
        let student_id = Id::new_v4();
        let request = request_model(student_id, Id::new_v4(), MentorshipStatus::Pending);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[request.clone()]])
            .into_connection();

        let response = define_routes(app_state(db))
            .oneshot(
                Request::builder()
                    .uri(format!("/mentorship_requests/{}", request.id))
                    .header(ApiVersion::field_name(), ApiVersion::default_version())
                    .header(AUTHORIZATION, bearer_for(student_id, Role::Student))
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status_code"], 200);
        assert_eq!(body["data"]["id"], request.id.to_string());
        Ok(())
    }

    #[tokio::test]
    async fn students_see_their_remaining_request_slots() -> anyhow::Result<()> {
        let student_id = Id::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(3)]])
            .into_connection();

        let response = define_routes(app_state(db))
            .oneshot(
                Request::builder()
                    .uri(format!("/users/{student_id}/mentorship_usage"))
                    .header(ApiVersion::field_name(), ApiVersion::default_version())
                    .header(AUTHORIZATION, bearer_for(student_id, Role::Student))
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["active"], 3);
        assert_eq!(body["data"]["limit"], 5);
        assert_eq!(body["data"]["remaining"], 2);
        Ok(())
    }

    #[tokio::test]
    async fn posting_an_empty_message_is_a_bad_request() -> anyhow::Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let response = define_routes(app_state(db))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/mentorship_requests/{}/messages", Id::new_v4()))
                    .header(ApiVersion::field_name(), ApiVersion::default_version())
                    .header(AUTHORIZATION, bearer_for(Id::new_v4(), Role::Student))
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"content":"   "}"#))?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "INVALID_ARGUMENT");
        Ok(())
    }
}
