use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use events::EventPublisher;
use log::*;
use sea_orm::DatabaseConnection;
use service::config::{ApiVersion, Config};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

mod controller;
mod error;
mod extractors;
mod middleware;
mod params;
mod protect;
mod router;

pub use error::{Error, Result};

/// Web-layer state handed to every handler. Wraps the infrastructure-only
/// `service::AppState` and adds the publisher that post-commit hooks hang off.
#[derive(Clone)]
pub struct AppState {
    service_state: service::AppState,
    pub event_publisher: Arc<EventPublisher>,
}

impl AppState {
    pub fn new(service_state: service::AppState, event_publisher: Arc<EventPublisher>) -> Self {
        Self {
            service_state,
            event_publisher,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.service_state.db_conn_ref()
    }

    pub fn config(&self) -> &Config {
        &self.service_state.config
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let config = app_state.config().clone();

    let allowed_origins = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect::<Vec<_>>();
    info!("CORS allowed origins: {:?}", config.allowed_origins);

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::DELETE, Method::GET, Method::POST, Method::PUT])
        .allow_credentials(true)
        .allow_headers([
            AUTHORIZATION,
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static(ApiVersion::field_name()),
        ])
        .allow_origin(allowed_origins);

    let router = router::define_routes(app_state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(cors_layer);

    let host = config.interface.as_deref().unwrap_or("127.0.0.1");
    let server_url = format!("{host}:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&server_url).await?;

    info!(
        "Server starting... listening for connections on http://{host}:{} (API version {})",
        config.port,
        config.api_version()
    );

    axum::serve(listener, router).await
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use clap::Parser;
    use domain::{jwt, roles::Role, Id};

    pub(crate) const JWT_SECRET: &str = "test-jwt-secret";

    pub(crate) fn config() -> Config {
        Config::parse_from(["mentorship_platform_rs"]).set_jwt_secret(JWT_SECRET.to_string())
    }

    pub(crate) fn app_state(db: DatabaseConnection) -> AppState {
        let service_state = service::AppState::new(config(), &Arc::new(db));
        AppState::new(service_state, Arc::new(EventPublisher::new()))
    }

    pub(crate) fn bearer_for(user_id: Id, role: Role) -> String {
        let identity = jwt::Identity {
            user_id,
            email: format!("{user_id}@alumni-network.org"),
            role,
            is_verified: true,
        };
        let token = jwt::issue_token(&config(), &identity, chrono::Duration::hours(1))
            .expect("token should be issued");
        format!("Bearer {token}")
    }
}
