use domain::notifications::EmailNotificationHandler;
use events::EventPublisher;
use log::*;
use service::{config::Config, logging::Logger};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();

    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!(
        "Starting up the Mentorship Platform API server ({} environment)...",
        config.runtime_env()
    );

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    // E-mails go out after the originating transaction has committed
    let event_publisher = EventPublisher::new().with_handler(Arc::new(
        EmailNotificationHandler::new(Arc::clone(&db), config.clone()),
    ));

    let service_state = service::AppState::new(config, &db);
    let app_state = web::AppState::new(service_state, Arc::new(event_publisher));

    if let Err(e) = web::init_server(app_state).await {
        error!("Server exited with an error: {e}");
        std::process::exit(1);
    }
}
