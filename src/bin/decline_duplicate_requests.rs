//! Maintenance task that declines duplicate active mentorship requests left over
//! from before pair uniqueness was enforced. For each student/mentor pair the
//! newest accepted request is kept (otherwise the newest pending one) and every
//! other pending or accepted request of that pair is declined.

use clap::Parser;
use domain::mentorship_request;
use log::{error, info};
use service::{config::Config, logging::Logger};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(about = "Decline duplicate active mentorship requests per student/mentor pair")]
struct Cli {
    /// Only report how many requests would be declined
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    config: Config,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let Cli { dry_run, config } = Cli::parse();

    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    match mentorship_request::decline_duplicates(db.as_ref(), dry_run).await {
        Ok(count) if dry_run => info!("Dry run: {count} duplicate requests would be declined"),
        Ok(count) => info!("Declined {count} duplicate requests"),
        Err(e) => {
            error!("Failed to decline duplicate requests: {e}");
            std::process::exit(1);
        }
    }
}
