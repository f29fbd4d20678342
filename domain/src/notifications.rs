//! Best-effort e-mail notifications driven by committed domain events.
//!
//! Sending happens on a spawned task. A missing template, an unknown
//! recipient or a MailerSend failure is logged and dropped; the operation
//! that produced the event has already committed.

use crate::error::Error;
use crate::{emails, mentorship_request, profile, Id};
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use service::config::Config;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Notification {
    /// Mentor learns about a new request.
    NewRequest,
    /// Student learns the mentor's decision.
    StatusChanged,
}

pub struct EmailNotificationHandler {
    db: Arc<DatabaseConnection>,
    config: Config,
}

impl EmailNotificationHandler {
    pub fn new(db: Arc<DatabaseConnection>, config: Config) -> Self {
        Self { db, config }
    }
}

#[async_trait]
impl EventHandler for EmailNotificationHandler {
    async fn handle(&self, event: &DomainEvent) {
        let Some((notification, request_id)) = notification_for(event) else {
            trace!("No e-mail notification for {} events", event.name());
            return;
        };

        let db = Arc::clone(&self.db);
        let config = self.config.clone();
        tokio::spawn(async move {
            if let Err(err) = send(db.as_ref(), &config, notification, request_id).await {
                warn!("Failed to send {notification:?} e-mail for mentorship request {request_id}: {err}");
            }
        });
    }
}

fn notification_for(event: &DomainEvent) -> Option<(Notification, Id)> {
    if event.notify_user_ids().is_empty() {
        return None;
    }

    let (notification, request) = match event {
        DomainEvent::MentorshipRequestCreated {
            mentorship_request, ..
        } => (Notification::NewRequest, mentorship_request),
        DomainEvent::MentorshipRequestStatusChanged {
            mentorship_request, ..
        } => (Notification::StatusChanged, mentorship_request),
        _ => return None,
    };

    let request_id = request_id(request)?;
    Some((notification, request_id))
}

fn request_id(request: &Value) -> Option<Id> {
    request
        .get("id")
        .and_then(Value::as_str)
        .and_then(|id| Id::parse_str(id).ok())
}

async fn send(
    db: &DatabaseConnection,
    config: &Config,
    notification: Notification,
    request_id: Id,
) -> Result<(), Error> {
    let request = mentorship_request::find_by_id(db, request_id).await?;
    let Some(mentor_id) = request.mentor_id else {
        debug!("Mentorship request {request_id} has no mentor, skipping e-mail");
        return Ok(());
    };

    let student = profile::find_by_user_id(db, request.student_id).await?;
    let mentor = profile::find_by_user_id(db, mentor_id).await?;

    match notification {
        Notification::NewRequest => {
            emails::send_mentorship_request_email(config, &mentor, &student, &request).await
        }
        Notification::StatusChanged => {
            emails::send_mentorship_status_email(config, &student, &mentor, &request).await
        }
    }
}
