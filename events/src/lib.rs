//! Event system infrastructure for the mentorship platform.
//!
//! Domain operations publish a [`DomainEvent`] only after their transaction
//! has committed, so handlers (e-mail notifications today) can never roll back
//! or block a state change.
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing all business events in the system
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies. Entity data is carried as serialized JSON values.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = Uuid;

/// Domain events that represent business-level changes in the system.
///
/// Events include the user IDs to notify. The domain layer decides who that
/// is; handlers only route.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A student asked a mentor for mentorship.
    MentorshipRequestCreated {
        /// Serialized request as stored (status `pending`).
        mentorship_request: Value,
        /// The mentor.
        notify_user_ids: Vec<Id>,
    },
    /// The mentor accepted, declined or completed a request.
    MentorshipRequestStatusChanged {
        mentorship_request: Value,
        /// Status before the transition, lowercase.
        previous_status: String,
        /// The student.
        notify_user_ids: Vec<Id>,
    },
    /// The mentor closed the conversation on a request.
    MentorshipChatClosed {
        mentorship_request: Value,
        notify_user_ids: Vec<Id>,
    },
    /// A participant posted a chat message.
    MessagePosted {
        mentorship_request_id: Id,
        message: Value,
        /// The other participant.
        notify_user_ids: Vec<Id>,
    },
    /// The student reviewed a finished mentorship.
    MentorshipReviewSubmitted {
        mentorship_request_id: Id,
        review: Value,
        /// The mentor.
        notify_user_ids: Vec<Id>,
    },
}

impl DomainEvent {
    /// Short, stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::MentorshipRequestCreated { .. } => "mentorship_request_created",
            DomainEvent::MentorshipRequestStatusChanged { .. } => {
                "mentorship_request_status_changed"
            }
            DomainEvent::MentorshipChatClosed { .. } => "mentorship_chat_closed",
            DomainEvent::MessagePosted { .. } => "message_posted",
            DomainEvent::MentorshipReviewSubmitted { .. } => "mentorship_review_submitted",
        }
    }

    pub fn notify_user_ids(&self) -> &[Id] {
        match self {
            DomainEvent::MentorshipRequestCreated {
                notify_user_ids, ..
            }
            | DomainEvent::MentorshipRequestStatusChanged {
                notify_user_ids, ..
            }
            | DomainEvent::MentorshipChatClosed {
                notify_user_ids, ..
            }
            | DomainEvent::MessagePosted {
                notify_user_ids, ..
            }
            | DomainEvent::MentorshipReviewSubmitted {
                notify_user_ids, ..
            } => notify_user_ids,
        }
    }
}

/// Trait for handling domain events.
/// Implementations can perform side effects like sending notifications,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Publish an event to all registered handlers, sequentially.
    /// Handlers own their failures; nothing is reported back to the publisher.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
