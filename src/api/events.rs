//! Domain event fan-out: every event is logged, and mirrored to NATS when a
//! connection is configured.

use tracing::{info, warn};
use crate::domain::events::DomainEvent;

pub const SUBJECT_PREFIX: &str = "storefront";

#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub fn is_connected(&self) -> bool { self.nats.is_some() }

    pub async fn publish(&self, events: Vec<DomainEvent>) {
        for event in events {
            info!(event = event.name(), "domain event");
            let Some(nats) = &self.nats else { continue };
            let payload = match serde_json::to_vec(&event) {
                Ok(payload) => payload,
                Err(e) => { warn!(error = %e, "failed to encode event"); continue; }
            };
            let subject = format!("{SUBJECT_PREFIX}.{}", event.name());
            if let Err(e) = nats.publish(subject, payload.into()).await {
                warn!(error = %e, event = event.name(), "failed to publish event");
            }
        }
    }
}
