//! NATS subscription for incoming prediction requests

use anyhow::Result;
use async_nats::{Client, Subscriber};
use tracing::info;

/// Queue group shared by service replicas so each request is handled once.
pub const QUEUE_GROUP: &str = "churn-service";

/// Consumer for receiving prediction requests from NATS
pub struct RequestConsumer {
    client: Client,
    subject: String,
}

impl RequestConsumer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the request subject within the service queue group
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self
            .client
            .queue_subscribe(self.subject.clone(), QUEUE_GROUP.to_string())
            .await?;
        info!(subject = %self.subject, queue = QUEUE_GROUP, "Subscribed to request subject");
        Ok(subscriber)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
