//! NATS reply publisher for prediction results

use crate::service::ServiceReply;
use anyhow::{Context, Result};
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes replies to the requester's inbox
#[derive(Clone)]
pub struct ReplyPublisher {
    client: Client,
}

impl ReplyPublisher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Publish a reply on the subject the request asked to be answered on
    pub async fn publish(&self, reply_to: Subject, reply: &ServiceReply) -> Result<()> {
        let payload = encode_reply(reply)?;

        self.client
            .publish(reply_to.clone(), payload.into())
            .await
            .with_context(|| format!("Failed to publish reply to {reply_to}"))?;

        debug!(reply_to = %reply_to, accepted = reply.is_accepted(), "Published reply");
        Ok(())
    }
}

/// JSON wire encoding of a reply
pub fn encode_reply(reply: &ServiceReply) -> Result<Vec<u8>> {
    serde_json::to_vec(reply).context("Failed to encode reply")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_reply_encoding() {
        let reply = ServiceReply::Rejected {
            error_kind: "schema_mismatch".to_string(),
            message: "schema mismatch on InternetService".to_string(),
        };
        let bytes = encode_reply(&reply).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["status"], "rejected");
        assert_eq!(json["error_kind"], "schema_mismatch");
    }
}
