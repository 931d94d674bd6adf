use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use uuid::Uuid;

use common::outbox::{EventPublisher, OutboxError};

/// Broker producer backing the Coordinator's outbox publisher (spec
/// §4.3). `acks=all` plus `enable.idempotence` keeps a single publish
/// attempt from double-appending to the log; the outbox's own
/// `publishedAt` flag is what makes the outer at-least-once tick safe
/// to retry, not this.
pub struct KafkaEventPublisher {
    producer: FutureProducer,
}

impl KafkaEventPublisher {
    pub fn new(brokers: &str) -> Result<Self, OutboxError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("compression.type", "snappy")
            .set("linger.ms", "10")
            .create()
            .map_err(|e| OutboxError::Publish(format!("failed to create producer: {e}")))?;

        Ok(Self { producer })
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: Uuid,
        payload: &serde_json::Value,
    ) -> Result<(), OutboxError> {
        let key = key.to_string();
        let body = serde_json::to_string(payload)
            .map_err(|e| OutboxError::Publish(format!("payload serialization failed: {e}")))?;

        let record = FutureRecord::to(topic).key(&key).payload(&body);

        self.producer
            .send(record, Duration::from_secs(5))
            .await
            .map(|_| ())
            .map_err(|(e, _)| OutboxError::Publish(e.to_string()))
    }
}
