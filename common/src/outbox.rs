//! The transactional outbox and its polling publisher (spec §4.3).
//!
//! Producers never touch this module directly to emit domain events —
//! they insert an [`OutboxDraft`] via their own repository's
//! transaction, in the same local transaction as the domain mutation
//! that produced it. This module only owns the *publishing* half: a
//! generic loop that drains unpublished rows to the broker, shared by
//! both services via the [`OutboxStore`] and [`EventPublisher`] ports.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::events::OutboxEventType;

#[derive(Debug, Error)]
pub enum OutboxError {
    #[error("outbox store error: {0}")]
    Store(String),
    #[error("event publish error: {0}")]
    Publish(String),
}

/// A not-yet-persisted outbox row, produced by a use case alongside its
/// domain mutation. `aggregate_id` is the broker message key — for
/// saga events this is always the `transferId` so per-saga ordering is
/// preserved on the wire (spec §3, §5).
#[derive(Debug, Clone)]
pub struct OutboxDraft {
    pub aggregate_type: &'static str,
    pub aggregate_id: Uuid,
    pub event_type: OutboxEventType,
    pub payload: serde_json::Value,
}

impl OutboxDraft {
    pub fn new(
        aggregate_type: &'static str,
        aggregate_id: Uuid,
        event_type: OutboxEventType,
        payload: &impl Serialize,
    ) -> Result<Self, OutboxError> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| OutboxError::Store(format!("payload serialization failed: {e}")))?;
        Ok(Self {
            aggregate_type,
            aggregate_id,
            event_type,
            payload,
        })
    }
}

/// A persisted outbox row as read back by the publisher.
#[derive(Debug, Clone)]
pub struct OutboxRecord {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub event_type: OutboxEventType,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Port onto a service's own `outbox` table. Implemented once per
/// service against its own Postgres pool.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Selects up to `limit` unpublished records `FOR UPDATE SKIP
    /// LOCKED` ordered by `created_at ASC`, emits each to `publisher`,
    /// and marks the ones that were emitted successfully as published —
    /// all inside the one local transaction opened for this call
    /// (spec §4.3 step 1-4, §5 "single commit window"). The row lock
    /// must stay held for the whole call, not just the SELECT, or a
    /// second publisher instance could select the same rows before
    /// this one commits its `published_at` update. Returns the number
    /// published.
    async fn drain(&self, limit: i64, publisher: &dyn EventPublisher) -> Result<usize, OutboxError>;
}

/// Port onto the broker. Implemented once per service via its Kafka
/// producer.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        key: Uuid,
        payload: &serde_json::Value,
    ) -> Result<(), OutboxError>;
}

/// Drains a service's outbox to the broker on a fixed period. One
/// instance per service process; safe to run redundantly across
/// replicas thanks to skip-locked selection.
pub struct OutboxPublisher<S, P> {
    store: S,
    publisher: P,
    batch_size: i64,
    period: Duration,
}

impl<S, P> OutboxPublisher<S, P>
where
    S: OutboxStore,
    P: EventPublisher,
{
    pub fn new(store: S, publisher: P, batch_size: i64, period: Duration) -> Self {
        Self {
            store,
            publisher,
            batch_size,
            period,
        }
    }

    /// Runs a single poll: drains up to `batch_size` unpublished rows
    /// through the store, which selects, emits, and marks them
    /// published inside one local transaction. Rows whose emission
    /// failed stay `NULL` and are retried on the next tick — unbounded
    /// tail retry is acceptable because emission is the only
    /// non-terminal side effect (spec §7).
    pub async fn tick(&self) -> Result<usize, OutboxError> {
        let published = self.store.drain(self.batch_size, &self.publisher).await?;
        if published > 0 {
            debug!(count = published, "outbox records published");
        }
        Ok(published)
    }

    /// Runs [`tick`](Self::tick) forever on `period`, logging and
    /// continuing on error — a missed tick is harmless because the
    /// effect is idempotent (spec §5 "Cancellation and timeouts").
    pub async fn run(self) -> ! {
        let mut interval = tokio::time::interval(self.period);
        loop {
            interval.tick().await;
            if let Err(e) = self.tick().await {
                error!(error = %e, "outbox publisher tick failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeStore {
        rows: Mutex<Vec<OutboxRecord>>,
        published: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl OutboxStore for FakeStore {
        /// Mirrors the Postgres adapter's contract (select, emit, mark
        /// published) without needing to hold a lock across an await
        /// point — the in-memory rows are snapshotted up front and
        /// reconciled at the end, which is observationally the same as
        /// a real transaction holding the row lock for the same span
        /// since nothing else touches this `FakeStore` concurrently in
        /// a single-threaded test.
        async fn drain(&self, limit: i64, publisher: &dyn EventPublisher) -> Result<usize, OutboxError> {
            let batch: Vec<OutboxRecord> = {
                let rows = self.rows.lock().unwrap();
                rows.iter().take(limit as usize).cloned().collect()
            };

            let mut published_ids = Vec::with_capacity(batch.len());
            for record in &batch {
                let outcome = publisher
                    .publish(record.event_type.topic(), record.aggregate_id, &record.payload)
                    .await;
                if outcome.is_ok() {
                    published_ids.push(record.id);
                }
            }

            let mut rows = self.rows.lock().unwrap();
            rows.retain(|r| !published_ids.contains(&r.id));
            self.published.lock().unwrap().extend_from_slice(&published_ids);
            Ok(published_ids.len())
        }
    }

    struct FakePublisher {
        fail_topics: Vec<&'static str>,
    }

    #[async_trait]
    impl EventPublisher for FakePublisher {
        async fn publish(
            &self,
            topic: &str,
            _key: Uuid,
            _payload: &serde_json::Value,
        ) -> Result<(), OutboxError> {
            if self.fail_topics.contains(&topic) {
                Err(OutboxError::Publish("simulated broker outage".into()))
            } else {
                Ok(())
            }
        }
    }

    fn record(event_type: OutboxEventType) -> OutboxRecord {
        OutboxRecord {
            id: Uuid::now_v7(),
            aggregate_type: "transfer".to_string(),
            aggregate_id: Uuid::now_v7(),
            event_type,
            payload: serde_json::json!({}),
            created_at: Utc::now(),
            published_at: None,
        }
    }

    #[tokio::test]
    async fn tick_publishes_and_marks_all_on_success() {
        let rows = vec![
            record(OutboxEventType::TransferInitiated),
            record(OutboxEventType::WalletDebited),
        ];
        let store = FakeStore {
            rows: Mutex::new(rows),
            published: Mutex::new(vec![]),
        };
        let publisher = OutboxPublisher::new(
            store,
            FakePublisher { fail_topics: vec![] },
            100,
            Duration::from_millis(50),
        );

        let n = publisher.tick().await.unwrap();
        assert_eq!(n, 2);
        assert!(publisher.store.rows.lock().unwrap().is_empty());
        assert_eq!(publisher.store.published.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_publish_leaves_record_unpublished_for_retry() {
        let rows = vec![
            record(OutboxEventType::TransferInitiated),
            record(OutboxEventType::WalletDebited),
        ];
        let store = FakeStore {
            rows: Mutex::new(rows),
            published: Mutex::new(vec![]),
        };
        let publisher = OutboxPublisher::new(
            store,
            FakePublisher {
                fail_topics: vec!["wallet.debited"],
            },
            100,
            Duration::from_millis(50),
        );

        let n = publisher.tick().await.unwrap();
        assert_eq!(n, 1);
        assert_eq!(publisher.store.rows.lock().unwrap().len(), 1);
        assert_eq!(
            publisher.store.rows.lock().unwrap()[0].event_type,
            OutboxEventType::WalletDebited
        );
    }

    #[tokio::test]
    async fn empty_outbox_is_a_no_op() {
        let store = FakeStore {
            rows: Mutex::new(vec![]),
            published: Mutex::new(vec![]),
        };
        let publisher = OutboxPublisher::new(
            store,
            FakePublisher { fail_topics: vec![] },
            100,
            Duration::from_millis(50),
        );
        assert_eq!(publisher.tick().await.unwrap(), 0);
    }
}
