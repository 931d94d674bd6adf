use std::sync::Arc;

use futures_util::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use tracing::{error, info, warn};

use common::events::{
    OutboxEventType, WalletCredited, WalletCreditFailed, WalletDebited, WalletDebitFailed, WalletRefunded,
};

use crate::domain::error::TransferError;
use crate::use_cases::apply_wallet_credit_failed::ApplyWalletCreditFailedUseCase;
use crate::use_cases::apply_wallet_credited::ApplyWalletCreditedUseCase;
use crate::use_cases::apply_wallet_debit_failed::ApplyWalletDebitFailedUseCase;
use crate::use_cases::apply_wallet_debited::ApplyWalletDebitedUseCase;

/// Drives the Coordinator's reactions to the Ledger's side of the
/// choreography (spec §4.1, §4.4): `wallet.debited`,
/// `wallet.debit-failed`, `wallet.credited`, `wallet.credit-failed`.
/// Also subscribes to `wallet.refunded` for audit logging only — the
/// refund itself already drove the saga to FAILED via the preceding
/// `wallet.credit-failed`, so this handler never touches saga state.
/// There is no `transfer.initiated` handler here — that event is the
/// Coordinator's own, consumed only by the Ledger.
///
/// Offsets are committed one message at a time, and only after the
/// handler returns `Ok`. A transient failure is left uncommitted so the
/// broker's own redelivery retries it.
pub struct TransferEventConsumer {
    consumer: StreamConsumer,
    apply_debited: Arc<ApplyWalletDebitedUseCase>,
    apply_debit_failed: Arc<ApplyWalletDebitFailedUseCase>,
    apply_credited: Arc<ApplyWalletCreditedUseCase>,
    apply_credit_failed: Arc<ApplyWalletCreditFailedUseCase>,
}

impl TransferEventConsumer {
    pub fn new(
        brokers: &str,
        group_id: &str,
        apply_debited: Arc<ApplyWalletDebitedUseCase>,
        apply_debit_failed: Arc<ApplyWalletDebitFailedUseCase>,
        apply_credited: Arc<ApplyWalletCreditedUseCase>,
        apply_credit_failed: Arc<ApplyWalletCreditFailedUseCase>,
    ) -> Result<Self, TransferError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "10000")
            .create()
            .map_err(|e| TransferError::RepositoryError(format!("failed to create consumer: {e}")))?;

        let topics = [
            OutboxEventType::WalletDebited.topic(),
            OutboxEventType::WalletDebitFailed.topic(),
            OutboxEventType::WalletCredited.topic(),
            OutboxEventType::WalletCreditFailed.topic(),
            OutboxEventType::WalletRefunded.topic(),
        ];
        consumer
            .subscribe(&topics)
            .map_err(|e| TransferError::RepositoryError(format!("failed to subscribe: {e}")))?;

        Ok(Self {
            consumer,
            apply_debited,
            apply_debit_failed,
            apply_credited,
            apply_credit_failed,
        })
    }

    pub async fn run(self) {
        let mut stream = self.consumer.stream();
        loop {
            match stream.next().await {
                Some(Ok(message)) => {
                    let topic = message.topic().to_string();
                    let payload = message.payload().map(|p| p.to_vec());
                    let result = match payload {
                        Some(bytes) => self.dispatch(&topic, &bytes).await,
                        None => {
                            warn!(topic = %topic, "received message with empty payload, skipping");
                            Ok(())
                        }
                    };

                    match result {
                        Ok(()) => {
                            if let Err(e) = self.consumer.commit_message(&message, CommitMode::Async) {
                                error!(error = %e, "failed to commit offset");
                            }
                        }
                        Err(e) => {
                            error!(topic = %topic, error = %e, "handler failed, leaving offset uncommitted for redelivery");
                        }
                    }
                }
                Some(Err(e)) => error!(error = %e, "kafka stream error"),
                None => break,
            }
        }
    }

    async fn dispatch(&self, topic: &str, bytes: &[u8]) -> Result<(), TransferError> {
        if topic == OutboxEventType::WalletDebited.topic() {
            let event: WalletDebited = serde_json::from_slice(bytes)
                .map_err(|e| TransferError::Validation(format!("bad WalletDebited payload: {e}")))?;
            info!(transfer_id = %event.transfer_id, "applying wallet debited");
            self.apply_debited.execute(event).await
        } else if topic == OutboxEventType::WalletDebitFailed.topic() {
            let event: WalletDebitFailed = serde_json::from_slice(bytes)
                .map_err(|e| TransferError::Validation(format!("bad WalletDebitFailed payload: {e}")))?;
            info!(transfer_id = %event.transfer_id, "applying wallet debit failed");
            self.apply_debit_failed.execute(event).await
        } else if topic == OutboxEventType::WalletCredited.topic() {
            let event: WalletCredited = serde_json::from_slice(bytes)
                .map_err(|e| TransferError::Validation(format!("bad WalletCredited payload: {e}")))?;
            info!(transfer_id = %event.transfer_id, "applying wallet credited");
            self.apply_credited.execute(event).await
        } else if topic == OutboxEventType::WalletCreditFailed.topic() {
            let event: WalletCreditFailed = serde_json::from_slice(bytes)
                .map_err(|e| TransferError::Validation(format!("bad WalletCreditFailed payload: {e}")))?;
            info!(transfer_id = %event.transfer_id, "applying wallet credit failed");
            self.apply_credit_failed.execute(event).await
        } else if topic == OutboxEventType::WalletRefunded.topic() {
            let event: WalletRefunded = serde_json::from_slice(bytes)
                .map_err(|e| TransferError::Validation(format!("bad WalletRefunded payload: {e}")))?;
            info!(transfer_id = %event.transfer_id, "observed wallet refunded (audit only)");
            Ok(())
        } else {
            warn!(topic = %topic, "no handler registered for topic, skipping");
            Ok(())
        }
    }
}
