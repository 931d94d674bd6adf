use std::sync::Arc;

use futures_util::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use tracing::{error, info, warn};

use common::events::{OutboxEventType, TransferInitiated, WalletCreditFailed, WalletDebited};

use crate::domain::error::WalletError;
use crate::use_cases::credit_wallet::CreditWalletUseCase;
use crate::use_cases::debit_wallet::DebitWalletUseCase;
use crate::use_cases::refund_wallet::RefundWalletUseCase;

/// Drives the ledger's reactions to the saga topics it cares about
/// (spec §4.4): `transfer.initiated` debits the sender, `wallet.debited`
/// credits the receiver, `wallet.credit-failed` refunds the sender.
///
/// Offsets are committed one message at a time, and only after the
/// handler returns `Ok`. A transient store error is left uncommitted so
/// the broker's own redelivery retries it — the outer loop never
/// retries in-process; only the refund path does that internally.
pub struct WalletEventConsumer {
    consumer: StreamConsumer,
    debit: Arc<DebitWalletUseCase>,
    credit: Arc<CreditWalletUseCase>,
    refund: Arc<RefundWalletUseCase>,
}

impl WalletEventConsumer {
    pub fn new(
        brokers: &str,
        group_id: &str,
        debit: Arc<DebitWalletUseCase>,
        credit: Arc<CreditWalletUseCase>,
        refund: Arc<RefundWalletUseCase>,
    ) -> Result<Self, WalletError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "10000")
            .create()
            .map_err(|e| WalletError::Transient(format!("failed to create consumer: {e}")))?;

        let topics = [
            OutboxEventType::TransferInitiated.topic(),
            OutboxEventType::WalletDebited.topic(),
            OutboxEventType::WalletCreditFailed.topic(),
        ];
        consumer
            .subscribe(&topics)
            .map_err(|e| WalletError::Transient(format!("failed to subscribe: {e}")))?;

        Ok(Self {
            consumer,
            debit,
            credit,
            refund,
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

    async fn dispatch(&self, topic: &str, bytes: &[u8]) -> Result<(), WalletError> {
        if topic == OutboxEventType::TransferInitiated.topic() {
            let event: TransferInitiated = serde_json::from_slice(bytes)
                .map_err(|e| WalletError::InvalidData(format!("bad TransferInitiated payload: {e}")))?;
            info!(transfer_id = %event.transfer_id, "debiting sender wallet");
            self.debit.execute(event).await
        } else if topic == OutboxEventType::WalletDebited.topic() {
            let event: WalletDebited = serde_json::from_slice(bytes)
                .map_err(|e| WalletError::InvalidData(format!("bad WalletDebited payload: {e}")))?;
            info!(transfer_id = %event.transfer_id, "crediting receiver wallet");
            self.credit.execute(event).await
        } else if topic == OutboxEventType::WalletCreditFailed.topic() {
            let event: WalletCreditFailed = serde_json::from_slice(bytes)
                .map_err(|e| WalletError::InvalidData(format!("bad WalletCreditFailed payload: {e}")))?;
            info!(transfer_id = %event.transfer_id, "refunding sender wallet");
            self.refund.execute(event).await
        } else {
            warn!(topic = %topic, "no handler registered for topic, skipping");
            Ok(())
        }
    }
}
