//! The closed set of broker topics and the JSON payload shape carried
//! on each one (spec §6). `OutboxEventType` is the tag stored on an
//! `OutboxRecord`; `topic()` is the single source of truth mapping it
//! onto a wire topic name, shared by both services' publishers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboxEventType {
    TransferInitiated,
    TransferCompleted,
    TransferFailed,
    WalletDebited,
    WalletDebitFailed,
    WalletCredited,
    WalletCreditFailed,
    WalletRefunded,
}

impl OutboxEventType {
    /// Bit-exact topic name per spec §6. Closed mapping — every
    /// variant must appear here exactly once.
    pub fn topic(self) -> &'static str {
        match self {
            OutboxEventType::TransferInitiated => "transfer.initiated",
            OutboxEventType::TransferCompleted => "transfer.completed",
            OutboxEventType::TransferFailed => "transfer.failed",
            OutboxEventType::WalletDebited => "wallet.debited",
            OutboxEventType::WalletDebitFailed => "wallet.debit-failed",
            OutboxEventType::WalletCredited => "wallet.credited",
            OutboxEventType::WalletCreditFailed => "wallet.credit-failed",
            OutboxEventType::WalletRefunded => "wallet.refunded",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutboxEventType::TransferInitiated => "TransferInitiated",
            OutboxEventType::TransferCompleted => "TransferCompleted",
            OutboxEventType::TransferFailed => "TransferFailed",
            OutboxEventType::WalletDebited => "WalletDebited",
            OutboxEventType::WalletDebitFailed => "WalletDebitFailed",
            OutboxEventType::WalletCredited => "WalletCredited",
            OutboxEventType::WalletCreditFailed => "WalletCreditFailed",
            OutboxEventType::WalletRefunded => "WalletRefunded",
        }
    }

    pub fn from_str_name(name: &str) -> Option<Self> {
        Some(match name {
            "TransferInitiated" => OutboxEventType::TransferInitiated,
            "TransferCompleted" => OutboxEventType::TransferCompleted,
            "TransferFailed" => OutboxEventType::TransferFailed,
            "WalletDebited" => OutboxEventType::WalletDebited,
            "WalletDebitFailed" => OutboxEventType::WalletDebitFailed,
            "WalletCredited" => OutboxEventType::WalletCredited,
            "WalletCreditFailed" => OutboxEventType::WalletCreditFailed,
            "WalletRefunded" => OutboxEventType::WalletRefunded,
            _ => return None,
        })
    }
}

/// `POST /transfers` accepted: the saga has started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferInitiated {
    pub transfer_id: Uuid,
    pub sender_wallet_id: Uuid,
    pub receiver_wallet_id: Uuid,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCompleted {
    pub transfer_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferFailed {
    pub transfer_id: Uuid,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// `wallet_id` is the debited (sender) wallet. `receiver_wallet_id`
/// rides along so the Ledger's own credit handler can act on this
/// event without a cross-service lookup back into the Coordinator —
/// the two services never query each other's stores (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletDebited {
    pub transfer_id: Uuid,
    pub wallet_id: Uuid,
    pub receiver_wallet_id: Uuid,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletDebitFailed {
    pub transfer_id: Uuid,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletCredited {
    pub transfer_id: Uuid,
    pub wallet_id: Uuid,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
}

/// Carries everything the Ledger needs to drive the refund
/// compensation without looking anything else up (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletCreditFailed {
    pub transfer_id: Uuid,
    pub sender_wallet_id: Uuid,
    pub amount: i64,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRefunded {
    pub transfer_id: Uuid,
    pub wallet_id: Uuid,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_mapping_is_bit_exact() {
        assert_eq!(OutboxEventType::TransferInitiated.topic(), "transfer.initiated");
        assert_eq!(OutboxEventType::TransferCompleted.topic(), "transfer.completed");
        assert_eq!(OutboxEventType::TransferFailed.topic(), "transfer.failed");
        assert_eq!(OutboxEventType::WalletDebited.topic(), "wallet.debited");
        assert_eq!(OutboxEventType::WalletDebitFailed.topic(), "wallet.debit-failed");
        assert_eq!(OutboxEventType::WalletCredited.topic(), "wallet.credited");
        assert_eq!(OutboxEventType::WalletCreditFailed.topic(), "wallet.credit-failed");
        assert_eq!(OutboxEventType::WalletRefunded.topic(), "wallet.refunded");
    }

    #[test]
    fn event_type_name_round_trips() {
        for ty in [
            OutboxEventType::TransferInitiated,
            OutboxEventType::TransferCompleted,
            OutboxEventType::TransferFailed,
            OutboxEventType::WalletDebited,
            OutboxEventType::WalletDebitFailed,
            OutboxEventType::WalletCredited,
            OutboxEventType::WalletCreditFailed,
            OutboxEventType::WalletRefunded,
        ] {
            assert_eq!(OutboxEventType::from_str_name(ty.as_str()), Some(ty));
        }
    }
}
