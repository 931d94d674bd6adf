//! Time-ordered id generation and the refund idempotency-key derivation.
//!
//! Primary keys use UUIDv7 so insertion order tracks creation order,
//! which keeps the outbox's `created_at ASC` index dense (spec §9).

use uuid::Uuid;

/// Namespace used to derive deterministic refund transaction ids.
/// Fixed forever: changing it would break idempotency for any refund
/// already in flight.
const REFUND_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6a, 0x1d, 0x3e, 0x2c, 0x9b, 0x44, 0x4c, 0x8a, 0xb1, 0x0e, 0x2f, 0x3a, 0x7c, 0x5d, 0x91, 0x02,
]);

/// Generates a fresh time-ordered id for a newly created row.
pub fn new_id() -> Uuid {
    Uuid::now_v7()
}

/// Derives the deterministic `transactionId` used for the compensating
/// refund of `transfer_id`. Must differ from the original debit's
/// transaction id (it does: it's namespaced under a distinct UUID) and
/// must never be randomized — that's what makes compensation converge
/// under retries, redeliveries, DLQ replays, and timeout-driven
/// compensation (spec §4.2, §9).
pub fn refund_transaction_id(transfer_id: Uuid) -> Uuid {
    Uuid::new_v5(
        &REFUND_NAMESPACE,
        format!("refund:{transfer_id}").as_bytes(),
    )
}
