//! Shared types and engines used by both `transaction_service` and
//! `wallet_service`.
//!
//! Nothing in this crate owns business rules — it owns the *shapes*
//! the two services agree on across the broker boundary (events,
//! topics, the outbox publishing engine) plus small cross-cutting
//! helpers (id generation, retry/backoff) that both services need but
//! neither should reimplement.

pub mod events;
pub mod ids;
pub mod outbox;
pub mod retry;
