pub mod entities;
pub mod error;
pub mod ledger;
pub mod outbox;
pub mod repository;
pub mod types;
