pub mod dead_letter_repository;
pub mod ledger_engine;
pub mod models;
pub mod outbox_repository;
pub mod wallet_repository;
