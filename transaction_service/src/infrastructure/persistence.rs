pub mod models;
pub mod outbox_repository;
pub mod transfer_repository;
