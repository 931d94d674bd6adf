pub mod apply_wallet_credit_failed;
pub mod apply_wallet_credited;
pub mod apply_wallet_debit_failed;
pub mod apply_wallet_debited;
pub mod get_transfer;
pub mod initiate_transfer;
