pub mod timeout_recoverer;
