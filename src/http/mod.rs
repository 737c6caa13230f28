//! HTTP layer: `LedgerHttp` with per-endpoint retry policies.

pub mod client;
pub mod retry;

pub use client::LedgerHttp;
pub use retry::{RetryConfig, RetryPolicy};
