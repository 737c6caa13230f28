//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs`: Rich domain types (validated, business-logic-ready)
//! - `wire.rs`: Raw serde structs matching remote responses
//! - `convert.rs`: `TryFrom`/`From` conversions with validation
//! - `state.rs`: Containers held by the selection store

pub mod account;
pub mod group;
pub mod market;
pub mod order;
pub mod orderbook;
pub mod trade;
pub mod wallet;
