//! Wire types for wallet token account reads (REST).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenAccountResponse {
    pub pubkey: String,
    pub mint: String,
    pub owner: String,
    /// Raw amount as a decimal integer string.
    pub amount: String,
}
