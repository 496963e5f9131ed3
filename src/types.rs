//! Core Bitcoin types for submission validation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Natural number type
pub type Natural = u64;

/// Integer type
pub type Integer = i64;

/// Witness stack: one byte string per stack element
pub type Witness = Vec<ByteString>;

/// Reference to a previous transaction output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: Natural,
}

/// Transaction input: previous-output reference, unlocking script,
/// sequence number and (for segwit inputs) the witness stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: Natural,
    pub witness: Witness,
}

/// Transaction output: value in satoshis and locking script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: Integer,
    pub script_pubkey: ByteString,
}

/// Decoded transaction: immutable after decode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: Natural,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: Natural,
}

/// Synthetic stand-in for the previous output being spent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub value: Integer,
    pub script_pubkey: ByteString,
    pub height: Natural,
    pub coinbase: bool,
}

/// View mapping previous-output references to coins, consulted during
/// signature verification.
#[derive(Debug, Clone, Default)]
pub struct CoinView {
    coins: HashMap<OutPoint, Coin>,
}

impl CoinView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_coin(&mut self, prevout: OutPoint, coin: Coin) {
        self.coins.insert(prevout, coin);
    }

    pub fn coin(&self, prevout: &OutPoint) -> Option<&Coin> {
        self.coins.get(prevout)
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_view_lookup() {
        let mut view = CoinView::new();
        assert!(view.is_empty());

        let prevout = OutPoint { hash: [0; 32], index: 0 };
        let coin = Coin {
            value: 100000,
            script_pubkey: vec![0xa9],
            height: 0,
            coinbase: false,
        };
        view.add_coin(prevout.clone(), coin.clone());

        assert_eq!(view.len(), 1);
        assert_eq!(view.coin(&prevout), Some(&coin));

        let other = OutPoint { hash: [1; 32], index: 0 };
        assert_eq!(view.coin(&other), None);
    }

    #[test]
    fn test_validation_result_is_valid() {
        assert!(ValidationResult::Valid.is_valid());
        assert!(!ValidationResult::Invalid("mismatch".to_string()).is_valid());
    }
}
