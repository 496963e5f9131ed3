//! # Submission-Proof
//!
//! Grading suite for the multisig spending assignment. The submitted
//! artifact is a raw Bitcoin transaction, hex-encoded in `out.txt`, that
//! spends a synthetic 2-of-2 multisig coin and pays it back to the same
//! P2SH address.
//!
//! This crate provides pure, side-effect-free functions that decode the
//! submission and check it against the fixed expected properties: input
//! and output shape, the spending address, the redeem script, and full
//! witness signature verification against the synthetic coin.
//!
//! ## Usage
//!
//! ```rust
//! use submission_proof::TransactionValidator;
//! use submission_proof::types::*;
//!
//! let validator = TransactionValidator::new();
//! let tx = Transaction {
//!     version: 1,
//!     inputs: vec![],
//!     outputs: vec![],
//!     lock_time: 0,
//! };
//! let report = validator.grade_transaction(&tx).unwrap();
//! assert!(!report.passed());
//! ```

pub mod types;
pub mod constants;
pub mod decode;
pub mod script;
pub mod address;
pub mod sighash;
pub mod verify;
pub mod checklist;
pub mod error;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use error::{Result, ValidationError};

/// Main submission validator
///
/// # Examples
///
/// ```
/// use submission_proof::TransactionValidator;
/// use submission_proof::types::*;
///
/// let validator = TransactionValidator::new();
///
/// // A transaction with no inputs fails the first check
/// let tx = Transaction {
///     version: 1,
///     inputs: vec![],
///     outputs: vec![],
///     lock_time: 0,
/// };
/// let report = validator.grade_transaction(&tx).unwrap();
/// assert_eq!(report.first_failure().unwrap().name, "input count");
/// ```
pub struct TransactionValidator;

impl TransactionValidator {
    /// Create a new validator instance
    pub fn new() -> Self {
        Self
    }

    /// Decode a hex-encoded transaction, segwit or legacy serialization
    ///
    /// # Examples
    ///
    /// ```
    /// use submission_proof::TransactionValidator;
    ///
    /// let validator = TransactionValidator::new();
    /// let result = validator.decode_transaction("not hex");
    /// assert!(result.is_err());
    /// ```
    pub fn decode_transaction(&self, hex_tx: &str) -> Result<Transaction> {
        decode::decode_hex_transaction(hex_tx)
    }

    /// P2SH address an input spends from, derived from its redeem script
    pub fn spending_address(&self, input: &TransactionInput) -> Result<String> {
        address::spending_address(input)
    }

    /// Verify every input of a transaction against a coin view
    pub fn verify_transaction(&self, tx: &Transaction, view: &CoinView) -> Result<bool> {
        verify::verify_transaction(tx, view)
    }

    /// Run the grading checklist against a decoded transaction
    pub fn grade_transaction(&self, tx: &Transaction) -> Result<checklist::Report> {
        checklist::grade_transaction(tx)
    }

    /// Read, decode and grade a submission file
    ///
    /// # Examples
    ///
    /// ```
    /// use submission_proof::TransactionValidator;
    /// use submission_proof::ValidationError;
    ///
    /// let validator = TransactionValidator::new();
    /// let result = validator.grade_submission("no-such-file.txt");
    /// assert!(matches!(result, Err(ValidationError::MissingSubmission(_))));
    /// ```
    pub fn grade_submission<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<checklist::Report> {
        checklist::grade_submission(path)
    }
}

impl Default for TransactionValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBMISSION_HEX: &str = include_str!("../tests/data/out.txt");

    #[test]
    fn test_validator_new_and_default() {
        let _ = TransactionValidator::new();
        let _ = TransactionValidator::default();
    }

    #[test]
    fn test_decode_and_grade_submission_hex() {
        let validator = TransactionValidator::new();
        let tx = validator.decode_transaction(SUBMISSION_HEX.trim()).unwrap();
        let report = validator.grade_transaction(&tx).unwrap();
        assert!(report.passed());
    }

    #[test]
    fn test_spending_address_of_submission() {
        let validator = TransactionValidator::new();
        let tx = validator.decode_transaction(SUBMISSION_HEX.trim()).unwrap();
        let address = validator.spending_address(&tx.inputs[0]).unwrap();
        assert_eq!(address, checklist::EXPECTED_ADDRESS);
    }

    #[test]
    fn test_verify_through_facade() {
        let validator = TransactionValidator::new();
        let tx = validator.decode_transaction(SUBMISSION_HEX.trim()).unwrap();
        let view = checklist::expected_coin_view().unwrap();
        assert!(validator.verify_transaction(&tx, &view).unwrap());
    }
}
