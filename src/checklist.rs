//! The grading checklist for the multisig spending assignment.
//!
//! The submission is a raw transaction, hex-encoded in `out.txt`, that
//! spends a synthetic 2-of-2 multisig coin back to the same address. Each
//! check here answers one question about that transaction; `grade_submission`
//! runs them in order and stops at the first failure.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::address::{address_from_script_pubkey, script_pubkey_from_address, spending_address};
use crate::constants::*;
use crate::decode::decode_hex_transaction;
use crate::error::{Result, ValidationError};
use crate::script::resolve_redeem;
use crate::types::*;
use crate::verify::verify_transaction;

/// Address the coin is locked to, and the address the output must pay
pub const EXPECTED_ADDRESS: &str = "325UUecEQuyrTd28Xs2hvAxdAjHM7XzqVF";

/// The 2-of-2 OP_CHECKMULTISIG witness script the spend must satisfy
pub const EXPECTED_REDEEM_SCRIPT_HEX: &str =
    "5221032ff8c5df0bc00fe1ac2319c3b8070d6d1e04cfbf4fedda499ae7b775185ad53b21039bbc8d24f89e5bc44c5b0d1980d6658316a6b2440023117c3c03a4975b04dd5652ae";

pub const EXPECTED_INPUT_COUNT: usize = 1;
pub const EXPECTED_OUTPUT_COUNT: usize = 1;
pub const EXPECTED_OUTPUT_VALUE: Integer = 100000;
pub const EXPECTED_LOCK_TIME: Natural = 0;

/// The synthetic coin sits at the all-zero outpoint
pub const EXPECTED_PREVOUT_INDEX: Natural = 0;

/// ReadSubmission: Path → 𝕊
///
/// Reads the hex submission file and trims surrounding whitespace. A
/// missing file and an empty file are distinct errors so the grader can
/// report them separately.
pub fn read_submission<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| {
        ValidationError::MissingSubmission(format!("{}: {}", path.display(), e))
    })?;
    let trimmed = raw.trim().to_string();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptySubmission(format!(
            "{} holds no transaction hex",
            path.display()
        )));
    }
    Ok(trimmed)
}

/// The coin the submission is expected to spend: 100000 satoshis locked
/// to the P2SH address, at height 0, not a coinbase.
pub fn expected_coin() -> Result<Coin> {
    Ok(Coin {
        value: EXPECTED_OUTPUT_VALUE,
        script_pubkey: script_pubkey_from_address(EXPECTED_ADDRESS)?,
        height: 0,
        coinbase: false,
    })
}

/// Coin view holding only the expected coin at the all-zero outpoint
pub fn expected_coin_view() -> Result<CoinView> {
    let mut view = CoinView::new();
    view.add_coin(
        OutPoint {
            hash: [0u8; 32],
            index: EXPECTED_PREVOUT_INDEX,
        },
        expected_coin()?,
    );
    Ok(view)
}

pub fn check_input_count(tx: &Transaction) -> Result<ValidationResult> {
    if tx.inputs.len() != EXPECTED_INPUT_COUNT {
        return Ok(ValidationResult::Invalid(format!(
            "Expected {} input, found {}",
            EXPECTED_INPUT_COUNT,
            tx.inputs.len()
        )));
    }
    Ok(ValidationResult::Valid)
}

/// The input must point at the synthetic coin: all-zero hash, index 0
pub fn check_prevout(tx: &Transaction) -> Result<ValidationResult> {
    let input = first_input(tx)?;
    if input.prevout.hash != [0u8; 32] {
        return Ok(ValidationResult::Invalid(format!(
            "Prevout hash is {}, expected all zeroes",
            hex::encode(input.prevout.hash)
        )));
    }
    if input.prevout.index != EXPECTED_PREVOUT_INDEX {
        return Ok(ValidationResult::Invalid(format!(
            "Prevout index is {}, expected {}",
            input.prevout.index, EXPECTED_PREVOUT_INDEX
        )));
    }
    Ok(ValidationResult::Valid)
}

pub fn check_sequence(tx: &Transaction) -> Result<ValidationResult> {
    let input = first_input(tx)?;
    if input.sequence != SEQUENCE_FINAL {
        return Ok(ValidationResult::Invalid(format!(
            "Sequence is 0x{:08x}, expected 0x{:08x}",
            input.sequence, SEQUENCE_FINAL
        )));
    }
    Ok(ValidationResult::Valid)
}

/// The input must spend from the multisig P2SH address
pub fn check_spending_address(tx: &Transaction) -> Result<ValidationResult> {
    let input = first_input(tx)?;
    let address = match spending_address(input) {
        Ok(address) => address,
        Err(e) => return Ok(ValidationResult::Invalid(e.to_string())),
    };
    if address != EXPECTED_ADDRESS {
        return Ok(ValidationResult::Invalid(format!(
            "Input spends from {}, expected {}",
            address, EXPECTED_ADDRESS
        )));
    }
    Ok(ValidationResult::Valid)
}

/// The script satisfied by the spend must be the fixed 2-of-2 template
pub fn check_redeem_script(tx: &Transaction) -> Result<ValidationResult> {
    let input = first_input(tx)?;
    let redeem = match resolve_redeem(input) {
        Ok(redeem) => redeem,
        Err(e) => return Ok(ValidationResult::Invalid(e.to_string())),
    };
    if hex::encode(&redeem) != EXPECTED_REDEEM_SCRIPT_HEX {
        return Ok(ValidationResult::Invalid(format!(
            "Redeem script is {}, expected {}",
            hex::encode(&redeem),
            EXPECTED_REDEEM_SCRIPT_HEX
        )));
    }
    Ok(ValidationResult::Valid)
}

pub fn check_output_count(tx: &Transaction) -> Result<ValidationResult> {
    if tx.outputs.len() != EXPECTED_OUTPUT_COUNT {
        return Ok(ValidationResult::Invalid(format!(
            "Expected {} output, found {}",
            EXPECTED_OUTPUT_COUNT,
            tx.outputs.len()
        )));
    }
    Ok(ValidationResult::Valid)
}

pub fn check_output_value(tx: &Transaction) -> Result<ValidationResult> {
    let output = first_output(tx)?;
    if output.value != EXPECTED_OUTPUT_VALUE {
        return Ok(ValidationResult::Invalid(format!(
            "Output value is {}, expected {}",
            output.value, EXPECTED_OUTPUT_VALUE
        )));
    }
    Ok(ValidationResult::Valid)
}

/// The single output must pay the same address the coin came from
pub fn check_output_address(tx: &Transaction) -> Result<ValidationResult> {
    let output = first_output(tx)?;
    let address = match address_from_script_pubkey(&output.script_pubkey) {
        Ok(address) => address,
        Err(e) => return Ok(ValidationResult::Invalid(e.to_string())),
    };
    if address != EXPECTED_ADDRESS {
        return Ok(ValidationResult::Invalid(format!(
            "Output pays {}, expected {}",
            address, EXPECTED_ADDRESS
        )));
    }
    Ok(ValidationResult::Valid)
}

pub fn check_lock_time(tx: &Transaction) -> Result<ValidationResult> {
    if tx.lock_time != EXPECTED_LOCK_TIME {
        return Ok(ValidationResult::Invalid(format!(
            "Locktime is {}, expected {}",
            tx.lock_time, EXPECTED_LOCK_TIME
        )));
    }
    Ok(ValidationResult::Valid)
}

/// CheckSignatures: 𝒯𝒳 → {valid, invalid}
///
/// Full witness verification of the spend against the expected coin.
pub fn check_signatures(tx: &Transaction) -> Result<ValidationResult> {
    let view = expected_coin_view()?;
    match verify_transaction(tx, &view) {
        Ok(true) => Ok(ValidationResult::Valid),
        Ok(false) => Ok(ValidationResult::Invalid(
            "Witness does not satisfy the multisig script".to_string(),
        )),
        Err(e) => Ok(ValidationResult::Invalid(e.to_string())),
    }
}

/// One named check and its outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub result: ValidationResult,
}

/// Outcomes of a full grading run, in check order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub outcomes: Vec<CheckOutcome>,
}

impl Report {
    /// True when every executed check passed
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_valid())
    }

    /// Name of the first failed check, if any
    pub fn first_failure(&self) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| !o.result.is_valid())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

const CHECKS: &[(&str, fn(&Transaction) -> Result<ValidationResult>)] = &[
    ("input count", check_input_count),
    ("prevout", check_prevout),
    ("sequence", check_sequence),
    ("spending address", check_spending_address),
    ("redeem script", check_redeem_script),
    ("output count", check_output_count),
    ("output value", check_output_value),
    ("output address", check_output_address),
    ("lock time", check_lock_time),
    ("signatures", check_signatures),
];

/// GradeTx: 𝒯𝒳 → Report
///
/// Runs the checklist in order, stopping at the first failed check.
pub fn grade_transaction(tx: &Transaction) -> Result<Report> {
    let mut outcomes = Vec::with_capacity(CHECKS.len());
    for (name, check) in CHECKS {
        let result = check(tx)?;
        let failed = !result.is_valid();
        outcomes.push(CheckOutcome { name, result });
        if failed {
            break;
        }
    }
    Ok(Report { outcomes })
}

/// GradeSubmission: Path → Report
///
/// Reads and decodes the submission, then grades the transaction.
/// Unreadable or undecodable submissions are errors, not failed checks.
pub fn grade_submission<P: AsRef<Path>>(path: P) -> Result<Report> {
    let hex_tx = read_submission(path)?;
    let tx = decode_hex_transaction(&hex_tx)?;
    grade_transaction(&tx)
}

fn first_input(tx: &Transaction) -> Result<&TransactionInput> {
    tx.inputs
        .first()
        .ok_or_else(|| ValidationError::Decode("Transaction has no inputs".to_string()))
}

fn first_output(tx: &Transaction) -> Result<&TransactionOutput> {
    tx.outputs
        .first()
        .ok_or_else(|| ValidationError::Decode("Transaction has no outputs".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBMISSION_HEX: &str = include_str!("../tests/data/out.txt");

    fn submission() -> Transaction {
        decode_hex_transaction(SUBMISSION_HEX.trim()).unwrap()
    }

    #[test]
    fn test_all_checks_pass_on_submission() {
        let tx = submission();
        for (name, check) in CHECKS {
            let result = check(&tx).unwrap();
            assert!(result.is_valid(), "check '{}' failed: {:?}", name, result);
        }
    }

    #[test]
    fn test_grade_transaction_passes() {
        let tx = submission();
        let report = grade_transaction(&tx).unwrap();
        assert!(report.passed());
        assert_eq!(report.outcomes.len(), CHECKS.len());
        assert!(report.first_failure().is_none());
    }

    #[test]
    fn test_grade_stops_at_first_failure() {
        let mut tx = submission();
        tx.inputs[0].sequence = 0xfffffffe;
        let report = grade_transaction(&tx).unwrap();
        assert!(!report.passed());
        // input count and prevout pass, sequence fails, nothing after runs
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.first_failure().unwrap().name, "sequence");
    }

    #[test]
    fn test_wrong_prevout_hash_fails() {
        let mut tx = submission();
        tx.inputs[0].prevout.hash[0] = 1;
        let result = check_prevout(&tx).unwrap();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_wrong_prevout_index_fails() {
        let mut tx = submission();
        tx.inputs[0].prevout.index = 1;
        let result = check_prevout(&tx).unwrap();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_extra_output_fails_count() {
        let mut tx = submission();
        let extra = tx.outputs[0].clone();
        tx.outputs.push(extra);
        let result = check_output_count(&tx).unwrap();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_wrong_value_fails() {
        let mut tx = submission();
        tx.outputs[0].value = 99999;
        let result = check_output_value(&tx).unwrap();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_nonzero_locktime_fails() {
        let mut tx = submission();
        tx.lock_time = 500000;
        let result = check_lock_time(&tx).unwrap();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_expected_coin_matches_output_script() {
        let tx = submission();
        let coin = expected_coin().unwrap();
        assert_eq!(coin.script_pubkey, tx.outputs[0].script_pubkey);
    }

    #[test]
    fn test_report_json_shape() {
        let tx = submission();
        let report = grade_transaction(&tx).unwrap();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"signatures\""));
        assert!(json.contains("Valid"));
    }
}
