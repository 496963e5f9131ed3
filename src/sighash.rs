//! BIP143 signature digest for version-0 witness programs

use crate::constants::*;
use crate::error::{Result, ValidationError};
use crate::script::sha256d;
use crate::types::*;

fn push_varint(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x10000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

/// SigHash_v0: 𝒯𝒳 × ℕ × 𝕊 × ℤ × ℕ → ℍ
///
/// The BIP143 preimage for input i with script code sc and spent amount a:
///
///   version ‖ HashPrevouts ‖ HashSequence ‖ outpoint(i) ‖ sc ‖ a
///           ‖ sequence(i) ‖ HashOutputs ‖ locktime ‖ sighash_type
///
/// double-SHA256'd. Only SIGHASH_ALL is supported; the checklist never
/// meets another type.
pub fn segwit_v0_digest(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    amount: Integer,
    sighash_type: u32,
) -> Result<Hash> {
    if sighash_type != SIGHASH_ALL {
        return Err(ValidationError::InvalidSignature(format!(
            "Unsupported sighash type: 0x{:02x}",
            sighash_type
        )));
    }
    let input = tx.inputs.get(input_index).ok_or_else(|| {
        ValidationError::InvalidSignature(format!("No input at index {}", input_index))
    })?;

    let mut prevouts = Vec::new();
    let mut sequences = Vec::new();
    for txin in &tx.inputs {
        prevouts.extend_from_slice(&txin.prevout.hash);
        prevouts.extend_from_slice(&(txin.prevout.index as u32).to_le_bytes());
        sequences.extend_from_slice(&(txin.sequence as u32).to_le_bytes());
    }
    let hash_prevouts = sha256d(&prevouts);
    let hash_sequence = sha256d(&sequences);

    let mut outputs = Vec::new();
    for txout in &tx.outputs {
        outputs.extend_from_slice(&(txout.value as u64).to_le_bytes());
        push_varint(&mut outputs, txout.script_pubkey.len() as u64);
        outputs.extend_from_slice(&txout.script_pubkey);
    }
    let hash_outputs = sha256d(&outputs);

    let mut preimage = Vec::new();
    preimage.extend_from_slice(&(tx.version as u32).to_le_bytes());
    preimage.extend_from_slice(&hash_prevouts);
    preimage.extend_from_slice(&hash_sequence);
    preimage.extend_from_slice(&input.prevout.hash);
    preimage.extend_from_slice(&(input.prevout.index as u32).to_le_bytes());
    push_varint(&mut preimage, script_code.len() as u64);
    preimage.extend_from_slice(script_code);
    preimage.extend_from_slice(&(amount as u64).to_le_bytes());
    preimage.extend_from_slice(&(input.sequence as u32).to_le_bytes());
    preimage.extend_from_slice(&hash_outputs);
    preimage.extend_from_slice(&(tx.lock_time as u32).to_le_bytes());
    preimage.extend_from_slice(&sighash_type.to_le_bytes());

    Ok(sha256d(&preimage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_hex_transaction;

    const SUBMISSION_HEX: &str = include_str!("../tests/data/out.txt");

    #[test]
    fn test_submission_digest_known_value() {
        let tx = decode_hex_transaction(SUBMISSION_HEX.trim()).unwrap();
        let witness_script = tx.inputs[0].witness.last().unwrap().clone();

        let digest = segwit_v0_digest(&tx, 0, &witness_script, 100000, SIGHASH_ALL).unwrap();
        assert_eq!(
            hex::encode(digest),
            "5ef430728099efb90dfda0a177aefcc14ed06e470a93dd54e1c4d4c8f7a0aea1"
        );
    }

    #[test]
    fn test_digest_binds_amount() {
        let tx = decode_hex_transaction(SUBMISSION_HEX.trim()).unwrap();
        let witness_script = tx.inputs[0].witness.last().unwrap().clone();

        let a = segwit_v0_digest(&tx, 0, &witness_script, 100000, SIGHASH_ALL).unwrap();
        let b = segwit_v0_digest(&tx, 0, &witness_script, 99999, SIGHASH_ALL).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_unsupported_sighash_type() {
        let tx = decode_hex_transaction(SUBMISSION_HEX.trim()).unwrap();
        let result = segwit_v0_digest(&tx, 0, &[], 100000, 0x03);
        assert!(matches!(result, Err(ValidationError::InvalidSignature(_))));
    }

    #[test]
    fn test_input_index_out_of_range() {
        let tx = decode_hex_transaction(SUBMISSION_HEX.trim()).unwrap();
        let result = segwit_v0_digest(&tx, 1, &[], 100000, SIGHASH_ALL);
        assert!(matches!(result, Err(ValidationError::InvalidSignature(_))));
    }

    #[test]
    fn test_push_varint_boundaries() {
        let mut out = Vec::new();
        push_varint(&mut out, 0xfc);
        assert_eq!(out, vec![0xfc]);

        let mut out = Vec::new();
        push_varint(&mut out, 0xfd);
        assert_eq!(out, vec![0xfd, 0xfd, 0x00]);

        let mut out = Vec::new();
        push_varint(&mut out, 0x1_0000);
        assert_eq!(out, vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
    }
}
