//! Base58check address encoding and derivation
//!
//! Covers the two legacy mainnet address forms the checklist can meet:
//! P2SH (version byte 0x05) and P2PKH (version byte 0x00).

use crate::constants::*;
use crate::error::{Result, ValidationError};
use crate::script;
use crate::types::*;

/// Encode a 20-byte script hash as a mainnet P2SH address
pub fn p2sh_address(script_hash: &[u8; HASH160_SIZE]) -> String {
    encode_base58check(P2SH_VERSION_BYTE, script_hash)
}

/// Encode a 20-byte public key hash as a mainnet P2PKH address
pub fn p2pkh_address(pubkey_hash: &[u8; HASH160_SIZE]) -> String {
    encode_base58check(P2PKH_VERSION_BYTE, pubkey_hash)
}

fn encode_base58check(version: u8, hash: &[u8; HASH160_SIZE]) -> String {
    let mut payload = Vec::with_capacity(1 + HASH160_SIZE);
    payload.push(version);
    payload.extend_from_slice(hash);
    bs58::encode(payload).with_check().into_string()
}

/// Derive the address of a locking script; only P2SH and P2PKH forms carry
/// an address here.
pub fn address_from_script_pubkey(script_pubkey: &[u8]) -> Result<String> {
    if let Some(hash) = script::p2sh_script_hash(script_pubkey) {
        return Ok(p2sh_address(&hash));
    }
    if let Some(hash) = script::p2pkh_pubkey_hash(script_pubkey) {
        return Ok(p2pkh_address(&hash));
    }
    Err(ValidationError::Address(format!(
        "No address form for script: {}",
        hex::encode(script_pubkey)
    )))
}

/// Rebuild the locking script an address commits to.
///
/// Inverse of [`address_from_script_pubkey`]; checksum and version byte are
/// verified during decode.
pub fn script_pubkey_from_address(address: &str) -> Result<ByteString> {
    let decoded = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| ValidationError::Address(format!("Invalid address {}: {}", address, e)))?;
    if decoded.len() != 1 + HASH160_SIZE {
        return Err(ValidationError::Address(format!(
            "Invalid address payload length: {}",
            decoded.len()
        )));
    }
    let mut hash = [0u8; HASH160_SIZE];
    hash.copy_from_slice(&decoded[1..]);
    match decoded[0] {
        P2SH_VERSION_BYTE => Ok(script::p2sh_script_pubkey(&hash)),
        P2PKH_VERSION_BYTE => Ok(script::p2pkh_script_pubkey(&hash)),
        version => Err(ValidationError::Address(format!(
            "Unknown address version byte: 0x{:02x}",
            version
        ))),
    }
}

/// Spending address of an input: the P2SH address of its scriptSig redeem
/// script.
pub fn spending_address(input: &TransactionInput) -> Result<String> {
    let redeem = script::redeem_script(input)?;
    Ok(p2sh_address(&script::hash160(&redeem)))
}
