//! Witness spend verification for P2SH-wrapped multisig inputs

use crate::constants::*;
use crate::error::{Result, ValidationError};
use crate::script::{
    hash160, p2sh_script_hash, parse_multisig, parse_pushes, sha256, witness_program_hash,
};
use crate::sighash::segwit_v0_digest;
use crate::types::*;
use secp256k1::{ecdsa::Signature, Context, Message, PublicKey, Secp256k1, Verification};

/// VerifyTx: 𝒯𝒳 × 𝒞𝒱 → {true, false}
///
/// Checks every input of tx against the coins it spends. Each input must
/// be a P2SH spend whose redeem script wraps a version-0 witness script
/// hash, with the witness carrying a checkmultisig script and enough
/// valid signatures to meet its threshold.
///
/// Returns Ok(false) for a well-formed transaction that fails script or
/// signature checks, and Err for structural problems (missing coin,
/// non-P2SH coin).
pub fn verify_transaction(tx: &Transaction, view: &CoinView) -> Result<bool> {
    let secp = Secp256k1::new();

    for (index, input) in tx.inputs.iter().enumerate() {
        let coin = view.coin(&input.prevout).ok_or_else(|| {
            ValidationError::CoinNotFound(format!(
                "No coin for input {} ({}:{})",
                index,
                hex::encode(input.prevout.hash),
                input.prevout.index
            ))
        })?;

        let script_hash = p2sh_script_hash(&coin.script_pubkey).ok_or_else(|| {
            ValidationError::Script(format!("Coin for input {} is not P2SH", index))
        })?;

        if !verify_input(&secp, tx, index, input, coin, &script_hash)? {
            return Ok(false);
        }
    }

    Ok(true)
}

fn verify_input<C: Context + Verification>(
    secp: &Secp256k1<C>,
    tx: &Transaction,
    index: usize,
    input: &TransactionInput,
    coin: &Coin,
    script_hash: &[u8; HASH160_SIZE],
) -> Result<bool> {
    // scriptSig must be a single push of the redeem script
    let pushes = match parse_pushes(&input.script_sig) {
        Ok(pushes) => pushes,
        Err(_) => return Ok(false),
    };
    if pushes.len() != 1 {
        return Ok(false);
    }
    let redeem = &pushes[0];

    if hash160(redeem) != *script_hash {
        return Ok(false);
    }

    // The redeem script must commit to a version-0 witness script
    let program = match witness_program_hash(redeem) {
        Some(program) => program,
        None => return Ok(false),
    };

    // Witness stack: dummy, signatures, witness script
    if input.witness.len() < 3 {
        return Ok(false);
    }
    let witness_script = match input.witness.last() {
        Some(script) => script,
        None => return Ok(false),
    };
    if sha256(witness_script) != program {
        return Ok(false);
    }

    let template = match parse_multisig(witness_script) {
        Ok(template) => template,
        Err(_) => return Ok(false),
    };

    // CHECKMULTISIG off-by-one: the first stack item is the unused dummy
    if !input.witness[0].is_empty() {
        return Ok(false);
    }
    let signatures = &input.witness[1..input.witness.len() - 1];
    if signatures.len() != template.threshold {
        return Ok(false);
    }

    let digest = segwit_v0_digest(tx, index, witness_script, coin.value, SIGHASH_ALL)?;

    // Signatures must match pubkeys in script order; the cursor only
    // moves forward, as in OP_CHECKMULTISIG
    let mut key_cursor = 0;
    for signature in signatures {
        let (der, sighash_type) = match signature.split_last() {
            Some((last, der)) => (der, *last),
            None => return Ok(false),
        };
        if sighash_type as u32 != SIGHASH_ALL {
            return Ok(false);
        }

        let mut matched = false;
        while key_cursor < template.pubkeys.len() {
            let pubkey = &template.pubkeys[key_cursor];
            key_cursor += 1;
            if check_ecdsa_signature(secp, pubkey, der, &digest) {
                matched = true;
                break;
            }
        }
        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Single ECDSA verification against a 32-byte digest. Any parse
/// failure counts as an unmatched signature, not an error.
fn check_ecdsa_signature<C: Context + Verification>(
    secp: &Secp256k1<C>,
    pubkey_bytes: &[u8],
    der: &[u8],
    digest: &Hash,
) -> bool {
    let pubkey = match PublicKey::from_slice(pubkey_bytes) {
        Ok(pubkey) => pubkey,
        Err(_) => return false,
    };
    let signature = match Signature::from_der(der) {
        Ok(signature) => signature,
        Err(_) => return false,
    };
    let message = match Message::from_digest_slice(digest) {
        Ok(message) => message,
        Err(_) => return false,
    };
    secp.verify_ecdsa(&message, &signature, &pubkey).is_ok()
}
