//! Raw transaction codec: legacy and BIP144 segwit serialization
//!
//! Decoding is kept separate from the grading checklist so the codec could be
//! swapped for an ecosystem one without touching the assertions.

use crate::constants::*;
use crate::error::{Result, ValidationError};
use crate::types::*;

/// Cursor over a raw transaction byte string
struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(ValidationError::Decode(format!(
                "Truncated transaction: wanted {} bytes at offset {}, {} left",
                n,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64_le(&mut self) -> Result<u64> {
        let bytes = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    /// Bitcoin variable-length integer: 1-byte value, or 0xfd/0xfe/0xff
    /// prefix followed by 2/4/8 little-endian bytes.
    fn read_varint(&mut self) -> Result<u64> {
        let prefix = self.read_u8()?;
        match prefix {
            0xfd => {
                let bytes = self.read_bytes(2)?;
                Ok(u16::from_le_bytes([bytes[0], bytes[1]]) as u64)
            }
            0xfe => Ok(self.read_u32_le()? as u64),
            0xff => self.read_u64_le(),
            n => Ok(n as u64),
        }
    }

    /// Varint-prefixed byte string (script or witness element)
    fn read_var_bytes(&mut self) -> Result<ByteString> {
        let len = self.read_varint()?;
        if len as usize > MAX_SCRIPT_SIZE {
            return Err(ValidationError::Decode(format!(
                "Byte string length {} exceeds maximum {}",
                len, MAX_SCRIPT_SIZE
            )));
        }
        Ok(self.read_bytes(len as usize)?.to_vec())
    }

    fn read_hash(&mut self) -> Result<Hash> {
        let bytes = self.read_bytes(32)?;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(bytes);
        Ok(hash)
    }
}

/// Decode a hex string into raw bytes
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>> {
    hex::decode(hex_str).map_err(|e| ValidationError::MalformedHex(e.to_string()))
}

/// Decode a hex string directly into a transaction
pub fn decode_hex_transaction(hex_str: &str) -> Result<Transaction> {
    decode_transaction(&decode_hex(hex_str)?)
}

/// DecodeTransaction: raw bytes → 𝒯𝒳
///
/// Accepts both serialization forms:
/// - legacy: version ‖ inputs ‖ outputs ‖ locktime
/// - segwit (BIP144): version ‖ 0x00 0x01 ‖ inputs ‖ outputs ‖ witnesses ‖ locktime
///
/// Every byte must be consumed; trailing data is a decode failure.
pub fn decode_transaction(raw: &[u8]) -> Result<Transaction> {
    if raw.len() > MAX_TX_SIZE {
        return Err(ValidationError::Decode(format!(
            "Transaction size {} exceeds maximum {}",
            raw.len(),
            MAX_TX_SIZE
        )));
    }

    let mut decoder = Decoder::new(raw);
    let version = decoder.read_u32_le()? as Natural;

    // A zero byte where the input count belongs is the segwit marker; a
    // legacy transaction can never have zero inputs here.
    let segwit = decoder.peek() == Some(SEGWIT_MARKER);
    if segwit {
        decoder.read_u8()?;
        let flag = decoder.read_u8()?;
        if flag != SEGWIT_FLAG {
            return Err(ValidationError::Decode(format!(
                "Unknown segwit flag: 0x{:02x}",
                flag
            )));
        }
    }

    let input_count = decoder.read_varint()?;
    let mut inputs = Vec::new();
    for _ in 0..input_count {
        let hash = decoder.read_hash()?;
        let index = decoder.read_u32_le()? as Natural;
        let script_sig = decoder.read_var_bytes()?;
        let sequence = decoder.read_u32_le()? as Natural;
        inputs.push(TransactionInput {
            prevout: OutPoint { hash, index },
            script_sig,
            sequence,
            witness: Vec::new(),
        });
    }

    let output_count = decoder.read_varint()?;
    let mut outputs = Vec::new();
    for _ in 0..output_count {
        let value = decoder.read_u64_le()?;
        if value > MAX_MONEY as u64 {
            return Err(ValidationError::Decode(format!(
                "Output value {} out of range",
                value
            )));
        }
        let script_pubkey = decoder.read_var_bytes()?;
        outputs.push(TransactionOutput {
            value: value as Integer,
            script_pubkey,
        });
    }

    if segwit {
        for input in inputs.iter_mut() {
            let item_count = decoder.read_varint()?;
            let mut witness = Vec::new();
            for _ in 0..item_count {
                witness.push(decoder.read_var_bytes()?);
            }
            input.witness = witness;
        }
    }

    let lock_time = decoder.read_u32_le()? as Natural;

    if decoder.remaining() != 0 {
        return Err(ValidationError::Decode(format!(
            "{} trailing bytes after transaction",
            decoder.remaining()
        )));
    }

    Ok(Transaction {
        version,
        inputs,
        outputs,
        lock_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBMISSION_HEX: &str = include_str!("../tests/data/out.txt");

    /// Hand-built legacy transaction: one input spending outpoint 01..:0
    /// with a single OP_1 scriptSig, one 1000-sat output, locktime 5.
    fn legacy_tx_bytes() -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&1u32.to_le_bytes()); // version
        raw.push(1); // input count
        raw.extend_from_slice(&[1u8; 32]); // prevout hash
        raw.extend_from_slice(&0u32.to_le_bytes()); // prevout index
        raw.push(1); // scriptSig length
        raw.push(0x51); // OP_1
        raw.extend_from_slice(&0xffffffffu32.to_le_bytes()); // sequence
        raw.push(1); // output count
        raw.extend_from_slice(&1000u64.to_le_bytes()); // value
        raw.push(1); // scriptPubKey length
        raw.push(0x51);
        raw.extend_from_slice(&5u32.to_le_bytes()); // locktime
        raw
    }

    #[test]
    fn test_decode_legacy_transaction() {
        let tx = decode_transaction(&legacy_tx_bytes()).unwrap();

        assert_eq!(tx.version, 1);
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.inputs[0].prevout.hash, [1u8; 32]);
        assert_eq!(tx.inputs[0].prevout.index, 0);
        assert_eq!(tx.inputs[0].script_sig, vec![0x51]);
        assert_eq!(tx.inputs[0].sequence, 0xffffffff);
        assert!(tx.inputs[0].witness.is_empty());
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].value, 1000);
        assert_eq!(tx.lock_time, 5);
    }

    #[test]
    fn test_decode_segwit_submission() {
        let tx = decode_hex_transaction(SUBMISSION_HEX.trim()).unwrap();

        assert_eq!(tx.version, 1);
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.inputs[0].prevout.hash, [0u8; 32]);
        assert_eq!(tx.inputs[0].prevout.index, 0);
        assert_eq!(tx.inputs[0].sequence, 0xffffffff);
        // Witness stack: dummy, two signatures, witness script
        assert_eq!(tx.inputs[0].witness.len(), 4);
        assert!(tx.inputs[0].witness[0].is_empty());
        assert_eq!(tx.inputs[0].witness[3].len(), 71);
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].value, 100000);
        assert_eq!(tx.lock_time, 0);
    }

    #[test]
    fn test_decode_truncated_transaction() {
        let mut raw = legacy_tx_bytes();
        raw.truncate(raw.len() - 2);
        assert!(matches!(
            decode_transaction(&raw),
            Err(ValidationError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_trailing_bytes() {
        let mut raw = legacy_tx_bytes();
        raw.push(0x00);
        assert!(matches!(
            decode_transaction(&raw),
            Err(ValidationError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_unknown_segwit_flag() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&1u32.to_le_bytes());
        raw.push(0x00); // marker
        raw.push(0x02); // unknown flag
        assert!(matches!(
            decode_transaction(&raw),
            Err(ValidationError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_malformed_hex() {
        assert!(matches!(
            decode_hex("zz00"),
            Err(ValidationError::MalformedHex(_))
        ));
        assert!(matches!(
            decode_hex("abc"),
            Err(ValidationError::MalformedHex(_))
        ));
    }

    #[test]
    fn test_read_varint_prefixes() {
        let mut decoder = Decoder::new(&[0xfc]);
        assert_eq!(decoder.read_varint().unwrap(), 0xfc);

        let mut decoder = Decoder::new(&[0xfd, 0x01, 0x02]);
        assert_eq!(decoder.read_varint().unwrap(), 0x0201);

        let mut decoder = Decoder::new(&[0xfe, 0x01, 0x02, 0x03, 0x04]);
        assert_eq!(decoder.read_varint().unwrap(), 0x04030201);

        let mut decoder = Decoder::new(&[0xff]);
        assert!(decoder.read_varint().is_err());
    }

    #[test]
    fn test_decode_oversized_script_rejected() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&1u32.to_le_bytes());
        raw.push(1);
        raw.extend_from_slice(&[0u8; 32]);
        raw.extend_from_slice(&0u32.to_le_bytes());
        // scriptSig length claims 20,000 bytes
        raw.push(0xfd);
        raw.extend_from_slice(&20_000u16.to_le_bytes());
        assert!(matches!(
            decode_transaction(&raw),
            Err(ValidationError::Decode(_))
        ));
    }
}
