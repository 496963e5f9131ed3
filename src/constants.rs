//! Bitcoin protocol constants used by submission validation

/// Maximum money supply: 21,000,000 BTC in satoshis
pub const MAX_MONEY: i64 = 21_000_000 * 100_000_000;

/// Maximum transaction size: 1MB
pub const MAX_TX_SIZE: usize = 1_000_000;

/// Maximum script length
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Sequence number for final transaction
pub const SEQUENCE_FINAL: u64 = 0xffffffff;

/// SIGHASH_ALL signature hash type
pub const SIGHASH_ALL: u32 = 0x01;

/// Base58check version byte for mainnet P2PKH addresses
pub const P2PKH_VERSION_BYTE: u8 = 0x00;

/// Base58check version byte for mainnet P2SH addresses
pub const P2SH_VERSION_BYTE: u8 = 0x05;

/// Size of a version-0 witness-script-hash program
pub const WITNESS_V0_SCRIPTHASH_SIZE: usize = 32;

/// Size of a hash160 (RIPEMD160 over SHA256) digest
pub const HASH160_SIZE: usize = 20;

/// Segwit serialization marker byte (BIP144)
pub const SEGWIT_MARKER: u8 = 0x00;

/// Segwit serialization flag byte (BIP144)
pub const SEGWIT_FLAG: u8 = 0x01;
