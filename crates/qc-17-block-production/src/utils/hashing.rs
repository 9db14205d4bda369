//! Hashing utilities for block production
//!
//! Provides consistent hashing implementations used across the subsystem.
//!
//! ## Performance (BLAKE3 vs SHA-256)
//!
//! | Algorithm | Speed | Use Case |
//! |-----------|-------|----------|
//! | SHA-256 | ~500 MB/s | Ethereum compatibility |
//! | BLAKE3 | ~3000 MB/s | Internal fast hashing |

use primitive_types::{H256, U256};
use sha2::{Digest, Sha256};
use shared_crypto::blake3_hash;

/// Compute SHA-256 hash of data
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute double SHA-256 hash (Bitcoin-style)
///
/// Used for PoW mining to prevent length extension attacks
#[inline]
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first_hash = sha256(data);
    sha256(&first_hash)
}

/// Compute BLAKE3 hash (5-10x faster than SHA-256)
///
/// Use for internal hashing where Ethereum compatibility is not required.
#[inline]
pub fn blake3(data: &[u8]) -> [u8; 32] {
    blake3_hash(data)
}

/// Compute double BLAKE3 hash (for PoW when BLAKE3 algorithm is selected)
#[inline]
pub fn blake3d(data: &[u8]) -> [u8; 32] {
    let first_hash = blake3(data);
    blake3(&first_hash)
}

/// Convert hash bytes to H256
#[inline]
pub fn bytes_to_h256(bytes: &[u8; 32]) -> H256 {
    H256::from(*bytes)
}

/// Convert hash bytes to U256 (big-endian)
#[inline]
pub fn bytes_to_u256(bytes: &[u8; 32]) -> U256 {
    U256::from_big_endian(bytes)
}

/// Compute transaction hash
///
/// Returns H256 hash of transaction data
pub fn transaction_hash(tx: &[u8]) -> H256 {
    let hash_bytes = sha256(tx);
    bytes_to_h256(&hash_bytes)
}

/// Serialize block header for hashing
///
/// Creates canonical byte representation for PoW/PoS
pub fn serialize_block_header(
    parent_hash: &H256,
    block_number: u64,
    timestamp: u64,
    beneficiary: &[u8; 20],
    gas_used: u64,
    nonce_opt: Option<u64>,
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(128);

    bytes.extend_from_slice(parent_hash.as_bytes());
    bytes.extend_from_slice(&block_number.to_le_bytes());
    bytes.extend_from_slice(&timestamp.to_le_bytes());
    bytes.extend_from_slice(beneficiary);
    bytes.extend_from_slice(&gas_used.to_le_bytes());

    if let Some(nonce) = nonce_opt {
        bytes.extend_from_slice(&nonce.to_le_bytes());
    }

    bytes
}

/// Check if hash meets difficulty target
///
/// Returns true if hash <= target (more leading zeros = harder)
#[inline]
pub fn meets_difficulty(hash: &[u8; 32], target: U256) -> bool {
    bytes_to_u256(hash) <= target
}
