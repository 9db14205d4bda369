//! Web3 JSON-RPC methods per SPEC-16 Section 3.1.

use crate::domain::error::ApiResult;
use crate::domain::types::Bytes;
use sha3::{Digest, Keccak256};

/// Web3 RPC methods handler
pub struct Web3Rpc {
    client_version: String,
}

impl Web3Rpc {
    pub fn new(client_version: String) -> Self {
        Self { client_version }
    }

    /// web3_clientVersion - Returns client version string
    ///
    /// Format: QuantumChain/v{version}/{os}/{runtime}
    pub async fn client_version(&self) -> ApiResult<String> {
        Ok(self.client_version.clone())
    }

    /// web3_sha3 - Returns Keccak-256 hash of data
    ///
    /// Note: This is NOT SHA3-256 (standardized), it's Keccak-256 (pre-standardization).
    /// Ethereum uses Keccak-256 throughout.
    pub async fn sha3(&self, data: Bytes) -> ApiResult<String> {
        let mut hasher = Keccak256::new();
        hasher.update(data.as_slice());
        let result = hasher.finalize();
        Ok(format!("0x{}", hex::encode(result)))
    }
}
