//! # Chain Controller Errors
//!
//! A closed taxonomy, one variant per row of the error table (spec §7),
//! following every donor crate's `domain/errors.rs` convention
//! (`thiserror`, structured fields instead of string interpolation —
//! see `qc-17-block-production::error::BlockProductionError`).
//!
//! `SoftFail`/`HardFail` are deliberately absent: per spec §7 they are
//! trace statuses produced by the onerror fallback
//! ([`crate::domain::entities::TransactionStatus`]), never raised as
//! errors.

use crate::domain::entities::BlockId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChainError {
    #[error("block {0} has unknown parent and is not the fork-db seed")]
    UnlinkableBlock(BlockId),

    #[error("block header validation failed for {block_id}: {reason}")]
    BlockValidateError { block_id: BlockId, reason: String },

    #[error("shard {shard_index} in region {region_id} cycle {cycle_index} declares locks that are not sorted/unique: {reason}")]
    BlockLockError {
        region_id: u16,
        cycle_index: u32,
        shard_index: u32,
        reason: String,
    },

    #[error("shard {shard_index} in region {region_id} cycle {cycle_index} collides with shard {other_shard_index} on scope {scope}")]
    BlockConcurrencyError {
        region_id: u16,
        cycle_index: u32,
        shard_index: u32,
        other_shard_index: u32,
        scope: String,
    },

    #[error("transaction {0:?} already present in dedup index")]
    TxDuplicate(shared_types::Hash),

    #[error("transaction {0:?} is missing required signatures")]
    TxMissingSigs(shared_types::Hash),

    #[error("transaction {0:?} carries a signature not required by any declared authorization")]
    TxIrrelevantSig(shared_types::Hash),

    #[error("transaction {0:?} declares an authorization not satisfied by any provided key or account")]
    TxIrrelevantAuth(shared_types::Hash),

    #[error("transaction {id:?} expired at {expiration}, head time is {head_time}")]
    TxExpired {
        id: shared_types::Hash,
        expiration: u64,
        head_time: u64,
    },

    #[error("transaction {id:?} expiration {expiration} exceeds max lifetime from head time {head_time}")]
    TxFutureExpiration {
        id: shared_types::Hash,
        expiration: u64,
        head_time: u64,
    },

    #[error("transaction {id:?} TaPoS reference (block {ref_block_num}, prefix {ref_block_prefix}) does not match block summary")]
    TapOsMismatch {
        id: shared_types::Hash,
        ref_block_num: u16,
        ref_block_prefix: u32,
    },

    #[error("processing deadline exceeded")]
    CheckTimeExceeded,

    #[error("pop_block called with no head block")]
    PopEmptyChain,

    #[error("requested block height {height} exceeds head height {head_height}")]
    UnknownBlock { height: u32, head_height: u32 },

    #[error("the two branches from get_block_ids_on_fork do not share a common parent")]
    DivergentForkBranches,

    #[error("block at checkpointed height {height} has id {actual} but checkpoint requires {expected}")]
    CheckpointMismatch {
        height: u32,
        expected: BlockId,
        actual: BlockId,
    },

    #[error("invalid chain configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("state store error: {0}")]
    StateStore(String),

    #[error("block log error: {0}")]
    BlockLog(String),

    #[error("interpreter error: {0}")]
    Interpreter(String),
}
