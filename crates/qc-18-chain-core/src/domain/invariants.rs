//! # Shard-Lock and Merkle Invariants
//!
//! Pure validation helpers used by [`crate::domain::block_processor`].
//! Kept free of any port dependency so they can be unit tested in
//! isolation, the same separation `qc-12-transaction-ordering::domain::invariants`
//! uses for its own conflict-detection checks.

use crate::domain::entities::{
    Action, ActionTrace, Cycle, DataAccessKind, Shard, ShardLock, Transaction,
};
use crate::domain::errors::ChainError;
use shared_types::Hash;
use std::collections::HashSet;

/// Assert a shard's locks are each strictly sorted (and therefore unique).
pub fn assert_locks_sorted_unique(
    shard: &Shard,
    region_id: u16,
    cycle_index: u32,
    shard_index: u32,
) -> Result<(), ChainError> {
    for (name, locks) in [
        ("read_locks", &shard.read_locks),
        ("write_locks", &shard.write_locks),
    ] {
        if !is_strictly_sorted(locks) {
            return Err(ChainError::BlockLockError {
                region_id,
                cycle_index,
                shard_index,
                reason: format!("{name} is not strictly sorted/unique"),
            });
        }
    }
    Ok(())
}

fn is_strictly_sorted(locks: &[ShardLock]) -> bool {
    locks.windows(2).all(|w| w[0] < w[1])
}

/// Assert no shard's write-lock collides with another shard's read- or
/// write-lock within the same cycle (spec §4.5.2 step 4b).
pub fn assert_no_cross_shard_collisions(
    cycle: &Cycle,
    region_id: u16,
    cycle_index: u32,
) -> Result<(), ChainError> {
    let mut write_owner: std::collections::HashMap<&ShardLock, u32> = std::collections::HashMap::new();
    let mut read_owners: std::collections::HashMap<&ShardLock, Vec<u32>> =
        std::collections::HashMap::new();

    for (shard_index, shard) in cycle.iter().enumerate() {
        let shard_index = shard_index as u32;
        for lock in &shard.write_locks {
            if let Some(&other) = write_owner.get(lock) {
                return Err(ChainError::BlockConcurrencyError {
                    region_id,
                    cycle_index,
                    shard_index,
                    other_shard_index: other,
                    scope: format!("{}/{}", lock.account, lock.scope),
                });
            }
            if let Some(readers) = read_owners.get(lock) {
                if let Some(&other) = readers.iter().find(|&&r| r != shard_index) {
                    return Err(ChainError::BlockConcurrencyError {
                        region_id,
                        cycle_index,
                        shard_index,
                        other_shard_index: other,
                        scope: format!("{}/{}", lock.account, lock.scope),
                    });
                }
            }
            write_owner.insert(lock, shard_index);
        }
        for lock in &shard.read_locks {
            if let Some(&other) = write_owner.get(lock) {
                if other != shard_index {
                    return Err(ChainError::BlockConcurrencyError {
                        region_id,
                        cycle_index,
                        shard_index,
                        other_shard_index: other,
                        scope: format!("{}/{}", lock.account, lock.scope),
                    });
                }
            }
            read_owners.entry(lock).or_default().push(shard_index);
        }
    }
    Ok(())
}

/// Reduce a shard's observed action traces to deduplicated, sorted
/// `(read_locks, write_locks)`. Shared by [`assert_observed_locks_match_declared`]
/// (verifying a block someone else authored) and the Pending Builder
/// (declaring locks for a block this node is producing) — the same
/// reduction, used in both directions (spec §4.5.2 step 4e, §4.3).
pub fn derive_shard_locks(traces: &[ActionTrace]) -> (Vec<ShardLock>, Vec<ShardLock>) {
    let mut reads = HashSet::new();
    let mut writes = HashSet::new();
    for trace in traces {
        for access in &trace.data_access {
            let lock = ShardLock {
                account: access.code.clone(),
                scope: access.scope.clone(),
            };
            match access.kind {
                DataAccessKind::Read => {
                    reads.insert(lock);
                }
                DataAccessKind::Write => {
                    writes.insert(lock);
                }
            }
        }
    }
    let mut observed_reads: Vec<_> = reads.into_iter().collect();
    let mut observed_writes: Vec<_> = writes.into_iter().collect();
    observed_reads.sort();
    observed_writes.sort();
    (observed_reads, observed_writes)
}

/// Assert a shard's declared `read_locks`/`write_locks` equal its
/// observed action traces, deduplicated and sorted (spec §4.5.2 step 4e,
/// Testable Property #4).
pub fn assert_observed_locks_match_declared(
    shard: &Shard,
    traces: &[ActionTrace],
    region_id: u16,
    cycle_index: u32,
    shard_index: u32,
) -> Result<(), ChainError> {
    let (observed_reads, observed_writes) = derive_shard_locks(traces);

    if observed_reads != shard.read_locks {
        return Err(ChainError::BlockLockError {
            region_id,
            cycle_index,
            shard_index,
            reason: "observed read accesses do not match declared read_locks".into(),
        });
    }
    if observed_writes != shard.write_locks {
        return Err(ChainError::BlockLockError {
            region_id,
            cycle_index,
            shard_index,
            reason: "observed write accesses do not match declared write_locks".into(),
        });
    }
    Ok(())
}

/// Merkle root over a list of hashes. Shared by `action_mroot`,
/// `transaction_mroot`, and the per-shard `shard_action_root`; odd levels
/// carry the last element forward, matching the donor's
/// `qc-03-transaction-indexing::domain::entities::MerkleTree` padding
/// convention except sourced directly from `shared-crypto` BLAKE3 rather
/// than SHA3, to avoid pulling in a second hash crate for one fold.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return [0u8; 32];
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            level.push(*level.last().unwrap());
        }
        level = level
            .chunks(2)
            .map(|pair| shared_crypto::blake3_hash(&[pair[0].as_slice(), pair[1].as_slice()].concat()))
            .collect();
    }
    level[0]
}

/// `transaction_mroot`: the Merkle root of input transaction ids in
/// declaration order.
pub fn transaction_merkle_root(transactions: &[Transaction]) -> Hash {
    merkle_root(&transactions.iter().map(Transaction::id).collect::<Vec<_>>())
}

/// The Merkle root of one action trace's receiver, action digest, and
/// console output — the leaf hashed into a shard's `shard_action_root`.
pub fn action_trace_digest(trace: &ActionTrace) -> Hash {
    let mut buf = Vec::new();
    buf.extend_from_slice(trace.receiver.0.as_bytes());
    buf.extend_from_slice(&action_digest(&trace.act));
    buf.extend_from_slice(trace.console.as_bytes());
    shared_crypto::blake3_hash(&buf)
}

fn action_digest(action: &Action) -> Hash {
    let mut buf = Vec::new();
    buf.extend_from_slice(action.account.0.as_bytes());
    buf.extend_from_slice(action.name.as_bytes());
    buf.extend_from_slice(&action.payload);
    shared_crypto::blake3_hash(&buf)
}
