//! # Pending Builder
//!
//! Assembles the block currently under construction: the partial
//! [`SignedBlock`] fields, the matching [`BlockTrace`], and the nested
//! undo session backing speculative execution (spec §4.3). Exactly one
//! pending block may exist at a time; `start_pending_block` on top of
//! an existing one is a programming error in the caller (the block
//! processor), not a recoverable [`ChainError`].

use crate::domain::entities::{
    AccountName, BlockId, BlockTrace, Cycle, CycleTrace, ProducerScheduleType, Region, RegionTrace,
    Shard, ShardLock, ShardTrace, Transaction, TransactionTrace,
};
use crate::domain::errors::ChainError;
use crate::domain::invariants::merkle_root;
use crate::ports::outbound::StateStore;

/// The block currently being assembled, whether by `generate_block`
/// (this node producing) or `apply_block` (replaying someone else's).
#[derive(Debug, Clone)]
pub struct PendingBlockState {
    pub timestamp: u64,
    pub producer: AccountName,
    pub previous: BlockId,
    pub new_producers: Option<ProducerScheduleType>,
    pub regions: Vec<Region>,
    pub trace: BlockTrace,
    pub input_transactions: Vec<Transaction>,
    undo_session_depth: usize,
}

impl PendingBlockState {
    fn current_region_mut(&mut self) -> Option<&mut Region> {
        self.regions.last_mut()
    }

    fn current_region_trace_mut(&mut self) -> Option<&mut RegionTrace> {
        self.trace.region_traces.last_mut()
    }

    pub fn current_cycle_mut(&mut self) -> Option<&mut Cycle> {
        self.current_region_mut().and_then(|r| r.cycles.last_mut())
    }

    pub fn current_cycle_trace_mut(&mut self) -> Option<&mut CycleTrace> {
        self.current_region_trace_mut()
            .and_then(|r| r.cycle_traces.last_mut())
    }

    pub fn current_shard_mut(&mut self) -> Option<&mut Shard> {
        self.current_cycle_mut().and_then(|c| c.last_mut())
    }

    pub fn current_shard_trace_mut(&mut self) -> Option<&mut ShardTrace> {
        self.current_cycle_trace_mut()
            .and_then(|c| c.shard_traces.last_mut())
    }

    /// Append a completed transaction trace to the current shard,
    /// recording it both as a compact receipt on the block (`regions`)
    /// and as the full trace (`trace`).
    pub fn record_transaction(&mut self, trace: TransactionTrace) {
        use crate::domain::entities::TransactionReceipt;
        let receipt = TransactionReceipt {
            id: trace.id,
            status: trace.status,
        };
        if let Some(shard) = self.current_shard_mut() {
            shard.transactions.push(receipt);
        }
        if let Some(shard_trace) = self.current_shard_trace_mut() {
            shard_trace.transaction_traces.push(trace);
        }
    }
}

/// Owns the single in-flight [`PendingBlockState`], backed by a nested
/// undo session on the state store.
#[derive(Debug, Default)]
pub struct PendingBuilder {
    state: Option<PendingBlockState>,
}

impl PendingBuilder {
    pub fn is_pending(&self) -> bool {
        self.state.is_some()
    }

    pub fn current(&self) -> Option<&PendingBlockState> {
        self.state.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut PendingBlockState> {
        self.state.as_mut()
    }

    /// Begin a new pending block, pushing a fresh undo session.
    pub fn start_pending_block(
        &mut self,
        store: &mut dyn StateStore,
        timestamp: u64,
        producer: AccountName,
        previous: BlockId,
    ) -> Result<(), ChainError> {
        if self.state.is_some() {
            return Err(ChainError::BlockValidateError {
                block_id: BlockId::ZERO,
                reason: "a pending block is already under construction".into(),
            });
        }
        let depth = store.push_undo_session();
        self.state = Some(PendingBlockState {
            timestamp,
            producer,
            previous,
            new_producers: None,
            regions: vec![],
            trace: BlockTrace::default(),
            input_transactions: vec![],
            undo_session_depth: depth,
        });
        Ok(())
    }

    pub fn start_pending_region(&mut self, region_id: u16) -> Result<(), ChainError> {
        let pending = self.require_pending()?;
        pending.regions.push(Region {
            region: region_id,
            cycles: vec![],
        });
        pending.trace.region_traces.push(RegionTrace::default());
        Ok(())
    }

    pub fn start_pending_cycle(&mut self) -> Result<(), ChainError> {
        let pending = self.require_pending()?;
        pending
            .current_region_mut()
            .ok_or_else(Self::no_region_error)?
            .cycles
            .push(Cycle::default());
        pending
            .current_region_trace_mut()
            .ok_or_else(Self::no_region_error)?
            .cycle_traces
            .push(CycleTrace::default());
        Ok(())
    }

    pub fn start_pending_shard(&mut self) -> Result<(), ChainError> {
        let pending = self.require_pending()?;
        pending
            .current_cycle_mut()
            .ok_or_else(Self::no_region_error)?
            .push(Shard::default());
        pending
            .current_cycle_trace_mut()
            .ok_or_else(Self::no_region_error)?
            .shard_traces
            .push(ShardTrace::default());
        Ok(())
    }

    /// Declare the current shard's `read_locks`/`write_locks`. Only the
    /// producing side calls this — a shard being replayed or validated
    /// already carries its declared locks from the incoming block, and
    /// `invariants::assert_observed_locks_match_declared` checks those
    /// against what was actually observed instead of overwriting them.
    pub fn set_shard_locks(&mut self, read_locks: Vec<ShardLock>, write_locks: Vec<ShardLock>) -> Result<(), ChainError> {
        let pending = self.require_pending()?;
        let shard = pending.current_shard_mut().ok_or_else(Self::no_region_error)?;
        shard.read_locks = read_locks;
        shard.write_locks = write_locks;
        Ok(())
    }

    /// Compute and stash the current shard's action Merkle root once
    /// every transaction in it has been applied (spec §4.5.2 step 4f).
    pub fn finalize_pending_shard(&mut self, leaves: &[shared_types::Hash]) -> Result<(), ChainError> {
        let root = merkle_root(leaves);
        let pending = self.require_pending()?;
        pending
            .current_shard_trace_mut()
            .ok_or_else(Self::no_region_error)?
            .shard_action_root = root;
        Ok(())
    }

    /// Release the pending block without committing it, undoing its
    /// nested session. Called both on success (the caller squashes the
    /// session into the parent first, via `finish_pending_block`) and
    /// on failure.
    pub fn clear_pending(&mut self, store: &mut dyn StateStore) {
        if self.state.take().is_some() {
            store.undo();
        }
    }

    /// Squash the pending session into its parent and hand back the
    /// assembled state for the caller to turn into a [`crate::domain::entities::SignedBlock`].
    pub fn finish_pending_block(
        &mut self,
        store: &mut dyn StateStore,
    ) -> Result<PendingBlockState, ChainError> {
        let pending = self.state.take().ok_or(ChainError::BlockValidateError {
            block_id: BlockId::ZERO,
            reason: "no pending block to finish".into(),
        })?;
        store.squash();
        Ok(pending)
    }

    fn require_pending(&mut self) -> Result<&mut PendingBlockState, ChainError> {
        self.state.as_mut().ok_or(ChainError::BlockValidateError {
            block_id: BlockId::ZERO,
            reason: "no pending block is under construction".into(),
        })
    }

    fn no_region_error() -> ChainError {
        ChainError::BlockValidateError {
            block_id: BlockId::ZERO,
            reason: "start_pending_region/cycle must be called before this operation".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::state_store::InMemoryStateStore;

    #[test]
    fn one_pending_block_at_a_time() {
        let mut store = InMemoryStateStore::genesis();
        let mut builder = PendingBuilder::default();
        builder
            .start_pending_block(&mut store, 1, "alice".into(), BlockId::ZERO)
            .unwrap();
        assert!(builder
            .start_pending_block(&mut store, 1, "alice".into(), BlockId::ZERO)
            .is_err());
    }

    #[test]
    fn clear_pending_undoes_session() {
        let mut store = InMemoryStateStore::genesis();
        let mut builder = PendingBuilder::default();
        builder
            .start_pending_block(&mut store, 1, "alice".into(), BlockId::ZERO)
            .unwrap();
        builder.clear_pending(&mut store);
        assert!(!builder.is_pending());
    }

    #[test]
    fn region_cycle_shard_nest_correctly() {
        let mut store = InMemoryStateStore::genesis();
        let mut builder = PendingBuilder::default();
        builder
            .start_pending_block(&mut store, 1, "alice".into(), BlockId::ZERO)
            .unwrap();
        builder.start_pending_region(0).unwrap();
        builder.start_pending_cycle().unwrap();
        builder.start_pending_shard().unwrap();
        assert_eq!(builder.current().unwrap().regions.len(), 1);
        assert_eq!(builder.current().unwrap().regions[0].cycles.len(), 1);
        assert_eq!(builder.current().unwrap().regions[0].cycles[0].len(), 1);
    }
}
