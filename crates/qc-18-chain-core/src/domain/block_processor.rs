//! # Block Processor
//!
//! [`ChainController`], the [`crate::ports::inbound::ChainControllerApi`]
//! implementation that ties every other domain module together: the
//! Fork Database for branch bookkeeping, the Pending Builder for
//! speculative assembly, the Transaction Applicator for execution, and
//! the producer-scheduler/invariants helpers for validation. One
//! instance owns the whole reversible+irreversible chain state behind
//! a single `&mut self` — the "process-wide write lock" of spec §5 is
//! just ordinary borrow checking, since nothing here is internally
//! concurrent.
//!
//! Shards within a cycle execute serially, in declaration order. The
//! shard-lock invariants `invariants.rs` enforces (sorted/unique locks,
//! no cross-shard write collisions) are exactly what a parallel shard
//! executor would need already proven before dispatching shards onto
//! separate workers; none is wired in here.
//!
//! Two undo-session frames nest per applied block: an outer one this
//! controller pushes itself (left open afterward, so `pop_block` can
//! unwind exactly one block), and an inner one the Pending Builder
//! pushes for speculative assembly (squashed into the outer frame on
//! success, discarded on failure). `push_transaction` opens the outer
//! frame lazily on the first transaction after a finalized block;
//! `apply_block`/`generate_block` close it out on completion.

use std::collections::{BTreeMap, HashMap};

use crate::adapters::signals::SignalBus;
use crate::domain::entities::{
    AccountName, ActionTrace, BlockId, BlockTrace, ChainConfig, PendingScheduleUpdate, ProducerKey,
    ProducerScheduleType, SignedBlock, Transaction, TransactionTrace, SINGLE_PRODUCER_LIB_ADJUSTMENT,
};
use crate::domain::errors::ChainError;
use crate::domain::fork_db::ForkDatabase;
use crate::domain::invariants;
use crate::domain::pending_builder::PendingBuilder;
use crate::domain::producer_scheduler;
use crate::domain::tx_applicator::{ApplyContext, TxApplicator};
use crate::metrics::ChainMetrics;
use crate::ports::inbound::{ChainControllerApi, SkipFlags};
use crate::ports::outbound::{AuthorityCheckerPort, BlockLogPort, InterpreterPort, StateStore};
use shared_types::Hash;

/// The consensus and execution controller. Owns every collaborator
/// described in spec §6 except the Interpreter/Authority checker,
/// which are themselves outbound ports so a real VM or permission
/// system can be substituted without touching this file.
pub struct ChainController {
    store: Box<dyn StateStore>,
    block_log: Box<dyn BlockLogPort>,
    interpreter: Box<dyn InterpreterPort>,
    authority: Box<dyn AuthorityCheckerPort>,
    signals: SignalBus,
    metrics: ChainMetrics,
    fork_db: ForkDatabase,
    pending: PendingBuilder,
    applicator: TxApplicator,
    genesis_time_ms: u64,
    /// Whether the per-block outer undo session (see module docs) is
    /// currently open. Distinct from `pending.is_pending()`, which only
    /// tracks the inner assembly session.
    block_session_open: bool,
    /// Trusted heights and their ids (`chain_controller.cpp::add_checkpoints`,
    /// SPEC_FULL.md §3). Heights at or below the highest checkpoint imply
    /// every skip flag (spec §6).
    checkpoints: BTreeMap<u32, BlockId>,
}

fn block_id_prefix(id: BlockId) -> u32 {
    u32::from_le_bytes([id.0[4], id.0[5], id.0[6], id.0[7]])
}

fn estimated_block_size(block: &SignedBlock) -> u32 {
    bincode::serialize(block).map(|v| v.len() as u32).unwrap_or(0)
}

impl ChainController {
    pub fn new(
        store: Box<dyn StateStore>,
        block_log: Box<dyn BlockLogPort>,
        interpreter: Box<dyn InterpreterPort>,
        authority: Box<dyn AuthorityCheckerPort>,
        genesis_time_ms: u64,
    ) -> Self {
        let root_id = store.dynamic_global_properties().head_block_id;
        Self {
            store,
            block_log,
            interpreter,
            authority,
            signals: SignalBus::default(),
            metrics: ChainMetrics::default(),
            fork_db: ForkDatabase::new(root_id),
            pending: PendingBuilder::default(),
            applicator: TxApplicator::default(),
            genesis_time_ms,
            block_session_open: false,
            checkpoints: BTreeMap::new(),
        }
    }

    pub fn signals_mut(&mut self) -> &mut SignalBus {
        &mut self.signals
    }

    pub fn metrics(&self) -> &ChainMetrics {
        &self.metrics
    }

    /// Register trusted (height, id) pairs. `apply_block` asserts the
    /// block id at a checkpointed height matches, and any height at or
    /// below the highest checkpoint implies every skip flag — the caller
    /// has already vouched for everything up to that point
    /// (`chain_controller.cpp::add_checkpoints`, SPEC_FULL.md §3).
    pub fn add_checkpoints(&mut self, checkpoints: impl IntoIterator<Item = (u32, BlockId)>) {
        self.checkpoints.extend(checkpoints);
    }

    /// The highest checkpointed height, or 0 if none are registered
    /// (`chain_controller.cpp::before_last_checkpoint`, SPEC_FULL.md §3).
    pub fn before_last_checkpoint(&self, height: u32) -> bool {
        self.checkpoints.keys().next_back().is_some_and(|&h| height <= h)
    }

    fn assert_checkpoint(&self, block: &SignedBlock) -> Result<(), ChainError> {
        let height = block.block_num();
        if let Some(&expected) = self.checkpoints.get(&height) {
            let actual = block.id();
            if actual != expected {
                return Err(ChainError::CheckpointMismatch { height, expected, actual });
            }
        }
        Ok(())
    }

    /// Every skip flag the checkpoint surface implies, combined with
    /// whatever flags the caller already passed (spec §6 "Checkpoints
    /// past the latest checkpoint height imply all skip flags").
    fn effective_skip(&self, block_num: u32, skip: SkipFlags) -> SkipFlags {
        if self.before_last_checkpoint(block_num) {
            SkipFlags::all()
        } else {
            skip
        }
    }

    /// Seed the active producer schedule and chain configuration.
    /// Intended to be called once, before the first `push_transaction`
    /// or `generate_block`; not part of [`ChainControllerApi`] since no
    /// running chain ever calls it again.
    pub fn configure_genesis(
        &mut self,
        active_producers: ProducerScheduleType,
        config: ChainConfig,
    ) -> Result<(), ChainError> {
        config.validate()?;
        let mut global = self.store.global_properties().clone();
        global.configuration = config;
        global.active_producers = active_producers;
        self.store.set_global_properties(global);
        Ok(())
    }

    /// Replay every block in the Block Log, in height order, with every
    /// validation skip flag set (spec §4.7) — the log is already known
    /// irreversible, so nothing there needs re-validating, only
    /// re-applying.
    pub fn replay(&mut self) -> Result<(), ChainError> {
        let Some(head) = self.block_log.read_head() else {
            return Ok(());
        };
        let target_height = head.block_num();
        for height in 1..=target_height {
            let block = self.block_log.read_block_by_num(height).ok_or(ChainError::UnknownBlock {
                height,
                head_height: target_height,
            })?;
            let trace = self.apply_block_session(&block, SkipFlags::all(), true)?;
            self.signals.emit_applied_block(&trace);
        }
        Ok(())
    }

    fn discard_any_pending(&mut self) {
        self.pending.clear_pending(self.store.as_mut());
        if self.block_session_open {
            self.store.undo();
            self.block_session_open = false;
        }
    }

    /// Open the outer+inner undo sessions and start a fresh single
    /// region/cycle/shard pending block, if one isn't already open.
    fn ensure_pending_block(&mut self, timestamp: u64, producer: AccountName) -> Result<(), ChainError> {
        if self.pending.is_pending() {
            return Ok(());
        }
        let previous = self.store.dynamic_global_properties().head_block_id;
        self.store.push_undo_session();
        self.block_session_open = true;
        if let Err(err) = self
            .pending
            .start_pending_block(self.store.as_mut(), timestamp, producer, previous)
        {
            self.store.undo();
            self.block_session_open = false;
            return Err(err);
        }
        self.pending.start_pending_region(0)?;
        self.pending.start_pending_cycle()?;
        self.pending.start_pending_shard()?;
        Ok(())
    }

    /// Which of the authority checker's known keys actually signed
    /// `id` (spec §6 "get_required_keys"), or none at all when
    /// `SKIP_AUTHORITY_CHECK` makes the question moot
    /// (`SKIP_TRANSACTION_SIGNATURES` still recovers keys, just without
    /// doing the cryptographic check — see
    /// [`AuthorityCheckerPort::recover_provided_keys`]).
    fn recover_provided_keys(&self, id: Hash, signatures: &[shared_types::Signature], skip: SkipFlags) -> Vec<shared_types::PublicKey> {
        if skip.has(SkipFlags::SKIP_AUTHORITY_CHECK) {
            return Vec::new();
        }
        self.authority
            .recover_provided_keys(&id, signatures, skip.has(SkipFlags::SKIP_TRANSACTION_SIGNATURES))
    }

    fn assert_tapos(&self, trx: &Transaction, id: Hash) -> Result<(), ChainError> {
        let summary_id = self.store.block_summary_id(trx.ref_block_num as u32);
        if trx.ref_block_prefix != block_id_prefix(summary_id) {
            return Err(ChainError::TapOsMismatch {
                id,
                ref_block_num: trx.ref_block_num,
                ref_block_prefix: trx.ref_block_prefix,
            });
        }
        Ok(())
    }

    /// Revert the currently-applied head block's state effects, without
    /// touching the fork database's bookkeeping. Shared by the public
    /// `pop_block` and by fork-switch rollback, which must undo state
    /// without discarding blocks that may still be valid on a losing
    /// branch.
    fn undo_applied_head(&mut self) -> Result<SignedBlock, ChainError> {
        let id = self.store.dynamic_global_properties().head_block_id;
        if id == self.fork_db.root_id() {
            return Err(ChainError::PopEmptyChain);
        }
        let block = self.fork_db.fetch(id).cloned().ok_or(ChainError::PopEmptyChain)?;
        self.store.undo();
        Ok(block)
    }

    /// Header validation (spec §4.5.5). Skipped checks are named by the
    /// flag that bypasses them.
    fn validate_header(&self, block: &SignedBlock, skip: SkipFlags) -> Result<(), ChainError> {
        let dynamic = self.store.dynamic_global_properties();
        let id = block.id();

        if block.previous != dynamic.head_block_id {
            return Err(ChainError::BlockValidateError {
                block_id: id,
                reason: format!("previous {} does not match head {}", block.previous, dynamic.head_block_id),
            });
        }
        if block.timestamp <= dynamic.head_block_time {
            return Err(ChainError::BlockValidateError {
                block_id: id,
                reason: "timestamp does not advance past head block time".into(),
            });
        }

        let global = self.store.global_properties();
        let round_boundary = producer_scheduler::is_start_of_round(
            block.block_num(),
            global.active_producers.producers.len(),
            global.configuration.producer_repetitions,
        );
        if block.new_producers.is_some() && !round_boundary {
            return Err(ChainError::BlockValidateError {
                block_id: id,
                reason: "new_producers set on a block that is not a round boundary".into(),
            });
        }

        if !skip.has(SkipFlags::SKIP_PRODUCER_SCHEDULE_CHECK) {
            let absolute_slot =
                producer_scheduler::slot_at_time(self.genesis_time_ms, global.configuration.block_interval_ms, block.timestamp);
            let slot_offset = absolute_slot.saturating_sub(dynamic.current_absolute_slot);
            let scheduled = producer_scheduler::get_scheduled_producer(
                &global.active_producers,
                dynamic.current_absolute_slot,
                slot_offset,
                global.configuration.producer_repetitions,
            )
            .ok_or_else(|| ChainError::BlockValidateError {
                block_id: id,
                reason: "no producer scheduled for this block's slot".into(),
            })?;
            if scheduled.producer != block.producer {
                return Err(ChainError::BlockValidateError {
                    block_id: id,
                    reason: format!("block signed by {} but slot belongs to {}", block.producer, scheduled.producer),
                });
            }
        }

        if !skip.has(SkipFlags::SKIP_PRODUCER_SIGNATURE) && !skip.has(SkipFlags::CREATED_BLOCK) {
            let key = global
                .active_producers
                .producers
                .iter()
                .find(|p| p.producer == block.producer)
                .map(|p| p.signing_key)
                .ok_or_else(|| ChainError::BlockValidateError {
                    block_id: id,
                    reason: "producer is not a member of the active schedule".into(),
                })?;
            let public_key = shared_crypto::Ed25519PublicKey::from_bytes(key).map_err(|e| ChainError::BlockValidateError {
                block_id: id,
                reason: format!("invalid producer key: {e}"),
            })?;
            let signature = shared_crypto::Ed25519Signature::from_bytes(block.producer_signature);
            public_key.verify(&id.0, &signature).map_err(|_| ChainError::BlockValidateError {
                block_id: id,
                reason: "producer signature does not verify".into(),
            })?;
        }

        Ok(())
    }

    /// Apply one block end to end (spec §4.5.2), wrapped in its own
    /// outer undo session so a failure anywhere unwinds every effect.
    fn apply_block_session(&mut self, block: &SignedBlock, skip: SkipFlags, replaying: bool) -> Result<BlockTrace, ChainError> {
        self.store.push_undo_session();
        self.block_session_open = true;
        match self.apply_block_inner(block, skip, replaying) {
            Ok(trace) => {
                self.block_session_open = false;
                Ok(trace)
            }
            Err(err) => {
                self.store.undo();
                self.block_session_open = false;
                Err(err)
            }
        }
    }

    fn apply_block_inner(&mut self, block: &SignedBlock, skip: SkipFlags, _replaying: bool) -> Result<BlockTrace, ChainError> {
        self.assert_checkpoint(block)?;
        let skip = self.effective_skip(block.block_num(), skip);
        self.validate_header(block, skip)?;

        if !skip.has(SkipFlags::SKIP_BLOCK_SIZE_CHECK) {
            let config = &self.store.global_properties().configuration;
            let size = estimated_block_size(block);
            if size > config.max_block_size_bytes {
                return Err(ChainError::BlockValidateError {
                    block_id: block.id(),
                    reason: format!("block size {size} exceeds max_block_size_bytes {}", config.max_block_size_bytes),
                });
            }
            let action_count: usize = block.input_transactions.iter().map(|t| t.actions.len()).sum();
            if action_count as u32 > config.max_block_action_count {
                return Err(ChainError::BlockValidateError {
                    block_id: block.id(),
                    reason: format!("block action count {action_count} exceeds max_block_action_count {}", config.max_block_action_count),
                });
            }
        }

        let mut last_region: Option<u16> = None;
        for region in &block.regions {
            if let Some(last) = last_region {
                if region.region <= last {
                    return Err(ChainError::BlockValidateError {
                        block_id: block.id(),
                        reason: "regions are not strictly increasing".into(),
                    });
                }
            }
            last_region = Some(region.region);
        }

        let input_map: HashMap<Hash, &Transaction> = block.input_transactions.iter().map(|t| (t.id(), t)).collect();

        self.pending
            .start_pending_block(self.store.as_mut(), block.timestamp, block.producer.clone(), block.previous)?;

        for region in &block.regions {
            self.pending.start_pending_region(region.region)?;

            for (cycle_idx, cycle) in region.cycles.iter().enumerate() {
                let cycle_idx = cycle_idx as u32;
                self.pending.start_pending_cycle()?;
                invariants::assert_no_cross_shard_collisions(cycle, region.region, cycle_idx)?;

                for (shard_idx, shard) in cycle.iter().enumerate() {
                    let shard_idx = shard_idx as u32;
                    self.pending.start_pending_shard()?;
                    invariants::assert_locks_sorted_unique(shard, region.region, cycle_idx, shard_idx)?;

                    let mut shard_traces: Vec<TransactionTrace> = Vec::with_capacity(shard.transactions.len());
                    for receipt in &shard.transactions {
                        let (trx, deferred_sender) = if let Some(&t) = input_map.get(&receipt.id) {
                            (t.clone(), None)
                        } else {
                            let record = self.store.remove_generated_transaction(&receipt.id).ok_or_else(|| {
                                ChainError::BlockValidateError {
                                    block_id: block.id(),
                                    reason: format!(
                                        "transaction {:?} is neither an input transaction nor a known generated transaction",
                                        receipt.id
                                    ),
                                }
                            })?;
                            let unpacked: Transaction = bincode::deserialize(&record.packed_trx)
                                .map_err(|e| ChainError::Interpreter(format!("could not unpack generated transaction: {e}")))?;
                            (unpacked, Some((record.sender, record.sender_id)))
                        };

                        if !skip.has(SkipFlags::SKIP_TRANSACTION_DUPE_CHECK)
                            && deferred_sender.is_none()
                            && self.store.is_known_transaction(&receipt.id)
                        {
                            return Err(ChainError::TxDuplicate(receipt.id));
                        }

                        let recovered_keys = self.recover_provided_keys(receipt.id, &trx.signatures, skip);
                        let ctx = ApplyContext {
                            transaction: &trx,
                            id: receipt.id,
                            region_id: region.region,
                            cycle_index: cycle_idx,
                            shard_index: shard_idx,
                            head_block_time: block.timestamp,
                            deferred_sender,
                            provided_keys: &recovered_keys,
                            max_authority_depth: self.store.global_properties().configuration.max_authority_depth,
                            skip_authority_check: skip.has(SkipFlags::SKIP_AUTHORITY_CHECK),
                        };

                        let trace =
                            self.applicator
                                .apply_transaction(self.store.as_mut(), self.interpreter.as_ref(), self.authority.as_ref(), &ctx)?;
                        if trace.status != receipt.status {
                            return Err(ChainError::BlockValidateError {
                                block_id: block.id(),
                                reason: format!(
                                    "transaction {:?} declared status {:?} but computed {:?}",
                                    receipt.id, receipt.status, trace.status
                                ),
                            });
                        }
                        self.metrics.record_transaction(trace.status);
                        shard_traces.push(trace);
                    }

                    let all_action_traces: Vec<_> = shard_traces.iter().flat_map(|t| t.action_traces.iter()).cloned().collect();
                    invariants::assert_observed_locks_match_declared(shard, &all_action_traces, region.region, cycle_idx, shard_idx)?;

                    let leaves: Vec<Hash> = all_action_traces.iter().map(invariants::action_trace_digest).collect();
                    self.pending.finalize_pending_shard(&leaves)?;
                    for trace in shard_traces {
                        self.pending.current_mut().unwrap().record_transaction(trace);
                    }
                }

                let cycle_traces: Vec<TransactionTrace> = self
                    .pending
                    .current()
                    .unwrap()
                    .trace
                    .region_traces
                    .last()
                    .unwrap()
                    .cycle_traces
                    .last()
                    .unwrap()
                    .shard_traces
                    .iter()
                    .flat_map(|st| st.transaction_traces.iter())
                    .cloned()
                    .collect();
                self.applicator.apply_cycle_effects(self.store.as_mut(), &cycle_traces, block.timestamp);
            }
        }

        if !skip.has(SkipFlags::SKIP_MERKLE_CHECK) {
            let shard_roots: Vec<Hash> = self
                .pending
                .current()
                .unwrap()
                .trace
                .region_traces
                .iter()
                .flat_map(|r| r.cycle_traces.iter())
                .flat_map(|c| c.shard_traces.iter())
                .map(|s| s.shard_action_root)
                .collect();
            if invariants::merkle_root(&shard_roots) != block.action_mroot {
                return Err(ChainError::BlockValidateError {
                    block_id: block.id(),
                    reason: "action_mroot does not match recomputed shard roots".into(),
                });
            }
            if invariants::transaction_merkle_root(&block.input_transactions) != block.transaction_mroot {
                return Err(ChainError::BlockValidateError {
                    block_id: block.id(),
                    reason: "transaction_mroot does not match input transactions".into(),
                });
            }
        }

        let pending_state = self.pending.finish_pending_block(self.store.as_mut())?;
        self.finalize_globals(block, &skip)?;
        Ok(pending_state.trace)
    }

    /// Step 8 of spec §4.5.2: roll the persistent singletons forward,
    /// update the signing producer's stats and any producers that missed
    /// their slot, garbage-collect expired dedup/generated records,
    /// register the block with the fork database, and advance the last
    /// irreversible block.
    fn finalize_globals(&mut self, block: &SignedBlock, skip: &SkipFlags) -> Result<(), ChainError> {
        let config = self.store.global_properties().configuration.clone();
        let mut dynamic = self.store.dynamic_global_properties().clone();
        let id = block.id();
        let prior_absolute_slot = dynamic.current_absolute_slot;

        let absolute_slot = producer_scheduler::slot_at_time(self.genesis_time_ms, config.block_interval_ms, block.timestamp);
        let slot_offset = absolute_slot.saturating_sub(dynamic.current_absolute_slot).max(1);
        dynamic.recent_slots_filled = if slot_offset >= 64 {
            u64::from(slot_offset == 1) * u64::MAX
        } else {
            (dynamic.recent_slots_filled << slot_offset) | 1
        };
        dynamic.average_block_size = ((u64::from(dynamic.average_block_size) * 7 + u64::from(estimated_block_size(block))) / 8) as u32;
        dynamic.current_absolute_slot = absolute_slot;
        dynamic.current_producer = block.producer.clone();
        dynamic.head_block_number = block.block_num();
        dynamic.head_block_id = id;
        dynamic.head_block_time = block.timestamp;
        dynamic.block_merkle_root.append(id.0);
        self.store.set_dynamic_global_properties(dynamic);
        self.store.set_block_summary_id(block.block_num(), id);

        // `update_signing_producer` (chain_controller.cpp): always record
        // who signed and at what height/slot; the missed-slot penalty
        // below is a separate, skippable concern.
        self.store.update_producer_stats(&block.producer, block.block_num(), absolute_slot);
        if !skip.has(SkipFlags::SKIP_MISSED_BLOCK_PENALTY) {
            let active_producers = self.store.global_properties().active_producers.clone();
            for missed_offset in 1..slot_offset {
                if let Some(missed) = producer_scheduler::get_scheduled_producer(
                    &active_producers,
                    prior_absolute_slot,
                    missed_offset,
                    config.producer_repetitions,
                ) {
                    self.store.record_missed_slot(&missed.producer);
                }
            }
        }

        if let Some(new_producers) = &block.new_producers {
            let mut global = self.store.global_properties().clone();
            if *new_producers != global.active_producers {
                global.pending_schedule_updates.push(PendingScheduleUpdate {
                    height: block.block_num(),
                    schedule: new_producers.clone(),
                });
                self.store.set_global_properties(global);
            }
        }

        self.store.expire_dedup_records(block.timestamp);
        self.store.expire_generated_transactions(block.timestamp);
        self.metrics.record_block_applied();

        if skip.has(SkipFlags::SKIP_FORK_DB) {
            // Already-irreversible replay path: trust the block log's
            // ordering outright instead of tracking it through the fork
            // database's branch bookkeeping or the order-statistic below.
            self.promote_pending_schedule(block.block_num());
            let mut dynamic = self.store.dynamic_global_properties().clone();
            dynamic.last_irreversible_block_num = block.block_num();
            self.store.set_dynamic_global_properties(dynamic);
            self.metrics.set_last_irreversible(block.block_num());
            self.store.commit(u64::from(block.block_num()));
            return Ok(());
        }

        self.fork_db.push(block.clone()).ok();
        self.advance_last_irreversible_block(skip)?;
        Ok(())
    }

    /// Promote whatever pending schedule update is due by `height` into
    /// `active_producers`, dropping it and every earlier one (shared by
    /// the normal and `SKIP_FORK_DB` last-irreversible-block paths).
    fn promote_pending_schedule(&mut self, height: u32) {
        let mut to_promote: Option<ProducerScheduleType> = None;
        let mut global = self.store.global_properties().clone();
        let before = global.pending_schedule_updates.len();
        for update in &global.pending_schedule_updates {
            if update.height <= height {
                to_promote = Some(update.schedule.clone());
            }
        }
        global.pending_schedule_updates.retain(|u| u.height > height);
        if let Some(schedule) = to_promote {
            global.active_producers = schedule;
        }
        if global.pending_schedule_updates.len() != before {
            self.store.set_global_properties(global);
        }
    }

    /// Last-irreversible-block advancement (spec §4.6): the
    /// order-statistic of each active producer's most recently confirmed
    /// height (`chain_controller.cpp::update_last_irreversible_block`,
    /// read from the persisted [`ProducerStats`] this module updates on
    /// every block rather than re-derived by walking the fork database),
    /// taken at the index a supermajority requires. The single-producer
    /// case never lets the head block itself fall behind a supermajority,
    /// so it is nudged down by [`SINGLE_PRODUCER_LIB_ADJUSTMENT`].
    fn advance_last_irreversible_block(&mut self, skip: &SkipFlags) -> Result<(), ChainError> {
        let dynamic = self.store.dynamic_global_properties().clone();
        let producers = self.store.global_properties().active_producers.producers.clone();
        let n = producers.len();
        if n == 0 {
            return Ok(());
        }

        let mut heights: Vec<u32> = producers
            .iter()
            .map(|p| self.store.producer_stats(&p.producer).last_confirmed_block_num)
            .collect();
        heights.sort_unstable();

        let threshold = u64::from(self.store.global_properties().configuration.irreversible_threshold_percent);
        let required = ((n as u64 * threshold + 99) / 100).max(1) as usize;
        let index = n.saturating_sub(required).min(heights.len() - 1);
        let mut candidate = i64::from(heights[index]);
        if n == 1 {
            candidate += SINGLE_PRODUCER_LIB_ADJUSTMENT;
        }
        let candidate = candidate.max(0) as u32;

        let old_lib = dynamic.last_irreversible_block_num;
        if candidate <= old_lib {
            return Ok(());
        }

        self.promote_pending_schedule(candidate);

        for height in (old_lib + 1)..=candidate {
            if let Some(b) = self.fork_db.fetch_by_height(height).cloned() {
                if !skip.has(SkipFlags::GENESIS_SETUP) {
                    self.block_log.append(b.clone());
                }
                self.signals.emit_applied_irreversible_block(&b);
            }
        }

        tracing::debug!(old_lib, new_lib = candidate, "last irreversible block advanced");
        let mut dynamic = self.store.dynamic_global_properties().clone();
        dynamic.last_irreversible_block_num = candidate;
        self.store.set_dynamic_global_properties(dynamic);
        self.metrics.set_last_irreversible(candidate);

        if let Some(new_root) = self.fork_db.fetch_by_height(candidate).map(|b| b.id()) {
            self.fork_db.advance_root(new_root);
        }
        self.store.commit(u64::from(candidate));

        Ok(())
    }

    /// Pop the current applied head, re-apply the other branch's blocks
    /// in order, and reconcile the fork database's head pointer. On
    /// failure partway through the new branch, only the offending block
    /// is discarded; every block successfully applied-then-unwound, and
    /// every block on the losing branch, stays known to the fork
    /// database (spec §8 scenarios 3-4).
    fn switch_fork(&mut self, new_head_id: BlockId, old_head_id: BlockId, skip: SkipFlags) -> Result<(), ChainError> {
        let (new_branch, old_branch) = self.fork_db.get_block_ids_on_fork(new_head_id, old_head_id)?;
        tracing::info!(
            old_head = %old_head_id,
            new_head = %new_head_id,
            popped = old_branch.len(),
            applying = new_branch.len(),
            "switching fork"
        );

        for _ in &old_branch {
            self.undo_applied_head()?;
        }

        let mut applied_count = 0usize;
        for id in new_branch.iter().rev() {
            let block = self.fork_db.fetch(*id).cloned().ok_or(ChainError::UnlinkableBlock(*id))?;
            match self.apply_block_session(&block, skip, false) {
                Ok(trace) => {
                    self.signals.emit_applied_block(&trace);
                    applied_count += 1;
                }
                Err(err) => {
                    tracing::warn!(block_id = %id, error = %err, "new branch failed to apply, rolling back to old branch");
                    for _ in 0..applied_count {
                        self.undo_applied_head()?;
                    }
                    self.fork_db.remove(*id);
                    for old_id in old_branch.iter().rev() {
                        let block = self.fork_db.fetch(*old_id).cloned().ok_or(ChainError::UnlinkableBlock(*old_id))?;
                        self.apply_block_session(&block, skip, false)?;
                    }
                    self.fork_db.set_head(old_head_id)?;
                    return Err(err);
                }
            }
        }

        self.metrics.record_fork_switch();
        self.fork_db.set_head(new_head_id)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChainControllerApi for ChainController {
    async fn push_block(&mut self, block: SignedBlock, skip: SkipFlags) -> Result<(), ChainError> {
        self.discard_any_pending();

        let applied_head_id = self.store.dynamic_global_properties().head_block_id;
        let applied_head_num = self.store.dynamic_global_properties().head_block_number;
        let new_id = self.fork_db.push(block.clone())?;

        if block.previous == applied_head_id {
            let trace = self.apply_block_session(&block, skip, false)?;
            self.signals.emit_applied_block(&trace);
            return Ok(());
        }

        if block.block_num() > applied_head_num {
            self.switch_fork(new_id, applied_head_id, skip)?;
        }
        Ok(())
    }

    async fn push_transaction(&mut self, transaction: Transaction, skip: SkipFlags) -> Result<TransactionTrace, ChainError> {
        let id = transaction.id();
        let head_time = self.store.dynamic_global_properties().head_block_time;

        if !skip.has(SkipFlags::SKIP_TRANSACTION_DUPE_CHECK) && self.store.is_known_transaction(&id) {
            return Err(ChainError::TxDuplicate(id));
        }
        if transaction.expiration <= head_time {
            return Err(ChainError::TxExpired {
                id,
                expiration: transaction.expiration,
                head_time,
            });
        }
        let max_lifetime_ms = self.store.global_properties().configuration.max_transaction_lifetime_secs * 1000;
        if transaction.expiration > head_time + max_lifetime_ms {
            return Err(ChainError::TxFutureExpiration {
                id,
                expiration: transaction.expiration,
                head_time,
            });
        }
        if !skip.has(SkipFlags::SKIP_TAPOS_CHECK) {
            self.assert_tapos(&transaction, id)?;
        }

        let producer = self.store.dynamic_global_properties().current_producer.clone();
        let interval = self.store.global_properties().configuration.block_interval_ms;
        let pending_timestamp = head_time + interval;
        self.ensure_pending_block(pending_timestamp, producer)?;

        let max_authority_depth = self.store.global_properties().configuration.max_authority_depth;
        let recovered_keys = self.recover_provided_keys(id, &transaction.signatures, skip);
        let ctx = ApplyContext {
            transaction: &transaction,
            id,
            region_id: 0,
            cycle_index: 0,
            shard_index: 0,
            head_block_time: pending_timestamp,
            deferred_sender: None,
            provided_keys: &recovered_keys,
            max_authority_depth,
            skip_authority_check: skip.has(SkipFlags::SKIP_AUTHORITY_CHECK),
        };

        let trace = self
            .applicator
            .apply_transaction(self.store.as_mut(), self.interpreter.as_ref(), self.authority.as_ref(), &ctx)?;

        self.applicator
            .apply_cycle_effects(self.store.as_mut(), std::slice::from_ref(&trace), pending_timestamp);
        self.metrics.record_transaction(trace.status);
        self.signals.emit_pending_transaction(&bincode::serialize(&transaction).unwrap_or_default());

        if let Some(state) = self.pending.current_mut() {
            state.record_transaction(trace.clone());
            state.input_transactions.push(transaction);
        }

        Ok(trace)
    }

    async fn generate_block(&mut self, when: u64, producer: ProducerKey, skip: SkipFlags) -> Result<SignedBlock, ChainError> {
        let dynamic = self.store.dynamic_global_properties().clone();
        let config = self.store.global_properties().configuration.clone();

        let absolute_slot = producer_scheduler::slot_at_time(self.genesis_time_ms, config.block_interval_ms, when);
        if absolute_slot == 0 {
            return Err(ChainError::BlockValidateError {
                block_id: BlockId::ZERO,
                reason: "generate_block called for a time before genesis".into(),
            });
        }
        let slot_offset = absolute_slot.saturating_sub(dynamic.current_absolute_slot);
        if slot_offset == 0 {
            return Err(ChainError::BlockValidateError {
                block_id: BlockId::ZERO,
                reason: "slot_offset must be strictly positive".into(),
            });
        }
        if !skip.has(SkipFlags::SKIP_PRODUCER_SCHEDULE_CHECK) {
            let scheduled = producer_scheduler::get_scheduled_producer(
                &self.store.global_properties().active_producers,
                dynamic.current_absolute_slot,
                slot_offset,
                config.producer_repetitions,
            )
            .ok_or_else(|| ChainError::BlockValidateError {
                block_id: BlockId::ZERO,
                reason: "no producer scheduled for this slot".into(),
            })?;
            if scheduled.producer != producer.producer {
                return Err(ChainError::BlockValidateError {
                    block_id: BlockId::ZERO,
                    reason: format!("expected producer {} but got {}", scheduled.producer, producer.producer),
                });
            }
        }

        self.ensure_pending_block(when, producer.producer.clone())?;
        if let Some(state) = self.pending.current_mut() {
            state.timestamp = when;
            state.producer = producer.producer.clone();
        }

        // If deferred work is mature, close out the cycle assembled so far
        // and open a fresh one so the deferred transactions land in a
        // cycle of their own rather than mixing with ordinary ones
        // (spec §4.4 "push_deferred_transactions" flush semantics,
        // exercised by spec §8 scenario 5).
        let due = self.store.generated_transactions_due(when);
        if !due.is_empty() {
            let traces: Vec<ActionTrace> = self
                .pending
                .current()
                .unwrap()
                .trace
                .region_traces
                .last()
                .unwrap()
                .cycle_traces
                .last()
                .unwrap()
                .shard_traces
                .last()
                .unwrap()
                .transaction_traces
                .iter()
                .flat_map(|t| t.action_traces.iter())
                .cloned()
                .collect();
            let leaves: Vec<Hash> = traces.iter().map(invariants::action_trace_digest).collect();
            let (reads, writes) = invariants::derive_shard_locks(&traces);
            self.pending.set_shard_locks(reads, writes)?;
            self.pending.finalize_pending_shard(&leaves)?;
            self.pending.start_pending_cycle()?;
            self.pending.start_pending_shard()?;
            let cycle_index = (self.pending.current().unwrap().regions.last().unwrap().cycles.len() - 1) as u32;

            let traces = self.applicator.push_deferred_transactions(
                self.store.as_mut(),
                self.interpreter.as_ref(),
                self.authority.as_ref(),
                when,
                0,
                cycle_index,
                0,
            )?;
            for trace in &traces {
                self.metrics.record_transaction(trace.status);
            }
            self.applicator.apply_cycle_effects(self.store.as_mut(), &traces, when);
            if let Some(state) = self.pending.current_mut() {
                for trace in traces {
                    state.record_transaction(trace);
                }
            }
        }

        let final_traces: Vec<ActionTrace> = self
            .pending
            .current()
            .unwrap()
            .trace
            .region_traces
            .last()
            .unwrap()
            .cycle_traces
            .last()
            .unwrap()
            .shard_traces
            .last()
            .unwrap()
            .transaction_traces
            .iter()
            .flat_map(|t| t.action_traces.iter())
            .cloned()
            .collect();
        let shard_leaves: Vec<Hash> = final_traces.iter().map(invariants::action_trace_digest).collect();
        let (final_reads, final_writes) = invariants::derive_shard_locks(&final_traces);
        self.pending.set_shard_locks(final_reads, final_writes)?;
        self.pending.finalize_pending_shard(&shard_leaves)?;

        let pending_state = self.pending.finish_pending_block(self.store.as_mut())?;

        let shard_roots: Vec<Hash> = pending_state
            .trace
            .region_traces
            .iter()
            .flat_map(|r| r.cycle_traces.iter())
            .flat_map(|c| c.shard_traces.iter())
            .map(|s| s.shard_action_root)
            .collect();

        let block = SignedBlock {
            timestamp: when,
            producer: producer.producer.clone(),
            previous: pending_state.previous,
            transaction_mroot: invariants::transaction_merkle_root(&pending_state.input_transactions),
            action_mroot: invariants::merkle_root(&shard_roots),
            block_mroot: self.store.dynamic_global_properties().block_merkle_root.root(),
            new_producers: pending_state.new_producers.clone(),
            regions: pending_state.regions,
            input_transactions: pending_state.input_transactions,
            // The signing key never enters the controller (spec §1 treats
            // cryptographic primitives as an external collaborator); a
            // driver signs this block out of band before broadcasting it,
            // and pushes it back with `SKIP_PRODUCER_SIGNATURE` or
            // `CREATED_BLOCK` set if it re-enters through `push_block`.
            producer_signature: [0u8; 64],
        };

        self.block_session_open = false;
        self.finalize_globals(&block, &skip)?;
        self.signals.emit_applied_block(&pending_state.trace);

        Ok(block)
    }

    async fn pop_block(&mut self) -> Result<SignedBlock, ChainError> {
        self.discard_any_pending();
        let block = self.undo_applied_head()?;
        self.fork_db.remove(block.id());
        Ok(block)
    }

    fn is_known_block(&self, id: BlockId) -> bool {
        self.fork_db.contains(id) || self.block_log.read_block_by_id(id).is_some()
    }

    fn is_known_transaction(&self, id: Hash) -> bool {
        self.store.is_known_transaction(&id)
    }

    fn fetch_block_by_id(&self, id: BlockId) -> Option<SignedBlock> {
        self.fork_db.fetch(id).cloned().or_else(|| self.block_log.read_block_by_id(id))
    }

    fn fetch_block_by_number(&self, number: u32) -> Option<SignedBlock> {
        self.block_log
            .read_block_by_num(number)
            .or_else(|| self.fork_db.fetch_by_height(number).cloned())
    }

    /// Thin wrapper over `fetch_block_by_number` surfaced for callers
    /// that only need the id (`chain_controller.cpp::get_block_id_for_num`,
    /// SPEC_FULL.md §3).
    fn get_block_id_for_num(&self, number: u32) -> Option<BlockId> {
        self.fetch_block_by_number(number).map(|b| b.id())
    }

    fn head_block_id(&self) -> BlockId {
        self.store.dynamic_global_properties().head_block_id
    }

    fn last_irreversible_block_num(&self) -> u32 {
        self.store.dynamic_global_properties().last_irreversible_block_num
    }
}
