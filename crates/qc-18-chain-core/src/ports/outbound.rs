//! Outbound ports: everything the controller depends on but does not
//! own the implementation of. Grounded on the donor's own
//! `ports/outbound.rs` split (see e.g. `qc-09-state-sync::ports::outbound`),
//! but the concrete trait shapes below are this crate's own — no
//! literal dependency on the other numbered subsystem crates' port
//! definitions, which are shaped for an EVM/async-execution model (see
//! `DESIGN.md` for the scope rationale).

use crate::domain::entities::{
    Action, AccountName, AccountUsage, Authorization, BlockId, CanceledDeferred, DataAccess,
    DeferredTransaction, DynamicGlobalProperties, GeneratedTransactionRecord, GlobalProperties,
    ProducerStats, SignedBlock, Transaction, TransactionDedupRecord,
};
use crate::domain::errors::ChainError;
use shared_types::{Hash, PublicKey, Signature};

/// The copy-on-write, nestable-undo-session state store (spec §6
/// "State Store"). One instance per running controller; every mutating
/// operation on it happens underneath the controller's process-wide
/// write lock.
pub trait StateStore: Send + Sync {
    /// Current revision number; must equal head block height after any
    /// successful `apply_block` (Testable Property #1).
    fn revision(&self) -> u64;

    /// Push a new undo session onto the stack, returning its depth.
    fn push_undo_session(&mut self) -> usize;

    /// Merge the most recently pushed session into the one beneath it,
    /// keeping the older pre-image on any key collision.
    fn squash(&mut self);

    /// Roll back and discard the most recently pushed session.
    fn undo(&mut self);

    /// Irrevocably apply every session up to and including `revision`,
    /// called once the last irreversible block advances past it.
    fn commit(&mut self, revision: u64);

    fn global_properties(&self) -> &GlobalProperties;
    fn set_global_properties(&mut self, props: GlobalProperties);

    fn dynamic_global_properties(&self) -> &DynamicGlobalProperties;
    fn set_dynamic_global_properties(&mut self, props: DynamicGlobalProperties);

    fn block_summary_id(&self, height: u32) -> BlockId;
    fn set_block_summary_id(&mut self, height: u32, id: BlockId);

    fn is_known_transaction(&self, id: &Hash) -> bool;
    fn insert_dedup_record(&mut self, record: TransactionDedupRecord);
    /// Drop dedup records whose expiration precedes `head_time`. Spec §9
    /// Open Question (a): the reference implementation left this path
    /// dead; this adapter keeps it live, pruning once a record's
    /// expiration is behind head time rather than retaining forever.
    fn expire_dedup_records(&mut self, head_time: u64) -> Vec<TransactionDedupRecord>;

    fn insert_generated_transaction(&mut self, record: GeneratedTransactionRecord);
    fn remove_generated_transaction(&mut self, id: &Hash) -> Option<GeneratedTransactionRecord>;
    fn find_generated_transaction(
        &self,
        sender: &AccountName,
        sender_id: u128,
    ) -> Option<GeneratedTransactionRecord>;
    /// Generated transactions matured (`delay_until <= head_time`) but
    /// not yet executed, in `delay_until` order.
    fn generated_transactions_due(&self, head_time: u64) -> Vec<GeneratedTransactionRecord>;
    fn expire_generated_transactions(&mut self, head_time: u64) -> Vec<GeneratedTransactionRecord>;

    /// Bandwidth/compute usage accumulated so far (spec §4.4 step 5,
    /// `chain_controller.cpp::update_usage`); zero-valued for an account
    /// never charged.
    fn account_usage(&self, account: &AccountName) -> AccountUsage;
    /// Charge `net_bytes`/`cpu_usage` against `account`, called once per
    /// authorizing account of a successfully applied transaction.
    fn charge_usage(&mut self, account: &AccountName, net_bytes: u64, cpu_usage: u64, head_time: u64);

    /// A producer's bookkeeping (spec §4.5.2 step 8); default-valued for
    /// a producer that has never signed a block.
    fn producer_stats(&self, producer: &AccountName) -> ProducerStats;
    /// Record that `producer` signed the block at `block_num`/`absolute_slot`.
    fn update_producer_stats(&mut self, producer: &AccountName, block_num: u32, absolute_slot: u64);
    /// Record one missed slot against `producer`
    /// (`chain_controller.cpp::update_global_properties` missed-block loop).
    fn record_missed_slot(&mut self, producer: &AccountName);
}

/// The append-only, already-irreversible block log (spec §6 "Block Log").
pub trait BlockLogPort: Send + Sync {
    fn append(&mut self, block: SignedBlock);
    fn read_head(&self) -> Option<SignedBlock>;
    fn read_block_by_num(&self, num: u32) -> Option<SignedBlock>;
    fn read_block_by_id(&self, id: BlockId) -> Option<SignedBlock>;
}

/// One action's worth of interpreter input.
pub struct ActionContext<'a> {
    pub action: &'a Action,
    pub transaction_id: Hash,
    pub region_id: u16,
    pub cycle_index: u32,
    pub shard_index: u32,
    pub head_block_time: u64,
}

/// What the interpreter observed and produced while applying one action.
#[derive(Debug, Clone, Default)]
pub struct ActionOutcome {
    pub console: String,
    pub data_access: Vec<DataAccess>,
    pub generated_transactions: Vec<DeferredTransaction>,
    pub canceled_deferred: Vec<CanceledDeferred>,
}

/// Contract execution (spec §6 "Interpreter") — explicitly out of
/// scope for this crate's own semantics; the controller only needs the
/// (action, context) -> outcome shape to drive the rest of block
/// processing.
pub trait InterpreterPort: Send + Sync {
    fn apply_action(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome, ChainError>;
}

/// Permission/signature satisfaction (spec §6 "Authority checker").
/// Returns the subset of `provided_keys` actually used to satisfy every
/// authorization, so the caller can flag irrelevant signatures.
pub trait AuthorityCheckerPort: Send + Sync {
    fn satisfy(
        &self,
        authorizations: &[Authorization],
        provided_keys: &[PublicKey],
        max_depth: u16,
    ) -> Result<Vec<PublicKey>, ChainError>;

    /// Spec §6 "get_required_keys": the subset of `candidate_keys` needed
    /// to satisfy every one of `authorizations`. Built on [`Self::satisfy`].
    fn get_required_keys(
        &self,
        authorizations: &[Authorization],
        candidate_keys: &[PublicKey],
        max_depth: u16,
    ) -> Result<Vec<PublicKey>, ChainError> {
        self.satisfy(authorizations, candidate_keys, max_depth)
    }

    /// Spec §6 "check_authorization": succeeds iff `provided_keys`
    /// satisfies every one of `authorizations`.
    fn check_authorization(
        &self,
        authorizations: &[Authorization],
        provided_keys: &[PublicKey],
        max_depth: u16,
    ) -> Result<(), ChainError> {
        self.satisfy(authorizations, provided_keys, max_depth).map(|_| ())
    }

    /// Spec §6 "check_transaction_authorization": every action in
    /// `transaction` must be satisfied by `provided_keys`.
    fn check_transaction_authorization(
        &self,
        transaction: &Transaction,
        provided_keys: &[PublicKey],
        max_depth: u16,
    ) -> Result<(), ChainError> {
        for action in &transaction.actions {
            self.check_authorization(&action.authorization, provided_keys, max_depth)?;
        }
        Ok(())
    }

    /// Recover which of this checker's registered keys actually produced
    /// one of `signatures` over `digest` — the real substitute for
    /// "recover a public key from a signature", since Ed25519 (the
    /// algorithm `PublicKey`/`Signature` are sized for) has no such
    /// recovery operation; verification only confirms a *candidate* key
    /// against a signature. When `trust_signatures` is set
    /// (`SkipFlags::SKIP_TRANSACTION_SIGNATURES`), every key this checker
    /// knows about is returned without doing the cryptographic check, for
    /// replay paths that have already verified signatures once. The
    /// default assumes no registry to trial-verify against and returns
    /// nothing, meaning callers of a checker that doesn't override this
    /// must supply `provided_keys` out of band.
    fn recover_provided_keys(&self, _digest: &Hash, _signatures: &[Signature], _trust_signatures: bool) -> Vec<PublicKey> {
        Vec::new()
    }
}
