//! Inbound port: the surface node-runtime (or any driver) calls into.

use crate::domain::entities::{BlockId, ProducerKey, SignedBlock, Transaction, TransactionTrace};
use crate::domain::errors::ChainError;

/// Validation steps a caller may opt out of (spec §6 "Skip-flag
/// surface"). Checkpoints past the latest known height imply every
/// flag is set, since the caller has already vouched for the block.
/// A plain bitmask newtype rather than a macro-generated one — no
/// other crate in this workspace pulls in `bitflags` for what is, here,
/// a fixed 13-bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkipFlags(pub u32);

impl SkipFlags {
    pub const SKIP_PRODUCER_SIGNATURE: u32 = 1 << 0;
    pub const SKIP_TRANSACTION_SIGNATURES: u32 = 1 << 1;
    pub const SKIP_TRANSACTION_DUPE_CHECK: u32 = 1 << 2;
    pub const SKIP_TAPOS_CHECK: u32 = 1 << 3;
    pub const SKIP_MERKLE_CHECK: u32 = 1 << 4;
    pub const SKIP_PRODUCER_SCHEDULE_CHECK: u32 = 1 << 5;
    pub const SKIP_AUTHORITY_CHECK: u32 = 1 << 6;
    pub const SKIP_FORK_DB: u32 = 1 << 7;
    pub const SKIP_MISSED_BLOCK_PENALTY: u32 = 1 << 8;
    pub const SKIP_BLOCK_SIZE_CHECK: u32 = 1 << 9;
    pub const RECEIVED_BLOCK: u32 = 1 << 10;
    pub const CREATED_BLOCK: u32 = 1 << 11;
    pub const GENESIS_SETUP: u32 = 1 << 12;

    pub fn empty() -> Self {
        SkipFlags(0)
    }

    pub fn all() -> Self {
        SkipFlags(0x1FFF)
    }

    pub fn has(&self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    pub fn with(mut self, flag: u32) -> Self {
        self.0 |= flag;
        self
    }
}

/// The chain controller's public surface: block lifecycle, transaction
/// submission, and chain introspection (spec §1, §6).
#[async_trait::async_trait]
pub trait ChainControllerApi: Send + Sync {
    async fn push_block(&mut self, block: SignedBlock, skip: SkipFlags) -> Result<(), ChainError>;

    async fn push_transaction(
        &mut self,
        transaction: Transaction,
        skip: SkipFlags,
    ) -> Result<TransactionTrace, ChainError>;

    async fn generate_block(
        &mut self,
        when: u64,
        producer: ProducerKey,
        skip: SkipFlags,
    ) -> Result<SignedBlock, ChainError>;

    async fn pop_block(&mut self) -> Result<SignedBlock, ChainError>;

    fn is_known_block(&self, id: BlockId) -> bool;
    fn is_known_transaction(&self, id: shared_types::Hash) -> bool;
    fn fetch_block_by_id(&self, id: BlockId) -> Option<SignedBlock>;
    fn fetch_block_by_number(&self, number: u32) -> Option<SignedBlock>;
    fn get_block_id_for_num(&self, number: u32) -> Option<BlockId>;
    fn head_block_id(&self) -> BlockId;
    fn last_irreversible_block_num(&self) -> u32;
}
