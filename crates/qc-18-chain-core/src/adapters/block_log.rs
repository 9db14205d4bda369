//! # In-Memory Block Log
//!
//! Reference implementation of [`crate::ports::outbound::BlockLogPort`]:
//! an append-only vector of irreversible blocks, indexed by height and by
//! id. Real deployments would back this with a file-backed log the way
//! the donor's `qc-02-block-storage` does; that crate's append/seek
//! split is out of scope here (see `DESIGN.md`), so this adapter keeps
//! everything resident.

use crate::domain::entities::{BlockId, SignedBlock};
use crate::ports::outbound::BlockLogPort;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct InMemoryBlockLog {
    by_num: Vec<SignedBlock>,
    by_id: HashMap<BlockId, u32>,
}

impl BlockLogPort for InMemoryBlockLog {
    fn append(&mut self, block: SignedBlock) {
        let id = block.id();
        let num = block.block_num();
        debug_assert_eq!(num as usize, self.by_num.len() + 1, "block log must be gap-free");
        self.by_id.insert(id, num);
        self.by_num.push(block);
    }

    fn read_head(&self) -> Option<SignedBlock> {
        self.by_num.last().cloned()
    }

    fn read_block_by_num(&self, num: u32) -> Option<SignedBlock> {
        if num == 0 {
            return None;
        }
        self.by_num.get(num as usize - 1).cloned()
    }

    fn read_block_by_id(&self, id: BlockId) -> Option<SignedBlock> {
        let num = *self.by_id.get(&id)?;
        self.read_block_by_num(num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block(previous: BlockId) -> SignedBlock {
        SignedBlock {
            timestamp: 1,
            producer: "alice".into(),
            previous,
            transaction_mroot: [0; 32],
            action_mroot: [0; 32],
            block_mroot: [0; 32],
            new_producers: None,
            regions: vec![],
            input_transactions: vec![],
            producer_signature: [0; 64],
        }
    }

    #[test]
    fn append_then_read_by_num_and_id() {
        let mut log = InMemoryBlockLog::default();
        let block = sample_block(BlockId::ZERO);
        let id = block.id();
        log.append(block.clone());
        assert_eq!(log.read_block_by_num(1).unwrap().id(), id);
        assert_eq!(log.read_block_by_id(id).unwrap().id(), id);
        assert_eq!(log.read_head().unwrap().id(), id);
    }

    #[test]
    fn unknown_lookups_return_none() {
        let log = InMemoryBlockLog::default();
        assert!(log.read_block_by_num(1).is_none());
        assert!(log.read_block_by_id(BlockId::ZERO).is_none());
        assert!(log.read_head().is_none());
    }
}
