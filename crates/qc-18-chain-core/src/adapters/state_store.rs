//! # In-Memory State Store
//!
//! Reference implementation of [`crate::ports::outbound::StateStore`]: a
//! stack of write-sets over a handful of typed tables (spec §3's
//! persistent singletons, the block summary ring, the dedup index, and
//! the generated-transaction index), following the Design Notes' "model
//! as a stack of write-sets where each level records (key -> pre-image)"
//! guidance literally rather than depending on a real nestable-undo
//! database engine.
//!
//! Only two session depths are ever actually open at once in practice —
//! one per pending block, one per in-flight transaction — but the
//! implementation imposes no such limit; it is a plain stack.

use crate::domain::entities::{
    AccountName, AccountUsage, BlockId, BlockSummaryRing, DynamicGlobalProperties,
    GeneratedTransactionRecord, GlobalProperties, ProducerStats, TransactionDedupRecord,
};
use crate::ports::outbound::StateStore;
use shared_types::Hash;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    GlobalProperties,
    DynamicGlobalProperties,
    BlockSummary(u32),
    Dedup(Hash),
    Generated(Hash),
    Usage(AccountName),
    ProducerStats(AccountName),
}

#[derive(Debug, Clone)]
enum Preimage {
    GlobalProperties(GlobalProperties),
    DynamicGlobalProperties(DynamicGlobalProperties),
    BlockSummary(BlockId),
    Dedup(Option<TransactionDedupRecord>),
    Generated(Option<GeneratedTransactionRecord>),
    Usage(AccountUsage),
    ProducerStats(ProducerStats),
}

#[derive(Debug)]
pub struct InMemoryStateStore {
    /// Revision of the oldest frame still on `frames`; everything at or
    /// below this height has been committed and is no longer revertible.
    committed_base: u64,
    frames: Vec<HashMap<Key, Preimage>>,
    global_properties: GlobalProperties,
    dynamic_global_properties: DynamicGlobalProperties,
    block_summary: BlockSummaryRing,
    dedup: HashMap<Hash, TransactionDedupRecord>,
    generated: HashMap<Hash, GeneratedTransactionRecord>,
    usage: HashMap<AccountName, AccountUsage>,
    producer_stats: HashMap<AccountName, ProducerStats>,
}

impl InMemoryStateStore {
    /// A fresh store at genesis: height 0, empty schedule, no history.
    pub fn genesis() -> Self {
        Self {
            committed_base: 0,
            frames: Vec::new(),
            global_properties: GlobalProperties {
                configuration: crate::domain::entities::ChainConfig::default(),
                active_producers: Default::default(),
                pending_schedule_updates: Vec::new(),
            },
            dynamic_global_properties: DynamicGlobalProperties {
                head_block_number: 0,
                head_block_id: BlockId::ZERO,
                head_block_time: 0,
                current_producer: AccountName::from("genesis"),
                current_absolute_slot: 0,
                last_irreversible_block_num: 0,
                recent_slots_filled: 0,
                average_block_size: 0,
                block_merkle_root: Default::default(),
            },
            block_summary: BlockSummaryRing::default(),
            dedup: HashMap::new(),
            generated: HashMap::new(),
            usage: HashMap::new(),
            producer_stats: HashMap::new(),
        }
    }

    fn record(&mut self, key: Key, preimage: Preimage) {
        if let Some(frame) = self.frames.last_mut() {
            frame.entry(key).or_insert(preimage);
        }
    }

    fn apply_preimage(&mut self, key: Key, preimage: Preimage) {
        match (key, preimage) {
            (Key::GlobalProperties, Preimage::GlobalProperties(v)) => self.global_properties = v,
            (Key::DynamicGlobalProperties, Preimage::DynamicGlobalProperties(v)) => {
                self.dynamic_global_properties = v
            }
            (Key::BlockSummary(h), Preimage::BlockSummary(id)) => self.block_summary.set(h, id),
            (Key::Dedup(id), Preimage::Dedup(Some(record))) => {
                self.dedup.insert(id, record);
            }
            (Key::Dedup(id), Preimage::Dedup(None)) => {
                self.dedup.remove(&id);
            }
            (Key::Generated(id), Preimage::Generated(Some(record))) => {
                self.generated.insert(id, record);
            }
            (Key::Generated(id), Preimage::Generated(None)) => {
                self.generated.remove(&id);
            }
            (Key::Usage(account), Preimage::Usage(usage)) => {
                self.usage.insert(account, usage);
            }
            (Key::ProducerStats(producer), Preimage::ProducerStats(stats)) => {
                self.producer_stats.insert(producer, stats);
            }
            _ => unreachable!("key/preimage kind mismatch"),
        }
    }
}

impl StateStore for InMemoryStateStore {
    fn revision(&self) -> u64 {
        self.committed_base + self.frames.len() as u64
    }

    fn push_undo_session(&mut self) -> usize {
        self.frames.push(HashMap::new());
        self.revision() as usize
    }

    fn squash(&mut self) {
        let child = self.frames.pop().expect("squash called with no open session");
        if let Some(parent) = self.frames.last_mut() {
            for (k, v) in child {
                parent.entry(k).or_insert(v);
            }
        }
    }

    fn undo(&mut self) {
        let frame = self.frames.pop().expect("undo called with no open session");
        for (key, preimage) in frame {
            self.apply_preimage(key, preimage);
        }
    }

    fn commit(&mut self, revision: u64) {
        let target = revision.max(self.committed_base);
        let drop_count = (target - self.committed_base) as usize;
        let drop_count = drop_count.min(self.frames.len());
        self.frames.drain(0..drop_count);
        self.committed_base += drop_count as u64;
    }

    fn global_properties(&self) -> &GlobalProperties {
        &self.global_properties
    }

    fn set_global_properties(&mut self, props: GlobalProperties) {
        self.record(
            Key::GlobalProperties,
            Preimage::GlobalProperties(self.global_properties.clone()),
        );
        self.global_properties = props;
    }

    fn dynamic_global_properties(&self) -> &DynamicGlobalProperties {
        &self.dynamic_global_properties
    }

    fn set_dynamic_global_properties(&mut self, props: DynamicGlobalProperties) {
        self.record(
            Key::DynamicGlobalProperties,
            Preimage::DynamicGlobalProperties(self.dynamic_global_properties.clone()),
        );
        self.dynamic_global_properties = props;
    }

    fn block_summary_id(&self, height: u32) -> BlockId {
        self.block_summary.get(height)
    }

    fn set_block_summary_id(&mut self, height: u32, id: BlockId) {
        self.record(
            Key::BlockSummary(height),
            Preimage::BlockSummary(self.block_summary.get(height)),
        );
        self.block_summary.set(height, id);
    }

    fn is_known_transaction(&self, id: &Hash) -> bool {
        self.dedup.contains_key(id)
    }

    fn insert_dedup_record(&mut self, record: TransactionDedupRecord) {
        self.record(Key::Dedup(record.id), Preimage::Dedup(self.dedup.get(&record.id).cloned()));
        self.dedup.insert(record.id, record);
    }

    fn expire_dedup_records(&mut self, head_time: u64) -> Vec<TransactionDedupRecord> {
        let expired: Vec<Hash> = self
            .dedup
            .values()
            .filter(|r| r.expiration < head_time)
            .map(|r| r.id)
            .collect();
        let mut out = Vec::with_capacity(expired.len());
        for id in expired {
            self.record(Key::Dedup(id), Preimage::Dedup(self.dedup.get(&id).cloned()));
            if let Some(record) = self.dedup.remove(&id) {
                out.push(record);
            }
        }
        out
    }

    fn insert_generated_transaction(&mut self, record: GeneratedTransactionRecord) {
        self.record(
            Key::Generated(record.id),
            Preimage::Generated(self.generated.get(&record.id).cloned()),
        );
        self.generated.insert(record.id, record);
    }

    fn remove_generated_transaction(&mut self, id: &Hash) -> Option<GeneratedTransactionRecord> {
        self.record(Key::Generated(*id), Preimage::Generated(self.generated.get(id).cloned()));
        self.generated.remove(id)
    }

    fn find_generated_transaction(
        &self,
        sender: &AccountName,
        sender_id: u128,
    ) -> Option<GeneratedTransactionRecord> {
        self.generated
            .values()
            .find(|r| &r.sender == sender && r.sender_id == sender_id)
            .cloned()
    }

    fn generated_transactions_due(&self, head_time: u64) -> Vec<GeneratedTransactionRecord> {
        let mut due: Vec<GeneratedTransactionRecord> = self
            .generated
            .values()
            .filter(|r| r.delay_until <= head_time)
            .cloned()
            .collect();
        due.sort_by(|a, b| b.delay_until.cmp(&a.delay_until).then(b.id.cmp(&a.id)));
        due
    }

    fn expire_generated_transactions(&mut self, head_time: u64) -> Vec<GeneratedTransactionRecord> {
        let expired: Vec<Hash> = self
            .generated
            .values()
            .filter(|r| r.expiration < head_time)
            .map(|r| r.id)
            .collect();
        let mut out = Vec::with_capacity(expired.len());
        for id in expired {
            self.record(Key::Generated(id), Preimage::Generated(self.generated.get(&id).cloned()));
            if let Some(record) = self.generated.remove(&id) {
                out.push(record);
            }
        }
        out
    }

    fn account_usage(&self, account: &AccountName) -> AccountUsage {
        self.usage.get(account).copied().unwrap_or_default()
    }

    fn charge_usage(&mut self, account: &AccountName, net_bytes: u64, cpu_usage: u64, head_time: u64) {
        self.record(
            Key::Usage(account.clone()),
            Preimage::Usage(self.usage.get(account).copied().unwrap_or_default()),
        );
        let entry = self.usage.entry(account.clone()).or_default();
        entry.charge(net_bytes, cpu_usage, head_time);
    }

    fn producer_stats(&self, producer: &AccountName) -> ProducerStats {
        self.producer_stats.get(producer).copied().unwrap_or_default()
    }

    fn update_producer_stats(&mut self, producer: &AccountName, block_num: u32, absolute_slot: u64) {
        self.record(
            Key::ProducerStats(producer.clone()),
            Preimage::ProducerStats(self.producer_stats.get(producer).copied().unwrap_or_default()),
        );
        let entry = self.producer_stats.entry(producer.clone()).or_default();
        entry.last_confirmed_block_num = block_num;
        entry.last_aslot = absolute_slot;
    }

    fn record_missed_slot(&mut self, producer: &AccountName) {
        self.record(
            Key::ProducerStats(producer.clone()),
            Preimage::ProducerStats(self.producer_stats.get(producer).copied().unwrap_or_default()),
        );
        let entry = self.producer_stats.entry(producer.clone()).or_default();
        entry.total_missed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_tracks_open_frames() {
        let mut store = InMemoryStateStore::genesis();
        assert_eq!(store.revision(), 0);
        store.push_undo_session();
        assert_eq!(store.revision(), 1);
        store.push_undo_session();
        assert_eq!(store.revision(), 2);
        store.squash();
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn undo_restores_prior_value() {
        let mut store = InMemoryStateStore::genesis();
        let before = store.dynamic_global_properties().clone();
        store.push_undo_session();
        let mut after = before.clone();
        after.head_block_number = 5;
        store.set_dynamic_global_properties(after);
        assert_eq!(store.dynamic_global_properties().head_block_number, 5);
        store.undo();
        assert_eq!(store.dynamic_global_properties().head_block_number, before.head_block_number);
    }

    #[test]
    fn squash_keeps_oldest_preimage_on_collision() {
        let mut store = InMemoryStateStore::genesis();
        let original = store.dynamic_global_properties().head_block_number;
        store.push_undo_session(); // outer (block-level)
        store.push_undo_session(); // inner (transaction-level)
        let mut v1 = store.dynamic_global_properties().clone();
        v1.head_block_number = 1;
        store.set_dynamic_global_properties(v1.clone());
        let mut v2 = v1.clone();
        v2.head_block_number = 2;
        store.set_dynamic_global_properties(v2);
        store.squash(); // merge inner into outer
        store.undo(); // undo outer: should restore all the way back to original
        assert_eq!(store.dynamic_global_properties().head_block_number, original);
    }

    #[test]
    fn dedup_insert_then_expire() {
        let mut store = InMemoryStateStore::genesis();
        store.insert_dedup_record(TransactionDedupRecord { id: [1; 32], expiration: 100 });
        assert!(store.is_known_transaction(&[1; 32]));
        let expired = store.expire_dedup_records(200);
        assert_eq!(expired.len(), 1);
        assert!(!store.is_known_transaction(&[1; 32]));
    }

    #[test]
    fn commit_discards_old_frames_without_changing_live_state() {
        let mut store = InMemoryStateStore::genesis();
        store.push_undo_session();
        let mut props = store.dynamic_global_properties().clone();
        props.head_block_number = 1;
        store.set_dynamic_global_properties(props);
        assert_eq!(store.revision(), 1);
        store.commit(1);
        assert_eq!(store.revision(), 1);
        assert_eq!(store.dynamic_global_properties().head_block_number, 1);
    }

    #[test]
    fn generated_due_ordered_by_delay_descending() {
        let mut store = InMemoryStateStore::genesis();
        store.insert_generated_transaction(GeneratedTransactionRecord {
            id: [1; 32],
            sender: "alice".into(),
            sender_id: 1,
            expiration: 1000,
            delay_until: 10,
            published: 0,
            packed_trx: vec![],
        });
        store.insert_generated_transaction(GeneratedTransactionRecord {
            id: [2; 32],
            sender: "alice".into(),
            sender_id: 2,
            expiration: 1000,
            delay_until: 20,
            published: 0,
            packed_trx: vec![],
        });
        let due = store.generated_transactions_due(50);
        assert_eq!(due[0].id, [2; 32]);
        assert_eq!(due[1].id, [1; 32]);
    }

    #[test]
    fn usage_accumulates_and_undoes() {
        let mut store = InMemoryStateStore::genesis();
        let alice: AccountName = "alice".into();
        store.push_undo_session();
        store.charge_usage(&alice, 100, 1, 10);
        store.charge_usage(&alice, 50, 1, 20);
        let usage = store.account_usage(&alice);
        assert_eq!(usage.net_usage, 150);
        assert_eq!(usage.cpu_usage, 2);
        assert_eq!(usage.last_usage_update, 20);
        store.undo();
        assert_eq!(store.account_usage(&alice), AccountUsage::default());
    }

    #[test]
    fn producer_stats_track_confirmations_and_missed_slots() {
        let mut store = InMemoryStateStore::genesis();
        let alice: AccountName = "alice".into();
        store.update_producer_stats(&alice, 5, 10);
        store.record_missed_slot(&alice);
        store.record_missed_slot(&alice);
        let stats = store.producer_stats(&alice);
        assert_eq!(stats.last_confirmed_block_num, 5);
        assert_eq!(stats.last_aslot, 10);
        assert_eq!(stats.total_missed, 2);
    }
}
