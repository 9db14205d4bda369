//! Subsystem-internal counters/gauges, the same plain-atomics shape
//! `qc-09-finality::metrics` and `qc-08-consensus::metrics` use for
//! their own counters — no Prometheus client pulled in, since nothing
//! in this workspace exports these externally (the donor's
//! `qc-16-api-gateway` would have, but that crate is out of scope).

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ChainMetrics {
    pub blocks_applied_total: AtomicU64,
    pub fork_switches_total: AtomicU64,
    pub transactions_executed_total: AtomicU64,
    pub transactions_soft_fail_total: AtomicU64,
    pub transactions_hard_fail_total: AtomicU64,
    pub last_irreversible_block_num: AtomicU32,
    pub pending_generated_transactions: AtomicU64,
}

impl ChainMetrics {
    pub fn record_block_applied(&self) {
        self.blocks_applied_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fork_switch(&self) {
        self.fork_switches_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transaction(&self, status: crate::domain::entities::TransactionStatus) {
        use crate::domain::entities::TransactionStatus::*;
        let counter = match status {
            Executed => &self.transactions_executed_total,
            SoftFail => &self.transactions_soft_fail_total,
            HardFail => &self.transactions_hard_fail_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_last_irreversible(&self, height: u32) {
        self.last_irreversible_block_num.store(height, Ordering::Relaxed);
    }

    pub fn set_pending_generated(&self, count: u64) {
        self.pending_generated_transactions.store(count, Ordering::Relaxed);
    }
}
