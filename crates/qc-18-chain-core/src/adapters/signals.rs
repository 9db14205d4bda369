//! # Signal Bus
//!
//! The three outbound signals (spec §6 "Signals"): `applied_block`,
//! `applied_irreversible_block`, `on_pending_transaction`. Per the
//! Design Notes, these are a registered list of callbacks invoked
//! synchronously under the controller's write lock — not the donor
//! `shared-bus`'s async `tokio::broadcast` pub/sub, which assumes
//! subscribers run on a separate task and can afford to miss a burst of
//! events. A subscriber that calls back into the controller from inside
//! one of these closures will deadlock; that's a caller bug, not
//! something this bus defends against.

use crate::domain::entities::{BlockTrace, SignedBlock};

type BlockCallback = Box<dyn Fn(&BlockTrace) + Send + Sync>;
type IrreversibleCallback = Box<dyn Fn(&SignedBlock) + Send + Sync>;
type PendingTxCallback = Box<dyn Fn(&[u8]) + Send + Sync>;

#[derive(Default)]
pub struct SignalBus {
    applied_block: Vec<BlockCallback>,
    applied_irreversible_block: Vec<IrreversibleCallback>,
    on_pending_transaction: Vec<PendingTxCallback>,
}

impl std::fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBus")
            .field("applied_block_subscribers", &self.applied_block.len())
            .field(
                "applied_irreversible_block_subscribers",
                &self.applied_irreversible_block.len(),
            )
            .field(
                "on_pending_transaction_subscribers",
                &self.on_pending_transaction.len(),
            )
            .finish()
    }
}

impl SignalBus {
    pub fn on_applied_block(&mut self, callback: impl Fn(&BlockTrace) + Send + Sync + 'static) {
        self.applied_block.push(Box::new(callback));
    }

    pub fn on_applied_irreversible_block(
        &mut self,
        callback: impl Fn(&SignedBlock) + Send + Sync + 'static,
    ) {
        self.applied_irreversible_block.push(Box::new(callback));
    }

    pub fn on_pending_transaction(&mut self, callback: impl Fn(&[u8]) + Send + Sync + 'static) {
        self.on_pending_transaction.push(Box::new(callback));
    }

    pub fn emit_applied_block(&self, trace: &BlockTrace) {
        for cb in &self.applied_block {
            cb(trace);
        }
    }

    pub fn emit_applied_irreversible_block(&self, block: &SignedBlock) {
        for cb in &self.applied_irreversible_block {
            cb(block);
        }
    }

    pub fn emit_pending_transaction(&self, packed_trx: &[u8]) {
        for cb in &self.on_pending_transaction {
            cb(packed_trx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn applied_block_fires_every_subscriber() {
        let mut bus = SignalBus::default();
        let count = Arc::new(AtomicUsize::new(0));
        let c1 = count.clone();
        bus.on_applied_block(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = count.clone();
        bus.on_applied_block(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });
        bus.emit_applied_block(&BlockTrace::default());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn no_subscribers_is_a_no_op() {
        let bus = SignalBus::default();
        bus.emit_applied_block(&BlockTrace::default());
        bus.emit_pending_transaction(&[1, 2, 3]);
    }
}
