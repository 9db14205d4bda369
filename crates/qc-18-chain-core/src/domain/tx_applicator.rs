//! # Transaction Applicator
//!
//! Executes one transaction's actions through the external interpreter,
//! producing a [`TransactionTrace`] (spec §4.4). Implements the happy
//! path, the `onerror` fallback for deferred transactions, the
//! generated/canceled-deferred bookkeeping the Pending Builder applies
//! at the end of each cycle, and deferred-transaction dispatch.

use crate::domain::entities::{
    Action, ActionTrace, AccountName, Authorization, GeneratedTransactionRecord, Transaction,
    TransactionDedupRecord, TransactionStatus, TransactionTrace,
};
use crate::domain::errors::ChainError;
use crate::ports::outbound::{ActionContext, AuthorityCheckerPort, InterpreterPort, StateStore};
use shared_types::{Hash, PublicKey};

/// Everything about one transaction the applicator needs but that isn't
/// carried on [`Transaction`] itself: its identity, its position within
/// the block under construction, and — if it is itself a deferred
/// transaction being dispatched — the sender an onerror fallback would
/// charge.
pub struct ApplyContext<'a> {
    pub transaction: &'a Transaction,
    pub id: Hash,
    pub region_id: u16,
    pub cycle_index: u32,
    pub shard_index: u32,
    pub head_block_time: u64,
    pub deferred_sender: Option<(AccountName, u128)>,
    pub provided_keys: &'a [PublicKey],
    pub max_authority_depth: u16,
    pub skip_authority_check: bool,
}

#[derive(Debug, Default)]
pub struct TxApplicator;

impl TxApplicator {
    /// Happy-path application of one transaction (spec §4.4 steps 1-7),
    /// falling back to `onerror` when the interpreter faults and the
    /// transaction carries a `deferred_sender`.
    pub fn apply_transaction(
        &self,
        store: &mut dyn StateStore,
        interpreter: &dyn InterpreterPort,
        authority: &dyn AuthorityCheckerPort,
        ctx: &ApplyContext<'_>,
    ) -> Result<TransactionTrace, ChainError> {
        store.push_undo_session();
        match self.run_actions(interpreter, authority, ctx, &ctx.transaction.actions) {
            Ok(trace) => {
                store.insert_dedup_record(TransactionDedupRecord {
                    id: ctx.id,
                    expiration: ctx.transaction.expiration,
                });
                self.charge_usage(store, ctx);
                store.squash();
                Ok(trace)
            }
            Err(err) => {
                store.undo();
                match &ctx.deferred_sender {
                    Some((sender, sender_id)) => {
                        self.apply_onerror(store, interpreter, ctx, sender, *sender_id, &err)
                    }
                    None => Err(err),
                }
            }
        }
    }

    /// Charge bandwidth/compute usage to every account that authorized an
    /// action in the transaction (spec §4.4 step 5,
    /// `chain_controller.cpp::update_usage`). Called once a transaction
    /// has successfully committed.
    fn charge_usage(&self, store: &mut dyn StateStore, ctx: &ApplyContext<'_>) {
        let trx_size = bincode::serialize(ctx.transaction).map(|v| v.len() as u64).unwrap_or(0);
        let act_usage = ctx.transaction.actions.len() as u64;
        for account in Self::authorizing_accounts(&ctx.transaction.actions) {
            store.charge_usage(&account, trx_size, act_usage, ctx.head_block_time);
        }
    }

    /// Every distinct authorizing actor across `actions`, in first-seen order.
    fn authorizing_accounts(actions: &[Action]) -> Vec<AccountName> {
        let mut out: Vec<AccountName> = Vec::new();
        for action in actions {
            for auth in &action.authorization {
                if !out.contains(&auth.actor) {
                    out.push(auth.actor.clone());
                }
            }
        }
        out
    }

    /// Run every action through the interpreter, aggregating their
    /// traces. Stops and propagates on the first failing action.
    fn run_actions(
        &self,
        interpreter: &dyn InterpreterPort,
        authority: &dyn AuthorityCheckerPort,
        ctx: &ApplyContext<'_>,
        actions: &[Action],
    ) -> Result<TransactionTrace, ChainError> {
        let mut action_traces = Vec::with_capacity(actions.len());
        let mut generated_transactions = Vec::new();
        let mut canceled_deferred = Vec::new();

        for action in actions {
            if !ctx.skip_authority_check {
                authority.satisfy(&action.authorization, ctx.provided_keys, ctx.max_authority_depth)?;
            }
            let outcome = interpreter.apply_action(ActionContext {
                action,
                transaction_id: ctx.id,
                region_id: ctx.region_id,
                cycle_index: ctx.cycle_index,
                shard_index: ctx.shard_index,
                head_block_time: ctx.head_block_time,
            })?;
            action_traces.push(ActionTrace {
                receiver: action.account.clone(),
                act: action.clone(),
                console: outcome.console,
                data_access: outcome.data_access,
                region_id: ctx.region_id,
                cycle_index: ctx.cycle_index,
                shard_index: ctx.shard_index,
            });
            generated_transactions.extend(outcome.generated_transactions);
            canceled_deferred.extend(outcome.canceled_deferred);
        }

        Ok(TransactionTrace {
            id: ctx.id,
            status: TransactionStatus::Executed,
            action_traces,
            generated_transactions,
            canceled_deferred,
        })
    }

    /// The `onerror` fallback (spec §4.4 Error path): a synthetic
    /// `onerror` action authorized by `(sender, active)`, carrying the
    /// original failure as its raw payload.
    fn apply_onerror(
        &self,
        store: &mut dyn StateStore,
        interpreter: &dyn InterpreterPort,
        ctx: &ApplyContext<'_>,
        sender: &AccountName,
        _sender_id: u128,
        original_error: &ChainError,
    ) -> Result<TransactionTrace, ChainError> {
        store.push_undo_session();
        let onerror_action = Action {
            account: sender.clone(),
            name: "onerror".to_string(),
            authorization: vec![Authorization {
                actor: sender.clone(),
                permission: "active".to_string(),
            }],
            payload: original_error.to_string().into_bytes(),
        };
        let outcome = interpreter.apply_action(ActionContext {
            action: &onerror_action,
            transaction_id: ctx.id,
            region_id: ctx.region_id,
            cycle_index: ctx.cycle_index,
            shard_index: ctx.shard_index,
            head_block_time: ctx.head_block_time,
        });
        match outcome {
            Ok(outcome) => {
                let trace = TransactionTrace {
                    id: ctx.id,
                    status: TransactionStatus::SoftFail,
                    action_traces: vec![ActionTrace {
                        receiver: sender.clone(),
                        act: onerror_action,
                        console: outcome.console,
                        data_access: outcome.data_access,
                        region_id: ctx.region_id,
                        cycle_index: ctx.cycle_index,
                        shard_index: ctx.shard_index,
                    }],
                    generated_transactions: outcome.generated_transactions,
                    canceled_deferred: outcome.canceled_deferred,
                };
                store.insert_dedup_record(TransactionDedupRecord {
                    id: ctx.id,
                    expiration: ctx.transaction.expiration,
                });
                let trx_size = bincode::serialize(ctx.transaction).map(|v| v.len() as u64).unwrap_or(0);
                store.charge_usage(sender, trx_size, 1, ctx.head_block_time);
                store.squash();
                Ok(trace)
            }
            Err(_) => {
                store.undo();
                Ok(TransactionTrace {
                    id: ctx.id,
                    status: TransactionStatus::HardFail,
                    action_traces: vec![],
                    generated_transactions: vec![],
                    canceled_deferred: vec![],
                })
            }
        }
    }

    /// Persist every newly generated deferred transaction and remove any
    /// canceled by (sender, sender_id) (spec §4.4 "Deferred transaction
    /// bookkeeping"), called once per cycle from `finalize_pending_cycle`.
    pub fn apply_cycle_effects(&self, store: &mut dyn StateStore, traces: &[TransactionTrace], head_block_time: u64) {
        for trace in traces {
            for deferred in &trace.generated_transactions {
                let id = deferred.trx.id();
                store.insert_generated_transaction(GeneratedTransactionRecord {
                    id,
                    sender: deferred.sender.clone(),
                    sender_id: deferred.sender_id,
                    expiration: deferred.trx.expiration,
                    delay_until: deferred.execute_after,
                    published: head_block_time,
                    packed_trx: bincode::serialize(&deferred.trx).unwrap_or_default(),
                });
            }
            for canceled in &trace.canceled_deferred {
                if let Some(record) = store.find_generated_transaction(&canceled.sender, canceled.sender_id) {
                    store.remove_generated_transaction(&record.id);
                }
            }
        }
    }

    /// Dispatch matured deferred transactions (spec §4.4 "Deferred
    /// transaction dispatch"). Returns their traces, in the order they
    /// were applied (reverse `delay_until` order).
    #[allow(clippy::too_many_arguments)]
    pub fn push_deferred_transactions(
        &self,
        store: &mut dyn StateStore,
        interpreter: &dyn InterpreterPort,
        authority: &dyn AuthorityCheckerPort,
        head_block_time: u64,
        region_id: u16,
        cycle_index: u32,
        shard_index: u32,
    ) -> Result<Vec<TransactionTrace>, ChainError> {
        let due = store.generated_transactions_due(head_block_time);
        let mut traces = Vec::with_capacity(due.len());
        for record in due {
            if store.is_known_transaction(&record.id) {
                store.remove_generated_transaction(&record.id);
                continue;
            }
            let trx: Transaction = bincode::deserialize(&record.packed_trx).map_err(|e| {
                ChainError::Interpreter(format!("could not unpack generated transaction: {e}"))
            })?;
            let ctx = ApplyContext {
                transaction: &trx,
                id: record.id,
                region_id,
                cycle_index,
                shard_index,
                head_block_time,
                deferred_sender: Some((record.sender.clone(), record.sender_id)),
                provided_keys: &[],
                max_authority_depth: u16::MAX,
                skip_authority_check: true,
            };
            let trace = self.apply_transaction(store, interpreter, authority, &ctx)?;
            store.remove_generated_transaction(&record.id);
            traces.push(trace);
        }
        Ok(traces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{NativeInterpreter, StaticAuthorityChecker};
    use crate::adapters::state_store::InMemoryStateStore;
    use crate::domain::entities::DeferredTransaction;

    fn transaction(action_name: &str) -> Transaction {
        Transaction {
            expiration: 10_000,
            ref_block_num: 0,
            ref_block_prefix: 0,
            actions: vec![Action {
                account: "alice".into(),
                name: action_name.to_string(),
                authorization: vec![],
                payload: vec![],
            }],
            signatures: vec![],
        }
    }

    fn ctx<'a>(trx: &'a Transaction, id: Hash, deferred_sender: Option<(AccountName, u128)>) -> ApplyContext<'a> {
        ApplyContext {
            transaction: trx,
            id,
            region_id: 0,
            cycle_index: 0,
            shard_index: 0,
            head_block_time: 1_000,
            deferred_sender,
            provided_keys: &[],
            max_authority_depth: 6,
            skip_authority_check: true,
        }
    }

    #[test]
    fn happy_path_executes_and_dedups() {
        let mut store = InMemoryStateStore::genesis();
        let interp = NativeInterpreter::new();
        let authority = StaticAuthorityChecker::new();
        let applicator = TxApplicator::default();
        let trx = transaction("transfer");
        let id = trx.id();
        let trace = applicator
            .apply_transaction(&mut store, &interp, &authority, &ctx(&trx, id, None))
            .unwrap();
        assert_eq!(trace.status, TransactionStatus::Executed);
        assert!(store.is_known_transaction(&id));
    }

    #[test]
    fn failing_transaction_without_sender_propagates() {
        let mut store = InMemoryStateStore::genesis();
        let interp = NativeInterpreter::new();
        let authority = StaticAuthorityChecker::new();
        let applicator = TxApplicator::default();
        let trx = transaction("fail");
        let id = trx.id();
        assert!(applicator
            .apply_transaction(&mut store, &interp, &authority, &ctx(&trx, id, None))
            .is_err());
        assert!(!store.is_known_transaction(&id));
    }

    #[test]
    fn failing_deferred_transaction_soft_fails_via_onerror() {
        let mut store = InMemoryStateStore::genesis();
        let interp = NativeInterpreter::new();
        let authority = StaticAuthorityChecker::new();
        let applicator = TxApplicator::default();
        let trx = transaction("fail");
        let id = trx.id();
        let sender: AccountName = "alice".into();
        let trace = applicator
            .apply_transaction(&mut store, &interp, &authority, &ctx(&trx, id, Some((sender, 1))))
            .unwrap();
        assert_eq!(trace.status, TransactionStatus::SoftFail);
        assert_eq!(trace.action_traces[0].act.name, "onerror");
        assert!(store.is_known_transaction(&id));
    }

    #[test]
    fn cycle_effects_persist_generated_and_remove_canceled() {
        let mut store = InMemoryStateStore::genesis();
        let applicator = TxApplicator::default();
        let generated = DeferredTransaction {
            trx: transaction("transfer"),
            sender: "alice".into(),
            sender_id: 5,
            execute_after: 2_000,
        };
        let trace = TransactionTrace {
            id: [1; 32],
            status: TransactionStatus::Executed,
            action_traces: vec![],
            generated_transactions: vec![generated],
            canceled_deferred: vec![],
        };
        applicator.apply_cycle_effects(&mut store, &[trace], 1_000);
        assert!(store.find_generated_transaction(&"alice".into(), 5).is_some());

        let cancel_trace = TransactionTrace {
            id: [2; 32],
            status: TransactionStatus::Executed,
            action_traces: vec![],
            generated_transactions: vec![],
            canceled_deferred: vec![crate::domain::entities::CanceledDeferred {
                sender: "alice".into(),
                sender_id: 5,
            }],
        };
        applicator.apply_cycle_effects(&mut store, &[cancel_trace], 1_000);
        assert!(store.find_generated_transaction(&"alice".into(), 5).is_none());
    }

    #[test]
    fn push_deferred_transactions_applies_due_records() {
        let mut store = InMemoryStateStore::genesis();
        let interp = NativeInterpreter::new();
        let authority = StaticAuthorityChecker::new();
        let applicator = TxApplicator::default();
        let trx = transaction("transfer");
        let packed = bincode::serialize(&trx).unwrap();
        store.insert_generated_transaction(GeneratedTransactionRecord {
            id: trx.id(),
            sender: "alice".into(),
            sender_id: 9,
            expiration: 10_000,
            delay_until: 500,
            published: 0,
            packed_trx: packed,
        });
        let traces = applicator
            .push_deferred_transactions(&mut store, &interp, &authority, 1_000, 0, 0, 0)
            .unwrap();
        assert_eq!(traces.len(), 1);
        assert!(store.find_generated_transaction(&"alice".into(), 9).is_none());
    }
}
