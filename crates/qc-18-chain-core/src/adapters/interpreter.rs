//! # Native Interpreter
//!
//! Reference implementation of [`crate::ports::outbound::InterpreterPort`].
//! Real contract execution is sandboxed WASM (spec §1, Out of scope);
//! this adapter instead dispatches on a small fixed set of action names so
//! the rest of the controller — shard-lock validation, deferred-transaction
//! maturation, the onerror fallback — can be exercised deterministically
//! without a VM, the same role the donor's `qc-11-smart-contracts::testing`
//! stub interpreter plays for its own test suite.
//!
//! Recognized actions (`payload` is ignored unless noted):
//! - `transfer`: records a write access on `(receiver, first authorization's actor)`.
//! - `defer`: also schedules one generated transaction addressed to `receiver`,
//!   maturing `payload[0]` seconds (as a little-endian `u64`, default 0) after
//!   the current head block time.
//! - `cancel`: records a cancellation of `(receiver, sender_id)`, where
//!   `sender_id` is `payload` read as a little-endian `u128` (default 0).
//! - `fail`: always errors, driving the onerror fallback path.
//! - anything else: a plain write access on `(receiver, receiver)`.

use crate::domain::entities::{CanceledDeferred, DataAccess, DataAccessKind, DeferredTransaction, Transaction};
use crate::domain::errors::ChainError;
use crate::ports::outbound::{ActionContext, ActionOutcome, InterpreterPort};

#[derive(Debug, Default)]
pub struct NativeInterpreter;

impl NativeInterpreter {
    pub fn new() -> Self {
        Self
    }
}

impl InterpreterPort for NativeInterpreter {
    fn apply_action(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome, ChainError> {
        let action = ctx.action;
        let receiver = action.account.clone();
        let mut outcome = ActionOutcome::default();

        match action.name.as_str() {
            "fail" => {
                return Err(ChainError::Interpreter(format!(
                    "action {}::{} deliberately faulted",
                    receiver, action.name
                )));
            }
            "transfer" => {
                let scope = action
                    .authorization
                    .first()
                    .map(|a| a.actor.clone())
                    .unwrap_or_else(|| receiver.clone());
                outcome.data_access.push(DataAccess {
                    code: receiver.clone(),
                    scope,
                    kind: DataAccessKind::Write,
                });
                outcome.console = format!("transfer applied by {}", receiver);
            }
            "defer" => {
                let scope = action
                    .authorization
                    .first()
                    .map(|a| a.actor.clone())
                    .unwrap_or_else(|| receiver.clone());
                outcome.data_access.push(DataAccess {
                    code: receiver.clone(),
                    scope: scope.clone(),
                    kind: DataAccessKind::Write,
                });
                let delay = action
                    .payload
                    .get(0..8)
                    .map(|b| u64::from_le_bytes(b.try_into().unwrap()))
                    .unwrap_or(0);
                outcome.generated_transactions.push(DeferredTransaction {
                    trx: Transaction {
                        expiration: ctx.head_block_time + 3600,
                        ref_block_num: 0,
                        ref_block_prefix: 0,
                        actions: vec![],
                        signatures: vec![],
                    },
                    sender: receiver.clone(),
                    sender_id: u128::from(ctx.head_block_time),
                    execute_after: ctx.head_block_time + delay,
                });
            }
            "cancel" => {
                let sender_id = action
                    .payload
                    .get(0..16)
                    .map(|b| u128::from_le_bytes(b.try_into().unwrap()))
                    .unwrap_or(0);
                outcome.canceled_deferred.push(CanceledDeferred {
                    sender: receiver.clone(),
                    sender_id,
                });
                outcome.console = format!("canceled deferred for {}", receiver);
            }
            _ => {
                outcome.data_access.push(DataAccess {
                    code: receiver.clone(),
                    scope: receiver.clone(),
                    kind: DataAccessKind::Write,
                });
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Action;

    fn ctx<'a>(action: &'a Action) -> ActionContext<'a> {
        ActionContext {
            action,
            transaction_id: [0; 32],
            region_id: 0,
            cycle_index: 0,
            shard_index: 0,
            head_block_time: 1_000,
        }
    }

    #[test]
    fn transfer_records_write_access() {
        let action = Action {
            account: "alice".into(),
            name: "transfer".into(),
            authorization: vec![],
            payload: vec![],
        };
        let interp = NativeInterpreter::new();
        let outcome = interp.apply_action(ctx(&action)).unwrap();
        assert_eq!(outcome.data_access.len(), 1);
        assert_eq!(outcome.data_access[0].kind, DataAccessKind::Write);
    }

    #[test]
    fn fail_action_errors() {
        let action = Action {
            account: "alice".into(),
            name: "fail".into(),
            authorization: vec![],
            payload: vec![],
        };
        let interp = NativeInterpreter::new();
        assert!(interp.apply_action(ctx(&action)).is_err());
    }

    #[test]
    fn defer_schedules_generated_transaction() {
        let action = Action {
            account: "alice".into(),
            name: "defer".into(),
            authorization: vec![],
            payload: 30u64.to_le_bytes().to_vec(),
        };
        let interp = NativeInterpreter::new();
        let outcome = interp.apply_action(ctx(&action)).unwrap();
        assert_eq!(outcome.generated_transactions.len(), 1);
        assert_eq!(outcome.generated_transactions[0].execute_after, 1_030);
    }

    #[test]
    fn cancel_records_cancellation() {
        let action = Action {
            account: "alice".into(),
            name: "cancel".into(),
            authorization: vec![],
            payload: 7u128.to_le_bytes().to_vec(),
        };
        let interp = NativeInterpreter::new();
        let outcome = interp.apply_action(ctx(&action)).unwrap();
        assert_eq!(outcome.canceled_deferred.len(), 1);
        assert_eq!(outcome.canceled_deferred[0].sender_id, 7);
    }
}
