//! # qc-18-chain-core — the chain controller
//!
//! Validates, applies, generates, and reconciles blocks against a
//! persistent state store, coordinating deterministic transaction
//! execution under a shard-locking concurrency model (delegated
//! proof-of-stake consensus).
//!
//! Layout follows the donor workspace's hexagonal split: [`domain`] holds
//! entities, errors, and the pure/stateful algorithms (fork database,
//! pending builder, producer scheduler, block processor, transaction
//! applicator, irreversibility); [`ports`] declares the inbound API and
//! the outbound contracts external collaborators satisfy; [`adapters`]
//! supplies the in-memory reference implementations of those outbound
//! ports used by tests and by `node-runtime` until a persistent backend
//! is wired in.

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;

pub use domain::errors::ChainError;
pub use ports::inbound::{ChainControllerApi, SkipFlags};
