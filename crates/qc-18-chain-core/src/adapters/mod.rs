//! Reference adapters for the outbound ports (spec §6). These are the
//! in-memory implementations used by the test suite and by
//! `node-runtime` until a persistent backend is wired in. Each adapter
//! is named for the contract it satisfies, matching the donor crates'
//! `adapters/<concern>.rs` naming (e.g. `qc-09-finality::adapters::block_storage`).

pub mod authority;
pub mod block_log;
pub mod interpreter;
pub mod signals;
pub mod state_store;

pub use authority::StaticAuthorityChecker;
pub use block_log::InMemoryBlockLog;
pub use interpreter::NativeInterpreter;
pub use signals::SignalBus;
pub use state_store::InMemoryStateStore;
