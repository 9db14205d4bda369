//! # IPC Security Module
//!
//! Subsystem-level IPC security per IPC-MATRIX.md.
//!
//! ## Modules
//!
//! - `authorization`: Sender validation per IPC-MATRIX
//! - `hmac`: HMAC verification utilities

// DELETED authorization module
