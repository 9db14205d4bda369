//! Service Layer
//!
//! Reference: Architecture.md - Hexagonal Architecture
//!
//! Contains the application services that orchestrate domain logic
//! and coordinate with external dependencies via ports.

pub mod bloom_filter_service;

pub use bloom_filter_service::BloomFilterService;
