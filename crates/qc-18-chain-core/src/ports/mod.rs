//! Hexagonal ports: the contracts the domain layer is written against,
//! with adapters supplying concrete implementations (see
//! [`crate::adapters`]). Mirrors the donor crates' `ports/{inbound,outbound}`
//! split.

pub mod inbound;
pub mod outbound;
