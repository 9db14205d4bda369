//! Security invariants for block propagation (SPEC-05 Section 2.3).

use super::{PeerPropagationState, PropagationConfig, PropagationState, SeenBlockCache};
use shared_types::Hash;

/// INVARIANT-1: Deduplication
/// The same block hash is never processed/validated twice.
pub fn invariant_no_duplicate_processing(cache: &SeenBlockCache, hash: &Hash) -> bool {
    if let Some(state) = cache.get_state(hash) {
        // If we've already fully processed, don't process again
        !matches!(
            state,
            PropagationState::Complete | PropagationState::Validated
        )
    } else {
        true
    }
}

/// INVARIANT-2: Rate Limiting
/// No peer can send more than max_announcements_per_second.
pub fn invariant_rate_limit(peer: &PeerPropagationState, config: &PropagationConfig) -> bool {
    peer.announcement_count < config.max_announcements_per_second
}

/// INVARIANT-3: Size Limit
/// No block larger than max_block_size is accepted.
pub fn invariant_size_limit(block_size: usize, config: &PropagationConfig) -> bool {
    block_size <= config.max_block_size_bytes
}

/// Security check result.
#[derive(Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    DuplicateBlock,
    RateLimitExceeded,
    BlockTooLarge,
}

/// Check all invariants for incoming block.
pub fn check_all_invariants(
    cache: &SeenBlockCache,
    hash: &Hash,
    block_size: usize,
    peer: &PeerPropagationState,
    config: &PropagationConfig,
) -> Result<(), InvariantViolation> {
    if !invariant_no_duplicate_processing(cache, hash) {
        return Err(InvariantViolation::DuplicateBlock);
    }

    if !invariant_rate_limit(peer, config) {
        return Err(InvariantViolation::RateLimitExceeded);
    }

    if !invariant_size_limit(block_size, config) {
        return Err(InvariantViolation::BlockTooLarge);
    }

    Ok(())
}
