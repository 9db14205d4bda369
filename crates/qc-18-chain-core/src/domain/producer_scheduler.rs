//! # Producer Scheduler
//!
//! Pure slot/round arithmetic (spec §4.2), isolated from the pending
//! builder and block processor so the formulas can be unit tested
//! directly against the glossary's definition of "slot" and "round".

use crate::domain::entities::{ProducerKey, ProducerScheduleType};

/// Convert a wall-clock time to an absolute slot number. Slot 0 is
/// reserved to mean "no block produced yet"; the genesis block's own
/// timestamp maps to slot 1.
pub fn slot_at_time(genesis_time_ms: u64, block_interval_ms: u64, when_ms: u64) -> u64 {
    if when_ms < genesis_time_ms {
        return 0;
    }
    (when_ms - genesis_time_ms) / block_interval_ms + 1
}

/// Inverse of [`slot_at_time`]: the wall-clock time a given slot begins.
pub fn time_at_slot(genesis_time_ms: u64, block_interval_ms: u64, slot: u64) -> u64 {
    genesis_time_ms + (slot.saturating_sub(1)) * block_interval_ms
}

/// A round is one full pass through every producer in the active
/// schedule, each producing `repetitions` blocks in a row (glossary:
/// "Round"). `height` is 1-indexed, matching block numbers.
pub fn is_start_of_round(height: u32, producer_count: usize, repetitions: u32) -> bool {
    if producer_count == 0 || repetitions == 0 {
        return false;
    }
    let round_length = producer_count as u64 * repetitions as u64;
    (height as u64) % round_length == 0
}

/// The producer scheduled to sign the block at `absolute_slot + slot_offset`
/// (spec §4.2: `index = ((current_absolute_slot + slot_offset) mod (N·R)) / R`).
pub fn get_scheduled_producer(
    schedule: &ProducerScheduleType,
    absolute_slot: u64,
    slot_offset: u64,
    repetitions: u32,
) -> Option<&ProducerKey> {
    let n = schedule.producers.len() as u64;
    if n == 0 || repetitions == 0 {
        return None;
    }
    let round_length = n * repetitions as u64;
    let index = ((absolute_slot + slot_offset) % round_length) / repetitions as u64;
    schedule.producers.get(index as usize)
}
