//! Deterministic stop counts per region visit.

use crate::constants::{MIN_SEQUENCES_PER_VISIT, SEQUENCE_SPREAD};

/// 32-bit polynomial rolling hash over UTF-16 code units with wrapping
/// arithmetic (`hash * 31 + unit`).
#[must_use]
pub fn region_hash(input: &str) -> i32 {
    input.encode_utf16().fold(0_i32, |hash, unit| {
        hash.wrapping_mul(31).wrapping_add(i32::from(unit))
    })
}

/// Number of stops for the `visit_count`-th visit to `region`. Always 2 or 3.
#[must_use]
pub fn sequence_count(region: &str, visit_count: u32) -> u32 {
    let hash = region_hash(&format!("{region}-{visit_count}"));
    MIN_SEQUENCES_PER_VISIT + hash.unsigned_abs() % SEQUENCE_SPREAD
}
