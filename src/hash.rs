//! # Hash Functions
//!
//! Two independent non-cryptographic hashes over arbitrary byte strings, both
//! instances of the same multiply-xor-shift mixing loop with distinct
//! multiplier pairs:
//!
//! - [`bucket_hash`] selects the starting bucket (`hash & (table_size - 1)`)
//! - [`slot_checksum`] is the short per-slot checksum that disambiguates
//!   same-bucket collisions
//!
//! Because the multiplier pairs differ, two keys that collide on
//! `bucket_hash` essentially never also collide on `slot_checksum`; the slot
//! layout depends on exactly that property.
//!
//! Checksum value 0 is reserved: a slot with checksum 0 means "empty", so
//! [`slot_checksum`] folds a natural 0 result to 1. Build, query, and verify
//! all go through the same function and therefore agree on the folded value.

const BUCKET_MUL_A: u32 = 0x9E37_79B1;
const BUCKET_MUL_B: u32 = 0x85EB_CA77;

const CKSUM_MUL_A: u32 = 0xC2B2_AE35;
const CKSUM_MUL_B: u32 = 0x27D4_EB2F;

#[inline]
fn mix(bytes: &[u8], mul_a: u32, mul_b: u32) -> u32 {
    let mut acc = 1u32;
    for &b in bytes {
        acc = acc.wrapping_mul(mul_a) ^ (acc >> 15) ^ (b as u32).wrapping_mul(mul_b);
    }
    acc
}

/// Bucket-selection hash. Deterministic, O(n), allocation-free.
#[inline]
pub fn bucket_hash(key: &[u8]) -> u32 {
    mix(key, BUCKET_MUL_A, BUCKET_MUL_B)
}

/// Per-slot checksum. Never returns 0; that value denotes an empty slot.
#[inline]
pub fn slot_checksum(key: &[u8]) -> u32 {
    fold_reserved(mix(key, CKSUM_MUL_A, CKSUM_MUL_B))
}

/// Folds the reserved empty-slot value to the nearest legal checksum.
#[inline]
fn fold_reserved(checksum: u32) -> u32 {
    if checksum == 0 {
        1
    } else {
        checksum
    }
}
