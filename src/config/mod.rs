//! # edictidx Configuration Module
//!
//! This module centralizes all configuration constants for edictidx. Constants
//! are grouped by functional area and their interdependencies are documented
//! and enforced through compile-time assertions.
//!
//! ## Why Centralization?
//!
//! Several constants here depend on each other. `DEFAULT_MIN_TABLE_SIZE` must
//! never exceed `DEFAULT_MAX_TABLE_SIZE` or the very first table allocation is
//! rejected, and both must be powers of two because the bucket index is masked
//! rather than reduced modulo. Co-locating the values with compile-time checks
//! prevents such mismatches.
//!
//! ## Module Organization
//!
//! - [`constants`]: All numeric configuration values with dependency documentation

pub mod constants;
pub use constants::*;
