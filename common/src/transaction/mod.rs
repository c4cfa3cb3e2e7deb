//! Canonical transaction buffers.
//!
//! Layout, little-endian throughout:
//! source (32) | destination (32) | amount (8) | tick (4) | selector (2) |
//! payload size (2) | payload | signature (64)

mod signed;
mod summary;
mod unsigned;

pub use signed::*;
pub use summary::*;
pub use unsigned::*;

#[cfg(test)]
mod tests;
