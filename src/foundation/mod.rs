//! Shared value types, errors, and time sources.

/// Monotonic time sources.
pub mod clock;
/// Frame indices, frame rates, colors, and transforms.
pub mod core;
/// Error taxonomy.
pub mod error;
