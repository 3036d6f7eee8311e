//! In-memory representation of a decoded animation.

/// Frames, draw elements, and the shared asset table.
pub mod model;
