//! Renderer port and the backends that implement it.

/// CPU raster backend.
pub mod cpu;
/// GPU backend (feature `gpu`).
#[cfg(feature = "gpu")]
pub mod gpu;
/// The renderer capability set and surface description.
pub mod port;
/// Frame presenters.
pub mod present;
/// Call-recording port for tests and debugging.
pub mod recording;
