//! Resource decoding: sprite documents into [`crate::FrameModel`]s.
//!
//! A resource is a JSON sprite document. File-backed assets are resolved relative to the document's
//! directory and decoded up front, so the resulting model is IO-free and immutable.

/// Decoder entrypoints.
pub mod decode;
/// Resource locators.
pub mod handle;
pub(crate) mod model;
pub(crate) mod raster;
