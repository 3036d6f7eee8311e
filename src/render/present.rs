use std::sync::{Arc, Mutex, PoisonError};

use crate::foundation::core::FrameIndex;
use crate::foundation::error::RendererError;
use crate::render::port::FrameRGBA;

/// Consumer of rasterized frames produced by a backend.
///
/// This is where a backend hands pixels to the host (a window, a texture upload queue, files on
/// disk). Presenters run on the tick loop's thread.
pub trait FramePresenter: Send {
    /// Receive one rasterized frame.
    fn present(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> Result<(), RendererError>;
}

/// In-memory presenter for tests and debugging.
///
/// Clones share storage, so a caller can keep a handle while a backend owns another.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPresenter {
    frames: Arc<Mutex<Vec<(FrameIndex, FrameRGBA)>>>,
}

impl InMemoryPresenter {
    /// Create an empty presenter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of presented frames in presentation order.
    pub fn frames(&self) -> Vec<(FrameIndex, FrameRGBA)> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Indices of presented frames in presentation order.
    pub fn indices(&self) -> Vec<FrameIndex> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(i, _)| *i)
            .collect()
    }
}

impl FramePresenter for InMemoryPresenter {
    fn present(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> Result<(), RendererError> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((idx, frame.clone()));
        Ok(())
    }
}
