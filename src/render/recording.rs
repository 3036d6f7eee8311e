use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::foundation::core::FrameIndex;
use crate::foundation::error::RendererError;
use crate::render::port::{FrameSubmission, RendererPort, SurfaceDesc};

/// One call observed by a [`RecordingBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedCall {
    /// `prepare` with the surface size.
    Prepare {
        /// Surface width.
        width: u32,
        /// Surface height.
        height: u32,
    },
    /// Accepted `submit_frame`.
    Submit(FrameIndex),
    /// Rejected `submit_frame` (injected failure or not prepared).
    Rejected(FrameIndex),
    /// `teardown`.
    Teardown,
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Vec<RecordedCall>,
    prepared: bool,
    fail_next_submits: usize,
    fail_next_prepare: Option<RendererError>,
}

/// In-memory renderer port that records every call instead of drawing.
///
/// Clones share state: hand one clone to the player and keep another to inspect what was
/// submitted, or to inject failures.
#[derive(Clone, Debug, Default)]
pub struct RecordingBackend {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingBackend {
    /// Create a recorder with no calls.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every recorded call in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Indices of accepted submissions in order.
    pub fn submitted(&self) -> Vec<FrameIndex> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                RecordedCall::Submit(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    /// Number of rejected submissions.
    pub fn rejected_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RecordedCall::Rejected(_)))
            .count()
    }

    /// Number of `teardown` calls.
    pub fn teardown_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RecordedCall::Teardown))
            .count()
    }

    /// Whether the port is currently prepared.
    pub fn is_prepared(&self) -> bool {
        self.lock().prepared
    }

    /// Reject the next `n` submissions with [`RendererError::SubmissionRejected`].
    pub fn fail_next_submits(&self, n: usize) {
        self.lock().fail_next_submits = n;
    }

    /// Make the next `prepare` fail with `err`.
    pub fn fail_next_prepare(&self, err: RendererError) {
        self.lock().fail_next_prepare = Some(err);
    }

    /// Drop the recorded call history, keeping prepared state and injected failures.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl RendererPort for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn prepare(&mut self, surface: &SurfaceDesc) -> Result<(), RendererError> {
        let mut st = self.lock();
        if let Some(err) = st.fail_next_prepare.take() {
            return Err(err);
        }
        surface.validate()?;
        st.calls.push(RecordedCall::Prepare {
            width: surface.width,
            height: surface.height,
        });
        st.prepared = true;
        Ok(())
    }

    fn submit_frame(&mut self, submission: &FrameSubmission<'_>) -> Result<(), RendererError> {
        let mut st = self.lock();
        if !st.prepared {
            st.calls.push(RecordedCall::Rejected(submission.index));
            return Err(RendererError::NotPrepared);
        }
        if st.fail_next_submits > 0 {
            st.fail_next_submits -= 1;
            st.calls.push(RecordedCall::Rejected(submission.index));
            return Err(RendererError::rejected(format!(
                "injected failure for frame {}",
                submission.index.0
            )));
        }
        st.calls.push(RecordedCall::Submit(submission.index));
        Ok(())
    }

    fn teardown(&mut self) {
        let mut st = self.lock();
        st.prepared = false;
        st.calls.push(RecordedCall::Teardown);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/recording.rs"]
mod tests;
