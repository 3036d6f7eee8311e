use std::sync::Arc;
use std::time::Duration;

use crate::foundation::core::FrameIndex;
use crate::frame::model::{FrameModel, LoopMode};
use crate::playback::timing::{FrameCursor, PlannedFrame, due_position};

/// Mutable state of one `play` invocation.
///
/// Elapsed playback time is derived from a clock anchor so that a slow tick never shifts the
/// schedule. Pausing freezes the elapsed value; resuming re-anchors so it continues from there.
#[derive(Debug)]
pub(crate) struct PlaybackSession {
    model: Arc<FrameModel>,
    loop_mode: LoopMode,
    anchor: Duration,
    frozen: Option<Duration>,
    cursor: FrameCursor,
}

impl PlaybackSession {
    pub(crate) fn start(model: Arc<FrameModel>, loop_mode: LoopMode, now: Duration) -> Self {
        Self {
            model,
            loop_mode,
            anchor: now,
            frozen: None,
            cursor: FrameCursor::default(),
        }
    }

    pub(crate) fn model(&self) -> &Arc<FrameModel> {
        &self.model
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.frozen.is_some()
    }

    pub(crate) fn elapsed(&self, now: Duration) -> Duration {
        self.frozen
            .unwrap_or_else(|| now.saturating_sub(self.anchor))
    }

    /// Returns false if already paused.
    pub(crate) fn pause(&mut self, now: Duration) -> bool {
        if self.frozen.is_some() {
            return false;
        }
        self.frozen = Some(self.elapsed(now));
        true
    }

    /// Returns false if not paused.
    pub(crate) fn resume(&mut self, now: Duration) -> bool {
        let Some(frozen) = self.frozen.take() else {
            return false;
        };
        self.anchor = now.saturating_sub(frozen);
        true
    }

    pub(crate) fn plan(&self, now: Duration, skip_frame: bool) -> Vec<PlannedFrame> {
        let n = self.model.frame_count();
        let due = due_position(self.elapsed(now), self.model.fps(), n, self.loop_mode);
        self.cursor.plan(due, n, self.loop_mode, skip_frame)
    }

    pub(crate) fn record(&mut self, frame: PlannedFrame) {
        self.cursor.record(frame);
    }

    pub(crate) fn last_submitted(&self) -> Option<FrameIndex> {
        self.cursor.last_submitted()
    }

    pub(crate) fn last_position(&self) -> Option<u64> {
        self.cursor.last_position()
    }
}
