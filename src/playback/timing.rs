use std::time::Duration;

use crate::foundation::core::{FrameIndex, Fps};
use crate::frame::model::LoopMode;

/// Frame index that should be on screen after `elapsed` playback time.
///
/// Looping playback wraps modulo `frame_count`; non-looping playback clamps to the last frame.
/// The result is always in `[0, frame_count - 1]` (a zero `frame_count` is treated as 1).
pub fn due_index(
    elapsed: Duration,
    fps: Fps,
    frame_count: u64,
    loop_mode: LoopMode,
) -> FrameIndex {
    index_at(due_position(elapsed, fps, frame_count, loop_mode), frame_count, loop_mode)
}

/// Absolute (unwrapped) frame position after `elapsed`. Clamped to the last frame for
/// [`LoopMode::Once`].
pub(crate) fn due_position(
    elapsed: Duration,
    fps: Fps,
    frame_count: u64,
    loop_mode: LoopMode,
) -> u64 {
    let pos = fps.frames_in(elapsed);
    match loop_mode {
        LoopMode::Loop => pos,
        LoopMode::Once => pos.min(frame_count.max(1) - 1),
    }
}

fn index_at(position: u64, frame_count: u64, loop_mode: LoopMode) -> FrameIndex {
    let n = frame_count.max(1);
    match loop_mode {
        LoopMode::Loop => FrameIndex(position % n),
        LoopMode::Once => FrameIndex(position.min(n - 1)),
    }
}

/// One planned submission: the absolute position and the frame index it maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PlannedFrame {
    pub(crate) position: u64,
    pub(crate) index: FrameIndex,
}

/// Tracks the last frame handed to the renderer and plans what to submit next.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FrameCursor {
    last: Option<PlannedFrame>,
}

impl FrameCursor {
    pub(crate) fn last_submitted(&self) -> Option<FrameIndex> {
        self.last.map(|p| p.index)
    }

    pub(crate) fn last_position(&self) -> Option<u64> {
        self.last.map(|p| p.position)
    }

    /// Submissions needed to reach `due`.
    ///
    /// With `skip_frame` the plan is at most the due frame itself. Without it, every position
    /// after the last submitted one is visited in order, across as many loop cycles as elapsed.
    pub(crate) fn plan(
        &self,
        due: u64,
        frame_count: u64,
        loop_mode: LoopMode,
        skip_frame: bool,
    ) -> Vec<PlannedFrame> {
        let n = frame_count.max(1);
        let due_frame = PlannedFrame {
            position: due,
            index: index_at(due, n, loop_mode),
        };
        let Some(last) = self.last else {
            if skip_frame {
                return vec![due_frame];
            }
            return positions(0, due, n, loop_mode);
        };

        if due <= last.position || (skip_frame && due_frame.index == last.index) {
            return Vec::new();
        }
        if skip_frame {
            return vec![due_frame];
        }
        positions(last.position + 1, due, n, loop_mode)
    }

    pub(crate) fn record(&mut self, frame: PlannedFrame) {
        self.last = Some(frame);
    }
}

fn positions(from: u64, to: u64, n: u64, loop_mode: LoopMode) -> Vec<PlannedFrame> {
    (from..=to)
        .map(|position| PlannedFrame {
            position,
            index: index_at(position, n, loop_mode),
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/playback/timing.rs"]
mod tests;
