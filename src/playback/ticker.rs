use std::time::{Duration, Instant};

use crate::playback::player::{PlayerState, SpritePlayer};

/// Totals from one [`FixedIntervalTicker`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of `tick` calls.
    pub ticks: u64,
    /// Frames accepted by the renderer.
    pub submitted: u64,
    /// Submissions the renderer rejected.
    pub failed: u64,
}

/// Drives [`SpritePlayer::tick`] at a fixed interval.
///
/// Stands in for a display-refresh callback on hosts that do not have one. The run ends when the
/// optional deadline passes or the player falls back to [`PlayerState::Idle`].
#[derive(Clone, Copy, Debug)]
pub struct FixedIntervalTicker {
    interval: Duration,
    deadline: Option<Duration>,
}

impl FixedIntervalTicker {
    /// Tick every `interval`. A zero interval is bumped to one millisecond.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            deadline: None,
        }
    }

    /// Stop after `deadline` of scheduled time.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run on the calling thread, sleeping between ticks.
    ///
    /// Ticks are scheduled at `start + k * interval`, so time spent inside `tick` does not
    /// accumulate as drift.
    pub fn run(&self, player: &mut SpritePlayer) -> RunSummary {
        let start = Instant::now();
        let mut k: u32 = 0;
        self.run_with(player, |interval| {
            k = k.saturating_add(1);
            let target = start + interval.saturating_mul(k);
            std::thread::sleep(target.saturating_duration_since(Instant::now()));
        })
    }

    /// Run with a caller-supplied wait between ticks.
    ///
    /// `wait` receives the interval. Tests and offline renders pass a closure that advances a
    /// [`crate::ManualClock`] instead of sleeping.
    pub fn run_with(
        &self,
        player: &mut SpritePlayer,
        mut wait: impl FnMut(Duration),
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut scheduled = Duration::ZERO;
        loop {
            let report = player.tick();
            summary.ticks += 1;
            summary.submitted += report.submitted.len() as u64;
            summary.failed += report.failed as u64;

            if player.state() == PlayerState::Idle {
                break;
            }
            scheduled += self.interval;
            if self.deadline.is_some_and(|d| scheduled > d) {
                break;
            }
            wait(self.interval);
        }
        tracing::debug!(
            ticks = summary.ticks,
            submitted = summary.submitted,
            failed = summary.failed,
            "ticker finished"
        );
        summary
    }
}
