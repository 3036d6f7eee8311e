use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Weak};

use crate::foundation::clock::{Clock, SystemClock};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{DecodeError, PlayerResult, RendererError};
use crate::frame::model::{FrameModel, LoopMode};
use crate::notify::observer::{Notifier, PlayerEvent, PlayerObserver};
use crate::playback::session::PlaybackSession;
use crate::render::port::{FrameSubmission, RendererPort, SurfaceDesc};
use crate::resource::decode::decode;
use crate::resource::handle::ResourceHandle;

/// Where `play` runs the resource decoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Decode on rayon's global pool; the player sits in [`PlayerState::Decoding`] until a later
    /// `tick` observes the result. The pool is process-wide, so hosts that also use rayon share
    /// its threads with decoding.
    #[default]
    Background,
    /// Decode synchronously inside `play`.
    Inline,
}

/// Player configuration.
#[derive(Clone, Copy, Debug)]
pub struct PlayerOpts {
    /// Drop intermediate frames when behind schedule. Defaults to `true`.
    pub skip_frame: bool,
    /// Where decoding runs.
    pub decode: DecodeMode,
    /// Force a loop mode regardless of what the resource declares.
    pub loop_override: Option<LoopMode>,
}

impl Default for PlayerOpts {
    fn default() -> Self {
        Self {
            skip_frame: true,
            decode: DecodeMode::default(),
            loop_override: None,
        }
    }
}

/// Externally observable player state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    /// No session. `play` is accepted.
    Idle,
    /// A background decode is in flight. Ticks do nothing but poll it.
    Decoding,
    /// A session is advancing with wall-clock time.
    Playing,
    /// A session is frozen at its pause time.
    Paused,
}

/// What one `tick` did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Frames accepted by the renderer, in submission order.
    pub submitted: Vec<FrameIndex>,
    /// Submissions the renderer rejected. They are retried on the next tick.
    pub failed: usize,
}

enum Phase {
    Idle,
    Decoding(Receiver<Result<FrameModel, DecodeError>>),
    Active(PlaybackSession),
}

/// Sprite animation player.
///
/// Owns one renderer for its whole lifetime and at most one playback session. All control calls
/// and `tick` take `&mut self`, so they are serialized by construction; once `stop` or `destroy`
/// returns, no further frame reaches the renderer for that session.
pub struct SpritePlayer {
    renderer: Box<dyn RendererPort>,
    surface: SurfaceDesc,
    clock: Box<dyn Clock>,
    opts: PlayerOpts,
    notifier: Notifier,
    phase: Phase,
    destroyed: bool,
}

impl std::fmt::Debug for SpritePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpritePlayer")
            .field("renderer", &self.renderer.name())
            .field("surface", &self.surface)
            .field("opts", &self.opts)
            .field("state", &self.state())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl SpritePlayer {
    /// Bind `renderer` to `surface` using the system clock.
    ///
    /// Fails if the renderer cannot prepare the surface.
    pub fn new(
        renderer: Box<dyn RendererPort>,
        surface: SurfaceDesc,
        opts: PlayerOpts,
    ) -> PlayerResult<Self> {
        Self::with_clock(renderer, surface, opts, SystemClock::new())
    }

    /// Like [`SpritePlayer::new`] with an explicit time source.
    pub fn with_clock(
        mut renderer: Box<dyn RendererPort>,
        surface: SurfaceDesc,
        opts: PlayerOpts,
        clock: impl Clock + 'static,
    ) -> PlayerResult<Self> {
        renderer.prepare(&surface)?;
        tracing::debug!(backend = renderer.name(), "renderer bound");
        Ok(Self {
            renderer,
            surface,
            clock: Box::new(clock),
            opts,
            notifier: Notifier::new(),
            phase: Phase::Idle,
            destroyed: false,
        })
    }

    /// Current state.
    pub fn state(&self) -> PlayerState {
        match &self.phase {
            Phase::Idle => PlayerState::Idle,
            Phase::Decoding(_) => PlayerState::Decoding,
            Phase::Active(s) if s.is_paused() => PlayerState::Paused,
            Phase::Active(_) => PlayerState::Playing,
        }
    }

    /// Name of the bound renderer backend.
    pub fn backend_name(&self) -> &'static str {
        self.renderer.name()
    }

    /// Whether `destroy` has been called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Whether the skip-frame policy is enabled.
    pub fn skip_frame_enabled(&self) -> bool {
        self.opts.skip_frame
    }

    /// Enable or disable the skip-frame policy. Takes effect on the next tick.
    pub fn set_skip_frame_enabled(&mut self, enabled: bool) {
        self.opts.skip_frame = enabled;
    }

    /// Register the lifecycle observer, replacing any previous one.
    ///
    /// The player keeps only a weak reference.
    pub fn set_observer(&mut self, observer: Weak<dyn PlayerObserver>) {
        if self.destroyed {
            return;
        }
        self.notifier.set(observer);
    }

    /// Remove the lifecycle observer.
    pub fn clear_observer(&mut self) {
        self.notifier.clear();
    }

    /// Rebind the renderer to a new or restored surface.
    pub fn prepare_surface(&mut self, surface: SurfaceDesc) -> Result<(), RendererError> {
        if self.destroyed {
            return Err(RendererError::NotPrepared);
        }
        self.renderer.prepare(&surface)?;
        self.surface = surface;
        Ok(())
    }

    /// Decode `resource` and start playing it from frame 0.
    ///
    /// Any session in progress is stopped first. Decode failures leave the player `Idle` and
    /// fire no notification.
    #[tracing::instrument(skip_all, fields(resource = %resource.describe()))]
    pub fn play(&mut self, resource: ResourceHandle) {
        if self.destroyed {
            tracing::debug!("play after destroy ignored");
            return;
        }
        self.end_session();

        match self.opts.decode {
            DecodeMode::Inline => match decode(&resource) {
                Ok(model) => self.begin_session(model),
                Err(e) => tracing::warn!(error = %e, "resource decode failed"),
            },
            DecodeMode::Background => {
                let (tx, rx) = mpsc::channel();
                rayon::spawn(move || {
                    // The receiver is gone if playback was stopped meanwhile.
                    let _ = tx.send(decode(&resource));
                });
                self.phase = Phase::Decoding(rx);
                tracing::debug!("decode dispatched");
            }
        }
    }

    /// Freeze playback. No-op unless playing.
    pub fn pause(&mut self) {
        let now = self.clock.now();
        let Phase::Active(session) = &mut self.phase else {
            tracing::debug!("pause ignored: no active session");
            return;
        };
        if session.pause(now) {
            tracing::debug!("paused");
            self.notifier.notify(PlayerEvent::Paused);
        }
    }

    /// Continue playback from where it was frozen. No-op unless paused.
    pub fn resume(&mut self) {
        let now = self.clock.now();
        let Phase::Active(session) = &mut self.phase else {
            tracing::debug!("resume ignored: no active session");
            return;
        };
        if session.resume(now) {
            tracing::debug!("resumed");
            self.notifier.notify(PlayerEvent::Resumed);
        }
    }

    /// End the current session. Cancels an in-flight decode silently.
    pub fn stop(&mut self) {
        self.end_session();
    }

    /// Stop, release the renderer and drop the observer registration.
    ///
    /// Every later call on this player is a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.end_session();
        self.renderer.teardown();
        self.notifier.clear();
        self.destroyed = true;
        tracing::debug!("player destroyed");
    }

    /// Advance playback to the current clock time.
    ///
    /// Call this from the host's display-refresh callback or a
    /// [`crate::playback::ticker::FixedIntervalTicker`].
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if self.destroyed {
            return report;
        }
        if let Phase::Decoding(rx) = &self.phase {
            match rx.try_recv() {
                Err(TryRecvError::Empty) => return report,
                Ok(Ok(model)) => self.begin_session(model),
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "resource decode failed");
                    self.phase = Phase::Idle;
                    return report;
                }
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("decode worker exited without a result");
                    self.phase = Phase::Idle;
                    return report;
                }
            }
        }

        let now = self.clock.now();
        let skip_frame = self.opts.skip_frame;
        let Phase::Active(session) = &mut self.phase else {
            return report;
        };
        if session.is_paused() {
            return report;
        }

        let plan = session.plan(now, skip_frame);
        if let (Some(first), Some(last)) = (plan.first(), session.last_position())
            && first.position > last + 1
        {
            tracing::debug!(
                due = first.index.0,
                skipped = first.position - last - 1,
                "behind schedule; frames skipped"
            );
        }

        let model = Arc::clone(session.model());
        for planned in plan {
            let Some(frame) = model.frame(planned.index) else {
                break;
            };
            let submission = FrameSubmission {
                index: planned.index,
                frame: frame.as_ref(),
                assets: model.assets(),
                canvas: model.canvas(),
            };
            match self.renderer.submit_frame(&submission) {
                Ok(()) => {
                    session.record(planned);
                    report.submitted.push(planned.index);
                }
                Err(e) => {
                    tracing::warn!(
                        frame = planned.index.0,
                        backend = self.renderer.name(),
                        error = %e,
                        "frame submission failed; retrying next tick"
                    );
                    report.failed += 1;
                    break;
                }
            }
        }
        report
    }

    fn begin_session(&mut self, model: FrameModel) {
        let loop_mode = self.opts.loop_override.unwrap_or(model.loop_mode());
        tracing::debug!(
            frames = model.frame_count(),
            fps = model.fps().as_f64(),
            ?loop_mode,
            "playback started"
        );
        let now = self.clock.now();
        self.phase = Phase::Active(PlaybackSession::start(Arc::new(model), loop_mode, now));
        self.notifier.notify(PlayerEvent::Started);
    }

    fn end_session(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => {}
            Phase::Decoding(_) => tracing::debug!("pending decode cancelled"),
            Phase::Active(session) => {
                tracing::debug!(last = ?session.last_submitted(), "playback stopped");
                drop(session);
                self.notifier.notify(PlayerEvent::Stopped);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/player.rs"]
mod tests;
