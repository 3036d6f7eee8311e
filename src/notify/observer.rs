use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Weak;

/// Receiver of playback lifecycle notifications.
///
/// Every method has an empty default, so an observer implements only the notifications it cares
/// about. Methods are called on the thread driving the player, after the state change has taken
/// effect.
pub trait PlayerObserver: Send + Sync {
    /// Decode finished and playback began at frame 0.
    fn on_started(&self) {}
    /// Playback was paused.
    fn on_paused(&self) {}
    /// Playback resumed after a pause.
    fn on_resumed(&self) {}
    /// A started session ended through `stop` or `destroy`.
    fn on_stopped(&self) {}
}

/// Lifecycle notification kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerEvent {
    /// See [`PlayerObserver::on_started`].
    Started,
    /// See [`PlayerObserver::on_paused`].
    Paused,
    /// See [`PlayerObserver::on_resumed`].
    Resumed,
    /// See [`PlayerObserver::on_stopped`].
    Stopped,
}

/// Holds at most one observer, without extending its lifetime.
#[derive(Default)]
pub struct Notifier {
    observer: Option<Weak<dyn PlayerObserver>>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("registered", &self.is_registered())
            .finish()
    }
}

impl Notifier {
    /// Create a notifier with no observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `observer`, replacing any previous one.
    pub fn set(&mut self, observer: Weak<dyn PlayerObserver>) {
        self.observer = Some(observer);
    }

    /// Drop the registration.
    pub fn clear(&mut self) {
        self.observer = None;
    }

    /// Whether a still-live observer is registered.
    pub fn is_registered(&self) -> bool {
        self.observer
            .as_ref()
            .is_some_and(|o| o.strong_count() > 0)
    }

    /// Deliver `event`. Missing observers are skipped and a panicking handler is logged and
    /// swallowed.
    pub fn notify(&self, event: PlayerEvent) {
        let Some(observer) = self.observer.as_ref().and_then(Weak::upgrade) else {
            tracing::trace!(?event, "no live observer");
            return;
        };
        let delivered = catch_unwind(AssertUnwindSafe(|| match event {
            PlayerEvent::Started => observer.on_started(),
            PlayerEvent::Paused => observer.on_paused(),
            PlayerEvent::Resumed => observer.on_resumed(),
            PlayerEvent::Stopped => observer.on_stopped(),
        }));
        if delivered.is_err() {
            tracing::warn!(?event, "observer panicked during notification");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/notify/observer.rs"]
mod tests;
