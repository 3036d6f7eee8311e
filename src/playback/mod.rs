//! Playback scheduling: the player state machine, per-session timing and tick drivers.

/// The player and its configuration.
pub mod player;
pub(crate) mod session;
/// Fixed-interval tick driver.
pub mod ticker;
/// Due-frame computation and the skip-frame policy.
pub mod timing;
