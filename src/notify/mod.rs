//! Lifecycle notifications forwarded to a registered observer.

/// Observer trait and the notifier that delivers to it.
pub mod observer;
