use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct StartedOnly {
    started: AtomicUsize,
}

impl PlayerObserver for StartedOnly {
    fn on_started(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }
}

struct Silent;

impl PlayerObserver for Silent {}

struct Panics;

impl PlayerObserver for Panics {
    fn on_paused(&self) {
        panic!("observer bug");
    }
}

#[test]
fn partial_observer_receives_only_what_it_handles() {
    let obs = Arc::new(StartedOnly::default());
    let mut n = Notifier::new();
    let weak: Weak<dyn PlayerObserver> = Arc::downgrade(&obs) as Weak<dyn PlayerObserver>;
    n.set(weak);

    n.notify(PlayerEvent::Started);
    n.notify(PlayerEvent::Paused);
    n.notify(PlayerEvent::Resumed);
    n.notify(PlayerEvent::Stopped);
    assert_eq!(obs.started.load(Ordering::SeqCst), 1);
}

#[test]
fn observer_with_no_handlers_is_tolerated() {
    let obs: Arc<dyn PlayerObserver> = Arc::new(Silent);
    let mut n = Notifier::new();
    n.set(Arc::downgrade(&obs));
    for ev in [
        PlayerEvent::Started,
        PlayerEvent::Paused,
        PlayerEvent::Resumed,
        PlayerEvent::Stopped,
    ] {
        n.notify(ev);
    }
    assert!(n.is_registered());
}

#[test]
fn dropped_observer_makes_delivery_a_noop() {
    let obs = Arc::new(StartedOnly::default());
    let mut n = Notifier::new();
    n.set(Arc::downgrade(&obs) as Weak<dyn PlayerObserver>);
    drop(obs);
    assert!(!n.is_registered());
    n.notify(PlayerEvent::Started);
}

#[test]
fn replacing_observer_does_not_stack() {
    let first = Arc::new(StartedOnly::default());
    let second = Arc::new(StartedOnly::default());
    let mut n = Notifier::new();
    n.set(Arc::downgrade(&first) as Weak<dyn PlayerObserver>);
    n.set(Arc::downgrade(&second) as Weak<dyn PlayerObserver>);
    n.notify(PlayerEvent::Started);
    assert_eq!(first.started.load(Ordering::SeqCst), 0);
    assert_eq!(second.started.load(Ordering::SeqCst), 1);

    n.clear();
    n.notify(PlayerEvent::Started);
    assert_eq!(second.started.load(Ordering::SeqCst), 1);
}

#[test]
fn panicking_observer_is_contained() {
    let obs: Arc<dyn PlayerObserver> = Arc::new(Panics);
    let mut n = Notifier::new();
    n.set(Arc::downgrade(&obs));
    n.notify(PlayerEvent::Paused);
    n.notify(PlayerEvent::Stopped);
}
