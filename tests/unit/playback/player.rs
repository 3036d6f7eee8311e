use super::*;
use crate::foundation::clock::ManualClock;
use crate::foundation::error::PlayerError;
use crate::render::recording::RecordingBackend;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const TEN_FRAMES: &str = r##"{
    "version": "1",
    "fps": 10,
    "loop": true,
    "canvas": { "width": 8, "height": 8 },
    "assets": { "dot": { "kind": "solid", "width": 2, "height": 2, "color": "#ff0000" } },
    "frames": [ { "elements": [ { "asset": "dot" } ], "hold": 10 } ]
}"##;

const MALFORMED: &str = r#"{ "version": "1", "fps": 10, "frames": "#;

#[derive(Default)]
struct Events(Mutex<Vec<PlayerEvent>>);

impl Events {
    fn take(&self) -> Vec<PlayerEvent> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl PlayerObserver for Events {
    fn on_started(&self) {
        self.0.lock().unwrap().push(PlayerEvent::Started);
    }
    fn on_paused(&self) {
        self.0.lock().unwrap().push(PlayerEvent::Paused);
    }
    fn on_resumed(&self) {
        self.0.lock().unwrap().push(PlayerEvent::Resumed);
    }
    fn on_stopped(&self) {
        self.0.lock().unwrap().push(PlayerEvent::Stopped);
    }
}

struct Rig {
    player: SpritePlayer,
    clock: ManualClock,
    port: RecordingBackend,
    events: Arc<Events>,
}

fn rig(opts: PlayerOpts) -> Rig {
    let clock = ManualClock::new();
    let port = RecordingBackend::new();
    let mut player = SpritePlayer::with_clock(
        Box::new(port.clone()),
        SurfaceDesc::new(8, 8),
        opts,
        clock.clone(),
    )
    .unwrap();
    let events = Arc::new(Events::default());
    player.set_observer(Arc::downgrade(&events) as Weak<dyn PlayerObserver>);
    Rig {
        player,
        clock,
        port,
        events,
    }
}

fn inline(skip_frame: bool) -> PlayerOpts {
    PlayerOpts {
        skip_frame,
        decode: DecodeMode::Inline,
        loop_override: None,
    }
}

fn ten_frames() -> ResourceHandle {
    ResourceHandle::from_bytes(TEN_FRAMES.as_bytes())
}

fn idx(v: &[u64]) -> Vec<FrameIndex> {
    v.iter().copied().map(FrameIndex).collect()
}

#[test]
fn skip_enabled_submits_only_due_frame() {
    let mut r = rig(inline(true));
    r.player.play(ten_frames());
    assert_eq!(r.player.state(), PlayerState::Playing);
    assert_eq!(r.events.take(), vec![PlayerEvent::Started]);

    r.clock.advance(Duration::from_millis(250));
    let report = r.player.tick();
    assert_eq!(report.submitted, idx(&[2]));
    assert_eq!(r.port.submitted(), idx(&[2]));
}

#[test]
fn skip_disabled_submits_every_intermediate_frame() {
    let mut r = rig(inline(false));
    r.player.play(ten_frames());
    r.clock.advance(Duration::from_millis(250));
    assert_eq!(r.player.tick().submitted, idx(&[0, 1, 2]));

    r.clock.advance(Duration::from_millis(300));
    assert_eq!(r.player.tick().submitted, idx(&[3, 4, 5]));
}

#[test]
fn skip_disabled_burst_replays_every_elapsed_loop() {
    const FOUR_FRAMES: &str = r##"{
        "version": "1",
        "fps": 10,
        "loop": true,
        "canvas": { "width": 8, "height": 8 },
        "assets": { "dot": { "kind": "solid", "width": 2, "height": 2, "color": "#ff0000" } },
        "frames": [ { "elements": [ { "asset": "dot" } ], "hold": 4 } ]
    }"##;
    let mut r = rig(inline(false));
    r.player.play(ResourceHandle::from_bytes(FOUR_FRAMES.as_bytes()));
    assert_eq!(r.player.tick().submitted, idx(&[0]));

    r.clock.advance(Duration::from_millis(1_000));
    let report = r.player.tick();
    assert_eq!(report.submitted.len(), 10);
    assert_eq!(report.submitted, idx(&[1, 2, 3, 0, 1, 2, 3, 0, 1, 2]));
}

#[test]
fn ticks_without_time_advance_do_not_resubmit() {
    let mut r = rig(inline(true));
    r.player.play(ten_frames());
    assert_eq!(r.player.tick().submitted, idx(&[0]));
    assert!(r.player.tick().submitted.is_empty());
    r.clock.advance(Duration::from_millis(99));
    assert!(r.player.tick().submitted.is_empty());
    assert_eq!(r.port.submitted(), idx(&[0]));
}

#[test]
fn malformed_resource_stays_idle_without_started() {
    let mut r = rig(inline(true));
    r.player.play(ResourceHandle::from_bytes(MALFORMED.as_bytes()));
    assert_eq!(r.player.state(), PlayerState::Idle);
    r.player.pause();
    r.player.resume();
    assert_eq!(r.player.state(), PlayerState::Idle);
    assert!(r.player.tick().submitted.is_empty());
    assert!(r.events.take().is_empty());
}

#[test]
fn stop_prevents_further_submissions_and_notifies_once() {
    let mut r = rig(inline(true));
    r.player.play(ten_frames());
    r.clock.advance(Duration::from_millis(100));
    r.player.tick();
    r.player.stop();
    r.player.stop();
    let submitted_at_stop = r.port.submitted();

    for _ in 0..5 {
        r.clock.advance(Duration::from_millis(100));
        assert!(r.player.tick().submitted.is_empty());
    }
    assert_eq!(r.port.submitted(), submitted_at_stop);
    assert_eq!(r.player.state(), PlayerState::Idle);
    assert_eq!(
        r.events.take(),
        vec![PlayerEvent::Started, PlayerEvent::Stopped]
    );
}

#[test]
fn pause_resume_round_trip_does_not_skip() {
    let mut r = rig(inline(true));
    r.player.play(ten_frames());
    r.clock.advance(Duration::from_millis(250));
    assert_eq!(r.player.tick().submitted, idx(&[2]));

    r.player.pause();
    r.player.pause();
    assert_eq!(r.player.state(), PlayerState::Paused);
    r.clock.advance(Duration::from_secs(10));
    assert!(r.player.tick().submitted.is_empty());

    r.player.resume();
    r.player.resume();
    assert!(r.player.tick().submitted.is_empty());
    r.clock.advance(Duration::from_millis(50));
    assert_eq!(r.player.tick().submitted, idx(&[3]));
    assert_eq!(
        r.events.take(),
        vec![
            PlayerEvent::Started,
            PlayerEvent::Paused,
            PlayerEvent::Resumed
        ]
    );
}

#[test]
fn failed_submission_is_retried_next_tick() {
    let mut r = rig(inline(true));
    r.player.play(ten_frames());
    r.port.fail_next_submits(1);
    r.clock.advance(Duration::from_millis(100));
    let report = r.player.tick();
    assert!(report.submitted.is_empty());
    assert_eq!(report.failed, 1);
    assert_eq!(r.player.state(), PlayerState::Playing);

    assert_eq!(r.player.tick().submitted, idx(&[1]));
}

#[test]
fn failed_submission_in_burst_resumes_in_order() {
    let mut r = rig(inline(false));
    r.player.play(ten_frames());
    r.clock.advance(Duration::from_millis(200));
    assert_eq!(r.player.tick().submitted, idx(&[0, 1, 2]));

    r.clock.advance(Duration::from_millis(300));
    r.port.fail_next_submits(1);
    let report = r.player.tick();
    assert!(report.submitted.is_empty());
    assert_eq!(report.failed, 1);
    assert_eq!(r.player.tick().submitted, idx(&[3, 4, 5]));
}

#[test]
fn play_while_playing_replaces_session() {
    let mut r = rig(inline(true));
    r.player.play(ten_frames());
    r.clock.advance(Duration::from_millis(450));
    assert_eq!(r.player.tick().submitted, idx(&[4]));

    r.player.play(ten_frames());
    assert_eq!(r.player.tick().submitted, idx(&[0]));
    assert_eq!(
        r.events.take(),
        vec![
            PlayerEvent::Started,
            PlayerEvent::Stopped,
            PlayerEvent::Started
        ]
    );
}

#[test]
fn skip_policy_change_applies_on_next_tick() {
    let mut r = rig(inline(true));
    r.player.play(ten_frames());
    r.player.tick();
    r.player.set_skip_frame_enabled(false);
    assert!(!r.player.skip_frame_enabled());
    r.clock.advance(Duration::from_millis(300));
    assert_eq!(r.player.tick().submitted, idx(&[1, 2, 3]));
}

#[test]
fn loop_override_clamps_to_last_frame() {
    let mut r = rig(PlayerOpts {
        loop_override: Some(LoopMode::Once),
        ..inline(true)
    });
    r.player.play(ten_frames());
    r.clock.advance(Duration::from_millis(2_500));
    assert_eq!(r.player.tick().submitted, idx(&[9]));
    r.clock.advance(Duration::from_millis(2_500));
    assert!(r.player.tick().submitted.is_empty());
    assert_eq!(r.player.state(), PlayerState::Playing);
}

#[test]
fn destroy_tears_down_and_ignores_later_calls() {
    let mut r = rig(inline(true));
    r.player.play(ten_frames());
    r.player.tick();
    r.player.destroy();
    assert!(r.player.is_destroyed());
    assert_eq!(r.port.teardown_count(), 1);
    assert!(!r.port.is_prepared());

    r.player.play(ten_frames());
    r.clock.advance(Duration::from_millis(500));
    assert!(r.player.tick().submitted.is_empty());
    r.player.destroy();
    assert_eq!(r.port.teardown_count(), 1);
    assert_eq!(
        r.events.take(),
        vec![PlayerEvent::Started, PlayerEvent::Stopped]
    );
}

#[test]
fn prepare_failure_is_surfaced_at_construction() {
    let port = RecordingBackend::new();
    port.fail_next_prepare(RendererError::surface_lost("detached"));
    let err = SpritePlayer::new(
        Box::new(port),
        SurfaceDesc::new(8, 8),
        PlayerOpts::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PlayerError::Renderer(RendererError::SurfaceLost(_))
    ));
}

fn tick_until_not_decoding(r: &mut Rig) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while r.player.state() == PlayerState::Decoding && Instant::now() < deadline {
        r.player.tick();
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn background_decode_starts_on_a_later_tick() {
    let mut r = rig(PlayerOpts::default());
    r.player.play(ten_frames());
    assert_eq!(r.player.state(), PlayerState::Decoding);
    r.player.pause();
    assert_eq!(r.player.state(), PlayerState::Decoding);

    tick_until_not_decoding(&mut r);
    assert_eq!(r.player.state(), PlayerState::Playing);
    assert_eq!(r.events.take(), vec![PlayerEvent::Started]);
    assert_eq!(r.port.submitted(), idx(&[0]));
}

#[test]
fn background_decode_failure_returns_to_idle() {
    let mut r = rig(PlayerOpts::default());
    r.player.play(ResourceHandle::from_bytes(MALFORMED.as_bytes()));
    tick_until_not_decoding(&mut r);
    assert_eq!(r.player.state(), PlayerState::Idle);
    assert!(r.events.take().is_empty());
}

#[test]
fn stop_during_decode_cancels_silently() {
    let mut r = rig(PlayerOpts::default());
    r.player.play(ten_frames());
    r.player.stop();
    assert_eq!(r.player.state(), PlayerState::Idle);
    std::thread::sleep(Duration::from_millis(20));
    r.player.tick();
    assert_eq!(r.player.state(), PlayerState::Idle);
    assert!(r.port.submitted().is_empty());
    assert!(r.events.take().is_empty());
}
