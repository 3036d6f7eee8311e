use super::*;
use crate::foundation::core::Canvas;
use crate::frame::model::{AssetTable, Frame};
use std::time::Duration;

fn submit(port: &mut dyn RendererPort, idx: u64) -> Result<(), RendererError> {
    let assets = Arc::new(AssetTable::new());
    let frame = Frame::new(Vec::new(), Duration::from_millis(10));
    port.submit_frame(&FrameSubmission {
        index: FrameIndex(idx),
        frame: &frame,
        assets: &assets,
        canvas: Canvas {
            width: 4,
            height: 4,
        },
    })
}

#[test]
fn clones_share_recorded_calls() {
    let probe = RecordingBackend::new();
    let mut port = probe.clone();
    port.prepare(&SurfaceDesc::new(4, 4)).unwrap();
    submit(&mut port, 0).unwrap();
    submit(&mut port, 2).unwrap();
    port.teardown();

    assert_eq!(probe.submitted(), vec![FrameIndex(0), FrameIndex(2)]);
    assert_eq!(
        probe.calls().first(),
        Some(&RecordedCall::Prepare {
            width: 4,
            height: 4
        })
    );
    assert_eq!(probe.teardown_count(), 1);
    assert!(!probe.is_prepared());
}

#[test]
fn unprepared_submit_is_rejected() {
    let mut port = RecordingBackend::new();
    assert_eq!(submit(&mut port, 0), Err(RendererError::NotPrepared));
    assert_eq!(port.rejected_count(), 1);
    assert!(port.submitted().is_empty());
}

#[test]
fn injected_failures_are_consumed_in_order() {
    let probe = RecordingBackend::new();
    let mut port = probe.clone();
    port.prepare(&SurfaceDesc::new(4, 4)).unwrap();
    probe.fail_next_submits(1);

    assert!(matches!(
        submit(&mut port, 1),
        Err(RendererError::SubmissionRejected(_))
    ));
    submit(&mut port, 1).unwrap();
    assert_eq!(
        probe.calls()[1..],
        [
            RecordedCall::Rejected(FrameIndex(1)),
            RecordedCall::Submit(FrameIndex(1))
        ]
    );
}

#[test]
fn injected_prepare_failure_fires_once() {
    let mut port = RecordingBackend::new();
    port.fail_next_prepare(RendererError::surface_lost("gone"));
    assert!(port.prepare(&SurfaceDesc::new(4, 4)).is_err());
    assert!(!port.is_prepared());
    port.prepare(&SurfaceDesc::new(4, 4)).unwrap();
    assert!(port.is_prepared());
}
