use super::*;
use crate::foundation::core::{Canvas, Rgba8Premul};
use crate::frame::model::{Frame, SolidAsset};
use crate::render::present::InMemoryPresenter;
use std::time::Duration;

fn red_square() -> (Arc<AssetTable>, Frame) {
    let mut assets = AssetTable::new();
    let id = assets.insert(
        "red",
        Asset::Solid(SolidAsset {
            width: 4.0,
            height: 4.0,
            color: Rgba8Premul::from_straight_rgba(255, 0, 0, 255),
        }),
    );
    let frame = Frame::new(
        vec![DrawElement {
            asset: id,
            transform: Affine::IDENTITY,
            opacity: 1.0,
            z: 0,
        }],
        Duration::from_millis(100),
    );
    (Arc::new(assets), frame)
}

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

const CANVAS: Canvas = Canvas {
    width: 8,
    height: 8,
};

#[test]
fn submit_before_prepare_is_not_prepared() {
    let (assets, frame) = red_square();
    let mut b = CpuBackend::new(CpuBackendOpts::default());
    let err = b
        .submit_frame(&FrameSubmission {
            index: FrameIndex(0),
            frame: &frame,
            assets: &assets,
            canvas: CANVAS,
        })
        .unwrap_err();
    assert_eq!(err, RendererError::NotPrepared);
}

#[test]
fn solid_element_rasterizes_over_clear_color() {
    let (assets, frame) = red_square();
    let presenter = InMemoryPresenter::new();
    let mut b = CpuBackend::new(CpuBackendOpts::default()).with_presenter(presenter.clone());
    b.prepare(&SurfaceDesc::new(8, 8).with_clear_rgba(Some([0, 0, 255, 255])))
        .unwrap();
    b.submit_frame(&FrameSubmission {
        index: FrameIndex(3),
        frame: &frame,
        assets: &assets,
        canvas: CANVAS,
    })
    .unwrap();

    let (idx, out) = b.last_frame().unwrap();
    assert_eq!(*idx, FrameIndex(3));
    assert!(out.premultiplied);
    assert_eq!(out.data.len(), 8 * 8 * 4);
    assert_eq!(px(out, 1, 1), [255, 0, 0, 255]);
    assert_eq!(px(out, 6, 6), [0, 0, 255, 255]);
    assert_eq!(presenter.indices(), vec![FrameIndex(3)]);
}

#[test]
fn surface_larger_than_canvas_scales_content() {
    let (assets, frame) = red_square();
    let mut b = CpuBackend::new(CpuBackendOpts::default());
    b.prepare(&SurfaceDesc::new(16, 16)).unwrap();
    b.submit_frame(&FrameSubmission {
        index: FrameIndex(0),
        frame: &frame,
        assets: &assets,
        canvas: CANVAS,
    })
    .unwrap();

    let (_, out) = b.last_frame().unwrap();
    assert_eq!(out.width, 16);
    assert_eq!(px(out, 6, 6), [255, 0, 0, 255]);
    assert_eq!(px(out, 12, 12), [0, 0, 0, 0]);
}

#[test]
fn teardown_requires_prepare_again() {
    let (assets, frame) = red_square();
    let mut b = CpuBackend::new(CpuBackendOpts::default().with_clear_rgba(Some([0, 0, 0, 255])));
    b.prepare(&SurfaceDesc::new(8, 8)).unwrap();
    b.teardown();
    let sub = FrameSubmission {
        index: FrameIndex(0),
        frame: &frame,
        assets: &assets,
        canvas: CANVAS,
    };
    assert_eq!(b.submit_frame(&sub), Err(RendererError::NotPrepared));
    b.prepare(&SurfaceDesc::new(8, 8)).unwrap();
    b.submit_frame(&sub).unwrap();
    let (_, out) = b.last_frame().unwrap();
    assert_eq!(px(out, 7, 7), [0, 0, 0, 255]);
}

#[test]
fn element_with_unknown_asset_is_rejected() {
    let (_, frame) = red_square();
    let empty = Arc::new(AssetTable::new());
    let mut b = CpuBackend::new(CpuBackendOpts::default());
    b.prepare(&SurfaceDesc::new(8, 8)).unwrap();
    let err = b
        .submit_frame(&FrameSubmission {
            index: FrameIndex(0),
            frame: &frame,
            assets: &empty,
            canvas: CANVAS,
        })
        .unwrap_err();
    assert!(matches!(err, RendererError::SubmissionRejected(_)));
}
