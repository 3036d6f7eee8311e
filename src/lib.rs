//! Sprite-player plays packaged sprite/vector animations on a host surface.
//!
//! The public API is player-oriented:
//!
//! - Pick a renderer backend with [`create_backend`] and bind it in a [`SpritePlayer`]
//! - Call [`SpritePlayer::play`] with a [`ResourceHandle`]
//! - Drive [`SpritePlayer::tick`] from a display-refresh callback or a [`FixedIntervalTicker`]
//! - Observe lifecycle changes through a [`PlayerObserver`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Decoded frame model.
pub mod frame;
/// Lifecycle notifications.
pub mod notify;
/// Playback scheduler.
pub mod playback;
/// Renderer port and backends.
pub mod render;
/// Resource decoding.
pub mod resource;

pub use crate::foundation::clock::{Clock, ManualClock, SystemClock};
pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Fps, FrameIndex, Point, Rect, Rgba8Premul, Transform2D, Vec2,
};
pub use crate::foundation::error::{
    DecodeError, PlayerError, PlayerResult, RendererError,
};

pub use crate::frame::model::{
    Asset, AssetId, AssetTable, DrawElement, Frame, FrameModel, ImageAsset, LoopMode, PathAsset,
    SolidAsset,
};
pub use crate::notify::observer::{PlayerEvent, PlayerObserver};
pub use crate::playback::player::{DecodeMode, PlayerOpts, PlayerState, SpritePlayer, TickReport};
pub use crate::playback::ticker::{FixedIntervalTicker, RunSummary};
pub use crate::playback::timing::due_index;
pub use crate::render::cpu::{CpuBackend, CpuBackendOpts};
#[cfg(feature = "gpu")]
pub use crate::render::gpu::{GpuBackend, GpuBackendOpts};
pub use crate::render::port::{
    BackendKind, FrameRGBA, FrameSubmission, GpuApi, RendererPort, SurfaceDesc, create_backend,
};
pub use crate::render::present::{FramePresenter, InMemoryPresenter};
pub use crate::render::recording::{RecordedCall, RecordingBackend};
pub use crate::resource::decode::{decode, decode_bytes};
pub use crate::resource::handle::ResourceHandle;
