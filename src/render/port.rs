use std::sync::Arc;

use crate::foundation::core::{Affine, Canvas, FrameIndex};
use crate::foundation::error::RendererError;
use crate::frame::model::{AssetTable, Frame};

/// Host-supplied description of the presentation surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceDesc {
    /// Surface width in physical pixels.
    pub width: u32,
    /// Surface height in physical pixels.
    pub height: u32,
    /// Physical pixels per logical point, informational for hosts.
    pub scale_factor: f64,
    /// If set, backends clear the surface to this straight-alpha RGBA8 color before drawing.
    pub clear_rgba: Option<[u8; 4]>,
}

impl SurfaceDesc {
    /// Surface of `width x height` physical pixels at scale 1 with a transparent clear.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale_factor: 1.0,
            clear_rgba: None,
        }
    }

    /// Return a copy with a configured clear color.
    pub fn with_clear_rgba(mut self, clear: Option<[u8; 4]>) -> Self {
        self.clear_rgba = clear;
        self
    }

    /// Check dimensions before a backend allocates anything.
    pub fn validate(&self) -> Result<(), RendererError> {
        if self.width == 0 || self.height == 0 {
            return Err(RendererError::surface_lost(format!(
                "surface has zero size ({}x{})",
                self.width, self.height
            )));
        }
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(RendererError::surface_lost(
                "surface scale_factor must be finite and > 0",
            ));
        }
        Ok(())
    }

    /// Map canvas space onto this surface, stretching to fill it.
    ///
    /// Every backend applies this same mapping so that a given frame looks the same on any of them.
    pub fn view_transform(&self, canvas: Canvas) -> Affine {
        let sx = f64::from(self.width) / f64::from(canvas.width.max(1));
        let sy = f64::from(self.height) / f64::from(canvas.height.max(1));
        Affine::scale_non_uniform(sx, sy)
    }
}

/// A rendered frame as RGBA8 pixels.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

/// Everything a backend needs to draw one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameSubmission<'a> {
    /// Index of `frame` within its sequence.
    pub index: FrameIndex,
    /// Frame to draw.
    pub frame: &'a Frame,
    /// Asset table the frame's elements refer to.
    pub assets: &'a Arc<AssetTable>,
    /// Nominal canvas the frame is authored in.
    pub canvas: Canvas,
}

/// Renderer capability set the playback scheduler drives.
///
/// The scheduler never inspects which implementation it holds. `submit_frame` is called on the
/// tick loop's thread at playback cadence; any hand-off to another thread is the backend's
/// business.
pub trait RendererPort: Send {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Bind to a surface. May be called again to rebind after a resize or a lost surface.
    fn prepare(&mut self, surface: &SurfaceDesc) -> Result<(), RendererError>;

    /// Draw one frame. Errors are per-frame; the caller may retry on a later tick.
    fn submit_frame(&mut self, submission: &FrameSubmission<'_>) -> Result<(), RendererError>;

    /// Release all backend resources. Submissions after teardown fail with
    /// [`RendererError::NotPrepared`] until `prepare` is called again.
    fn teardown(&mut self);
}

/// Graphics API family used by the GPU backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GpuApi {
    /// The platform's primary modern API (Metal, Vulkan, or DX12).
    #[default]
    Modern,
    /// OpenGL / GLES, for devices without a modern API.
    Legacy,
}

/// Available backend kinds.
///
/// - `Cpu` is always available.
/// - `Gpu` requires the `gpu` cargo feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// CPU raster backend powered by `vello_cpu`.
    Cpu,
    /// GPU backend powered by `vello` on `wgpu`.
    Gpu(GpuApi),
}

/// Create a renderer backend implementation.
pub fn create_backend(kind: BackendKind) -> Result<Box<dyn RendererPort>, RendererError> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(crate::render::cpu::CpuBackend::new(
            crate::render::cpu::CpuBackendOpts::default(),
        ))),
        #[cfg(feature = "gpu")]
        BackendKind::Gpu(api) => Ok(Box::new(crate::render::gpu::GpuBackend::new(
            crate::render::gpu::GpuBackendOpts { api },
        ))),
        #[cfg(not(feature = "gpu"))]
        BackendKind::Gpu(api) => Err(RendererError::Unavailable(format!(
            "gpu backend ({api:?}) requires the 'gpu' feature"
        ))),
    }
}
