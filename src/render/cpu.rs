use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::foundation::core::{Affine, BezPath, FrameIndex};
use crate::foundation::error::RendererError;
use crate::frame::model::{Asset, AssetId, AssetTable, DrawElement, ImageAsset};
use crate::render::port::{FrameRGBA, FrameSubmission, RendererPort, SurfaceDesc};
use crate::render::present::FramePresenter;

/// Options for the CPU backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackendOpts {
    /// Fallback clear color used when the surface does not configure one.
    pub clear_rgba: Option<[u8; 4]>,
}

impl CpuBackendOpts {
    /// Return options with a configured fallback clear color.
    pub fn with_clear_rgba(mut self, clear: Option<[u8; 4]>) -> Self {
        self.clear_rgba = clear;
        self
    }
}

struct CpuTarget {
    width: u16,
    height: u16,
    clear_rgba: Option<[u8; 4]>,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

/// CPU raster backend powered by `vello_cpu`.
///
/// Each submitted frame is rasterized into premultiplied RGBA8, handed to the configured
/// [`FramePresenter`] (if any) and kept as the last presented frame.
pub struct CpuBackend {
    opts: CpuBackendOpts,
    target: Option<CpuTarget>,
    presenter: Option<Box<dyn FramePresenter>>,
    image_cache: HashMap<AssetId, ImagePaint>,
    cache_owner: Weak<AssetTable>,
    last_frame: Option<(FrameIndex, FrameRGBA)>,
}

#[derive(Clone)]
struct ImagePaint {
    paint: vello_cpu::Image,
    w: u32,
    h: u32,
}

impl CpuBackend {
    /// Create an unprepared backend.
    pub fn new(opts: CpuBackendOpts) -> Self {
        Self {
            opts,
            target: None,
            presenter: None,
            image_cache: HashMap::new(),
            cache_owner: Weak::new(),
            last_frame: None,
        }
    }

    /// Attach a presenter that receives every rasterized frame.
    pub fn with_presenter(mut self, presenter: impl FramePresenter + 'static) -> Self {
        self.presenter = Some(Box::new(presenter));
        self
    }

    /// Most recently presented frame, if any.
    pub fn last_frame(&self) -> Option<&(FrameIndex, FrameRGBA)> {
        self.last_frame.as_ref()
    }

    fn sync_cache_owner(&mut self, assets: &Arc<AssetTable>) {
        let same = self
            .cache_owner
            .upgrade()
            .is_some_and(|owner| Arc::ptr_eq(&owner, assets));
        if !same {
            self.image_cache.clear();
            self.cache_owner = Arc::downgrade(assets);
        }
    }

    fn image_paint_for(
        &mut self,
        id: AssetId,
        image: &ImageAsset,
    ) -> Result<ImagePaint, RendererError> {
        if let Some(p) = self.image_cache.get(&id) {
            return Ok(p.clone());
        }
        let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
        let out = ImagePaint {
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            w: image.width,
            h: image.height,
        };
        self.image_cache.insert(id, out.clone());
        Ok(out)
    }

    fn draw_element(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        assets: &AssetTable,
        el: &DrawElement,
        view: Affine,
    ) -> Result<(), RendererError> {
        let asset = assets.get(el.asset).ok_or_else(|| {
            RendererError::rejected(format!("asset {} not in table", el.asset.as_u32()))
        })?;
        let opacity = el.opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return Ok(());
        }
        let tr = view * el.transform;

        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(tr));
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        match asset {
            Asset::Image(image) => {
                let p = self.image_paint_for(el.asset, image)?;
                ctx.set_paint(p.paint);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(p.w),
                    f64::from(p.h),
                ));
            }
            Asset::Path(p) => {
                let [r, g, b, a] = p.fill.to_straight_rgba();
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                ctx.fill_path(&bezpath_to_cpu(&p.path));
            }
            Asset::Solid(s) => {
                let [r, g, b, a] = s.color.to_straight_rgba();
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, s.width, s.height));
            }
        }
        if opacity < 1.0 {
            ctx.pop_layer();
        }
        Ok(())
    }
}

impl RendererPort for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn prepare(&mut self, surface: &SurfaceDesc) -> Result<(), RendererError> {
        surface.validate()?;
        let width: u16 = surface
            .width
            .try_into()
            .map_err(|_| RendererError::surface_lost("surface width exceeds u16"))?;
        let height: u16 = surface
            .height
            .try_into()
            .map_err(|_| RendererError::surface_lost("surface height exceeds u16"))?;

        let target = match self.target.take() {
            Some(t) if t.width == width && t.height == height => CpuTarget {
                clear_rgba: surface.clear_rgba.or(self.opts.clear_rgba),
                ..t
            },
            _ => CpuTarget {
                width,
                height,
                clear_rgba: surface.clear_rgba.or(self.opts.clear_rgba),
                ctx: vello_cpu::RenderContext::new(width, height),
                pixmap: vello_cpu::Pixmap::new(width, height),
            },
        };
        tracing::debug!(width, height, "cpu backend prepared");
        self.target = Some(target);
        Ok(())
    }

    fn submit_frame(&mut self, submission: &FrameSubmission<'_>) -> Result<(), RendererError> {
        let mut target = self.target.take().ok_or(RendererError::NotPrepared)?;
        let res = self.rasterize(&mut target, submission);
        self.target = Some(target);
        let frame = res?;

        if let Some(presenter) = self.presenter.as_mut() {
            presenter.present(submission.index, &frame)?;
        }
        self.last_frame = Some((submission.index, frame));
        Ok(())
    }

    fn teardown(&mut self) {
        self.target = None;
        self.image_cache.clear();
        self.cache_owner = Weak::new();
    }
}

impl CpuBackend {
    fn rasterize(
        &mut self,
        target: &mut CpuTarget,
        submission: &FrameSubmission<'_>,
    ) -> Result<FrameRGBA, RendererError> {
        self.sync_cache_owner(submission.assets);

        let view = SurfaceDesc::new(u32::from(target.width), u32::from(target.height))
            .view_transform(submission.canvas);
        let ctx = &mut target.ctx;
        ctx.reset();

        // render_to_pixmap overwrites the target, so the clear is drawn as the first fill.
        if let Some([r, g, b, a]) = target.clear_rgba {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(target.width),
                f64::from(target.height),
            ));
        }

        for el in submission.frame.elements() {
            self.draw_element(ctx, submission.assets, el, view)?;
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut target.pixmap);

        Ok(FrameRGBA {
            width: u32::from(target.width),
            height: u32::from(target.height),
            data: target.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> Result<vello_cpu::Pixmap, RendererError> {
    let w: u16 = width
        .try_into()
        .map_err(|_| RendererError::rejected("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| RendererError::rejected("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(RendererError::rejected("image byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
