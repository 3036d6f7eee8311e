use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::foundation::core::{Affine, BezPath, FrameIndex};
use crate::foundation::error::RendererError;
use crate::frame::model::{Asset, AssetId, AssetTable, DrawElement, ImageAsset};
use crate::render::port::{FrameRGBA, FrameSubmission, GpuApi, RendererPort, SurfaceDesc};
use crate::render::present::FramePresenter;

/// Options for the GPU backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpuBackendOpts {
    /// Graphics API family to request an adapter for.
    pub api: GpuApi,
}

struct GpuTarget {
    width: u32,
    height: u32,
    clear_rgba: Option<[u8; 4]>,
    device: vello::wgpu::Device,
    queue: vello::wgpu::Queue,
    renderer: vello::Renderer,
    texture: vello::wgpu::Texture,
    view: vello::wgpu::TextureView,
    readback: vello::wgpu::Buffer,
    readback_bytes_per_row: u32,
}

/// GPU backend powered by `vello` on `wgpu`.
///
/// Frames are encoded into a `vello::Scene`, rendered offscreen and read back as premultiplied
/// RGBA8, then handed to the configured [`FramePresenter`].
pub struct GpuBackend {
    opts: GpuBackendOpts,
    target: Option<GpuTarget>,
    scene: vello::Scene,
    presenter: Option<Box<dyn FramePresenter>>,
    image_cache: HashMap<AssetId, vello::peniko::ImageData>,
    cache_owner: Weak<AssetTable>,
    last_frame: Option<(FrameIndex, FrameRGBA)>,
}

impl GpuBackend {
    /// Create an unprepared backend. No device is requested until [`RendererPort::prepare`].
    pub fn new(opts: GpuBackendOpts) -> Self {
        Self {
            opts,
            target: None,
            scene: vello::Scene::new(),
            presenter: None,
            image_cache: HashMap::new(),
            cache_owner: Weak::new(),
            last_frame: None,
        }
    }

    /// Attach a presenter that receives every rendered frame.
    pub fn with_presenter(mut self, presenter: impl FramePresenter + 'static) -> Self {
        self.presenter = Some(Box::new(presenter));
        self
    }

    /// Most recently presented frame, if any.
    pub fn last_frame(&self) -> Option<&(FrameIndex, FrameRGBA)> {
        self.last_frame.as_ref()
    }

    fn init_target(&self, surface: &SurfaceDesc) -> Result<GpuTarget, RendererError> {
        let backends = match self.opts.api {
            GpuApi::Modern => vello::wgpu::Backends::PRIMARY,
            GpuApi::Legacy => vello::wgpu::Backends::GL,
        };
        let instance = vello::wgpu::Instance::new(&vello::wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let adapter = pollster::block_on(instance.request_adapter(
            &vello::wgpu::RequestAdapterOptions {
                power_preference: vello::wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            },
        ))
        .map_err(|e| match e {
            vello::wgpu::RequestAdapterError::NotFound { .. } => RendererError::Unavailable(
                format!("no {:?} gpu adapter available", self.opts.api),
            ),
            other => RendererError::Unavailable(format!("wgpu request_adapter failed: {other:?}")),
        })?;

        let (device, queue) =
            pollster::block_on(adapter.request_device(&vello::wgpu::DeviceDescriptor {
                label: None,
                required_features: vello::wgpu::Features::empty(),
                required_limits: vello::wgpu::Limits::default(),
                experimental_features: vello::wgpu::ExperimentalFeatures::default(),
                memory_hints: vello::wgpu::MemoryHints::Performance,
                trace: vello::wgpu::Trace::Off,
            }))
            .map_err(|e| RendererError::Unavailable(format!("wgpu request_device failed: {e:?}")))?;

        let renderer = vello::Renderer::new(&device, vello::RendererOptions::default())
            .map_err(|e| RendererError::Unavailable(format!("vello renderer init failed: {e:?}")))?;

        let (width, height) = (surface.width, surface.height);
        let texture = device.create_texture(&vello::wgpu::TextureDescriptor {
            label: Some("sprite_player_target"),
            size: vello::wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: vello::wgpu::TextureDimension::D2,
            format: vello::wgpu::TextureFormat::Rgba8Unorm,
            usage: vello::wgpu::TextureUsages::STORAGE_BINDING
                | vello::wgpu::TextureUsages::TEXTURE_BINDING
                | vello::wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&vello::wgpu::TextureViewDescriptor::default());

        let bytes_per_row_unpadded = width
            .checked_mul(4)
            .ok_or_else(|| RendererError::surface_lost("render target width overflow"))?;
        let bytes_per_row = align_to(
            bytes_per_row_unpadded,
            vello::wgpu::COPY_BYTES_PER_ROW_ALIGNMENT,
        );
        let buffer_size = u64::from(bytes_per_row)
            .checked_mul(u64::from(height))
            .ok_or_else(|| RendererError::surface_lost("readback buffer size overflow"))?;
        let readback = device.create_buffer(&vello::wgpu::BufferDescriptor {
            label: Some("sprite_player_readback"),
            size: buffer_size,
            usage: vello::wgpu::BufferUsages::MAP_READ | vello::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(GpuTarget {
            width,
            height,
            clear_rgba: surface.clear_rgba,
            device,
            queue,
            renderer,
            texture,
            view,
            readback,
            readback_bytes_per_row: bytes_per_row,
        })
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

    fn image_for(&mut self, id: AssetId, img: &ImageAsset) -> vello::peniko::ImageData {
        if let Some(image) = self.image_cache.get(&id) {
            return image.clone();
        }
        let image = vello::peniko::ImageData {
            data: vello::peniko::Blob::from(img.rgba8_premul.as_ref().clone()),
            format: vello::peniko::ImageFormat::Rgba8,
            alpha_type: vello::peniko::ImageAlphaType::AlphaPremultiplied,
            width: img.width,
            height: img.height,
        };
        self.image_cache.insert(id, image.clone());
        image
    }

    fn encode_element(
        &mut self,
        assets: &AssetTable,
        el: &DrawElement,
        view: Affine,
        clip: vello::kurbo::Rect,
    ) -> Result<(), RendererError> {
        use vello::peniko::{BlendMode, Fill};

        let asset = assets.get(el.asset).ok_or_else(|| {
            RendererError::rejected(format!("asset {} not in table", el.asset.as_u32()))
        })?;
        let opacity = el.opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return Ok(());
        }
        let tr = affine_to_vello(view * el.transform);

        if opacity < 1.0 {
            self.scene.push_layer(
                Fill::NonZero,
                BlendMode::default(),
                opacity,
                vello::kurbo::Affine::IDENTITY,
                &clip,
            );
        }
        match asset {
            Asset::Image(img) => {
                let image = self.image_for(el.asset, img);
                self.scene.draw_image(&image, tr);
            }
            Asset::Path(p) => {
                let [r, g, b, a] = p.fill.to_straight_rgba();
                self.scene.fill(
                    Fill::NonZero,
                    tr,
                    vello::peniko::Color::from_rgba8(r, g, b, a),
                    None,
                    &bezpath_to_vello(&p.path),
                );
            }
            Asset::Solid(s) => {
                let [r, g, b, a] = s.color.to_straight_rgba();
                self.scene.fill(
                    Fill::NonZero,
                    tr,
                    vello::peniko::Color::from_rgba8(r, g, b, a),
                    None,
                    &vello::kurbo::Rect::new(0.0, 0.0, s.width, s.height),
                );
            }
        }
        if opacity < 1.0 {
            self.scene.pop_layer();
        }
        Ok(())
    }
}

impl RendererPort for GpuBackend {
    fn name(&self) -> &'static str {
        match self.opts.api {
            GpuApi::Modern => "gpu",
            GpuApi::Legacy => "gpu-gl",
        }
    }

    fn prepare(&mut self, surface: &SurfaceDesc) -> Result<(), RendererError> {
        surface.validate()?;
        match self.target.as_mut() {
            Some(t) if t.width == surface.width && t.height == surface.height => {
                t.clear_rgba = surface.clear_rgba;
            }
            _ => {
                let target = self.init_target(surface)?;
                self.image_cache.clear();
                self.cache_owner = Weak::new();
                self.target = Some(target);
            }
        }
        tracing::debug!(
            api = ?self.opts.api,
            width = surface.width,
            height = surface.height,
            "gpu backend prepared"
        );
        Ok(())
    }

    fn submit_frame(&mut self, submission: &FrameSubmission<'_>) -> Result<(), RendererError> {
        let (width, height) = match self.target.as_ref() {
            Some(t) => (t.width, t.height),
            None => return Err(RendererError::NotPrepared),
        };
        self.sync_cache_owner(submission.assets);

        let view = SurfaceDesc::new(width, height).view_transform(submission.canvas);
        let clip = vello::kurbo::Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
        self.scene.reset();
        for el in submission.frame.elements() {
            self.encode_element(submission.assets, el, view, clip)?;
        }

        let target = self.target.as_mut().ok_or(RendererError::NotPrepared)?;
        let frame = render_and_read_back(target, &self.scene)?;

        if let Some(presenter) = self.presenter.as_mut() {
            presenter.present(submission.index, &frame)?;
        }
        self.last_frame = Some((submission.index, frame));
        Ok(())
    }

    fn teardown(&mut self) {
        self.target = None;
        self.scene.reset();
        self.image_cache.clear();
        self.cache_owner = Weak::new();
    }
}

fn render_and_read_back(
    target: &mut GpuTarget,
    scene: &vello::Scene,
) -> Result<FrameRGBA, RendererError> {
    let base_color = match target.clear_rgba {
        Some([r, g, b, a]) => vello::peniko::Color::from_rgba8(r, g, b, a),
        None => vello::peniko::Color::from_rgba8(0, 0, 0, 0),
    };
    target
        .renderer
        .render_to_texture(
            &target.device,
            &target.queue,
            scene,
            &target.view,
            &vello::RenderParams {
                base_color,
                width: target.width,
                height: target.height,
                antialiasing_method: vello::AaConfig::Area,
            },
        )
        .map_err(|e| RendererError::rejected(format!("vello render failed: {e:?}")))?;

    let mut encoder = target
        .device
        .create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
            label: Some("sprite_player_readback_encoder"),
        });
    encoder.copy_texture_to_buffer(
        vello::wgpu::TexelCopyTextureInfo {
            texture: &target.texture,
            mip_level: 0,
            origin: vello::wgpu::Origin3d::ZERO,
            aspect: vello::wgpu::TextureAspect::All,
        },
        vello::wgpu::TexelCopyBufferInfo {
            buffer: &target.readback,
            layout: vello::wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(target.readback_bytes_per_row),
                rows_per_image: Some(target.height),
            },
        },
        vello::wgpu::Extent3d {
            width: target.width,
            height: target.height,
            depth_or_array_layers: 1,
        },
    );
    target.queue.submit(Some(encoder.finish()));

    let buffer_slice = target.readback.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer_slice.map_async(vello::wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });
    target
        .device
        .poll(vello::wgpu::PollType::wait_indefinitely())
        .map_err(|e| RendererError::surface_lost(format!("wgpu poll failed: {e:?}")))?;
    rx.recv()
        .map_err(|_| RendererError::surface_lost("readback channel closed"))?
        .map_err(|e| RendererError::surface_lost(format!("readback map failed: {e:?}")))?;

    let mapped = buffer_slice.get_mapped_range();
    let row_bytes = (target.width as usize) * 4;
    let padded_row_bytes = target.readback_bytes_per_row as usize;
    let mut out = Vec::with_capacity(row_bytes * target.height as usize);
    for row in 0..target.height as usize {
        let start = row * padded_row_bytes;
        out.extend_from_slice(&mapped[start..start + row_bytes]);
    }
    drop(mapped);
    target.readback.unmap();

    Ok(FrameRGBA {
        width: target.width,
        height: target.height,
        data: out,
        premultiplied: true,
    })
}

fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

fn affine_to_vello(a: Affine) -> vello::kurbo::Affine {
    vello::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_vello(path: &BezPath) -> vello::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: kurbo::Point| vello::kurbo::Point::new(p.x, p.y);
    let mut out = vello::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
