use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::foundation::core::{Affine, BezPath, Canvas, Fps, FrameIndex, Rgba8Premul};
use crate::foundation::error::DecodeError;

/// What happens when playback runs past the last frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Wrap back to frame 0.
    #[default]
    Loop,
    /// Hold the last frame forever.
    Once,
}

/// Dense handle into an [`AssetTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(pub(crate) u32);

impl AssetId {
    /// Raw table slot.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct ImageAsset {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Filled vector path.
#[derive(Clone, Debug)]
pub struct PathAsset {
    /// Path geometry in element-local space.
    pub path: BezPath,
    /// Fill color.
    pub fill: Rgba8Premul,
}

/// Axis-aligned solid rectangle anchored at the element origin.
#[derive(Clone, Copy, Debug)]
pub struct SolidAsset {
    /// Width in element-local units.
    pub width: f64,
    /// Height in element-local units.
    pub height: f64,
    /// Fill color.
    pub color: Rgba8Premul,
}

/// Union of decoded asset kinds a frame can draw.
///
/// SVG documents are rasterized during decode and arrive here as [`Asset::Image`].
#[derive(Clone, Debug)]
pub enum Asset {
    /// Bitmap.
    Image(ImageAsset),
    /// Vector path.
    Path(PathAsset),
    /// Solid rectangle.
    Solid(SolidAsset),
}

/// Shared asset storage referenced by frames. Each asset is stored exactly once.
#[derive(Clone, Debug, Default)]
pub struct AssetTable {
    names: Vec<String>,
    assets: Vec<Asset>,
    by_name: HashMap<String, AssetId>,
}

impl AssetTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an asset under `name`. Re-inserting a name replaces the stored asset and keeps its id.
    pub fn insert(&mut self, name: impl Into<String>, asset: Asset) -> AssetId {
        let name = name.into();
        if let Some(&id) = self.by_name.get(&name) {
            self.assets[id.0 as usize] = asset;
            return id;
        }
        let id = AssetId(self.assets.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.names.push(name);
        self.assets.push(asset);
        id
    }

    /// Look up an asset id by the name used in the resource.
    pub fn id(&self, name: &str) -> Option<AssetId> {
        self.by_name.get(name).copied()
    }

    /// Borrow an asset.
    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(id.0 as usize)
    }

    /// Name an asset was registered under.
    pub fn name(&self, id: AssetId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    /// Return `true` when `id` addresses a stored asset.
    pub fn contains(&self, id: AssetId) -> bool {
        (id.0 as usize) < self.assets.len()
    }

    /// Number of stored assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Return `true` when the table holds no assets.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// One drawable placed in a frame.
#[derive(Clone, Debug)]
pub struct DrawElement {
    /// Asset to draw.
    pub asset: AssetId,
    /// Element-local to canvas transform.
    pub transform: Affine,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Paint order; higher draws later.
    pub z: i32,
}

/// A declarative frame: elements in paint order plus the intended display duration.
#[derive(Clone, Debug)]
pub struct Frame {
    elements: Vec<DrawElement>,
    duration: Duration,
}

impl Frame {
    /// Build a frame. Elements are stably sorted by `z` and opacities clamped to `[0, 1]`.
    pub fn new(mut elements: Vec<DrawElement>, duration: Duration) -> Self {
        for el in &mut elements {
            el.opacity = el.opacity.clamp(0.0, 1.0);
        }
        elements.sort_by_key(|el| el.z);
        Self { elements, duration }
    }

    /// Elements in paint order.
    pub fn elements(&self) -> &[DrawElement] {
        &self.elements
    }

    /// Intended display duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Immutable decoded animation.
///
/// Invariants (checked by [`FrameModel::new`]): at least one frame, and every asset referenced by
/// a frame exists in the asset table.
#[derive(Clone, Debug)]
pub struct FrameModel {
    canvas: Canvas,
    fps: Fps,
    loop_mode: LoopMode,
    frames: Vec<Arc<Frame>>,
    assets: Arc<AssetTable>,
}

impl FrameModel {
    /// Assemble and validate a frame model.
    pub fn new(
        canvas: Canvas,
        fps: Fps,
        loop_mode: LoopMode,
        frames: Vec<Arc<Frame>>,
        assets: AssetTable,
    ) -> Result<Self, DecodeError> {
        if frames.is_empty() {
            return Err(DecodeError::malformed("resource has no frames"));
        }
        for (i, frame) in frames.iter().enumerate() {
            if let Some(el) = frame.elements().iter().find(|el| !assets.contains(el.asset)) {
                return Err(DecodeError::missing_asset(format!(
                    "frame {i} references unknown asset slot {}",
                    el.asset.0
                )));
            }
        }
        Ok(Self {
            canvas,
            fps,
            loop_mode,
            frames,
            assets: Arc::new(assets),
        })
    }

    /// Nominal canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Nominal frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Loop mode declared by the resource.
    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Number of frames, always `>= 1`.
    pub fn frame_count(&self) -> u64 {
        self.frames.len() as u64
    }

    /// Borrow a frame.
    pub fn frame(&self, idx: FrameIndex) -> Option<&Arc<Frame>> {
        self.frames.get(idx.as_usize())
    }

    /// Iterate frames in order.
    pub fn frames(&self) -> impl ExactSizeIterator<Item = &Arc<Frame>> {
        self.frames.iter()
    }

    /// Shared asset table.
    pub fn assets(&self) -> &Arc<AssetTable> {
        &self.assets
    }

    /// Total nominal duration of one pass through the sequence.
    pub fn total_duration(&self) -> Duration {
        self.fps.frames_to_duration(self.frame_count())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/model.rs"]
mod tests;
