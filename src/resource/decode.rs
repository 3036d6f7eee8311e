use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;

use crate::foundation::core::{Canvas, Fps, Transform2D, Vec2};
use crate::foundation::error::DecodeError;
use crate::frame::model::{
    Asset, AssetTable, DrawElement, Frame, FrameModel, LoopMode, PathAsset, SolidAsset,
};
use crate::resource::handle::{ResourceHandle, normalize_rel_path};
use crate::resource::model::{
    AssetDef, ElementDef, ImageDef, SUPPORTED_VERSIONS, SpriteDocDef, SvgDef, TransformDef,
    VersionProbe,
};
use crate::resource::raster;

/// Upper bound on expanded frame slots (after `hold`), guarding against runaway documents.
const MAX_FRAMES: u64 = 1 << 20;

/// Decode a resource into an immutable [`FrameModel`].
///
/// Decoding is pure with respect to playback: it touches neither renderer nor scheduler state, and
/// the returned model can be shared read-only across threads.
#[tracing::instrument(skip(handle), fields(resource = %handle.describe()))]
pub fn decode(handle: &ResourceHandle) -> Result<FrameModel, DecodeError> {
    let (bytes, base_dir) = handle.load()?;
    let model = decode_bytes(&bytes, base_dir.as_deref())?;
    tracing::debug!(
        frames = model.frame_count(),
        assets = model.assets().len(),
        "decoded resource"
    );
    Ok(model)
}

/// Decode a sprite document from bytes. File-backed assets resolve against `base_dir`.
pub fn decode_bytes(bytes: &[u8], base_dir: Option<&Path>) -> Result<FrameModel, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptySource);
    }

    let probe: VersionProbe = serde_json::from_slice(bytes)
        .map_err(|e| DecodeError::malformed(format!("parse sprite document: {e}")))?;
    let version = probe.version.as_string();
    if !SUPPORTED_VERSIONS.contains(&version.as_str()) {
        return Err(DecodeError::UnsupportedVersion(version));
    }

    let doc: SpriteDocDef = serde_json::from_slice(bytes)
        .map_err(|e| DecodeError::malformed(format!("parse sprite document: {e}")))?;

    let fps = Fps::new(doc.fps.num, doc.fps.den)
        .map_err(|e| DecodeError::malformed(format!("invalid fps: {e}")))?;
    if doc.canvas.width == 0 || doc.canvas.height == 0 {
        return Err(DecodeError::malformed("canvas dimensions must be non-zero"));
    }
    let canvas = Canvas {
        width: doc.canvas.width,
        height: doc.canvas.height,
    };
    let loop_mode = if doc.looping {
        LoopMode::Loop
    } else {
        LoopMode::Once
    };

    let assets = decode_assets(&doc, base_dir)?;
    let frames = build_frames(&doc, &assets, fps)?;

    FrameModel::new(canvas, fps, loop_mode, frames, assets)
}

fn decode_assets(doc: &SpriteDocDef, base_dir: Option<&Path>) -> Result<AssetTable, DecodeError> {
    // Assets are independent; decode them in parallel and insert in name order so ids are stable.
    let decoded = doc
        .assets
        .par_iter()
        .map(|(name, def)| decode_asset(name, def, base_dir).map(|a| (name.clone(), a)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut table = AssetTable::new();
    for (name, asset) in decoded {
        table.insert(name, asset);
    }
    Ok(table)
}

fn decode_asset(name: &str, def: &AssetDef, base_dir: Option<&Path>) -> Result<Asset, DecodeError> {
    match def {
        AssetDef::Image(img) => decode_image_asset(name, img, base_dir),
        AssetDef::Svg(svg) => decode_svg_asset(name, svg, base_dir),
        AssetDef::Path(p) => {
            let d = p.d.trim();
            if d.is_empty() {
                return Err(DecodeError::malformed(format!(
                    "path asset '{name}' has empty path data"
                )));
            }
            let path = kurbo::BezPath::from_svg(d).map_err(|e| {
                DecodeError::malformed(format!("path asset '{name}' has invalid path data: {e}"))
            })?;
            Ok(Asset::Path(PathAsset {
                path,
                fill: p.fill.to_rgba8_premul(),
            }))
        }
        AssetDef::Solid(s) => {
            if !(s.width.is_finite() && s.height.is_finite() && s.width > 0.0 && s.height > 0.0) {
                return Err(DecodeError::malformed(format!(
                    "solid asset '{name}' must have finite, positive width/height"
                )));
            }
            Ok(Asset::Solid(SolidAsset {
                width: s.width,
                height: s.height,
                color: s.color.to_rgba8_premul(),
            }))
        }
    }
}

fn decode_image_asset(
    name: &str,
    def: &ImageDef,
    base_dir: Option<&Path>,
) -> Result<Asset, DecodeError> {
    let image = match (&def.path, &def.rgba) {
        (Some(rel), None) => {
            let bytes = read_asset_bytes(name, rel, base_dir)?;
            raster::decode_image(&bytes)?
        }
        (None, Some(rgba)) => {
            let (Some(w), Some(h)) = (def.width, def.height) else {
                return Err(DecodeError::malformed(format!(
                    "inline image asset '{name}' needs width and height"
                )));
            };
            raster::image_from_straight_rgba(w, h, rgba.clone())?
        }
        _ => {
            return Err(DecodeError::malformed(format!(
                "image asset '{name}' needs exactly one of 'path' or 'rgba'"
            )));
        }
    };
    Ok(Asset::Image(image))
}

fn decode_svg_asset(
    name: &str,
    def: &SvgDef,
    base_dir: Option<&Path>,
) -> Result<Asset, DecodeError> {
    let size = match (def.width, def.height) {
        (Some(w), Some(h)) => Some((w, h)),
        (None, None) => None,
        _ => {
            return Err(DecodeError::malformed(format!(
                "svg asset '{name}' must set both width and height or neither"
            )));
        }
    };
    let image = match (&def.path, &def.markup) {
        (Some(rel), None) => {
            let bytes = read_asset_bytes(name, rel, base_dir)?;
            raster::rasterize_svg(&bytes, size)?
        }
        (None, Some(markup)) => raster::rasterize_svg(markup.as_bytes(), size)?,
        _ => {
            return Err(DecodeError::malformed(format!(
                "svg asset '{name}' needs exactly one of 'path' or 'markup'"
            )));
        }
    };
    Ok(Asset::Image(image))
}

fn read_asset_bytes(name: &str, rel: &str, base_dir: Option<&Path>) -> Result<Vec<u8>, DecodeError> {
    let norm = normalize_rel_path(rel)?;
    let Some(base) = base_dir else {
        return Err(DecodeError::missing_asset(format!(
            "asset '{name}' is file-backed ('{norm}') but the resource has no asset directory"
        )));
    };
    let p = base.join(Path::new(&norm));
    std::fs::read(&p).map_err(|e| {
        DecodeError::missing_asset(format!("asset '{name}' at '{}': {e}", p.display()))
    })
}

fn build_frames(
    doc: &SpriteDocDef,
    assets: &AssetTable,
    fps: Fps,
) -> Result<Vec<Arc<Frame>>, DecodeError> {
    let duration = fps.frame_duration();
    let mut frames = Vec::with_capacity(doc.frames.len());
    let mut total: u64 = 0;

    for (fi, def) in doc.frames.iter().enumerate() {
        if def.hold == 0 {
            return Err(DecodeError::malformed(format!("frame {fi} has hold 0")));
        }
        total = total.saturating_add(u64::from(def.hold));
        if total > MAX_FRAMES {
            return Err(DecodeError::malformed(format!(
                "resource expands to more than {MAX_FRAMES} frames"
            )));
        }

        let elements = def
            .elements
            .iter()
            .enumerate()
            .map(|(ei, el)| build_element(fi, ei, el, assets))
            .collect::<Result<Vec<_>, _>>()?;

        let frame = Arc::new(Frame::new(elements, duration));
        for _ in 0..def.hold {
            frames.push(frame.clone());
        }
    }

    Ok(frames)
}

fn build_element(
    fi: usize,
    ei: usize,
    el: &ElementDef,
    assets: &AssetTable,
) -> Result<DrawElement, DecodeError> {
    let asset = assets.id(&el.asset).ok_or_else(|| {
        DecodeError::missing_asset(format!(
            "frame {fi} element {ei} references unknown asset '{}'",
            el.asset
        ))
    })?;
    if !el.opacity.is_finite() {
        return Err(DecodeError::malformed(format!(
            "frame {fi} element {ei} has non-finite opacity"
        )));
    }
    let transform = to_transform(&el.transform).ok_or_else(|| {
        DecodeError::malformed(format!("frame {fi} element {ei} has non-finite transform"))
    })?;

    Ok(DrawElement {
        asset,
        transform: transform.to_affine(),
        opacity: el.opacity as f32,
        z: el.z,
    })
}

fn to_transform(def: &TransformDef) -> Option<Transform2D> {
    let vals = [
        def.translate.x,
        def.translate.y,
        def.rotation_deg,
        def.scale.x,
        def.scale.y,
        def.anchor.x,
        def.anchor.y,
    ];
    if vals.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(Transform2D {
        translate: Vec2::new(def.translate.x, def.translate.y),
        rotation_rad: def.rotation_deg.to_radians(),
        scale: Vec2::new(def.scale.x, def.scale.y),
        anchor: Vec2::new(def.anchor.x, def.anchor.y),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/resource/decode.rs"]
mod tests;
