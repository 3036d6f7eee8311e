use std::sync::Arc;

use crate::foundation::error::DecodeError;
use crate::frame::model::ImageAsset;

/// Largest raster edge accepted for decoded or rasterized assets.
const MAX_DIM: u32 = 16_384;

/// Decode encoded image bytes (PNG, JPEG, ...) and convert to premultiplied RGBA8.
pub(crate) fn decode_image(bytes: &[u8]) -> Result<ImageAsset, DecodeError> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| DecodeError::malformed(format!("decode image: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    check_dims(width, height)?;

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(ImageAsset {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Build an image from inline straight-alpha RGBA8 pixels.
pub(crate) fn image_from_straight_rgba(
    width: u32,
    height: u32,
    mut rgba: Vec<u8>,
) -> Result<ImageAsset, DecodeError> {
    check_dims(width, height)?;
    let expected = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4);
    if rgba.len() != expected {
        return Err(DecodeError::malformed(format!(
            "inline image is {width}x{height} but carries {} bytes (expected {expected})",
            rgba.len()
        )));
    }
    premultiply_rgba8_in_place(&mut rgba);
    Ok(ImageAsset {
        width,
        height,
        rgba8_premul: Arc::new(rgba),
    })
}

/// Parse an SVG document and rasterize it into a premultiplied image.
///
/// `size` overrides the raster size; the document's intrinsic size is used otherwise.
pub(crate) fn rasterize_svg(
    bytes: &[u8],
    size: Option<(u32, u32)>,
) -> Result<ImageAsset, DecodeError> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| DecodeError::malformed(format!("parse svg: {e}")))?;

    let (width, height) = match size {
        Some(wh) => wh,
        None => {
            let s = tree.size();
            (to_px(s.width())?, to_px(s.height())?)
        }
    };
    check_dims(width, height)?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| DecodeError::malformed("failed to allocate svg pixmap"))?;
    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    // tiny-skia pixmaps are already premultiplied RGBA8.
    Ok(ImageAsset {
        width,
        height,
        rgba8_premul: Arc::new(pixmap.take()),
    })
}

fn to_px(v: f32) -> Result<u32, DecodeError> {
    if !v.is_finite() || v <= 0.0 {
        return Err(DecodeError::malformed("svg has invalid width/height"));
    }
    Ok((v.ceil() as u32).max(1))
}

fn check_dims(width: u32, height: u32) -> Result<(), DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::malformed("image dimensions must be non-zero"));
    }
    if width > MAX_DIM || height > MAX_DIM {
        return Err(DecodeError::malformed(format!(
            "image size too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }
    Ok(())
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resource/raster.rs"]
mod tests;
