//! Geometric editing effects applied uniformly to a base image and its gain map.
//!
//! Grounded on the teacher's `ultrahdr/encoder.rs`/`decoder.rs` plumbing for
//! resizing decoded frames, generalized to the fuller effect set (crop,
//! mirror, rotate, resize) this crate exposes through a single ordered
//! effect list.

use crate::buffer::{MonoImage, YuvImage};
use crate::error::{Result, UhdrError};

/// Largest single temporary buffer this module will allocate while applying
/// an effect chain, sized for a 4K 4:2:0 frame (`3840 * 2160 * 3 / 2`
/// bytes). Effects producing a larger intermediate are rejected rather than
/// silently allocating unbounded memory.
pub const MAX_BUFFER_SIZE: usize = 3840 * 2160 * 3 / 2;

/// One geometric edit. Effects are applied in list order to both the base
/// image and the gain map, each scaled to its own resolution.
#[derive(Debug, Clone, Copy)]
pub enum EditEffect {
    Crop { x: u32, y: u32, width: u32, height: u32 },
    MirrorHorizontal,
    MirrorVertical,
    Rotate90,
    Rotate180,
    Rotate270,
    Resize { width: u32, height: u32 },
}

fn check_buffer_size(width: u32, height: u32) -> Result<()> {
    let size = (width as usize) * (height as usize) * 3 / 2;
    if size > MAX_BUFFER_SIZE {
        return Err(UhdrError::InsufficientResource(format!(
            "{width}x{height} exceeds the maximum working-buffer size"
        )));
    }
    Ok(())
}

/// Applies `effects` in order to both `base` and `map`, keeping the map's
/// resolution proportional to the base's at every step (spec section 4.6's
/// invariant: `baseW % mapW == 0` and `baseH % mapH == 0` with equal ratios).
/// Crop and resize parameters are given in base-image coordinates and are
/// scaled down by the base/map ratio before being applied to the map;
/// mirror and rotate pass through unchanged since they preserve the ratio.
pub fn add_effects(base: YuvImage, map: MonoImage, effects: &[EditEffect]) -> Result<(YuvImage, MonoImage)> {
    let mut base = base;
    let mut map = map;
    for effect in effects {
        let (scale_x, scale_y) = map_scale_factors(&base, &map)?;
        let map_effect = scale_effect_for_map(*effect, scale_x, scale_y)?;
        base = apply_to_yuv(base, *effect)?;
        map = apply_to_mono(map, map_effect)?;
        if base.width % 2 != 0 || base.height % 2 != 0 {
            return Err(UhdrError::UnsupportedWidthHeight(format!(
                "{}x{} after {effect:?}",
                base.width, base.height
            )));
        }
    }
    Ok((base, map))
}

/// Applies `effects` in order to a base image alone, with no paired gain
/// map (the plain-JPEG output path, which never materializes a gain map).
pub fn apply_effects_to_yuv(base: YuvImage, effects: &[EditEffect]) -> Result<YuvImage> {
    let mut base = base;
    for effect in effects {
        base = apply_to_yuv(base, *effect)?;
    }
    Ok(base)
}

/// Computes the base/map resolution ratio, requiring it be an integral,
/// equal-on-both-axes factor.
fn map_scale_factors(base: &YuvImage, map: &MonoImage) -> Result<(u32, u32)> {
    if base.width % map.width != 0 || base.height % map.height != 0 {
        return Err(UhdrError::UnsupportedMapScaleFactor(format!(
            "base {}x{} is not an integral multiple of map {}x{}",
            base.width, base.height, map.width, map.height
        )));
    }
    Ok((base.width / map.width, base.height / map.height))
}

/// Rewrites an effect expressed in base-image coordinates into the
/// equivalent effect in map coordinates, given the base/map scale factor.
fn scale_effect_for_map(effect: EditEffect, scale_x: u32, scale_y: u32) -> Result<EditEffect> {
    match effect {
        EditEffect::Crop { x, y, width, height } => {
            if x % scale_x != 0 || y % scale_y != 0 || width % scale_x != 0 || height % scale_y != 0 {
                return Err(UhdrError::InvalidCropping(format!(
                    "crop rect ({x},{y},{width},{height}) does not divide evenly by the map scale factor ({scale_x},{scale_y})"
                )));
            }
            Ok(EditEffect::Crop {
                x: x / scale_x,
                y: y / scale_y,
                width: width / scale_x,
                height: height / scale_y,
            })
        }
        EditEffect::Resize { width, height } => {
            if width % scale_x != 0 || height % scale_y != 0 {
                return Err(UhdrError::UnsupportedMapScaleFactor(format!(
                    "resize target {width}x{height} does not divide evenly by the map scale factor ({scale_x},{scale_y})"
                )));
            }
            Ok(EditEffect::Resize {
                width: width / scale_x,
                height: height / scale_y,
            })
        }
        other => Ok(other),
    }
}

fn apply_to_yuv(img: YuvImage, effect: EditEffect) -> Result<YuvImage> {
    check_buffer_size(img.width, img.height)?;
    match effect {
        EditEffect::Crop { x, y, width, height } => crop_yuv(img, x, y, width, height),
        EditEffect::MirrorHorizontal => mirror_h_yuv(img),
        EditEffect::MirrorVertical => mirror_v_yuv(img),
        EditEffect::Rotate90 => rotate_yuv(img, Rotation::R90),
        EditEffect::Rotate180 => rotate_yuv(img, Rotation::R180),
        EditEffect::Rotate270 => rotate_yuv(img, Rotation::R270),
        EditEffect::Resize { width, height } => resize_yuv(img, width, height),
    }
}

fn apply_to_mono(img: MonoImage, effect: EditEffect) -> Result<MonoImage> {
    match effect {
        EditEffect::Crop { x, y, width, height } => crop_mono(img, x, y, width, height),
        EditEffect::MirrorHorizontal => mirror_h_mono(img),
        EditEffect::MirrorVertical => mirror_v_mono(img),
        EditEffect::Rotate90 => rotate_mono(img, Rotation::R90),
        EditEffect::Rotate180 => rotate_mono(img, Rotation::R180),
        EditEffect::Rotate270 => rotate_mono(img, Rotation::R270),
        EditEffect::Resize { width, height } => resize_mono(img, width, height),
    }
}

#[derive(Clone, Copy)]
enum Rotation {
    R90,
    R180,
    R270,
}

fn crop_yuv(img: YuvImage, x: u32, y: u32, width: u32, height: u32) -> Result<YuvImage> {
    if x % 2 != 0 || y % 2 != 0 || width % 2 != 0 || height % 2 != 0 {
        return Err(UhdrError::InvalidCropping("crop rect must be even-aligned for 4:2:0".into()));
    }
    if x + width > img.width || y + height > img.height {
        return Err(UhdrError::InvalidCropping(format!(
            "crop rect ({x},{y},{width},{height}) exceeds image {}x{}",
            img.width, img.height
        )));
    }
    let mut y_plane = vec![0u8; (width * height) as usize];
    for row in 0..height {
        let src_start = ((y + row) * img.y_stride + x) as usize;
        let dst_start = (row * width) as usize;
        y_plane[dst_start..dst_start + width as usize]
            .copy_from_slice(&img.y_plane[src_start..src_start + width as usize]);
    }
    let (cw, ch) = (width / 2, height / 2);
    let (cx, cy) = (x / 2, y / 2);
    let mut u_plane = vec![0u8; (cw * ch) as usize];
    let mut v_plane = vec![0u8; (cw * ch) as usize];
    for row in 0..ch {
        let u_src = ((cy + row) * img.u_stride + cx) as usize;
        let v_src = ((cy + row) * img.v_stride + cx) as usize;
        let dst = (row * cw) as usize;
        u_plane[dst..dst + cw as usize].copy_from_slice(&img.u_plane[u_src..u_src + cw as usize]);
        v_plane[dst..dst + cw as usize].copy_from_slice(&img.v_plane[v_src..v_src + cw as usize]);
    }
    YuvImage::new(width, height, width, cw, cw, y_plane, u_plane, v_plane, img.gamut, img.transfer)
}

fn crop_mono(img: MonoImage, x: u32, y: u32, width: u32, height: u32) -> Result<MonoImage> {
    if x + width > img.width || y + height > img.height {
        return Err(UhdrError::InvalidCropping(format!(
            "crop rect ({x},{y},{width},{height}) exceeds image {}x{}",
            img.width, img.height
        )));
    }
    let mut plane = vec![0u8; (width * height) as usize];
    for row in 0..height {
        let src_start = ((y + row) * img.stride + x) as usize;
        let dst_start = (row * width) as usize;
        plane[dst_start..dst_start + width as usize]
            .copy_from_slice(&img.plane[src_start..src_start + width as usize]);
    }
    MonoImage::new(width, height, width, plane)
}

fn mirror_h_yuv(img: YuvImage) -> Result<YuvImage> {
    let (w, h) = (img.width, img.height);
    let y_plane = mirror_rows_h(&img.y_plane, img.y_stride, w, h);
    let cw = w / 2;
    let ch = h / 2;
    let u_plane = mirror_rows_h(&img.u_plane, img.u_stride, cw, ch);
    let v_plane = mirror_rows_h(&img.v_plane, img.v_stride, cw, ch);
    YuvImage::new(w, h, w, cw, cw, y_plane, u_plane, v_plane, img.gamut, img.transfer)
}

fn mirror_v_yuv(img: YuvImage) -> Result<YuvImage> {
    let (w, h) = (img.width, img.height);
    let y_plane = mirror_rows_v(&img.y_plane, img.y_stride, w, h);
    let cw = w / 2;
    let ch = h / 2;
    let u_plane = mirror_rows_v(&img.u_plane, img.u_stride, cw, ch);
    let v_plane = mirror_rows_v(&img.v_plane, img.v_stride, cw, ch);
    YuvImage::new(w, h, w, cw, cw, y_plane, u_plane, v_plane, img.gamut, img.transfer)
}

fn mirror_h_mono(img: MonoImage) -> Result<MonoImage> {
    let plane = mirror_rows_h(&img.plane, img.stride, img.width, img.height);
    MonoImage::new(img.width, img.height, img.width, plane)
}

fn mirror_v_mono(img: MonoImage) -> Result<MonoImage> {
    let plane = mirror_rows_v(&img.plane, img.stride, img.width, img.height);
    MonoImage::new(img.width, img.height, img.width, plane)
}

fn mirror_rows_h(src: &[u8], stride: u32, w: u32, h: u32) -> Vec<u8> {
    let mut out = vec![0u8; (w * h) as usize];
    for row in 0..h {
        let src_row = &src[(row * stride) as usize..(row * stride + w) as usize];
        let dst_row = &mut out[(row * w) as usize..(row * w + w) as usize];
        for i in 0..w as usize {
            dst_row[i] = src_row[w as usize - 1 - i];
        }
    }
    out
}

fn mirror_rows_v(src: &[u8], stride: u32, w: u32, h: u32) -> Vec<u8> {
    let mut out = vec![0u8; (w * h) as usize];
    for row in 0..h {
        let src_row_idx = h - 1 - row;
        let src_row = &src[(src_row_idx * stride) as usize..(src_row_idx * stride + w) as usize];
        let dst_row = &mut out[(row * w) as usize..(row * w + w) as usize];
        dst_row.copy_from_slice(src_row);
    }
    out
}

fn rotate_plane(src: &[u8], stride: u32, w: u32, h: u32, rotation: Rotation) -> (Vec<u8>, u32, u32) {
    match rotation {
        Rotation::R180 => {
            let mut out = vec![0u8; (w * h) as usize];
            for y in 0..h {
                for x in 0..w {
                    let s = src[(y * stride + x) as usize];
                    let dx = w - 1 - x;
                    let dy = h - 1 - y;
                    out[(dy * w + dx) as usize] = s;
                }
            }
            (out, w, h)
        }
        Rotation::R90 => {
            let (new_w, new_h) = (h, w);
            let mut out = vec![0u8; (new_w * new_h) as usize];
            for y in 0..h {
                for x in 0..w {
                    let s = src[(y * stride + x) as usize];
                    let dx = h - 1 - y;
                    let dy = x;
                    out[(dy * new_w + dx) as usize] = s;
                }
            }
            (out, new_w, new_h)
        }
        Rotation::R270 => {
            let (new_w, new_h) = (h, w);
            let mut out = vec![0u8; (new_w * new_h) as usize];
            for y in 0..h {
                for x in 0..w {
                    let s = src[(y * stride + x) as usize];
                    let dx = y;
                    let dy = w - 1 - x;
                    out[(dy * new_w + dx) as usize] = s;
                }
            }
            (out, new_w, new_h)
        }
    }
}

fn rotate_yuv(img: YuvImage, rotation: Rotation) -> Result<YuvImage> {
    let (y_plane, new_w, new_h) = rotate_plane(&img.y_plane, img.y_stride, img.width, img.height, rotation);
    let cw = img.width / 2;
    let ch = img.height / 2;
    let (u_plane, new_cw, new_ch) = rotate_plane(&img.u_plane, img.u_stride, cw, ch, rotation);
    let (v_plane, _, _) = rotate_plane(&img.v_plane, img.v_stride, cw, ch, rotation);
    let _ = (new_cw, new_ch);
    YuvImage::new(
        new_w,
        new_h,
        new_w,
        new_w / 2,
        new_w / 2,
        y_plane,
        u_plane,
        v_plane,
        img.gamut,
        img.transfer,
    )
}

fn rotate_mono(img: MonoImage, rotation: Rotation) -> Result<MonoImage> {
    let (plane, new_w, new_h) = rotate_plane(&img.plane, img.stride, img.width, img.height, rotation);
    MonoImage::new(new_w, new_h, new_w, plane)
}

fn resize_mono(img: MonoImage, width: u32, height: u32) -> Result<MonoImage> {
    if width == 0 || height == 0 {
        return Err(UhdrError::UnsupportedWidthHeight(format!("{width}x{height}")));
    }
    check_buffer_size(width, height)?;
    let mut plane = vec![0u8; (width * height) as usize];
    for y in 0..height {
        let sy = (y * img.height) / height;
        for x in 0..width {
            let sx = (x * img.width) / width;
            plane[(y * width + x) as usize] = img.at(sx, sy);
        }
    }
    MonoImage::new(width, height, width, plane)
}

fn resize_yuv(img: YuvImage, width: u32, height: u32) -> Result<YuvImage> {
    if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
        return Err(UhdrError::UnsupportedWidthHeight(format!("{width}x{height}")));
    }
    check_buffer_size(width, height)?;
    let mut y_plane = vec![0u8; (width * height) as usize];
    for y in 0..height {
        let sy = (y * img.height) / height;
        for x in 0..width {
            let sx = (x * img.width) / width;
            y_plane[(y * width + x) as usize] = img.y_at(sx, sy);
        }
    }
    let (cw, ch) = (width / 2, height / 2);
    let mut u_plane = vec![0u8; (cw * ch) as usize];
    let mut v_plane = vec![0u8; (cw * ch) as usize];
    for cy in 0..ch {
        let sy = (cy * 2 * img.height) / height;
        for cx in 0..cw {
            let sx = (cx * 2 * img.width) / width;
            let (u, v) = img.chroma_at(sx, sy);
            u_plane[(cy * cw + cx) as usize] = u;
            v_plane[(cy * cw + cx) as usize] = v;
        }
    }
    YuvImage::new(width, height, width, cw, cw, y_plane, u_plane, v_plane, img.gamut, img.transfer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{ColorGamut, ColorTransfer};

    fn sample_yuv(w: u32, h: u32) -> YuvImage {
        let y_plane: Vec<u8> = (0..w * h).map(|i| (i % 256) as u8).collect();
        let c = vec![128u8; ((w / 2) * (h / 2)) as usize];
        YuvImage::new(w, h, w, w / 2, w / 2, y_plane, c.clone(), c, ColorGamut::Bt709, ColorTransfer::Srgb).unwrap()
    }

    fn sample_mono(w: u32, h: u32) -> MonoImage {
        MonoImage::filled(w, h, 64)
    }

    #[test]
    fn crop_losslessly_extracts_region() {
        let img = sample_yuv(8, 8);
        let cropped = crop_yuv(img, 2, 2, 4, 4).unwrap();
        assert_eq!(cropped.width, 4);
        assert_eq!(cropped.height, 4);
    }

    #[test]
    fn mirror_horizontal_is_involutive() {
        let img = sample_yuv(8, 8);
        let once = mirror_h_yuv(img.clone()).unwrap();
        let twice = mirror_h_yuv(once).unwrap();
        assert_eq!(twice.y_plane, img.y_plane);
    }

    #[test]
    fn rotate_90_four_times_is_identity() {
        let img = sample_yuv(8, 4);
        let mut current = img.clone();
        for _ in 0..4 {
            current = rotate_yuv(current, Rotation::R90).unwrap();
        }
        assert_eq!(current.width, img.width);
        assert_eq!(current.height, img.height);
        assert_eq!(current.y_plane, img.y_plane);
    }

    #[test]
    fn add_effects_keeps_base_and_map_proportional() {
        // base starts at 8x8, map at 4x4 -> scale factor 2. Resizing the
        // base to 4x4 must resize the map to 2x2, preserving the ratio.
        let base = sample_yuv(8, 8);
        let map = sample_mono(4, 4);
        let (base2, map2) = add_effects(base, map, &[EditEffect::Resize { width: 4, height: 4 }]).unwrap();
        assert_eq!(base2.width, 4);
        assert_eq!(map2.width, 2);
        assert_eq!(base2.width / map2.width, 2);
        assert_eq!(base2.height / map2.height, 2);
    }

    #[test]
    fn add_effects_scales_crop_rect_to_map_coordinates() {
        // base 8x8, map 4x4 -> scale 2. Cropping the base to a 4x4 region at
        // (2,2) must crop the map to a 2x2 region at (1,1).
        let base = sample_yuv(8, 8);
        let map = sample_mono(4, 4);
        let (base2, map2) = add_effects(
            base,
            map,
            &[EditEffect::Crop { x: 2, y: 2, width: 4, height: 4 }],
        )
        .unwrap();
        assert_eq!((base2.width, base2.height), (4, 4));
        assert_eq!((map2.width, map2.height), (2, 2));
    }

    #[test]
    fn add_effects_rejects_crop_rect_not_aligned_to_map_scale() {
        let base = sample_yuv(8, 8);
        let map = sample_mono(4, 4);
        let err = add_effects(base, map, &[EditEffect::Crop { x: 1, y: 0, width: 4, height: 4 }]).unwrap_err();
        assert!(matches!(err, UhdrError::InvalidCropping(_)));
    }

    #[test]
    fn add_effects_mirror_leaves_map_scale_unchanged() {
        let base = sample_yuv(8, 8);
        let map = sample_mono(4, 4);
        let (base2, map2) = add_effects(base, map, &[EditEffect::MirrorHorizontal]).unwrap();
        assert_eq!(base2.width / map2.width, 2);
        assert_eq!(base2.height / map2.height, 2);
    }

    #[test]
    fn crop_rejects_odd_alignment() {
        let img = sample_yuv(8, 8);
        let err = crop_yuv(img, 1, 0, 4, 4).unwrap_err();
        assert!(matches!(err, UhdrError::InvalidCropping(_)));
    }
}
