//! The color-management collaborator.
//!
//! Actual color science is delegated to an external CMS engine
//! ([`moxcms`]); this module only owns profile handles, caches
//! transforms keyed by (source, destination) space pair and shapes
//! channel tuples between the 0.0–1.0 float model and the engine's
//! fixed 4-slot byte buffers. When a space has no profile configured,
//! conversion falls back to the pure approximations in [`crate::color`].

use crate::color::{self, Color, ColorSpace, ColorValues};
use log::warn;
use moxcms::{ColorProfile, Layout, Transform8BitExecutor, TransformOptions};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::path::Path;
use std::sync::Arc;

/// Open an ICC profile from a file.
///
/// Returns `None` when the file is missing or not a parseable profile;
/// the failure is logged and treated as non-fatal.
pub fn open_profile(path: &Path) -> Option<ColorProfile> {
    let data = std::fs::read(path)
        .map_err(|e| warn!("cannot read profile {}: {e}", path.display()))
        .ok()?;

    ColorProfile::new_from_slice(&data)
        .map_err(|e| warn!("cannot parse profile {}: {e:?}", path.display()))
        .ok()
}

fn layout_for(space: ColorSpace) -> Layout {
    match space.num_channels() {
        1 => Layout::Gray,
        4 => Layout::Rgba,
        _ => Layout::Rgb,
    }
}

/// Scale color channels into the engine's 4-slot byte representation,
/// padding with zeros. SPOT colors contribute their RGB alternate, or
/// the CMYK one when `cmyk` is set.
pub fn colorb(color: &Color, cmyk: bool) -> [u8; 4] {
    let vals: ColorValues = match (&color.spot, color.space) {
        (Some(spot), ColorSpace::Spot) => {
            if cmyk {
                SmallVec::from_slice(&spot.cmyk)
            } else {
                SmallVec::from_slice(&spot.rgb)
            }
        }
        _ => color.vals.clone(),
    };

    let mut out = [0u8; 4];
    for (slot, val) in out.iter_mut().zip(vals.iter()) {
        *slot = (((val * 1000.0).round() / 1000.0) * 255.0) as u8;
    }
    out
}

/// Decode the engine's byte buffer back into channel values for the
/// given target space.
pub fn decode_colorb(colorb: &[u8; 4], space: ColorSpace) -> ColorValues {
    let n = space.num_channels().max(1);
    colorb[..n]
        .iter()
        .map(|v| (*v as f64 / 255.0 * 1000.0).round() / 1000.0)
        .collect()
}

/// Owns per-space profile handles and a transform cache.
///
/// One manager serves one presenter; it is not shared across documents.
pub struct ColorManager {
    handles: FxHashMap<ColorSpace, ColorProfile>,
    transforms: FxHashMap<(ColorSpace, ColorSpace), Arc<Transform8BitExecutor>>,
}

impl ColorManager {
    /// Create a manager with the built-in sRGB profile only.
    pub fn new() -> Self {
        let mut handles = FxHashMap::default();
        handles.insert(ColorSpace::Rgb, ColorProfile::new_srgb());

        Self {
            handles,
            transforms: FxHashMap::default(),
        }
    }

    /// Register a profile for a color space, replacing any previous one
    /// and invalidating cached transforms involving that space.
    pub fn set_profile(&mut self, space: ColorSpace, profile: ColorProfile) {
        self.handles.insert(space, profile);
        self.transforms.retain(|(a, b), _| *a != space && *b != space);
    }

    /// Register a profile loaded from a file. Missing or broken files
    /// are logged and ignored.
    pub fn load_profile(&mut self, space: ColorSpace, path: &Path) {
        if let Some(profile) = open_profile(path) {
            self.set_profile(space, profile);
        }
    }

    fn transform(&mut self, src: ColorSpace, dst: ColorSpace) -> Option<&Transform8BitExecutor> {
        if !self.transforms.contains_key(&(src, dst)) {
            let src_profile = self.handles.get(&src)?;
            let dst_profile = self.handles.get(&dst)?;

            let transform = src_profile
                .create_transform_8bit(
                    layout_for(src),
                    dst_profile,
                    layout_for(dst),
                    TransformOptions::default(),
                )
                .map_err(|e| warn!("cannot create {src:?} -> {dst:?} transform: {e:?}"))
                .ok()?;

            self.transforms.insert((src, dst), transform);
        }

        self.transforms.get(&(src, dst)).map(|t| t.as_ref())
    }

    fn convert_through_engine(&mut self, color: &Color, dst: ColorSpace) -> Option<ColorValues> {
        let src = color.space;
        let in_buf = colorb(color, false);
        let mut out_buf = [0u8; 4];

        let transform = self.transform(src, dst)?;
        transform
            .transform(
                &in_buf[..src.num_channels()],
                &mut out_buf[..dst.num_channels()],
            )
            .map_err(|e| warn!("{src:?} -> {dst:?} transform failed: {e:?}"))
            .ok()?;

        Some(decode_colorb(&out_buf, dst))
    }

    /// Resolve any color to RGB, preferring configured profiles over
    /// the pure fallback math.
    pub fn get_rgb_color(&mut self, color: &Color) -> Color {
        if color.space == ColorSpace::Rgb {
            return color.clone();
        }

        if let Some(spot) = &color.spot {
            let [r, g, b] = spot.rgb;
            return Color::rgb(r, g, b)
                .with_alpha(color.alpha)
                .with_name(color.name.clone());
        }

        if let Some(vals) = self.convert_through_engine(color, ColorSpace::Rgb) {
            return Color {
                space: ColorSpace::Rgb,
                vals,
                alpha: color.alpha,
                name: color.name.clone(),
                spot: None,
            };
        }

        color.to_rgb()
    }

    /// Resolve any color to CMYK, preferring configured profiles over
    /// the pure fallback math.
    pub fn get_cmyk_color(&mut self, color: &Color) -> Color {
        if color.space == ColorSpace::Cmyk {
            return color.clone();
        }

        if let Some(spot) = &color.spot {
            let [c, m, y, k] = spot.cmyk;
            return Color::cmyk(c, m, y, k)
                .with_alpha(color.alpha)
                .with_name(color.name.clone());
        }

        if let Some(vals) = self.convert_through_engine(color, ColorSpace::Cmyk) {
            return Color {
                space: ColorSpace::Cmyk,
                vals,
                alpha: color.alpha,
                name: color.name.clone(),
                spot: None,
            };
        }

        let rgb = self.get_rgb_color(color);
        let [c, m, y, k] = color::rgb_to_cmyk(&[rgb.vals[0], rgb.vals[1], rgb.vals[2]]);
        Color::cmyk(c, m, y, k)
            .with_alpha(color.alpha)
            .with_name(color.name.clone())
    }
}
