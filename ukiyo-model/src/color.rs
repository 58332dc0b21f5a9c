//! The tagged color model and pure channel conversions.
//!
//! Colors are always a tagged union over the five supported color
//! spaces. Channel values are floats in the 0.0–1.0 range with a fixed
//! cardinality per tag (1 for GRAY, 3 for RGB and LAB, 4 for CMYK).
//! LAB channels are stored normalized: `L/100`, `(a+128)/255`,
//! `(b+128)/255`.
//!
//! The conversions in this module are profile-free approximations used
//! when no ICC profiles are configured; profile-backed conversion lives
//! in [`crate::cms`].

use smallvec::{SmallVec, smallvec};

/// Storage for color channel values.
pub type ColorValues = SmallVec<[f64; 4]>;

/// The color space tag of a [`Color`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    Lab,
    Spot,
}

impl ColorSpace {
    /// The canonical wire name of the color space.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gray => "GRAY",
            Self::Rgb => "RGB",
            Self::Cmyk => "CMYK",
            Self::Lab => "LAB",
            Self::Spot => "SPOT",
        }
    }

    /// Parse a wire name into a color space tag.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "GRAY" => Some(Self::Gray),
            "RGB" => Some(Self::Rgb),
            "CMYK" => Some(Self::Cmyk),
            "LAB" => Some(Self::Lab),
            "SPOT" => Some(Self::Spot),
            _ => None,
        }
    }

    /// The channel cardinality fixed per tag. SPOT colors carry their
    /// values in the alternates instead.
    pub fn num_channels(&self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb | Self::Lab => 3,
            Self::Cmyk => 4,
            Self::Spot => 0,
        }
    }
}

/// The RGB and CMYK alternates plus palette label of a SPOT color.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpotAlternates {
    pub rgb: [f64; 3],
    pub cmyk: [f64; 4],
    pub palette: String,
}

/// A tagged color with alpha and an optional human-readable name.
#[derive(Debug, Clone, PartialEq)]
pub struct Color {
    pub space: ColorSpace,
    pub vals: ColorValues,
    pub alpha: f64,
    pub name: String,
    /// Present iff `space` is [`ColorSpace::Spot`].
    pub spot: Option<SpotAlternates>,
}

impl Color {
    /// Create an RGB color.
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self {
            space: ColorSpace::Rgb,
            vals: smallvec![r, g, b],
            alpha: 1.0,
            name: String::new(),
            spot: None,
        }
    }

    /// Create a CMYK color.
    pub fn cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Self {
            space: ColorSpace::Cmyk,
            vals: smallvec![c, m, y, k],
            alpha: 1.0,
            name: String::new(),
            spot: None,
        }
    }

    /// Create a grayscale color.
    pub fn gray(g: f64) -> Self {
        Self {
            space: ColorSpace::Gray,
            vals: smallvec![g],
            alpha: 1.0,
            name: String::new(),
            spot: None,
        }
    }

    /// Create a LAB color from normalized channels.
    pub fn lab(l: f64, a: f64, b: f64) -> Self {
        Self {
            space: ColorSpace::Lab,
            vals: smallvec![l, a, b],
            alpha: 1.0,
            name: String::new(),
            spot: None,
        }
    }

    /// Create a SPOT color from its alternates.
    pub fn spot(alternates: SpotAlternates, name: impl Into<String>) -> Self {
        Self {
            space: ColorSpace::Spot,
            vals: SmallVec::new(),
            alpha: 1.0,
            name: name.into(),
            spot: Some(alternates),
        }
    }

    /// The fallback color used when a record carries no usable color.
    pub fn fallback() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// Return the same color with a different alpha.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Return the same color with a name attached.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Profile-free conversion to RGB, keeping alpha and name.
    pub fn to_rgb(&self) -> Self {
        let [r, g, b] = match self.space {
            ColorSpace::Rgb => [self.vals[0], self.vals[1], self.vals[2]],
            ColorSpace::Cmyk => cmyk_to_rgb(&[
                self.vals[0],
                self.vals[1],
                self.vals[2],
                self.vals[3],
            ]),
            ColorSpace::Gray => gray_to_rgb(self.vals[0]),
            ColorSpace::Lab => lab_to_rgb(&[self.vals[0], self.vals[1], self.vals[2]]),
            ColorSpace::Spot => self.spot.as_ref().map(|s| s.rgb).unwrap_or([0.0; 3]),
        };

        let mut out = Self::rgb(r, g, b);
        out.alpha = self.alpha;
        out.name = self.name.clone();
        out
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::fallback()
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Convert CMYK channels to RGB.
pub fn cmyk_to_rgb(color: &[f64; 4]) -> [f64; 3] {
    let [c, m, y, k] = *color;
    [
        round3(1.0 - (c + k).min(1.0)),
        round3(1.0 - (m + k).min(1.0)),
        round3(1.0 - (y + k).min(1.0)),
    ]
}

/// Convert RGB channels to CMYK.
pub fn rgb_to_cmyk(color: &[f64; 3]) -> [f64; 4] {
    let [r, g, b] = *color;
    let c = 1.0 - r;
    let m = 1.0 - g;
    let y = 1.0 - b;
    let k = c.min(m).min(y);
    [c - k, m - k, y - k, k]
}

/// Convert a gray channel to RGB.
pub fn gray_to_rgb(gray: f64) -> [f64; 3] {
    [gray, gray, gray]
}

/// Convert RGB channels to a gray channel.
pub fn rgb_to_gray(color: &[f64; 3]) -> f64 {
    round3((color[0] + color[1] + color[2]) / 3.0)
}

const D65: [f64; 3] = [0.95047, 1.0, 1.08883];

fn srgb_encode(c: f64) -> f64 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn srgb_decode(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert normalized LAB channels to RGB (D65 sRGB).
pub fn lab_to_rgb(color: &[f64; 3]) -> [f64; 3] {
    let l = color[0] * 100.0;
    let a = color[1] * 255.0 - 128.0;
    let b = color[2] * 255.0 - 128.0;

    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let finv = |t: f64| {
        if t > 6.0 / 29.0 {
            t.powi(3)
        } else {
            3.0 * (6.0_f64 / 29.0).powi(2) * (t - 4.0 / 29.0)
        }
    };

    let x = D65[0] * finv(fx);
    let y = D65[1] * finv(fy);
    let z = D65[2] * finv(fz);

    let rl = 3.2404542 * x - 1.5371385 * y - 0.4985314 * z;
    let gl = -0.9692660 * x + 1.8760108 * y + 0.0415560 * z;
    let bl = 0.0556434 * x - 0.2040259 * y + 1.0572252 * z;

    [
        round3(srgb_encode(rl)),
        round3(srgb_encode(gl)),
        round3(srgb_encode(bl)),
    ]
}

/// Convert RGB channels to normalized LAB (D65 sRGB).
pub fn rgb_to_lab(color: &[f64; 3]) -> [f64; 3] {
    let rl = srgb_decode(color[0]);
    let gl = srgb_decode(color[1]);
    let bl = srgb_decode(color[2]);

    let x = (0.4124564 * rl + 0.3575761 * gl + 0.1804375 * bl) / D65[0];
    let y = (0.2126729 * rl + 0.7151522 * gl + 0.0721750 * bl) / D65[1];
    let z = (0.0193339 * rl + 0.1191920 * gl + 0.9503041 * bl) / D65[2];

    let f = |t: f64| {
        if t > (6.0_f64 / 29.0).powi(3) {
            t.cbrt()
        } else {
            t / (3.0 * (6.0_f64 / 29.0).powi(2)) + 4.0 / 29.0
        }
    };

    let (fx, fy, fz) = (f(x), f(y), f(z));
    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let b = 200.0 * (fy - fz);

    [
        round3(l / 100.0),
        round3((a + 128.0) / 255.0),
        round3((b + 128.0) / 255.0),
    ]
}

/// Format RGB channels as a hex color string, e.g. `#ff00ff`.
pub fn rgb_to_hexcolor(color: &[f64; 3]) -> String {
    format!(
        "#{:02x}{:02x}{:02x}",
        (255.0 * color[0]) as u8,
        (255.0 * color[1]) as u8,
        (255.0 * color[2]) as u8
    )
}

/// Format RGBA channels as a hex color string, e.g. `#ff00ff80`.
pub fn rgba_to_hexcolor(color: &[f64; 4]) -> String {
    format!(
        "#{:02x}{:02x}{:02x}{:02x}",
        (255.0 * color[0]) as u8,
        (255.0 * color[1]) as u8,
        (255.0 * color[2]) as u8,
        (255.0 * color[3]) as u8
    )
}

/// Parse a `#rrggbb` hex color string into RGB channels.
pub fn hexcolor_to_rgb(hexcolor: &str) -> Option<[f64; 3]> {
    let hex = hexcolor.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }

    let channel = |range| {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(|v| v as f64 / 255.0)
    };

    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

/// Parse a `#rrggbb` or `#rrggbbaa` hex color string into RGBA channels.
pub fn hexcolor_to_rgba(hexcolor: &str) -> [f64; 4] {
    let hex = hexcolor.strip_prefix('#').unwrap_or(hexcolor);

    let channel = |range| {
        hex.get(range)
            .and_then(|s: &str| u8::from_str_radix(s, 16).ok())
            .map(|v| v as f64 / 255.0)
    };

    match hex.len() {
        6 => {
            if let (Some(r), Some(g), Some(b)) = (channel(0..2), channel(2..4), channel(4..6)) {
                return [r, g, b, 1.0];
            }
        }
        8 => {
            if let (Some(r), Some(g), Some(b), Some(a)) =
                (channel(0..2), channel(2..4), channel(4..6), channel(6..8))
            {
                return [r, g, b, a];
            }
        }
        _ => {}
    }

    [0.0, 0.0, 0.0, 1.0]
}
