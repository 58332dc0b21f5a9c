//! Fill, stroke and text style model.
//!
//! The historical formats carry styles as positional lists; here every
//! slot is an explicit type and the 4-slot bundle is a struct of
//! `Option`s. Defaults always come from a config instance, never from
//! shared statics.

use crate::color::Color;

/// Fill rule for solid fills.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    EvenOdd,
    NonZero,
}

/// Line cap style.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Cap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Line join style.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Join {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Where the stroke sits relative to the path outline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StrokeRule {
    #[default]
    Middle,
    Inside,
    Outside,
}

/// A solid fill.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fill {
    pub rule: FillRule,
    pub color: Color,
}

/// A stroke definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub rule: StrokeRule,
    pub width: f64,
    pub color: Color,
    pub dash: Vec<f64>,
    pub cap: Cap,
    pub join: Join,
    pub miter_limit: f64,
    pub behind: bool,
    pub scalable: bool,
}

impl Default for Stroke {
    fn default() -> Self {
        let miter_angle = 45.0_f64.to_radians();

        Self {
            rule: StrokeRule::Middle,
            width: 0.0,
            color: Color::cmyk(0.0, 0.0, 0.0, 1.0).with_name("Black"),
            dash: Vec::new(),
            cap: Cap::Butt,
            join: Join::Miter,
            miter_limit: 1.0 / (miter_angle / 2.0).sin(),
            behind: false,
            scalable: false,
        }
    }
}

/// Text style attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextStyle {
    pub font: String,
    pub size: f64,
    pub color: Option<Color>,
}

/// Structural style attributes (reserved by the wire formats, carried
/// through untouched).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructuralStyle;

/// The 4-slot style bundle attached to drawable nodes.
///
/// Each slot is independently present-or-absent; an absent slot means
/// "no fill", "no stroke" and so on, not "inherit".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
    pub text: Option<TextStyle>,
    pub structural: Option<StructuralStyle>,
}

impl Style {
    /// A style with all slots empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether all slots are empty.
    pub fn is_empty(&self) -> bool {
        self.fill.is_none()
            && self.stroke.is_none()
            && self.text.is_none()
            && self.structural.is_none()
    }
}
