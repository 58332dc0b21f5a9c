//! Geometry primitives shared by all document models.

use kurbo::{Affine, BezPath, Rect, Shape};

/// A 2D point.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Point> for kurbo::Point {
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// An affine transform stored as the 6-tuple `(m11, m12, m21, m22, dx, dy)`.
///
/// The convention is the row-vector one used by the historical file
/// formats: `[x' y'] = [x y]·M + [dx dy]`, i.e.
/// `x' = m11·x + m21·y + dx` and `y' = m12·x + m22·y + dy`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Trafo {
    pub m11: f64,
    pub m12: f64,
    pub m21: f64,
    pub m22: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Trafo {
    /// The identity transform.
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    /// Create a new transform from its coefficients.
    pub const fn new(m11: f64, m12: f64, m21: f64, m22: f64, dx: f64, dy: f64) -> Self {
        Self {
            m11,
            m12,
            m21,
            m22,
            dx,
            dy,
        }
    }

    /// Create a transform from a coefficient array in tuple order.
    pub fn from_coeff(c: [f64; 6]) -> Self {
        Self::new(c[0], c[1], c[2], c[3], c[4], c[5])
    }

    /// Return the coefficients in tuple order.
    pub fn coeff(&self) -> [f64; 6] {
        [self.m11, self.m12, self.m21, self.m22, self.dx, self.dy]
    }

    /// Replace a degenerate (all-zero) linear part with a flip
    /// transform, keeping the translation. Legacy writers emitted such
    /// transforms for axis-aligned objects.
    pub fn sanitized(self) -> Self {
        if self.m11 == 0.0 && self.m12 == 0.0 && self.m21 == 0.0 && self.m22 == 0.0 {
            Self::new(1.0, 0.0, 0.0, -1.0, self.dx, self.dy)
        } else {
            self
        }
    }

    /// Apply the transform to a point.
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.m11 * p.x + self.m21 * p.y + self.dx,
            self.m12 * p.x + self.m22 * p.y + self.dy,
        )
    }
}

impl Default for Trafo {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Trafo> for Affine {
    fn from(t: Trafo) -> Self {
        // kurbo's coefficient order matches the tuple order.
        Self::new(t.coeff())
    }
}

impl From<Affine> for Trafo {
    fn from(a: Affine) -> Self {
        Self::from_coeff(a.as_coeffs())
    }
}

/// One segment of a subpath.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathSeg {
    /// A straight line to the given point.
    Line(Point),
    /// A cubic bezier segment.
    Bezier {
        c1: Point,
        c2: Point,
        end: Point,
        /// Tangent continuity marker with the adjacent segment.
        cont: u8,
    },
}

impl PathSeg {
    /// The on-curve end point of the segment.
    pub fn end_point(&self) -> Point {
        match *self {
            Self::Line(p) => p,
            Self::Bezier { end, .. } => end,
        }
    }
}

/// A single subpath: a start point, segments and a closed flag.
///
/// This is the canonical structured path representation. The flat
/// point list used by some historical formats is available as a view
/// through [`Subpath::points`], it is never stored alongside.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Subpath {
    pub start: Option<Point>,
    pub segs: Vec<PathSeg>,
    pub closed: bool,
}

impl Subpath {
    /// Create an empty open subpath.
    pub fn new() -> Self {
        Self::default()
    }

    /// All on-curve points of the subpath, start point first.
    pub fn points(&self) -> Vec<Point> {
        let mut pts = Vec::with_capacity(self.segs.len() + 1);
        if let Some(start) = self.start {
            pts.push(start);
        }
        pts.extend(self.segs.iter().map(|s| s.end_point()));
        pts
    }

    /// Whether the subpath carries no geometry at all.
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.segs.is_empty()
    }
}

/// An ordered list of subpaths.
pub type Paths = Vec<Subpath>;

/// Convert structured subpaths into a [`BezPath`].
///
/// Subpaths without a recorded start point are skipped.
pub fn to_bez_path(paths: &[Subpath]) -> BezPath {
    let mut bez = BezPath::new();

    for path in paths {
        let Some(start) = path.start else {
            continue;
        };

        bez.move_to(start);

        for seg in &path.segs {
            match *seg {
                PathSeg::Line(p) => bez.line_to(p),
                PathSeg::Bezier { c1, c2, end, .. } => bez.curve_to(c1, c2, end),
            }
        }

        if path.closed {
            bez.close_path();
        }
    }

    bez
}

/// Bounding box of the given subpaths under a transform.
pub fn bbox(paths: &[Subpath], trafo: Trafo) -> Rect {
    (Affine::from(trafo) * to_bez_path(paths)).bounding_box()
}
