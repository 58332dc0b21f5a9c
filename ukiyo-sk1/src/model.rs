//! The SK1 document tree.
//!
//! Every node caches its serialized wire record (`string`), rebuilt by
//! [`Sk1Node::update`]; the saver only concatenates those caches. The
//! cache is not maintained automatically on mutation, callers run
//! [`Sk1Node::propagate_and_update`] after structural edits, exactly
//! like the generic model contract.

use crate::config::Sk1Config;
use crate::scan::Value;
use smallvec::SmallVec;
use std::sync::Arc;
use ukiyo_model::color::SpotAlternates;
use ukiyo_model::geom::PathSeg;
use ukiyo_model::tree::{ArcType, GuideOrientation, LayerProps, NodeInfo, PageFormat};
use ukiyo_model::{Color, ColorSpace, Paths, Style, Trafo};

/// The header line of an SK1 file.
pub const HEADER: &str = "##sK1 1 2";

/// The sentinel line terminating an embedded base64 block.
pub const BLOCK_END: &str = "-";

/// Per-variant payload of an SK1 node.
#[derive(Debug, Clone, PartialEq)]
pub enum Sk1Kind {
    /// Root object. Its children follow the fixed slot order of the
    /// grammar: layout, grid, pages, master layer, guide layer.
    Document,
    Layout(PageFormat),
    Grid {
        /// `(start_x, start_y, dx, dy)`.
        geometry: [f64; 4],
        visible: bool,
        color: Color,
        name: String,
    },
    /// Childs-list holder for pages; writes no record of its own.
    Pages,
    Page {
        name: String,
        format: PageFormat,
    },
    Layer(LayerProps),
    MasterLayer(LayerProps),
    GuideLayer(LayerProps),
    Guide {
        position: f64,
        orientation: GuideOrientation,
    },
    Group,
    /// The first child is the mask.
    MaskGroup,
    Rectangle {
        trafo: Trafo,
        radius1: f64,
        radius2: f64,
        style: Style,
    },
    Ellipse {
        trafo: Trafo,
        start_angle: f64,
        end_angle: f64,
        arc_type: ArcType,
        style: Style,
    },
    Curve {
        paths: Paths,
        style: Style,
    },
    Text {
        text: String,
        trafo: Trafo,
        horiz_align: i64,
        vert_align: i64,
        chargap: f64,
        wordgap: f64,
        linegap: f64,
        style: Style,
    },
    /// Embedded raster data; `data` holds the raw image file bytes.
    BitmapData {
        id: i64,
        data: Vec<u8>,
    },
    /// A placed image referencing a [`Sk1Kind::BitmapData`] id.
    Image {
        trafo: Trafo,
        id: i64,
    },
}

impl Sk1Kind {
    /// Display name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Layout(_) => "Layout",
            Self::Grid { .. } => "Grid",
            Self::Pages => "Pages",
            Self::Page { .. } => "Page",
            Self::Layer(_) => "Layer",
            Self::MasterLayer(_) => "MasterLayer",
            Self::GuideLayer(_) => "GuideLayer",
            Self::Guide { .. } => "Guideline",
            Self::Group => "Group",
            Self::MaskGroup => "MaskGroup",
            Self::Rectangle { .. } => "Rectangle",
            Self::Ellipse { .. } => "Ellipse",
            Self::Curve { .. } => "Curve",
            Self::Text { .. } => "Text",
            Self::BitmapData { .. } => "BitmapData",
            Self::Image { .. } => "Image",
        }
    }

    /// Whether the variant may hold children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Document
                | Self::Pages
                | Self::Page { .. }
                | Self::Layer(_)
                | Self::MasterLayer(_)
                | Self::GuideLayer(_)
                | Self::Group
                | Self::MaskGroup
        )
    }
}

/// One node of the SK1 tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Sk1Node {
    pub kind: Sk1Kind,
    pub children: Vec<Sk1Node>,
    string: String,
}

impl Sk1Node {
    /// Create a childless node with an empty record cache.
    pub fn new(kind: Sk1Kind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            string: String::new(),
        }
    }

    /// The cached wire record of this node.
    pub fn string(&self) -> &str {
        &self.string
    }

    /// The closing record of open/close container variants.
    pub fn end_string(&self) -> &'static str {
        match self.kind {
            Sk1Kind::Group => "G_()\n",
            Sk1Kind::MaskGroup => "M_()\n",
            _ => "",
        }
    }

    /// Total number of descendants (self excluded).
    pub fn count(&self) -> usize {
        self.children.len() + self.children.iter().map(Self::count).sum::<usize>()
    }

    /// Tree-display query; pure, no mutation.
    pub fn resolve(&self) -> NodeInfo {
        let is_leaf = !self.kind.is_container();

        NodeInfo {
            is_leaf,
            name: self.kind.name(),
            info: if is_leaf {
                String::new()
            } else {
                self.children.len().to_string()
            },
        }
    }

    /// Push the configuration down and rebuild every record cache
    /// bottom-up. Idempotent.
    pub fn propagate_and_update(&mut self, config: &Arc<Sk1Config>) {
        for child in &mut self.children {
            child.propagate_and_update(config);
        }
        self.update();
    }

    /// Rebuild this node's cached record from its current field values.
    pub fn update(&mut self) {
        self.string = match &self.kind {
            Sk1Kind::Document => format!("{HEADER}\ndocument()\n"),
            Sk1Kind::Layout(format) => format!(
                "layout({},({},{}),{})\n",
                quote(&format.name),
                fmt_num(format.size.0),
                fmt_num(format.size.1),
                format.orientation.as_int()
            ),
            Sk1Kind::Grid {
                geometry,
                visible,
                color,
                name,
            } => format!(
                "grid(({},{},{},{}),{},{},{})\n",
                fmt_num(geometry[0]),
                fmt_num(geometry[1]),
                fmt_num(geometry[2]),
                fmt_num(geometry[3]),
                i64::from(*visible),
                write_color(color),
                quote(name)
            ),
            Sk1Kind::Pages => String::new(),
            Sk1Kind::Page { name, format } => format!(
                "page({},{},({},{}),{})\n",
                quote(name),
                quote(&format.name),
                fmt_num(format.size.0),
                fmt_num(format.size.1),
                format.orientation.as_int()
            ),
            Sk1Kind::Layer(props) => layer_record("layer", props),
            Sk1Kind::MasterLayer(props) => layer_record("masterlayer", props),
            Sk1Kind::GuideLayer(props) => layer_record("guidelayer", props),
            Sk1Kind::Guide {
                position,
                orientation,
            } => {
                let point = match orientation {
                    GuideOrientation::Vertical => (*position, 0.0),
                    GuideOrientation::Horizontal => (0.0, *position),
                };
                format!(
                    "guide(({},{}),{})\n",
                    fmt_num(point.0),
                    fmt_num(point.1),
                    orientation.as_int()
                )
            }
            Sk1Kind::Group => "G()\n".into(),
            Sk1Kind::MaskGroup => "M()\n".into(),
            Sk1Kind::Rectangle {
                trafo,
                radius1,
                radius2,
                ..
            } => {
                if *radius1 == 0.0 && *radius2 == 0.0 {
                    format!("r({})\n", fmt_coeff(trafo))
                } else {
                    format!(
                        "r({},{},{})\n",
                        fmt_coeff(trafo),
                        fmt_num(*radius1),
                        fmt_num(*radius2)
                    )
                }
            }
            Sk1Kind::Ellipse {
                trafo,
                start_angle,
                end_angle,
                arc_type,
                ..
            } => {
                if start_angle == end_angle {
                    format!("e({})\n", fmt_coeff(trafo))
                } else {
                    format!(
                        "e({},{},{},{})\n",
                        fmt_coeff(trafo),
                        fmt_num(*start_angle),
                        fmt_num(*end_angle),
                        arc_type.as_int()
                    )
                }
            }
            Sk1Kind::Curve { paths, .. } => curve_records(paths),
            Sk1Kind::Text {
                text,
                trafo,
                horiz_align,
                vert_align,
                chargap,
                wordgap,
                linegap,
                ..
            } => format!(
                "txt({},({}),{},{},{},{},{})\n",
                quote(text),
                fmt_coeff(trafo),
                horiz_align,
                vert_align,
                fmt_num(*chargap),
                fmt_num(*wordgap),
                fmt_num(*linegap)
            ),
            Sk1Kind::BitmapData { id, .. } => format!("bm({id})\n"),
            Sk1Kind::Image { trafo, id } => format!("im(({}),{id})\n", fmt_coeff(trafo)),
        };
    }

    /// Structural equivalence, ignoring the record caches.
    pub fn same_structure(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.same_structure(b))
    }

    /// The first direct child matching the predicate.
    pub fn find_child(&self, pred: impl Fn(&Sk1Kind) -> bool) -> Option<&Self> {
        self.children.iter().find(|c| pred(&c.kind))
    }
}

fn layer_record(name: &str, props: &LayerProps) -> String {
    format!(
        "{name}({},{},{},{},{},{})\n",
        quote(&props.name),
        i64::from(props.visible),
        i64::from(props.printable),
        i64::from(props.locked),
        i64::from(props.outlined),
        write_color(&props.color)
    )
}

fn curve_records(paths: &Paths) -> String {
    let mut out = String::from("b()\n");

    for (i, path) in paths.iter().enumerate() {
        if i > 0 {
            out.push_str("bn()\n");
        }

        if let Some(start) = path.start {
            out.push_str(&format!("bs({},{},0)\n", fmt_num(start.x), fmt_num(start.y)));
        }

        for seg in &path.segs {
            match seg {
                PathSeg::Line(p) => {
                    out.push_str(&format!("bs({},{},0)\n", fmt_num(p.x), fmt_num(p.y)));
                }
                PathSeg::Bezier { c1, c2, end, cont } => {
                    out.push_str(&format!(
                        "bc({},{},{},{},{},{},{})\n",
                        fmt_num(c1.x),
                        fmt_num(c1.y),
                        fmt_num(c2.x),
                        fmt_num(c2.y),
                        fmt_num(end.x),
                        fmt_num(end.y),
                        cont
                    ));
                }
            }
        }

        if path.closed {
            out.push_str("bC()\n");
        }
    }

    out
}

/// Format a number the way the writer historically does: integers
/// without a fractional part, reals in shortest round-trip form.
pub fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn fmt_coeff(trafo: &Trafo) -> String {
    trafo
        .coeff()
        .iter()
        .map(|c| fmt_num(*c))
        .collect::<Vec<_>>()
        .join(",")
}

/// Single-quote and escape a name string.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Decode an SK1 positional color tuple into a generic [`Color`].
///
/// `("RGB", r, g, b [, a])`, `("CMYK", c, m, y, k [, a])` and
/// `("SPOT", palette, name, r, g, b, c, m, y, k [, a])` are the
/// historical encodings; GRAY and LAB tuples follow the RGB shape with
/// their own cardinality. Anything else yields the fallback color.
pub fn read_color(values: &[Value]) -> Color {
    let Some(space) = values
        .first()
        .and_then(Value::as_str)
        .and_then(ColorSpace::from_name)
    else {
        return Color::fallback();
    };

    let nums = |vals: &[Value]| -> Option<Vec<f64>> { vals.iter().map(Value::as_f64).collect() };

    match space {
        ColorSpace::Spot => {
            let palette = match values.get(1) {
                Some(Value::Str(s)) => s.clone(),
                Some(Value::Num(n)) => fmt_num(*n),
                _ => return Color::fallback(),
            };
            let Some(name) = values.get(2).and_then(Value::as_str) else {
                return Color::fallback();
            };
            let Some(channels) = values.get(3..10).and_then(nums) else {
                return Color::fallback();
            };

            let alternates = SpotAlternates {
                rgb: [channels[0], channels[1], channels[2]],
                cmyk: [channels[3], channels[4], channels[5], channels[6]],
                palette,
            };
            let alpha = values.get(10).and_then(Value::as_f64).unwrap_or(1.0);

            Color::spot(alternates, name).with_alpha(alpha)
        }
        _ => {
            let n = space.num_channels();
            let Some(channels) = values.get(1..1 + n).and_then(nums) else {
                return Color::fallback();
            };
            let alpha = values.get(1 + n).and_then(Value::as_f64).unwrap_or(1.0);

            Color {
                space,
                vals: SmallVec::from_vec(channels),
                alpha,
                name: String::new(),
                spot: None,
            }
        }
    }
}

/// Encode a generic [`Color`] as an SK1 positional tuple.
///
/// The alpha channel is elided when fully opaque. GRAY and LAB colors,
/// which the format does not define, are written as their RGB
/// resolution.
pub fn write_color(color: &Color) -> String {
    let color = match color.space {
        ColorSpace::Gray | ColorSpace::Lab => color.to_rgb(),
        _ => color.clone(),
    };

    let mut parts = vec![format!("\"{}\"", color.space.as_str())];

    match (&color.spot, color.space) {
        (Some(spot), ColorSpace::Spot) => {
            parts.push(quote(&spot.palette));
            parts.push(quote(&color.name));
            parts.extend(spot.rgb.iter().map(|v| fmt_num(*v)));
            parts.extend(spot.cmyk.iter().map(|v| fmt_num(*v)));
        }
        _ => parts.extend(color.vals.iter().map(|v| fmt_num(*v))),
    }

    if color.alpha != 1.0 {
        parts.push(fmt_num(color.alpha));
    }

    format!("({})", parts.join(","))
}

/// Build the default document skeleton: layout, grid, one page with
/// one layer, a master layer and a guide layer.
pub fn default_document(config: &Arc<Sk1Config>) -> Sk1Node {
    let mut doc = Sk1Node::new(Sk1Kind::Document);

    doc.children.push(Sk1Node::new(Sk1Kind::Layout(config.page_format.clone())));
    doc.children.push(Sk1Node::new(Sk1Kind::Grid {
        geometry: config.grid_geometry,
        visible: false,
        color: config.grid_color.clone(),
        name: "Grid".into(),
    }));

    let mut pages = Sk1Node::new(Sk1Kind::Pages);
    let mut page = Sk1Node::new(Sk1Kind::Page {
        name: String::new(),
        format: config.page_format.clone(),
    });
    page.children
        .push(Sk1Node::new(Sk1Kind::Layer(config.layer_props("Layer 1"))));
    pages.children.push(page);
    doc.children.push(pages);

    doc.children.push(Sk1Node::new(Sk1Kind::MasterLayer(
        config.layer_props("MasterLayer 1"),
    )));
    doc.children.push(Sk1Node::new(Sk1Kind::GuideLayer(
        config.guidelayer_props(),
    )));

    doc
}
