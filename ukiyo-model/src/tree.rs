//! The generic document tree.
//!
//! Format codecs parse into (or translate through) this model: one
//! owned, order-preserving tree of [`Node`]s. Children are owned by
//! their parent, so teardown is simply dropping the root; child order
//! is z-order for rendering and serialization order for saving and is
//! never permuted.

use crate::color::Color;
use crate::geom::{Paths, Trafo};
use crate::style::Style;
use std::sync::Arc;

/// Page orientation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// The wire encoding (0 portrait, 1 landscape).
    pub fn as_int(&self) -> i64 {
        match self {
            Self::Portrait => 0,
            Self::Landscape => 1,
        }
    }

    /// Decode from the wire encoding; any non-zero value is landscape.
    pub fn from_int(v: i64) -> Self {
        if v == 0 { Self::Portrait } else { Self::Landscape }
    }
}

/// Orientation of a guideline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum GuideOrientation {
    #[default]
    Horizontal,
    Vertical,
}

impl GuideOrientation {
    /// The wire encoding (0 horizontal, 1 vertical).
    pub fn as_int(&self) -> i64 {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }

    /// Decode from the wire encoding.
    pub fn from_int(v: i64) -> Self {
        if v == 0 { Self::Horizontal } else { Self::Vertical }
    }
}

/// How a partial ellipse is closed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ArcType {
    Arc,
    #[default]
    PieSlice,
    Chord,
}

impl ArcType {
    /// The wire encoding used by the historical formats.
    pub fn as_int(&self) -> i64 {
        match self {
            Self::Arc => 0,
            Self::PieSlice => 1,
            Self::Chord => 2,
        }
    }

    /// Decode from the wire encoding.
    pub fn from_int(v: i64) -> Self {
        match v {
            0 => Self::Arc,
            2 => Self::Chord,
            _ => Self::PieSlice,
        }
    }
}

/// A named page format with size in points.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFormat {
    pub name: String,
    pub size: (f64, f64),
    pub orientation: Orientation,
}

impl Default for PageFormat {
    fn default() -> Self {
        Self {
            name: "A4".into(),
            size: page_size("A4").unwrap_or((595.276, 841.89)),
            orientation: Orientation::Portrait,
        }
    }
}

/// Look up the size in points of a well-known page format name.
pub fn page_size(name: &str) -> Option<(f64, f64)> {
    match name {
        "A0" => Some((2383.937, 3370.394)),
        "A1" => Some((1683.78, 2383.937)),
        "A2" => Some((1190.551, 1683.78)),
        "A3" => Some((841.89, 1190.551)),
        "A4" => Some((595.276, 841.89)),
        "A5" => Some((419.528, 595.276)),
        "A6" => Some((297.638, 419.528)),
        "Letter" => Some((612.0, 792.0)),
        "Legal" => Some((612.0, 1008.0)),
        "Executive" => Some((522.0, 756.0)),
        _ => None,
    }
}

/// The name, visibility and lock state shared by layer variants.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerProps {
    pub name: String,
    pub visible: bool,
    pub printable: bool,
    pub locked: bool,
    pub outlined: bool,
    pub color: Color,
}

impl Default for LayerProps {
    fn default() -> Self {
        Self {
            name: String::new(),
            visible: true,
            printable: true,
            locked: false,
            outlined: false,
            color: Color::rgb(0.196, 0.314, 0.635),
        }
    }
}

/// Per-variant payload of a document tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The document root.
    Document,
    /// Container for pages, carrying the default page format.
    Pages(PageFormat),
    /// A single page.
    Page { name: String, format: PageFormat },
    /// An ordinary drawing layer.
    Layer(LayerProps),
    /// The grid layer with its origin + spacing geometry.
    GridLayer {
        props: LayerProps,
        /// `(start_x, start_y, dx, dy)`.
        geometry: [f64; 4],
    },
    /// The guide layer holding [`NodeKind::Guide`] children.
    GuideLayer(LayerProps),
    /// Container for master layers shared by all pages.
    MasterLayers,
    /// A single guideline.
    Guide {
        position: f64,
        orientation: GuideOrientation,
    },
    /// An ordered group of drawables.
    Group,
    /// A group whose first child masks the rest.
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
    /// A placed raster image referencing bitmap data by id.
    Pixmap { trafo: Trafo, id: i64 },
    /// An embedded raster payload addressed by [`NodeKind::Pixmap`] ids.
    BitmapData { id: i64, data: Vec<u8> },
}

impl NodeKind {
    /// Display name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Pages(_) => "Pages",
            Self::Page { .. } => "Page",
            Self::Layer(_) => "Layer",
            Self::GridLayer { .. } => "GridLayer",
            Self::GuideLayer(_) => "GuideLayer",
            Self::MasterLayers => "MasterLayers",
            Self::Guide { .. } => "Guideline",
            Self::Group => "Group",
            Self::MaskGroup => "MaskGroup",
            Self::Rectangle { .. } => "Rectangle",
            Self::Ellipse { .. } => "Ellipse",
            Self::Curve { .. } => "Curve",
            Self::Text { .. } => "Text",
            Self::Pixmap { .. } => "Pixmap",
            Self::BitmapData { .. } => "BitmapData",
        }
    }

    /// Whether the variant is a structural container.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Document
                | Self::Pages(_)
                | Self::Page { .. }
                | Self::Layer(_)
                | Self::GridLayer { .. }
                | Self::GuideLayer(_)
                | Self::MasterLayers
                | Self::Group
                | Self::MaskGroup
        )
    }
}

/// Tree-display information returned by [`Node::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub is_leaf: bool,
    pub name: &'static str,
    pub info: String,
}

/// One node of the generic document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<Node>,
}

impl Node {
    /// Create a childless node.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// Create a node with children.
    pub fn with_children(kind: NodeKind, children: Vec<Self>) -> Self {
        Self { kind, children }
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

    /// Push the configuration down the tree and refresh every node's
    /// derived state bottom-up.
    ///
    /// Must be called after structural edits; mutation alone never
    /// triggers an update.
    pub fn propagate_and_update(&mut self, config: &Arc<DocConfig>) {
        for child in &mut self.children {
            child.propagate_and_update(config);
        }
        self.update(config);
    }

    fn update(&mut self, _config: &Arc<DocConfig>) {
        // The generic tree keeps no serialized cache; codec-side trees
        // rebuild their cached records here instead.
    }
}

/// Document-level configuration shared by a whole tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DocConfig {
    pub page_format: PageFormat,
    pub layer_color: Color,
    pub guide_color: Color,
    pub grid_color: Color,
    pub grid_geometry: [f64; 4],
    pub default_style: Style,
}

impl Default for DocConfig {
    fn default() -> Self {
        Self {
            page_format: PageFormat::default(),
            layer_color: Color::rgb(0.196, 0.314, 0.635),
            guide_color: Color::rgb(0.0, 0.3, 1.0),
            grid_color: Color::rgb(0.83, 0.87, 0.91),
            grid_geometry: [0.0, 0.0, 2.83465, 2.83465],
            default_style: Style::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> Node {
        Node::with_children(
            NodeKind::Document,
            vec![Node::with_children(
                NodeKind::Page {
                    name: "P1".into(),
                    format: PageFormat::default(),
                },
                vec![Node::with_children(
                    NodeKind::Layer(LayerProps::default()),
                    vec![
                        Node::new(NodeKind::Rectangle {
                            trafo: Trafo::IDENTITY,
                            radius1: 0.0,
                            radius2: 0.0,
                            style: Style::empty(),
                        }),
                        Node::new(NodeKind::Group),
                    ],
                )],
            )],
        )
    }

    #[test]
    fn count_descendants() {
        assert_eq!(small_tree().count(), 4);
    }

    #[test]
    fn resolve_container_and_leaf() {
        let tree = small_tree();
        let info = tree.resolve();
        assert!(!info.is_leaf);
        assert_eq!(info.name, "Document");
        assert_eq!(info.info, "1");

        let rect = &tree.children[0].children[0].children[0];
        let info = rect.resolve();
        assert!(info.is_leaf);
        assert_eq!(info.name, "Rectangle");
        assert_eq!(info.info, "");
    }

    #[test]
    fn page_format_lookup() {
        assert_eq!(page_size("A4"), Some((595.276, 841.89)));
        assert_eq!(page_size("Tabloid"), None);
    }

    #[test]
    fn propagate_is_idempotent() {
        let config = Arc::new(DocConfig::default());
        let mut tree = small_tree();
        tree.propagate_and_update(&config);
        let snapshot = tree.clone();
        tree.propagate_and_update(&config);
        assert_eq!(tree, snapshot);
    }
}
