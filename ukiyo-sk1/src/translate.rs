//! Translation between the SK1 tree and the generic document model.
//!
//! Both directions are pure structural transforms: no I/O, total over
//! every variant, and order-preserving (child order is paint order).
//! The SK1 layout record folds into the generic Pages node, which
//! carries the default page format; embedded raster payloads ride the
//! tree as bitmap-data nodes so that saving re-emits their blocks.

use crate::config::Sk1Config;
use crate::model::{Sk1Kind, Sk1Node};
use ukiyo_model::tree::LayerProps;
use ukiyo_model::{Node, NodeKind};

/// Translate an SK1 document into the generic model.
pub fn sk1_to_doc(doc: &Sk1Node) -> Node {
    let format = doc
        .find_child(|k| matches!(k, Sk1Kind::Layout(_)))
        .and_then(|n| match &n.kind {
            Sk1Kind::Layout(f) => Some(f.clone()),
            _ => None,
        })
        .unwrap_or_default();

    let mut children = Vec::new();
    let mut master_idx: Option<usize> = None;

    for child in &doc.children {
        match &child.kind {
            // Folded into the Pages node.
            Sk1Kind::Layout(_) => {}
            Sk1Kind::Grid {
                geometry,
                visible,
                color,
                name,
            } => {
                children.push(Node::new(NodeKind::GridLayer {
                    props: LayerProps {
                        name: name.clone(),
                        visible: *visible,
                        printable: false,
                        color: color.clone(),
                        ..LayerProps::default()
                    },
                    geometry: *geometry,
                }));
            }
            Sk1Kind::Pages => {
                children.push(Node::with_children(
                    NodeKind::Pages(format.clone()),
                    child.children.iter().map(to_doc_node).collect(),
                ));
            }
            // Consecutive master layers collect under one container.
            Sk1Kind::MasterLayer(props) => {
                let layer = Node::with_children(
                    NodeKind::Layer(props.clone()),
                    child.children.iter().map(to_doc_node).collect(),
                );
                match master_idx {
                    Some(idx) => children[idx].children.push(layer),
                    None => {
                        children.push(Node::with_children(NodeKind::MasterLayers, vec![layer]));
                        master_idx = Some(children.len() - 1);
                    }
                }
            }
            _ => children.push(to_doc_node(child)),
        }
    }

    Node::with_children(NodeKind::Document, children)
}

fn to_doc_node(node: &Sk1Node) -> Node {
    let children = node.children.iter().map(to_doc_node).collect();

    let kind = match &node.kind {
        Sk1Kind::Page { name, format } => NodeKind::Page {
            name: name.clone(),
            format: format.clone(),
        },
        Sk1Kind::Layer(props) => NodeKind::Layer(props.clone()),
        Sk1Kind::GuideLayer(props) => NodeKind::GuideLayer(props.clone()),
        Sk1Kind::Guide {
            position,
            orientation,
        } => NodeKind::Guide {
            position: *position,
            orientation: *orientation,
        },
        Sk1Kind::Group => NodeKind::Group,
        Sk1Kind::MaskGroup => NodeKind::MaskGroup,
        Sk1Kind::Rectangle {
            trafo,
            radius1,
            radius2,
            style,
        } => NodeKind::Rectangle {
            trafo: *trafo,
            radius1: *radius1,
            radius2: *radius2,
            style: style.clone(),
        },
        Sk1Kind::Ellipse {
            trafo,
            start_angle,
            end_angle,
            arc_type,
            style,
        } => NodeKind::Ellipse {
            trafo: *trafo,
            start_angle: *start_angle,
            end_angle: *end_angle,
            arc_type: *arc_type,
            style: style.clone(),
        },
        Sk1Kind::Curve { paths, style } => NodeKind::Curve {
            paths: paths.clone(),
            style: style.clone(),
        },
        Sk1Kind::Text {
            text,
            trafo,
            horiz_align,
            vert_align,
            chargap,
            wordgap,
            linegap,
            style,
        } => NodeKind::Text {
            text: text.clone(),
            trafo: *trafo,
            horiz_align: *horiz_align,
            vert_align: *vert_align,
            chargap: *chargap,
            wordgap: *wordgap,
            linegap: *linegap,
            style: style.clone(),
        },
        Sk1Kind::Image { trafo, id } => NodeKind::Pixmap {
            trafo: *trafo,
            id: *id,
        },
        Sk1Kind::BitmapData { id, data } => NodeKind::BitmapData {
            id: *id,
            data: data.clone(),
        },
        // Structural variants out of their expected slot degrade to a
        // plain group so that their children survive.
        Sk1Kind::Document
        | Sk1Kind::Layout(_)
        | Sk1Kind::Grid { .. }
        | Sk1Kind::Pages
        | Sk1Kind::MasterLayer(_) => NodeKind::Group,
    };

    Node { kind, children }
}

/// Translate a generic document into the SK1 tree.
pub fn doc_to_sk1(doc: &Node, config: &Sk1Config) -> Sk1Node {
    let mut out = Sk1Node::new(Sk1Kind::Document);

    for child in &doc.children {
        match &child.kind {
            NodeKind::Pages(format) => {
                out.children
                    .push(Sk1Node::new(Sk1Kind::Layout(format.clone())));
                let mut pages = Sk1Node::new(Sk1Kind::Pages);
                pages.children = child.children.iter().map(from_doc_node).collect();
                out.children.push(pages);
            }
            NodeKind::GridLayer { props, geometry } => {
                out.children.push(Sk1Node::new(Sk1Kind::Grid {
                    geometry: *geometry,
                    visible: props.visible,
                    color: props.color.clone(),
                    name: props.name.clone(),
                }));
            }
            NodeKind::MasterLayers => {
                for layer in &child.children {
                    let props = match &layer.kind {
                        NodeKind::Layer(props) => props.clone(),
                        _ => config.layer_props("MasterLayer"),
                    };
                    let mut node = Sk1Node::new(Sk1Kind::MasterLayer(props));
                    node.children = layer.children.iter().map(from_doc_node).collect();
                    out.children.push(node);
                }
            }
            _ => out.children.push(from_doc_node(child)),
        }
    }

    out
}

fn from_doc_node(node: &Node) -> Sk1Node {
    let kind = match &node.kind {
        NodeKind::Page { name, format } => Sk1Kind::Page {
            name: name.clone(),
            format: format.clone(),
        },
        NodeKind::Layer(props) => Sk1Kind::Layer(props.clone()),
        NodeKind::GuideLayer(props) => Sk1Kind::GuideLayer(props.clone()),
        NodeKind::Guide {
            position,
            orientation,
        } => Sk1Kind::Guide {
            position: *position,
            orientation: *orientation,
        },
        NodeKind::Group => Sk1Kind::Group,
        NodeKind::MaskGroup => Sk1Kind::MaskGroup,
        NodeKind::Rectangle {
            trafo,
            radius1,
            radius2,
            style,
        } => Sk1Kind::Rectangle {
            trafo: *trafo,
            radius1: *radius1,
            radius2: *radius2,
            style: style.clone(),
        },
        NodeKind::Ellipse {
            trafo,
            start_angle,
            end_angle,
            arc_type,
            style,
        } => Sk1Kind::Ellipse {
            trafo: *trafo,
            start_angle: *start_angle,
            end_angle: *end_angle,
            arc_type: *arc_type,
            style: style.clone(),
        },
        NodeKind::Curve { paths, style } => Sk1Kind::Curve {
            paths: paths.clone(),
            style: style.clone(),
        },
        NodeKind::Text {
            text,
            trafo,
            horiz_align,
            vert_align,
            chargap,
            wordgap,
            linegap,
            style,
        } => Sk1Kind::Text {
            text: text.clone(),
            trafo: *trafo,
            horiz_align: *horiz_align,
            vert_align: *vert_align,
            chargap: *chargap,
            wordgap: *wordgap,
            linegap: *linegap,
            style: style.clone(),
        },
        NodeKind::Pixmap { trafo, id } => Sk1Kind::Image {
            trafo: *trafo,
            id: *id,
        },
        NodeKind::BitmapData { id, data } => Sk1Kind::BitmapData {
            id: *id,
            data: data.clone(),
        },
        NodeKind::GridLayer { props, geometry } => Sk1Kind::Grid {
            geometry: *geometry,
            visible: props.visible,
            color: props.color.clone(),
            name: props.name.clone(),
        },
        NodeKind::Document | NodeKind::Pages(_) | NodeKind::MasterLayers => Sk1Kind::Group,
    };

    let mut out = Sk1Node::new(kind);
    out.children = node.children.iter().map(from_doc_node).collect();
    out
}
