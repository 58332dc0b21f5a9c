/*!
The format-neutral document model of the ukiyo vector-graphics
translator.

Format codecs parse raw bytes into a format-specific tree and translate
it through the types of this crate: geometry primitives ([`geom`]), the
tagged color model ([`color`]), the color-management collaborator
([`cms`]), style bundles ([`style`]), the generic document tree
([`tree`]) and the progress/cancellation interface ([`events`]).

## Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]

pub mod cms;
pub mod color;
pub mod events;
pub mod geom;
pub mod style;
pub mod tree;

pub use color::{Color, ColorSpace};
pub use geom::{Paths, PathSeg, Point, Subpath, Trafo};
pub use style::Style;
pub use tree::{DocConfig, Node, NodeInfo, NodeKind};
