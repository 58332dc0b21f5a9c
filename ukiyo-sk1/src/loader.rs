//! Streaming loader for SK1 files.
//!
//! The loader makes exactly one sequential pass over the input,
//! interpreting each line as a directive. Property directives mutate a
//! pending style that the next drawable consumes; structural
//! directives open and close containers. One damaged record never
//! aborts the load, it is recorded in the [`ParseReport`] and the pass
//! continues.

use crate::config::Sk1Config;
use crate::error::{Error, Result};
use crate::model::{BLOCK_END, Sk1Kind, Sk1Node, read_color};
use crate::scan::{Directive, parse_directive};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::warn;
use rustc_hash::FxHashMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use ukiyo_model::events::{CancelToken, MessageKind, ProgressListener};
use ukiyo_model::geom::{PathSeg, Subpath};
use ukiyo_model::style::{Cap, Fill, Join, Stroke};
use ukiyo_model::tree::{ArcType, GuideOrientation, LayerProps, Orientation, PageFormat, page_size};
use ukiyo_model::{Color, Paths, Point, Style, Trafo};

/// One malformed or unknown line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseWarning {
    pub line_no: usize,
    pub text: String,
}

/// Non-fatal trouble collected during one load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub warnings: Vec<ParseWarning>,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Everything one load pass produces.
#[derive(Debug)]
pub struct LoadResult {
    /// The document root.
    pub model: Sk1Node,
    /// Embedded raster payloads keyed by their record id.
    pub resources: FxHashMap<i64, Vec<u8>>,
    pub report: ParseReport,
}

/// The SK1 loader. One instance handles one file at a time; per-load
/// state is rebuilt from scratch on every call.
pub struct Sk1Loader {
    config: Arc<Sk1Config>,
}

impl Sk1Loader {
    pub fn new(config: Arc<Sk1Config>) -> Self {
        Self { config }
    }

    /// Load an SK1 file from `path`.
    ///
    /// Progress is reported through `listener` scaled into `[0, 0.95]`
    /// and throttled to steps of more than 1%; `cancel` is checked at
    /// every line boundary.
    pub fn load(
        &self,
        path: &Path,
        listener: &dyn ProgressListener,
        cancel: &CancelToken,
    ) -> Result<LoadResult> {
        let file_size = std::fs::metadata(path)?.len();
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);

        let mut builder = Builder::new(self.config.clone());
        let mut line = String::new();
        let mut consumed = 0u64;
        let mut last_position = 0.0f64;

        // Header line; version drift is tolerated.
        let read = reader.read_line(&mut line)?;
        consumed += read as u64;
        if !line.starts_with("##sK1") {
            warn!("unexpected header: {:?}", line.trim_end());
            builder.report.warnings.push(ParseWarning {
                line_no: 1,
                text: line.trim_end().to_owned(),
            });
        }
        builder.line_no = 1;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                break;
            }
            consumed += read as u64;
            builder.line_no += 1;

            if file_size > 0 {
                let position = consumed as f64 / file_size as f64 * 0.95;
                if position - last_position > 0.01 {
                    last_position = position;
                    listener.notify(MessageKind::Info, "Parsing in process...", Some(position));
                }
            }

            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() {
                continue;
            }

            let Some(directive) = parse_directive(trimmed) else {
                builder.record_trouble(trimmed);
                continue;
            };

            if directive.name == "bm" {
                builder.bitmap(&directive, &mut reader, &mut consumed, cancel)?;
                continue;
            }

            if let Err(msg) = builder.dispatch(&directive) {
                warn!("line {}: {msg}", builder.line_no);
                builder.record_trouble(trimmed);
            }
        }

        builder.finish()
    }
}

/// Where the currently open layer belongs once closed.
#[derive(Debug, Copy, Clone, PartialEq)]
enum LayerSlot {
    /// Inside the active page.
    Page,
    /// Directly under the document root (master and guide layers).
    Doc,
}

/// Per-load parser state.
struct Builder {
    config: Arc<Sk1Config>,
    line_no: usize,
    report: ParseReport,
    resources: FxHashMap<i64, Vec<u8>>,

    root: Option<Sk1Node>,
    /// Index of the Pages node within the root's children.
    pages_idx: Option<usize>,
    active_page: Option<Sk1Node>,
    active_layer: Option<(Sk1Node, LayerSlot)>,
    group_stack: Vec<Sk1Node>,

    pending_style: Style,
    /// Accumulated curve data between `b()` and the next structural
    /// boundary.
    pending_curve: Option<(Style, Paths)>,
}

impl Builder {
    fn new(config: Arc<Sk1Config>) -> Self {
        let pending_style = config.default_style.clone();
        Self {
            config,
            line_no: 0,
            report: ParseReport::default(),
            resources: FxHashMap::default(),
            root: None,
            pages_idx: None,
            active_page: None,
            active_layer: None,
            group_stack: Vec::new(),
            pending_style,
            pending_curve: None,
        }
    }

    fn record_trouble(&mut self, text: &str) {
        warn!("skipping unparsable line {}: {text:?}", self.line_no);
        self.report.warnings.push(ParseWarning {
            line_no: self.line_no,
            text: text.to_owned(),
        });
    }

    fn dispatch(&mut self, d: &Directive) -> std::result::Result<(), String> {
        match d.name.as_str() {
            // Property setters mutating the pending style.
            "fp" => self.fill_color(color_arg(d, 0)?),
            "fe" => self.pending_style.fill = None,
            "lp" => self.stroke_mut().color = color_arg(d, 0)?,
            "le" => self.pending_style.stroke = None,
            "lw" => self.stroke_mut().width = num_arg(d, 0)?,
            "lc" => {
                self.stroke_mut().cap = match int_arg(d, 0)? {
                    2 => Cap::Round,
                    3 => Cap::Square,
                    _ => Cap::Butt,
                }
            }
            "lj" => {
                self.stroke_mut().join = match int_arg(d, 0)? {
                    1 => Join::Round,
                    2 => Join::Bevel,
                    _ => Join::Miter,
                }
            }
            "ld" => {
                let dashes = d
                    .tuple(0)
                    .map(|t| t.iter().filter_map(|v| v.as_f64()).collect())
                    .unwrap_or_default();
                self.stroke_mut().dash = dashes;
            }

            // Properties of older writers without a counterpart here.
            "gl" | "pe" | "ps" | "pgl" | "pgr" | "pgc" | "phs" | "pit" | "ft" | "la1" | "la2"
            | "Fs" | "Fn" | "dstyle" | "style" | "eps" => {}

            // Structural records.
            "document" => {
                if self.root.is_some() {
                    return Err("duplicate document record".into());
                }
                self.root = Some(Sk1Node::new(Sk1Kind::Document));
            }
            "layout" => {
                let format = layout_format(d)?;
                self.attach_to_root(Sk1Node::new(Sk1Kind::Layout(format)));
            }
            "grid" => {
                let geometry = d
                    .tuple(0)
                    .and_then(|t| {
                        let mut g = [0.0; 4];
                        for (slot, v) in g.iter_mut().zip(t) {
                            *slot = v.as_f64()?;
                        }
                        Some(g)
                    })
                    .ok_or("'grid' expects a geometry tuple")?;
                let visible = int_arg(d, 1)? != 0;
                let color = color_arg(d, 2)?;
                let name = d.str(3).unwrap_or("Grid").to_owned();
                self.attach_to_root(Sk1Node::new(Sk1Kind::Grid {
                    geometry,
                    visible,
                    color,
                    name,
                }));
            }
            "page" => {
                self.open_page(page_args(d, &self.config));
            }
            "layer" => {
                let props = layer_args(d, &self.config)?;
                self.open_layer(Sk1Kind::Layer(props), LayerSlot::Page);
            }
            "masterlayer" => {
                let props = layer_args(d, &self.config)?;
                self.open_layer(Sk1Kind::MasterLayer(props), LayerSlot::Doc);
            }
            "guidelayer" => {
                let props = layer_args(d, &self.config)?;
                self.open_layer(Sk1Kind::GuideLayer(props), LayerSlot::Doc);
            }
            "guide" => {
                let point = d.point(0).ok_or("'guide' expects a point")?;
                let orientation = GuideOrientation::from_int(int_arg(d, 1)?);
                let position = match orientation {
                    GuideOrientation::Vertical => point.x,
                    GuideOrientation::Horizontal => point.y,
                };
                self.attach(Sk1Node::new(Sk1Kind::Guide {
                    position,
                    orientation,
                }));
            }

            // Groups, including aliases of older writers.
            "G" | "B" | "PT" | "PC" => {
                self.flush_curve();
                self.group_stack.push(Sk1Node::new(Sk1Kind::Group));
            }
            "M" => {
                self.flush_curve();
                self.group_stack.push(Sk1Node::new(Sk1Kind::MaskGroup));
            }
            "G_" | "B_" | "PT_" | "PC_" | "M_" => {
                self.flush_curve();
                let group = self.group_stack.pop().ok_or("unbalanced group close")?;
                self.attach_raw(group);
            }
            "Bi" | "pt" => {}

            // Primitives.
            "r" => {
                let trafo = trafo_arg(d, 0)?;
                let radius1 = d.num(6).unwrap_or(0.0);
                let radius2 = d.num(7).unwrap_or(0.0);
                let style = self.take_style();
                self.attach(Sk1Node::new(Sk1Kind::Rectangle {
                    trafo,
                    radius1,
                    radius2,
                    style,
                }));
            }
            "e" => {
                let trafo = trafo_arg(d, 0)?;
                let start_angle = d.num(6).unwrap_or(0.0);
                let end_angle = d.num(7).unwrap_or(0.0);
                let arc_type = d.int(8).map(ArcType::from_int).unwrap_or_default();
                let style = self.take_style();
                self.attach(Sk1Node::new(Sk1Kind::Ellipse {
                    trafo,
                    start_angle,
                    end_angle,
                    arc_type,
                    style,
                }));
            }
            "b" => {
                self.flush_curve();
                let style = self.take_style();
                self.pending_curve = Some((style, vec![Subpath::default()]));
            }
            "bs" => {
                let point = Point::new(num_arg(d, 0)?, num_arg(d, 1)?);
                self.curve_point(PathSeg::Line(point))?;
            }
            "bc" => {
                let seg = PathSeg::Bezier {
                    c1: Point::new(num_arg(d, 0)?, num_arg(d, 1)?),
                    c2: Point::new(num_arg(d, 2)?, num_arg(d, 3)?),
                    end: Point::new(num_arg(d, 4)?, num_arg(d, 5)?),
                    cont: int_arg(d, 6)? as u8,
                };
                self.curve_point(seg)?;
            }
            "bn" => {
                let (_, paths) = self
                    .pending_curve
                    .as_mut()
                    .ok_or("'bn' outside of a curve")?;
                paths.push(Subpath::default());
            }
            "bC" => {
                let (_, paths) = self
                    .pending_curve
                    .as_mut()
                    .ok_or("'bC' outside of a curve")?;
                if let Some(path) = paths.last_mut() {
                    path.closed = true;
                }
            }
            "txt" => {
                let text = d.str(0).ok_or("'txt' expects a string")?.to_owned();
                let coeff = d
                    .tuple(1)
                    .and_then(tuple_coeff)
                    .ok_or("'txt' expects a transform tuple")?;
                let style = self.take_style();
                self.attach(Sk1Node::new(Sk1Kind::Text {
                    text,
                    trafo: Trafo::from_coeff(coeff),
                    horiz_align: d.int(2).unwrap_or(0),
                    vert_align: d.int(3).unwrap_or(0),
                    chargap: d.num(4).unwrap_or(0.0),
                    wordgap: d.num(5).unwrap_or(0.0),
                    linegap: d.num(6).unwrap_or(1.0),
                    style,
                }));
            }
            "im" => {
                let coeff = d
                    .tuple(0)
                    .and_then(tuple_coeff)
                    .ok_or("'im' expects a transform tuple")?;
                let id = int_arg(d, 1)?;
                self.pending_style = self.config.default_style.clone();
                self.attach(Sk1Node::new(Sk1Kind::Image {
                    trafo: Trafo::from_coeff(coeff),
                    id,
                }));
            }

            other => return Err(format!("unknown directive '{other}'")),
        }

        Ok(())
    }

    /// Read the base64 block following a `bm` record, register the
    /// decoded bytes and attach a BitmapData node.
    fn bitmap(
        &mut self,
        d: &Directive,
        reader: &mut impl BufRead,
        consumed: &mut u64,
        cancel: &CancelToken,
    ) -> Result<()> {
        let Some(id) = d.int(0) else {
            self.record_trouble("bm()");
            return Ok(());
        };

        let mut encoded = String::new();
        let mut line = String::new();
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                break;
            }
            *consumed += read as u64;
            self.line_no += 1;

            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed == BLOCK_END {
                break;
            }
            encoded.push_str(trimmed);
        }

        let data = match BASE64.decode(encoded.as_bytes()) {
            Ok(data) => data,
            Err(e) => {
                warn!("bitmap {id}: undecodable base64 block: {e}");
                self.record_trouble(&format!("bm({id})"));
                return Ok(());
            }
        };

        if image::guess_format(&data).is_err() {
            warn!("bitmap {id}: unrecognized image data");
        }

        self.pending_style = self.config.default_style.clone();
        self.resources.insert(id, data.clone());
        self.attach(Sk1Node::new(Sk1Kind::BitmapData { id, data }));
        Ok(())
    }

    fn fill_color(&mut self, color: Color) {
        match &mut self.pending_style.fill {
            Some(fill) => fill.color = color,
            none => *none = Some(Fill {
                color,
                ..Fill::default()
            }),
        }
    }

    fn stroke_mut(&mut self) -> &mut Stroke {
        self.pending_style.stroke.get_or_insert_with(Stroke::default)
    }

    fn take_style(&mut self) -> Style {
        std::mem::replace(&mut self.pending_style, self.config.default_style.clone())
    }

    fn curve_point(&mut self, seg: PathSeg) -> std::result::Result<(), String> {
        let (_, paths) = self
            .pending_curve
            .as_mut()
            .ok_or("curve point outside of a curve")?;
        let path = paths.last_mut().ok_or("curve without a subpath")?;

        // The first recorded point becomes the subpath start.
        if path.start.is_none() && path.segs.is_empty() {
            path.start = Some(seg.end_point());
            if matches!(seg, PathSeg::Line(_)) {
                return Ok(());
            }
        }
        path.segs.push(seg);
        Ok(())
    }

    fn flush_curve(&mut self) {
        if let Some((style, mut paths)) = self.pending_curve.take() {
            paths.retain(|p| !p.is_empty());
            self.attach_raw(Sk1Node::new(Sk1Kind::Curve { paths, style }));
        }
    }

    /// Attach a finished node at the current insertion point, flushing
    /// any accumulated curve first so that paint order is preserved.
    fn attach(&mut self, node: Sk1Node) {
        self.flush_curve();
        self.attach_raw(node);
    }

    fn attach_raw(&mut self, node: Sk1Node) {
        if let Some(group) = self.group_stack.last_mut() {
            group.children.push(node);
            return;
        }
        self.ensure_layer();
        if let Some((layer, _)) = self.active_layer.as_mut() {
            layer.children.push(node);
        }
    }

    fn attach_to_root(&mut self, node: Sk1Node) {
        self.root
            .get_or_insert_with(|| Sk1Node::new(Sk1Kind::Document))
            .children
            .push(node);
    }

    fn ensure_page(&mut self) {
        if self.active_page.is_none() {
            self.active_page = Some(Sk1Node::new(Sk1Kind::Page {
                name: String::new(),
                format: self.config.page_format.clone(),
            }));
        }
        self.ensure_pages_slot();
    }

    fn ensure_layer(&mut self) {
        if self.active_layer.is_none() {
            self.ensure_page();
            self.active_layer = Some((
                Sk1Node::new(Sk1Kind::Layer(self.config.layer_props("Layer 1"))),
                LayerSlot::Page,
            ));
        }
    }

    fn close_layer(&mut self) {
        self.flush_curve();
        while let Some(group) = self.group_stack.pop() {
            self.attach_raw(group);
        }
        if let Some((layer, slot)) = self.active_layer.take() {
            match slot {
                LayerSlot::Page => {
                    self.ensure_page();
                    if let Some(page) = self.active_page.as_mut() {
                        page.children.push(layer);
                    }
                }
                LayerSlot::Doc => self.attach_to_root(layer),
            }
        }
    }

    fn close_page(&mut self) {
        self.close_layer();
        if let Some(page) = self.active_page.take() {
            self.ensure_pages_slot();
            if let (Some(root), Some(idx)) = (self.root.as_mut(), self.pages_idx) {
                root.children[idx].children.push(page);
            }
        }
    }

    fn ensure_pages_slot(&mut self) {
        if self.pages_idx.is_none() {
            let root = self
                .root
                .get_or_insert_with(|| Sk1Node::new(Sk1Kind::Document));
            root.children.push(Sk1Node::new(Sk1Kind::Pages));
            self.pages_idx = Some(root.children.len() - 1);
        }
    }

    fn open_page(&mut self, format: (String, PageFormat)) {
        self.close_page();
        let (name, format) = format;
        self.ensure_pages_slot();
        self.active_page = Some(Sk1Node::new(Sk1Kind::Page { name, format }));
    }

    fn open_layer(&mut self, kind: Sk1Kind, slot: LayerSlot) {
        match slot {
            LayerSlot::Page => {
                self.close_layer();
                self.ensure_page();
            }
            // Master and guide layers end the page sequence.
            LayerSlot::Doc => self.close_page(),
        }
        self.active_layer = Some((Sk1Node::new(kind), slot));
    }

    fn finish(mut self) -> Result<LoadResult> {
        self.close_page();

        let Some(model) = self.root else {
            return Err(Error::Load("no document record found".into()));
        };

        Ok(LoadResult {
            model,
            resources: self.resources,
            report: self.report,
        })
    }
}

fn num_arg(d: &Directive, i: usize) -> std::result::Result<f64, String> {
    d.num(i)
        .ok_or_else(|| format!("'{}' expects a number at position {i}", d.name))
}

fn int_arg(d: &Directive, i: usize) -> std::result::Result<i64, String> {
    d.int(i)
        .ok_or_else(|| format!("'{}' expects an integer at position {i}", d.name))
}

fn color_arg(d: &Directive, i: usize) -> std::result::Result<Color, String> {
    d.tuple(i)
        .map(read_color)
        .ok_or_else(|| format!("'{}' expects a color tuple at position {i}", d.name))
}

fn trafo_arg(d: &Directive, i: usize) -> std::result::Result<Trafo, String> {
    d.coeff(i)
        .map(Trafo::from_coeff)
        .ok_or_else(|| format!("'{}' expects transform coefficients", d.name))
}

fn tuple_coeff(t: &[crate::scan::Value]) -> Option<[f64; 6]> {
    let mut c = [0.0; 6];
    if t.len() < 6 {
        return None;
    }
    for (slot, v) in c.iter_mut().zip(t) {
        *slot = v.as_f64()?;
    }
    Some(c)
}

/// Decode the argument forms of a `layout` record. Newer writers emit
/// `(name, size, orientation)`; older ones drop either the name or the
/// size.
fn layout_format(d: &Directive) -> std::result::Result<PageFormat, String> {
    if d.args.len() > 2 {
        let name = d.str(0).unwrap_or("").to_owned();
        let size = d
            .point(1)
            .map(|p| (p.x, p.y))
            .ok_or("'layout' expects a size tuple")?;
        let orientation = Orientation::from_int(int_arg(d, 2)?);
        return Ok(PageFormat {
            name,
            size,
            orientation,
        });
    }

    if let Some(name) = d.str(0) {
        let orientation = Orientation::from_int(int_arg(d, 1)?);
        let (name, size) = match page_size(name) {
            Some(size) => (name.to_owned(), size),
            None => ("A4".to_owned(), page_size("A4").unwrap_or((595.276, 841.89))),
        };
        Ok(PageFormat {
            name,
            size,
            orientation,
        })
    } else {
        let size = d
            .point(0)
            .map(|p| (p.x, p.y))
            .ok_or("'layout' expects a size tuple")?;
        let orientation = Orientation::from_int(int_arg(d, 1)?);
        Ok(PageFormat {
            name: String::new(),
            size,
            orientation,
        })
    }
}

/// Decode a `page` record; every argument is optional.
fn page_args(d: &Directive, config: &Sk1Config) -> (String, PageFormat) {
    let name = d.str(0).unwrap_or("").to_owned();
    let format_name = d.str(1).unwrap_or("").to_owned();
    let size = d
        .point(2)
        .map(|p| (p.x, p.y))
        .or_else(|| page_size(&format_name))
        .unwrap_or(config.page_format.size);
    let orientation = d
        .int(3)
        .map(Orientation::from_int)
        .unwrap_or(config.page_format.orientation);

    (
        name,
        PageFormat {
            name: format_name,
            size,
            orientation,
        },
    )
}

fn layer_args(d: &Directive, config: &Sk1Config) -> std::result::Result<LayerProps, String> {
    let name = d.str(0).ok_or("layer record without a name")?.to_owned();
    Ok(LayerProps {
        name,
        visible: d.int(1).unwrap_or(1) != 0,
        printable: d.int(2).unwrap_or(1) != 0,
        locked: d.int(3).unwrap_or(0) != 0,
        outlined: d.int(4).unwrap_or(0) != 0,
        color: d
            .tuple(5)
            .map(read_color)
            .unwrap_or_else(|| config.layer_color.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use ukiyo_model::events::NullListener;

    fn load_str(content: &str) -> LoadResult {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let loader = Sk1Loader::new(Arc::new(Sk1Config::default()));
        loader
            .load(file.path(), &NullListener, &CancelToken::new())
            .unwrap()
    }

    const FIVE_LINES: &str = "##sK1 1 2\n\
        document()\n\
        layout('A4',(595.276,841.89),0)\n\
        page('P1','A4',(595.276,841.89),0)\n\
        layer('L1',1,1,0,0,(\"RGB\",0.2,0.3,0.6))\n\
        r(1,0,0,1,10,10)\n";

    #[test]
    fn five_line_scenario() {
        let result = load_str(FIVE_LINES);
        assert!(result.report.is_clean());

        let doc = &result.model;
        assert_eq!(doc.kind, Sk1Kind::Document);
        assert_eq!(doc.children.len(), 2);

        assert!(matches!(&doc.children[0].kind, Sk1Kind::Layout(f) if f.name == "A4"));

        let pages = &doc.children[1];
        assert_eq!(pages.kind, Sk1Kind::Pages);
        let page = &pages.children[0];
        assert!(matches!(&page.kind, Sk1Kind::Page { name, .. } if name == "P1"));

        let layer = &page.children[0];
        match &layer.kind {
            Sk1Kind::Layer(props) => {
                assert_eq!(props.name, "L1");
                assert_eq!(props.color, Color::rgb(0.2, 0.3, 0.6));
            }
            other => panic!("expected layer, got {other:?}"),
        }

        match &layer.children[0].kind {
            Sk1Kind::Rectangle { trafo, .. } => {
                assert_eq!(trafo.coeff(), [1.0, 0.0, 0.0, 1.0, 10.0, 10.0]);
            }
            other => panic!("expected rectangle, got {other:?}"),
        }
    }

    #[test]
    fn curve_accumulation() {
        let result = load_str(
            "##sK1 1 2\n\
             document()\n\
             layer('L1',1,1,0,0,(\"RGB\",0,0,0))\n\
             b()\n\
             bs(0.0,0.0,0)\n\
             bc(1.0,1.0,2.0,2.0,3.0,3.0,0)\n\
             bC()\n",
        );
        assert!(result.report.is_clean());

        let page = &result.model.children[0].children[0];
        let layer = &page.children[0];
        match &layer.children[0].kind {
            Sk1Kind::Curve { paths, .. } => {
                assert_eq!(paths.len(), 1);
                let path = &paths[0];
                assert_eq!(path.start, Some(Point::new(0.0, 0.0)));
                assert_eq!(path.segs.len(), 1);
                assert!(path.closed);
            }
            other => panic!("expected curve, got {other:?}"),
        }
    }

    #[test]
    fn unknown_directive_is_reported_not_fatal() {
        let result = load_str(
            "##sK1 1 2\n\
             document()\n\
             layer('L1',1,1,0,0,(\"RGB\",0,0,0))\n\
             frobnicate(1,2)\n\
             r(1,0,0,1,10,10)\n",
        );
        assert_eq!(result.report.warnings.len(), 1);
        assert_eq!(result.report.warnings[0].line_no, 4);

        let layer = &result.model.children[0].children[0].children[0];
        assert_eq!(layer.children.len(), 1);
    }

    #[test]
    fn layer_before_page_synthesizes_default_page() {
        let result = load_str(
            "##sK1 1 2\n\
             document()\n\
             layer('L1',1,1,0,0,(\"RGB\",0,0,0))\n",
        );
        let pages = &result.model.children[0];
        assert_eq!(pages.kind, Sk1Kind::Pages);
        match &pages.children[0].kind {
            Sk1Kind::Page { name, format } => {
                assert_eq!(name, "");
                assert_eq!(format.name, "A4");
            }
            other => panic!("expected page, got {other:?}"),
        }
    }

    #[test]
    fn primitive_before_layer_synthesizes_default_layer() {
        let result = load_str(
            "##sK1 1 2\n\
             document()\n\
             r(1,0,0,1,0,0)\n",
        );
        let page = &result.model.children[0].children[0];
        match &page.children[0].kind {
            Sk1Kind::Layer(props) => assert_eq!(props.name, "Layer 1"),
            other => panic!("expected layer, got {other:?}"),
        }
        assert!(matches!(
            page.children[0].children[0].kind,
            Sk1Kind::Rectangle { .. }
        ));
    }

    #[test]
    fn pending_style_is_consumed_once() {
        let result = load_str(
            "##sK1 1 2\n\
             document()\n\
             layer('L1',1,1,0,0,(\"RGB\",0,0,0))\n\
             fp((\"RGB\",1,0,0))\n\
             lw(2.5)\n\
             r(1,0,0,1,0,0)\n\
             r(1,0,0,1,5,5)\n",
        );
        let layer = &result.model.children[0].children[0].children[0];

        match &layer.children[0].kind {
            Sk1Kind::Rectangle { style, .. } => {
                assert_eq!(
                    style.fill.as_ref().map(|f| f.color.clone()),
                    Some(Color::rgb(1.0, 0.0, 0.0))
                );
                assert_eq!(style.stroke.as_ref().map(|s| s.width), Some(2.5));
            }
            other => panic!("expected rectangle, got {other:?}"),
        }

        match &layer.children[1].kind {
            Sk1Kind::Rectangle { style, .. } => assert!(style.is_empty()),
            other => panic!("expected rectangle, got {other:?}"),
        }
    }

    #[test]
    fn groups_nest_and_preserve_order() {
        let result = load_str(
            "##sK1 1 2\n\
             document()\n\
             layer('L1',1,1,0,0,(\"RGB\",0,0,0))\n\
             G()\n\
             r(1,0,0,1,0,0)\n\
             e(1,0,0,1,2,2)\n\
             G_()\n\
             r(1,0,0,1,9,9)\n",
        );
        let layer = &result.model.children[0].children[0].children[0];
        assert_eq!(layer.children.len(), 2);

        let group = &layer.children[0];
        assert_eq!(group.kind, Sk1Kind::Group);
        assert!(matches!(group.children[0].kind, Sk1Kind::Rectangle { .. }));
        assert!(matches!(group.children[1].kind, Sk1Kind::Ellipse { .. }));
        assert!(matches!(layer.children[1].kind, Sk1Kind::Rectangle { .. }));
    }

    #[test]
    fn bitmap_block_registers_resource() {
        let payload = BASE64.encode(b"not really an image");
        let content = format!(
            "##sK1 1 2\n\
             document()\n\
             layer('L1',1,1,0,0,(\"RGB\",0,0,0))\n\
             bm(7)\n\
             {payload}\n\
             -\n\
             im((1,0,0,1,0,0),7)\n"
        );
        let result = load_str(&content);

        assert_eq!(
            result.resources.get(&7).map(Vec::as_slice),
            Some(b"not really an image".as_slice())
        );

        let layer = &result.model.children[0].children[0].children[0];
        assert!(matches!(
            layer.children[0].kind,
            Sk1Kind::BitmapData { id: 7, .. }
        ));
        assert!(matches!(layer.children[1].kind, Sk1Kind::Image { id: 7, .. }));
    }

    #[test]
    fn masterlayer_and_guides_attach_to_root() {
        let result = load_str(
            "##sK1 1 2\n\
             document()\n\
             page('P1','A4',(595.276,841.89),0)\n\
             layer('L1',1,1,0,0,(\"RGB\",0,0,0))\n\
             masterlayer('M1',1,1,0,0,(\"RGB\",0,0,0))\n\
             guidelayer('GuideLayer',1,0,0,0,(\"CMYK\",1,0,0,1))\n\
             guide((0.0,120.5),0)\n",
        );

        let doc = &result.model;
        assert_eq!(doc.children.len(), 3);
        assert_eq!(doc.children[0].kind, Sk1Kind::Pages);
        assert!(matches!(doc.children[1].kind, Sk1Kind::MasterLayer(_)));

        let guidelayer = &doc.children[2];
        assert!(matches!(guidelayer.kind, Sk1Kind::GuideLayer(_)));
        match &guidelayer.children[0].kind {
            Sk1Kind::Guide {
                position,
                orientation,
            } => {
                assert_eq!(*position, 120.5);
                assert_eq!(*orientation, GuideOrientation::Horizontal);
            }
            other => panic!("expected guide, got {other:?}"),
        }
    }

    #[test]
    fn cancellation_stops_the_pass() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIVE_LINES.as_bytes()).unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let loader = Sk1Loader::new(Arc::new(Sk1Config::default()));
        let err = loader
            .load(file.path(), &NullListener, &cancel)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn cancellation_interrupts_a_bitmap_block() {
        let mut builder = Builder::new(Arc::new(Sk1Config::default()));
        let directive = parse_directive("bm(1)").unwrap();
        let block = format!("{}\n-\n", BASE64.encode(b"payload"));
        let mut reader = std::io::Cursor::new(block.into_bytes());

        let cancel = CancelToken::new();
        cancel.cancel();
        let mut consumed = 0u64;
        let err = builder
            .bitmap(&directive, &mut reader, &mut consumed, &cancel)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(consumed, 0);
    }

    #[test]
    fn missing_document_record_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"##sK1 1 2\n").unwrap();

        let loader = Sk1Loader::new(Arc::new(Sk1Config::default()));
        let err = loader
            .load(file.path(), &NullListener, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }
}
