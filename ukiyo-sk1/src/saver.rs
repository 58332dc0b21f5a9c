//! Saver for SK1 files.
//!
//! Serialization is a depth-first pre-order walk over the record
//! caches: the tree is refreshed through `propagate_and_update` first,
//! then each node contributes its cached record, its children and its
//! closing marker. The whole document is assembled in memory and
//! written with a single filesystem call, so a failing sink never
//! leaves a half-written file behind.

use crate::config::Sk1Config;
use crate::error::{Error, Result};
use crate::model::{BLOCK_END, Sk1Kind, Sk1Node};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::path::Path;
use std::sync::Arc;

/// Column width of embedded base64 blocks.
const BLOCK_WIDTH: usize = 76;

/// The SK1 saver.
pub struct Sk1Saver {
    config: Arc<Sk1Config>,
}

impl Sk1Saver {
    pub fn new(config: Arc<Sk1Config>) -> Self {
        Self { config }
    }

    /// Serialize the document rooted at `model` to `path`.
    pub fn save(&self, model: &mut Sk1Node, path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(Error::Save("no output path given".into()));
        }

        let content = self.content(model);
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Serialize the document to a string.
    pub fn content(&self, model: &mut Sk1Node) -> String {
        model.propagate_and_update(&self.config);

        let mut out = String::new();
        write_node(model, &mut out);
        out
    }
}

fn write_node(node: &Sk1Node, out: &mut String) {
    out.push_str(node.string());

    if let Sk1Kind::BitmapData { data, .. } = &node.kind {
        write_block(data, out);
    }

    for child in &node.children {
        write_node(child, out);
    }

    out.push_str(node.end_string());
}

fn write_block(data: &[u8], out: &mut String) {
    let encoded = BASE64.encode(data);
    for chunk in encoded.as_bytes().chunks(BLOCK_WIDTH) {
        // Chunks of the base64 alphabet are always valid UTF-8.
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        out.push('\n');
    }
    out.push_str(BLOCK_END);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Sk1Loader;
    use std::io::Write;
    use ukiyo_model::events::{CancelToken, NullListener};

    fn load_str(content: &str) -> Sk1Node {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let loader = Sk1Loader::new(Arc::new(Sk1Config::default()));
        loader
            .load(file.path(), &NullListener, &CancelToken::new())
            .unwrap()
            .model
    }

    const FIVE_LINES: &str = "##sK1 1 2\n\
        document()\n\
        layout('A4',(595.276,841.89),0)\n\
        page('P1','A4',(595.276,841.89),0)\n\
        layer('L1',1,1,0,0,(\"RGB\",0.2,0.3,0.6))\n\
        r(1,0,0,1,10,10)\n";

    #[test]
    fn save_reproduces_directive_lines() {
        let mut model = load_str(FIVE_LINES);
        let saver = Sk1Saver::new(Arc::new(Sk1Config::default()));
        assert_eq!(saver.content(&mut model), FIVE_LINES);
    }

    #[test]
    fn group_markers_are_balanced() {
        let input = "##sK1 1 2\n\
            document()\n\
            layer('L1',1,1,0,0,(\"RGB\",0,0,0))\n\
            G()\n\
            r(1,0,0,1,0,0)\n\
            G_()\n";
        let mut model = load_str(input);
        let saver = Sk1Saver::new(Arc::new(Sk1Config::default()));
        let content = saver.content(&mut model);

        assert!(content.contains("G()\nr(1,0,0,1,0,0)\nG_()\n"));
    }

    #[test]
    fn bitmap_payload_round_trips() {
        let payload = BASE64.encode(b"raster bytes");
        let input = format!(
            "##sK1 1 2\n\
             document()\n\
             layer('L1',1,1,0,0,(\"RGB\",0,0,0))\n\
             bm(3)\n\
             {payload}\n\
             -\n"
        );
        let mut model = load_str(&input);
        let saver = Sk1Saver::new(Arc::new(Sk1Config::default()));
        let content = saver.content(&mut model);

        assert!(content.contains(&format!("bm(3)\n{payload}\n-\n")));
    }

    #[test]
    fn round_trip_law() {
        let mut first = load_str(FIVE_LINES);
        let saver = Sk1Saver::new(Arc::new(Sk1Config::default()));
        let saved = saver.content(&mut first);

        let second = load_str(&saved);
        assert!(first.same_structure(&second));
    }

    #[test]
    fn empty_path_is_a_save_error() {
        let mut model = load_str(FIVE_LINES);
        let saver = Sk1Saver::new(Arc::new(Sk1Config::default()));
        let err = saver.save(&mut model, Path::new("")).unwrap_err();
        assert!(matches!(err, Error::Save(_)));
    }
}
