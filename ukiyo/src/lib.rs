/*!
A vector-graphics translator core.

Documents are parsed by a format codec into a format-specific tree,
translated through the format-neutral model of [`ukiyo_model`] and
serialized by another codec. The SK1 codec in [`ukiyo_sk1`] is the
line-oriented representative; [`convert`] wires the whole pipeline
together for it.

## Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]

use log::info;
use std::path::Path;
use std::sync::Arc;

pub use ukiyo_model as model;
pub use ukiyo_sk1 as sk1;

pub use ukiyo_model::{Color, ColorSpace, DocConfig, Node, NodeKind, Style, Trafo};
pub use ukiyo_sk1::{Error, Result, Sk1Config, Sk1Presenter};

use ukiyo_model::events::ProgressListener;
use ukiyo_sk1::{Sk1Saver, doc_to_sk1, sk1_to_doc};

/// Load an SK1 document, translate it through the generic model and
/// save it back out.
///
/// This exercises the full pipeline (loader, translator in both
/// directions, saver) rather than copying bytes; the output is the
/// canonicalized form of the input.
pub fn convert(input: &Path, output: &Path, listener: Box<dyn ProgressListener>) -> Result<()> {
    let config = Arc::new(Sk1Config::default());

    let cache_dir = std::env::temp_dir().join("ukiyo-cache");
    let mut presenter = Sk1Presenter::new(config.clone(), &cache_dir, listener)?;

    let result = convert_with(&mut presenter, &config, input, output);
    presenter.close();
    result
}

fn convert_with(
    presenter: &mut Sk1Presenter,
    config: &Arc<Sk1Config>,
    input: &Path,
    output: &Path,
) -> Result<()> {
    presenter.load(input)?;

    let model = presenter
        .model()
        .ok_or_else(|| Error::Load("no document model after load".into()))?;
    let doc = sk1_to_doc(model);
    info!(
        "translated {} nodes from {}",
        doc.count(),
        input.display()
    );

    let mut out_tree = doc_to_sk1(&doc, config);
    Sk1Saver::new(config.clone()).save(&mut out_tree, output)
}
