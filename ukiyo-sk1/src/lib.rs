/*!
Loader, saver and presenter for the SK1 vector-graphics format.

SK1 files are line-oriented: every record is one directive in a
restricted call syntax (`r(1,0,0,1,10,10)`). The codec is built in
layers:

- [`scan`] turns one line into a [`scan::Directive`].
- [`loader`] interprets the directive stream into an [`model::Sk1Node`]
  tree in a single streaming pass.
- [`saver`] serializes the tree back from the per-node record caches.
- [`presenter`] drives the load/update/save/close lifecycle and owns
  the document's resource cache ([`resmngr`]).
- [`translate`] maps the SK1 tree onto the format-neutral model of
  [`ukiyo_model`] and back.

## Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod presenter;
pub mod resmngr;
pub mod saver;
pub mod scan;
pub mod translate;

pub use config::Sk1Config;
pub use error::{Error, Result};
pub use loader::{LoadResult, ParseReport, ParseWarning, Sk1Loader};
pub use model::{Sk1Kind, Sk1Node};
pub use presenter::Sk1Presenter;
pub use resmngr::{ResourceManager, ResourcePlace};
pub use saver::Sk1Saver;
pub use translate::{doc_to_sk1, sk1_to_doc};
