//! Document lifecycle façade for the SK1 codec.
//!
//! A presenter owns one document at a time together with its loader,
//! saver, resource cache and progress listener. The lifecycle is
//! new → load → update → save (repeatable) → close; close tears the
//! cache directory down and is idempotent.

use crate::config::Sk1Config;
use crate::error::{Error, Result};
use crate::loader::{ParseReport, Sk1Loader};
use crate::model::{Sk1Node, default_document};
use crate::resmngr::{ResourceManager, ResourcePlace, content_id};
use crate::saver::Sk1Saver;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use ukiyo_model::events::{CancelToken, MessageKind, ProgressListener};

/// The presenter driving one SK1 document.
pub struct Sk1Presenter {
    config: Arc<Sk1Config>,
    listener: Box<dyn ProgressListener>,
    cancel: CancelToken,

    loader: Sk1Loader,
    saver: Sk1Saver,
    resources: ResourceManager,

    model: Option<Sk1Node>,
    /// Raw embedded raster payloads keyed by their record id.
    bitmaps: FxHashMap<i64, Vec<u8>>,
    /// Record id to cache resource id.
    resource_ids: FxHashMap<i64, String>,
    report: ParseReport,

    doc_id: String,
    doc_file: PathBuf,
}

impl Sk1Presenter {
    /// Create a presenter with a fresh default document and a private
    /// cache directory under `cache_dir`.
    pub fn new(
        config: Arc<Sk1Config>,
        cache_dir: &Path,
        listener: Box<dyn ProgressListener>,
    ) -> Result<Self> {
        let doc_id = generate_doc_id();
        let resources = ResourceManager::create(cache_dir.join(format!("doc_{doc_id}")))?;

        let mut presenter = Self {
            loader: Sk1Loader::new(config.clone()),
            saver: Sk1Saver::new(config.clone()),
            config,
            listener,
            cancel: CancelToken::new(),
            resources,
            model: None,
            bitmaps: FxHashMap::default(),
            resource_ids: FxHashMap::default(),
            report: ParseReport::default(),
            doc_id,
            doc_file: PathBuf::new(),
        };

        presenter.model = Some(default_document(&presenter.config));
        presenter.update();
        Ok(presenter)
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn model(&self) -> Option<&Sk1Node> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut Sk1Node> {
        self.model.as_mut()
    }

    pub fn report(&self) -> &ParseReport {
        &self.report
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn bitmaps(&self) -> &FxHashMap<i64, Vec<u8>> {
        &self.bitmaps
    }

    pub fn config(&self) -> &Arc<Sk1Config> {
        &self.config
    }

    /// A token that cancels the running load when triggered.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Replace the current document with a file from disk.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            let msg = "error while loading: file doesn't exist";
            self.listener.notify(MessageKind::Error, msg, None);
            return Err(Error::Load(msg.into()));
        }

        self.listener
            .notify(MessageKind::Info, "Parsing is started...", Some(0.03));

        let result = match self.loader.load(path, self.listener.as_ref(), &self.cancel) {
            Ok(result) => result,
            Err(e) => {
                self.listener
                    .notify(MessageKind::Error, &format!("error while loading: {e}"), None);
                self.close();
                return Err(e);
            }
        };

        self.model = Some(result.model);
        self.report = result.report;
        self.bitmaps = result.resources;
        self.resource_ids = self
            .bitmaps
            .iter()
            .filter_map(|(record_id, data)| {
                let id = self.resources.put(ResourcePlace::Image, data)?;
                Some((*record_id, id))
            })
            .collect();

        self.listener
            .notify(MessageKind::Ok, "Document model is created", None);
        self.doc_file = path.to_path_buf();
        self.update();
        Ok(())
    }

    /// Re-propagate the configuration and rebuild all record caches.
    ///
    /// The rebuild walks an owned tree and cannot fail; a missing
    /// document makes it a no-op.
    pub fn update(&mut self) {
        let Some(model) = self.model.as_mut() else {
            return;
        };

        self.listener
            .notify(MessageKind::Info, "SK1 model update...", Some(0.95));
        model.propagate_and_update(&self.config);
        self.listener.notify(
            MessageKind::Ok,
            "Document model is updated successfully",
            Some(0.98),
        );
    }

    /// Serialize the current document to `path`.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            let msg = "error while saving: empty file name";
            self.listener.notify(MessageKind::Error, msg, None);
            return Err(Error::Save(msg.into()));
        }
        let Some(model) = self.model.as_mut() else {
            let msg = "error while saving: no document loaded";
            self.listener.notify(MessageKind::Error, msg, None);
            return Err(Error::Save(msg.into()));
        };

        self.listener
            .notify(MessageKind::Info, "Saving is started...", Some(0.03));

        if let Err(e) = self.saver.save(model, path) {
            self.listener
                .notify(MessageKind::Error, &format!("error while saving: {e}"), None);
            return Err(e);
        }

        self.doc_file = path.to_path_buf();
        self.listener.notify(
            MessageKind::Ok,
            "Document model is saved successfully",
            Some(0.95),
        );
        Ok(())
    }

    /// Drop the document and remove the cache directory. Idempotent.
    pub fn close(&mut self) {
        self.doc_file.clear();
        self.model = None;
        self.bitmaps.clear();
        self.resource_ids.clear();
        self.resources.clear();
        self.listener
            .notify(MessageKind::Ok, "Document model is destroyed", None);
    }
}

fn generate_doc_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    content_id(&nanos.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sk1Kind;
    use std::io::Write;
    use std::sync::Mutex;
    use ukiyo_model::events::NullListener;

    /// Captures every notification for assertions.
    #[derive(Clone, Default)]
    struct Recorder(std::sync::Arc<Mutex<Vec<(MessageKind, String, Option<f64>)>>>);

    impl ProgressListener for Recorder {
        fn notify(&self, kind: MessageKind, msg: &str, fraction: Option<f64>) {
            self.0
                .lock()
                .unwrap()
                .push((kind, msg.to_owned(), fraction));
        }
    }

    fn presenter(cache: &Path) -> Sk1Presenter {
        Sk1Presenter::new(
            Arc::new(Sk1Config::default()),
            cache,
            Box::new(NullListener),
        )
        .unwrap()
    }

    const FIVE_LINES: &str = "##sK1 1 2\n\
        document()\n\
        layout('A4',(595.276,841.89),0)\n\
        page('P1','A4',(595.276,841.89),0)\n\
        layer('L1',1,1,0,0,(\"RGB\",0.2,0.3,0.6))\n\
        r(1,0,0,1,10,10)\n";

    #[test]
    fn new_builds_the_default_skeleton() {
        let cache = tempfile::tempdir().unwrap();
        let presenter = presenter(cache.path());

        let model = presenter.model().unwrap();
        assert_eq!(model.kind, Sk1Kind::Document);
        // layout, grid, pages, page, layer, masterlayer, guidelayer
        assert_eq!(model.count(), 7);
        assert!(presenter.resources().doc_dir().join("mimetype").is_file());
    }

    #[test]
    fn full_lifecycle() {
        let cache = tempfile::tempdir().unwrap();
        let mut presenter = presenter(cache.path());

        let mut input = tempfile::NamedTempFile::new().unwrap();
        input.write_all(FIVE_LINES.as_bytes()).unwrap();
        presenter.load(input.path()).unwrap();
        assert!(presenter.report().is_clean());

        let out = cache.path().join("out.sk1");
        presenter.save(&out).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), FIVE_LINES);

        // Saving is repeatable.
        presenter.save(&out).unwrap();

        let doc_dir = presenter.resources().doc_dir().to_path_buf();
        presenter.close();
        assert!(presenter.model().is_none());
        assert!(!doc_dir.exists());

        // Close is idempotent.
        presenter.close();
    }

    #[test]
    fn update_is_repeatable_and_tolerates_no_document() {
        let cache = tempfile::tempdir().unwrap();
        let mut presenter = presenter(cache.path());

        presenter.update();
        let snapshot = presenter.model().cloned();
        presenter.update();
        assert_eq!(presenter.model().cloned(), snapshot);

        presenter.close();
        presenter.update();
        assert!(presenter.model().is_none());
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let cache = tempfile::tempdir().unwrap();
        let mut presenter = presenter(cache.path());

        let err = presenter.load(Path::new("/no/such/file.sk1")).unwrap_err();
        assert!(matches!(err, Error::Load(_)));
        // The default document survives a rejected path.
        assert!(presenter.model().is_some());
    }

    #[test]
    fn failed_load_cleans_up() {
        let cache = tempfile::tempdir().unwrap();
        let mut presenter = presenter(cache.path());

        let mut input = tempfile::NamedTempFile::new().unwrap();
        input.write_all(b"##sK1 1 2\n").unwrap();

        let err = presenter.load(input.path()).unwrap_err();
        assert!(matches!(err, Error::Load(_)));
        assert!(presenter.model().is_none());
    }

    #[test]
    fn empty_save_path_is_an_error() {
        let cache = tempfile::tempdir().unwrap();
        let mut presenter = presenter(cache.path());

        let err = presenter.save(Path::new("")).unwrap_err();
        assert!(matches!(err, Error::Save(_)));
    }

    #[test]
    fn lifecycle_fractions_are_reported() {
        let cache = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();

        let mut presenter = Sk1Presenter::new(
            Arc::new(Sk1Config::default()),
            cache.path(),
            Box::new(recorder.clone()),
        )
        .unwrap();

        let mut input = tempfile::NamedTempFile::new().unwrap();
        input.write_all(FIVE_LINES.as_bytes()).unwrap();
        presenter.load(input.path()).unwrap();

        let events = recorder.0.lock().unwrap();
        let fractions: Vec<f64> = events.iter().filter_map(|(_, _, f)| *f).collect();
        assert!(fractions.contains(&0.03));
        assert!(fractions.contains(&0.95));
        assert!(fractions.contains(&0.98));
        assert!(
            events
                .iter()
                .any(|(kind, msg, _)| *kind == MessageKind::Ok
                    && msg == "Document model is created")
        );
    }

    #[test]
    fn bitmap_resources_are_registered() {
        use base64::Engine;
        let payload = base64::engine::general_purpose::STANDARD.encode(b"raster");

        let cache = tempfile::tempdir().unwrap();
        let mut presenter = presenter(cache.path());

        let content = format!(
            "##sK1 1 2\n\
             document()\n\
             layer('L1',1,1,0,0,(\"RGB\",0,0,0))\n\
             bm(4)\n\
             {payload}\n\
             -\n"
        );
        let mut input = tempfile::NamedTempFile::new().unwrap();
        input.write_all(content.as_bytes()).unwrap();
        presenter.load(input.path()).unwrap();

        assert_eq!(
            presenter.bitmaps().get(&4).map(Vec::as_slice),
            Some(b"raster".as_slice())
        );
        let resource_id = presenter.resource_ids.get(&4).unwrap();
        let path = presenter.resources().get(resource_id).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"raster");
    }
}
