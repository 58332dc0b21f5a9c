//! Content-addressed resource store backing one document cache.
//!
//! Every presenter owns a private cache directory with fixed subdirs
//! (`image/`, `profile/`, `preview/`) and a `mimetype` marker file.
//! Resources are keyed by a content hash, so registering identical
//! bytes twice yields the same id. Registry trouble is logged and
//! non-fatal, the id is simply dropped.

use log::warn;
use rustc_hash::FxHashMap;
use siphasher::sip::SipHasher13;
use std::hash::Hasher;
use std::path::{Path, PathBuf};

/// Marker content identifying the cache as ours.
const MIMETYPE: &str = "application/vnd.sk1project.pdxf-graphics";

/// Which cache subdirectory a resource belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResourcePlace {
    Image,
    Profile,
    Preview,
}

impl ResourcePlace {
    fn dir(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Profile => "profile",
            Self::Preview => "preview",
        }
    }

    const ALL: [Self; 3] = [Self::Image, Self::Profile, Self::Preview];
}

/// Hash content into a resource (or document) id.
pub fn content_id(bytes: &[u8]) -> String {
    let mut hasher = SipHasher13::new();
    hasher.write(bytes);
    format!("{:016x}", hasher.finish())
}

/// The id to relative-path table of one document cache directory.
pub struct ResourceManager {
    doc_dir: PathBuf,
    table: FxHashMap<String, String>,
}

impl ResourceManager {
    /// Build the cache structure under `doc_dir`.
    pub fn create(doc_dir: PathBuf) -> std::io::Result<Self> {
        for place in ResourcePlace::ALL {
            std::fs::create_dir_all(doc_dir.join(place.dir()))?;
        }
        std::fs::write(doc_dir.join("mimetype"), MIMETYPE)?;

        Ok(Self {
            doc_dir,
            table: FxHashMap::default(),
        })
    }

    pub fn doc_dir(&self) -> &Path {
        &self.doc_dir
    }

    /// Register `bytes` under `place` and return the content id, or
    /// `None` when the blob could not be stored.
    pub fn put(&mut self, place: ResourcePlace, bytes: &[u8]) -> Option<String> {
        let id = content_id(bytes);
        let relative = format!("{}/{id}", place.dir());

        if let Err(e) = std::fs::write(self.doc_dir.join(&relative), bytes) {
            warn!("cannot store resource {id}: {e}");
            return None;
        }

        self.table.insert(id.clone(), relative);
        Some(id)
    }

    /// The absolute path of a registered resource, when it still
    /// exists on disk.
    pub fn get(&self, id: &str) -> Option<PathBuf> {
        let path = self.doc_dir.join(self.table.get(id)?);
        path.is_file().then_some(path)
    }

    /// Drop a resource from the table and from disk.
    pub fn delete(&mut self, id: &str) {
        let Some(relative) = self.table.remove(id) else {
            return;
        };
        if let Err(e) = std::fs::remove_file(self.doc_dir.join(relative)) {
            warn!("cannot remove resource {id}: {e}");
        }
    }

    /// Remove the whole cache directory tree.
    pub fn clear(&mut self) {
        self.table.clear();
        if self.doc_dir.exists()
            && let Err(e) = std::fs::remove_dir_all(&self.doc_dir)
        {
            warn!("cache clearing is unsuccessful: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (tempfile::TempDir, ResourceManager) {
        let dir = tempfile::tempdir().unwrap();
        let rm = ResourceManager::create(dir.path().join("doc")).unwrap();
        (dir, rm)
    }

    #[test]
    fn cache_structure() {
        let (_dir, rm) = manager();
        for sub in ["image", "profile", "preview"] {
            assert!(rm.doc_dir().join(sub).is_dir());
        }
        assert_eq!(
            std::fs::read_to_string(rm.doc_dir().join("mimetype")).unwrap(),
            MIMETYPE
        );
    }

    #[test]
    fn put_get_delete() {
        let (_dir, mut rm) = manager();

        let id = rm.put(ResourcePlace::Image, b"pixels").unwrap();
        let path = rm.get(&id).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"pixels");

        rm.delete(&id);
        assert_eq!(rm.get(&id), None);
        assert!(!path.exists());
    }

    #[test]
    fn identical_content_reuses_the_id() {
        let (_dir, mut rm) = manager();
        let a = rm.put(ResourcePlace::Image, b"same").unwrap();
        let b = rm.put(ResourcePlace::Image, b"same").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn clear_removes_the_tree() {
        let (_dir, mut rm) = manager();
        rm.put(ResourcePlace::Preview, b"thumb").unwrap();
        rm.clear();
        assert!(!rm.doc_dir().exists());

        // A second clear is a no-op.
        rm.clear();
    }

    #[test]
    fn missing_resource_is_none() {
        let (_dir, rm) = manager();
        assert_eq!(rm.get("no-such-id"), None);
    }
}
