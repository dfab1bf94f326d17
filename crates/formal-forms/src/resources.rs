//! Transient resources allocated by widgets while processing input.
//!
//! A widget that receives an upload parks it here so that it survives a
//! re-display of the form: the browser will not send the file again, but it
//! will send back the resource id. Each resource is a temporary file that is
//! deleted when the resource is released.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use formal_core::FormalResult;
use formal_http::UploadedFile;
use tempfile::NamedTempFile;

struct StoredResource {
    file: NamedTempFile,
    name: String,
    content_type: String,
}

#[derive(Default)]
struct Inner {
    resources: HashMap<String, StoredResource>,
    by_key: HashMap<String, String>,
}

/// Holds the temporary resources of one form.
///
/// # Examples
///
/// ```
/// use formal_forms::resources::ResourceManager;
/// use formal_http::UploadedFile;
///
/// let manager = ResourceManager::new(None);
/// let id = manager
///     .register("avatar", &UploadedFile::new("me.png", "image/png", vec![1, 2, 3]))
///     .unwrap();
///
/// assert_eq!(manager.get(&id).unwrap().unwrap().content, vec![1, 2, 3]);
/// assert_eq!(manager.clear_up_resources(), 1);
/// assert_eq!(manager.clear_up_resources(), 0);
/// ```
pub struct ResourceManager {
    dir: Option<PathBuf>,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("dir", &self.dir)
            .field("len", &self.len())
            .finish()
    }
}

impl ResourceManager {
    /// Creates a manager storing files in `dir`, or in the system temporary
    /// directory when `None`.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Stores `file` for the field `key` and returns its resource id.
    ///
    /// A later registration for the same key replaces the earlier one.
    pub fn register(&self, key: &str, file: &UploadedFile) -> FormalResult<String> {
        self.register_in(key, file, None)
    }

    /// Like [`register`](Self::register), storing the file in `dir` when
    /// given instead of the manager's own directory.
    pub fn register_in(
        &self,
        key: &str,
        file: &UploadedFile,
        dir: Option<&Path>,
    ) -> FormalResult<String> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("formal-");
        let mut tmp = match dir.or(self.dir.as_deref()) {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        tmp.write_all(&file.content)?;
        tmp.flush()?;

        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut inner = self.inner.lock().expect("resource lock poisoned");
        if let Some(previous) = inner.by_key.insert(key.to_string(), id.clone()) {
            inner.resources.remove(&previous);
        }
        inner.resources.insert(
            id.clone(),
            StoredResource {
                file: tmp,
                name: file.name.clone(),
                content_type: file.content_type.clone(),
            },
        );
        tracing::debug!(key, resource = %id, size = file.size, "Registered widget resource");
        Ok(id)
    }

    /// Reads a stored resource back. Returns `None` for an unknown id.
    pub fn get(&self, id: &str) -> FormalResult<Option<UploadedFile>> {
        let inner = self.inner.lock().expect("resource lock poisoned");
        let Some(stored) = inner.resources.get(id) else {
            return Ok(None);
        };
        let content = std::fs::read(stored.file.path())?;
        Ok(Some(UploadedFile::new(
            stored.name.clone(),
            stored.content_type.clone(),
            content,
        )))
    }

    /// Returns the id of the resource registered for the field `key`.
    pub fn resource_id(&self, key: &str) -> Option<String> {
        let inner = self.inner.lock().expect("resource lock poisoned");
        inner.by_key.get(key).cloned()
    }

    /// Returns the number of live resources.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("resource lock poisoned").resources.len()
    }

    /// Returns `true` if no resources are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Releases every live resource and returns how many were released.
    ///
    /// Each resource is released once; calling this again without new
    /// registrations releases nothing.
    pub fn clear_up_resources(&self) -> usize {
        let drained: Vec<StoredResource> = {
            let mut inner = self.inner.lock().expect("resource lock poisoned");
            inner.by_key.clear();
            inner.resources.drain().map(|(_, r)| r).collect()
        };
        let count = drained.len();
        for resource in drained {
            if let Err(e) = resource.file.close() {
                tracing::warn!(error = %e, "Failed to remove widget resource");
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content: &[u8]) -> UploadedFile {
        UploadedFile::new("notes.txt", "text/plain", content.to_vec())
    }

    #[test]
    fn test_register_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ResourceManager::new(Some(dir.path().to_path_buf()));
        let id = manager.register("doc", &upload(b"hello")).unwrap();

        let file = manager.get(&id).unwrap().unwrap();
        assert_eq!(file.name, "notes.txt");
        assert_eq!(file.content_type, "text/plain");
        assert_eq!(file.content, b"hello");
        assert_eq!(manager.resource_id("doc"), Some(id));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_get_unknown() {
        let manager = ResourceManager::new(None);
        assert!(manager.get("nope").unwrap().is_none());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_reregister_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ResourceManager::new(Some(dir.path().to_path_buf()));
        let first = manager.register("doc", &upload(b"one")).unwrap();
        let second = manager.register("doc", &upload(b"two")).unwrap();

        assert_ne!(first, second);
        assert_eq!(manager.len(), 1);
        assert!(manager.get(&first).unwrap().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_clear_up_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ResourceManager::new(Some(dir.path().to_path_buf()));
        manager.register("a", &upload(b"1")).unwrap();
        manager.register("b", &upload(b"2")).unwrap();

        assert_eq!(manager.clear_up_resources(), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(manager.clear_up_resources(), 0);
        assert!(manager.resource_id("a").is_none());
    }

    #[test]
    fn test_register_in_overrides_dir() {
        let own = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let manager = ResourceManager::new(Some(own.path().to_path_buf()));

        let id = manager.register_in("doc", &upload(b"x"), Some(other.path())).unwrap();
        assert_eq!(std::fs::read_dir(own.path()).unwrap().count(), 0);
        assert_eq!(std::fs::read_dir(other.path()).unwrap().count(), 1);
        assert_eq!(manager.get(&id).unwrap().unwrap().content, b"x");

        manager.register_in("more", &upload(b"y"), None).unwrap();
        assert_eq!(std::fs::read_dir(own.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_dir_is_io_error() {
        let manager = ResourceManager::new(Some(PathBuf::from("/nonexistent/formal/uploads")));
        let err = manager.register("a", &upload(b"1")).unwrap_err();
        assert!(matches!(err, formal_core::FormalError::IoError(_)));
    }
}
