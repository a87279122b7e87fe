//! Directory-backed storage: one file per slot.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{KeyValueStore, StorageError, validate_key};

/// Storage slots persisted as files under a directory.
///
/// Writes go to a temporary file that is then renamed over the slot, so a
/// reader never sees a half-written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "Opened file storage");
        Ok(Self { dir })
    }

    /// Directory holding the slot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        let tmp_path = self.dir.join(format!(".{key}.tmp"));

        write_and_rename(&tmp_path, &path, value).inspect_err(|_| {
            if let Err(e) = fs::remove_file(&tmp_path) {
                debug!(path = %tmp_path.display(), error = %e, "Temporary slot file not removed");
            }
        })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn write_and_rename(tmp_path: &Path, path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp_path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp_path, path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("slots")).unwrap();

        assert_eq!(store.get("cart").unwrap(), None);
        store.set("cart", "first").unwrap();
        store.set("cart", "second").unwrap();
        assert_eq!(store.get("cart").unwrap().as_deref(), Some("second"));

        // Survives reopening
        let reopened = FileStore::open(store.dir()).unwrap();
        assert_eq!(reopened.get("cart").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("token", "abc").unwrap();
        store.remove("token").unwrap();
        store.remove("token").unwrap();
        assert_eq!(store.get("token").unwrap(), None);
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        // A directory in the slot's place makes the final rename fail.
        fs::create_dir(dir.path().join("cart")).unwrap();
        fs::write(dir.path().join("cart").join("keep"), "x").unwrap();

        assert!(matches!(store.set("cart", "[]"), Err(StorageError::Io(_))));
        assert!(!dir.path().join(".cart.tmp").exists());
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
