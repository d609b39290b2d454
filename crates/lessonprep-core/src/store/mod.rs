//! Local textbook file store: one saved file per textbook id.
//!
//! Layout: `<root>/<id>/<file name>`. A record is replaced by writing a fresh
//! directory next to it, moving the old record aside and renaming the new one
//! into place. The old record is restored if that rename fails.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::StorageError;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A saved textbook file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Original file name, without directories.
    pub name: String,
    pub data: Vec<u8>,
}

impl StoredFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Read a file from disk, keeping its file name.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let data = fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "book.pdf".to_string());
        Ok(Self { name, data })
    }
}

/// Directory-backed store keyed by textbook id.
///
/// The directory is created on first use; later calls reuse it. Calls for the
/// same id must not run concurrently.
#[derive(Debug)]
pub struct BookStore {
    root: PathBuf,
    opened: OnceCell<()>,
}

fn check_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidId(id.to_string()))
    }
}

fn file_name(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.starts_with('.'))
        .unwrap_or("book.pdf")
}

async fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_dir_all(path).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Replace `target` with `staging`, keeping the previous `target` at `backup`
/// until the new one is in place.
async fn swap_into_place(staging: &Path, target: &Path, backup: &Path) -> std::io::Result<()> {
    remove_if_present(backup).await?;
    let had_previous = match fs::rename(target, backup).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => return Err(e),
    };

    if let Err(e) = fs::rename(staging, target).await {
        if had_previous {
            if let Err(restore) = fs::rename(backup, target).await {
                warn!("Could not restore {}: {}", target.display(), restore);
            }
        }
        return Err(e);
    }

    if had_previous {
        if let Err(e) = fs::remove_dir_all(backup).await {
            warn!("Could not remove old record {}: {}", backup.display(), e);
        }
    }
    Ok(())
}

impl BookStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            opened: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn open(&self) -> Result<&Path> {
        self.opened
            .get_or_try_init(|| async {
                debug!("Opening book store at {}", self.root.display());
                fs::create_dir_all(&self.root)
                    .await
                    .map_err(|source| StorageError::Open {
                        path: self.root.display().to_string(),
                        source,
                    })
            })
            .await?;
        Ok(&self.root)
    }

    /// Save `file` as the record for `id`, replacing any previous one.
    pub async fn put(&self, id: &str, file: &StoredFile) -> Result<()> {
        check_id(id)?;
        let root = self.open().await?;
        let save_err = |source| StorageError::Save {
            id: id.to_string(),
            source,
        };

        let staging = root.join(format!(".{}.tmp", id));
        let target = root.join(id);

        remove_if_present(&staging).await.map_err(save_err)?;
        fs::create_dir(&staging).await.map_err(save_err)?;
        fs::write(staging.join(file_name(&file.name)), &file.data)
            .await
            .map_err(save_err)?;

        let backup = root.join(format!(".{}.old", id));
        if let Err(e) = swap_into_place(&staging, &target, &backup).await {
            if let Err(cleanup) = fs::remove_dir_all(&staging).await {
                debug!("Could not remove staging for {}: {}", id, cleanup);
            }
            return Err(save_err(e));
        }

        debug!("Saved {} ({} bytes) for {}", file.name, file.data.len(), id);
        Ok(())
    }

    /// Load the record for `id`, if any.
    pub async fn get(&self, id: &str) -> Result<Option<StoredFile>> {
        check_id(id)?;
        let root = self.open().await?;
        let load_err = |source| StorageError::Load {
            id: id.to_string(),
            source,
        };

        let mut entries = match fs::read_dir(root.join(id)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(load_err(e)),
        };

        while let Some(entry) = entries.next_entry().await.map_err(load_err)? {
            if entry.file_type().await.map_err(load_err)?.is_file() {
                let data = fs::read(entry.path()).await.map_err(load_err)?;
                let name = entry.file_name().to_string_lossy().into_owned();
                return Ok(Some(StoredFile { name, data }));
            }
        }

        warn!("Record directory for {} is empty", id);
        Ok(None)
    }

    /// Remove the record for `id`. Removing a missing record succeeds.
    pub async fn delete(&self, id: &str) -> Result<()> {
        check_id(id)?;
        let root = self.open().await?;

        match fs::remove_dir_all(root.join(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Delete {
                id: id.to_string(),
                source,
            }),
        }
    }

    /// Ids of all saved records, sorted.
    pub async fn list(&self) -> Result<Vec<String>> {
        let root = self.open().await?;
        let load_err = |source| StorageError::Load {
            id: "*".to_string(),
            source,
        };

        let mut ids = Vec::new();
        let mut entries = fs::read_dir(root).await.map_err(load_err)?;
        while let Some(entry) = entries.next_entry().await.map_err(load_err)? {
            let name = entry.file_name().to_string_lossy().into_owned();
            // Staging and backup directories start with a dot and fail the id check
            if check_id(&name).is_ok() && entry.file_type().await.map_err(load_err)?.is_dir() {
                ids.push(name);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = BookStore::new(dir.path().join("books"));

        assert_eq!(store.get("science-7").await.unwrap(), None);

        let file = StoredFile::new("science.pdf", b"%PDF-1.5".to_vec());
        store.put("science-7", &file).await.unwrap();
        assert_eq!(store.get("science-7").await.unwrap(), Some(file));

        store.delete("science-7").await.unwrap();
        assert_eq!(store.get("science-7").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = BookStore::new(dir.path());

        store.put("math", &StoredFile::new("old.pdf", vec![1])).await.unwrap();
        store.put("math", &StoredFile::new("new.pdf", vec![2])).await.unwrap();

        let loaded = store.get("math").await.unwrap().unwrap();
        assert_eq!(loaded, StoredFile::new("new.pdf", vec![2]));
        assert_eq!(store.list().await.unwrap(), vec!["math".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = BookStore::new(dir.path());
        assert!(store.delete("nothing").await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = BookStore::new(dir.path());
        for id in ["", "../etc", "a/b", ".hidden"] {
            assert!(matches!(store.get(id).await, Err(StorageError::InvalidId(_))));
        }
    }

    #[tokio::test]
    async fn test_file_name_strips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = BookStore::new(dir.path());
        store
            .put("art", &StoredFile::new("../../escape.pdf", vec![7]))
            .await
            .unwrap();
        assert_eq!(store.get("art").await.unwrap().unwrap().name, "escape.pdf");
    }

    #[tokio::test]
    async fn test_failed_swap_restores_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = BookStore::new(dir.path());
        let original = StoredFile::new("old.pdf", vec![1, 2, 3]);
        store.put("math", &original).await.unwrap();

        let missing_staging = dir.path().join(".math.tmp");
        let result = swap_into_place(
            &missing_staging,
            &dir.path().join("math"),
            &dir.path().join(".math.old"),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(store.get("math").await.unwrap(), Some(original));
        assert_eq!(store.list().await.unwrap(), vec!["math".to_string()]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_put_into_read_only_store_keeps_record() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("books");
        let store = BookStore::new(&root);
        let original = StoredFile::new("old.pdf", vec![1]);
        store.put("math", &original).await.unwrap();

        std::fs::set_permissions(&root, std::fs::Permissions::from_mode(0o555)).unwrap();
        // Permission bits do not bind root
        let enforced = std::fs::create_dir(root.join("writable")).is_err();

        let result = store.put("math", &StoredFile::new("new.pdf", vec![2])).await;
        std::fs::set_permissions(&root, std::fs::Permissions::from_mode(0o755)).unwrap();

        if enforced {
            assert!(matches!(result, Err(StorageError::Save { .. })));
            assert_eq!(store.get("math").await.unwrap(), Some(original));
        }
    }

    #[tokio::test]
    async fn test_list_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = BookStore::new(dir.path());
        for id in ["b", "a", "c"] {
            store.put(id, &StoredFile::new("x.pdf", vec![])).await.unwrap();
        }
        assert_eq!(store.list().await.unwrap(), vec!["a", "b", "c"]);
    }
}
