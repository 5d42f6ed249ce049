//! PDF artifact storage.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::error::Result;

/// Subdirectory (under the upload root) where invoice PDFs land
const INVOICE_DIR: &str = "invoices";

pub trait FileStore: Send + Sync {
    /// Store raw bytes and return a stable location string for them
    fn save(&self, bytes: &[u8], original_name: &str) -> Result<String>;

    /// Remove a stored artifact. Best effort: failures are logged, never returned.
    fn remove(&self, location: &str);
}

/// Stores files under `<root>/invoices/<unix-millis>-<original name>`
pub struct FsFileStore {
    root: PathBuf,
}

impl FsFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a location previously returned by `save`
    pub fn resolve(&self, location: &str) -> PathBuf {
        self.root.join(location.trim_start_matches('/'))
    }
}

/// Keep only the final path component of a client-supplied name
fn base_name(original_name: &str) -> &str {
    original_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("invoice.pdf")
}

impl FileStore for FsFileStore {
    fn save(&self, bytes: &[u8], original_name: &str) -> Result<String> {
        let dir = self.root.join(INVOICE_DIR);
        fs::create_dir_all(&dir)?;

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let filename = format!("{}-{}", millis, base_name(original_name));
        fs::write(dir.join(&filename), bytes)?;

        let location = format!("{}/{}", INVOICE_DIR, filename);
        debug!(%location, size = bytes.len(), "stored invoice file");
        Ok(location)
    }

    fn remove(&self, location: &str) {
        let path = self.resolve(location);
        if let Err(e) = fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "could not remove invoice file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_remove() {
        let dir = TempDir::new().unwrap();
        let store = FsFileStore::new(dir.path());

        let location = store.save(b"%PDF-1.4", "facture.pdf").unwrap();
        assert!(location.starts_with("invoices/"));
        assert!(location.ends_with("-facture.pdf"));

        let path = store.resolve(&location);
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");

        store.remove(&location);
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_missing_file_is_silent() {
        let dir = TempDir::new().unwrap();
        let store = FsFileStore::new(dir.path());
        store.remove("invoices/does-not-exist.pdf");
    }

    #[test]
    fn test_directory_components_are_dropped() {
        assert_eq!(base_name("../../etc/passwd"), "passwd");
        assert_eq!(base_name("C:\\scans\\f.pdf"), "f.pdf");
        assert_eq!(base_name("dir/"), "invoice.pdf");
    }
}
