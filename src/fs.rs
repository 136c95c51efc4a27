//! Filesystem seam shared by document loading, [`FileFetcher`](crate::reference::FileFetcher)
//! and the config manager, so tests can run against an in-memory tree.

use std::io;
use std::path::Path;

pub trait FileSystem {
    /// Reads a whole document or config file as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or not UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replaces the contents of `path`, creating the file when needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    fn write_all(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_all(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        OsFileSystem.create_dir_all(&nested).unwrap();
        let file = nested.join("api.yaml");
        assert!(!OsFileSystem.exists(&file));
        OsFileSystem.write_all(&file, b"openapi: 3.1.0\n").unwrap();
        assert_eq!(OsFileSystem.read_to_string(&file).unwrap(), "openapi: 3.1.0\n");
    }
}
