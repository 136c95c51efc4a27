//! Shared test utilities

#![allow(dead_code)]

use refscope::document::{parse_document, Specification};
use refscope::error::Error;
use refscope::fs::FileSystem;
use refscope::reference::{DocumentFetcher, ResolveOptions};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex};

/// Cached binary path for the refscope CLI to avoid repeated lookups
#[allow(deprecated)]
pub static REFSCOPE_BIN: LazyLock<PathBuf> =
    LazyLock::new(|| assert_cmd::cargo::cargo_bin("refscope"));

/// Test helper to create a command with the cached binary
pub fn refscope_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(&*REFSCOPE_BIN)
}

/// Parses `content` as the root document `location`, with default options
pub fn parse(content: &str, location: &str) -> (Specification, ResolveOptions) {
    let spec = parse_document(content, location).unwrap();
    let options = ResolveOptions::new(Arc::clone(&spec.raw));
    (spec, options)
}

// In-memory FileSystem for testing
#[derive(Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    dirs: Arc<Mutex<HashMap<PathBuf, bool>>>,
    io_error_on_write: Arc<Mutex<bool>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_io_error_on_write(&self, value: bool) {
        *self.io_error_on_write.lock().unwrap() = value;
    }

    pub fn add_file(&self, path: &Path, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.as_bytes().to_vec());
        if let Some(parent) = path.parent() {
            self.dirs.lock().unwrap().insert(parent.to_path_buf(), true);
        }
    }

    pub fn get_file_content(&self, path: &Path) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|v| String::from_utf8_lossy(v).to_string())
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|v| String::from_utf8_lossy(v).to_string())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "File not found"))
    }

    fn write_all(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if *self.io_error_on_write.lock().unwrap() {
            return Err(io::Error::other("Mock I/O error on write"));
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.dirs.lock().unwrap().insert(path.to_path_buf(), true);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
            || self.dirs.lock().unwrap().contains_key(path)
    }
}

/// Serves documents from memory and counts how often each one was requested
#[derive(Default)]
pub struct CountingFetcher {
    documents: HashMap<String, String>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl CountingFetcher {
    pub fn new<I, K, V>(documents: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            documents: documents
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self, location: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(location)
            .copied()
            .unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl DocumentFetcher for CountingFetcher {
    fn fetch(&self, location: &str) -> Result<String, Error> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(location.to_string())
            .or_default() += 1;
        self.documents
            .get(location)
            .cloned()
            .ok_or_else(|| Error::fetch_failed(location, "no such document"))
    }
}
