// src/fs/mock.rs

use super::FileSystem;
use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: Vec<u8>, readable: bool },
    Dir,
    Symlink(PathBuf),
}

/// In-memory filesystem for deterministic tests.
///
/// Paths are used verbatim as keys; no normalization happens here.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut files = self.files.lock().unwrap();
        files.insert(
            path.as_ref().to_path_buf(),
            MockEntry::File {
                content: content.into(),
                readable: true,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.files.lock().unwrap();
        files.insert(path.as_ref().to_path_buf(), MockEntry::Dir);
    }

    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        let mut files = self.files.lock().unwrap();
        files.insert(
            path.as_ref().to_path_buf(),
            MockEntry::Symlink(target.as_ref().to_path_buf()),
        );
    }

    /// Make an existing file fail to open with `PermissionDenied`.
    pub fn deny_read(&self, path: impl AsRef<Path>) {
        let mut files = self.files.lock().unwrap();
        if let Some(MockEntry::File { readable, .. }) = files.get_mut(path.as_ref()) {
            *readable = false;
        }
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let mut files = self.files.lock().unwrap();
        files.remove(path.as_ref());
    }

    /// Current content of a file, if it exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let files = self.files.lock().unwrap();
        match files.get(path.as_ref()) {
            Some(MockEntry::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    /// Current content of a file as UTF-8 text, if it exists.
    pub fn read_string(&self, path: impl AsRef<Path>) -> Option<String> {
        self.contents(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl FileSystem for MockFileSystem {
    fn is_regular_file(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(files.get(path), Some(MockEntry::File { .. }))
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.contains_key(path)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::File { content, readable: true }) => {
                Ok(Box::new(Cursor::new(content.clone())))
            }
            Some(MockEntry::File { readable: false, .. }) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {:?}", path),
            )),
            Some(_) => Err(io::Error::other(format!("not a file: {:?}", path))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )),
        }
    }

    fn create_write(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        let mut files = self.files.lock().unwrap();
        if matches!(files.get(path), Some(MockEntry::Dir)) {
            return Err(io::Error::other(format!("is a directory: {:?}", path)));
        }
        files.insert(
            path.to_path_buf(),
            MockEntry::File {
                content: Vec::new(),
                readable: true,
            },
        );
        Ok(Box::new(MockWriter {
            path: path.to_path_buf(),
            files: Arc::clone(&self.files),
        }))
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut files = self.files.lock().unwrap();
        match files.remove(from) {
            Some(entry) => {
                files.insert(to.to_path_buf(), entry);
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", from),
            )),
        }
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::Dir) => Err(io::Error::other(format!("is a directory: {:?}", path))),
            Some(_) => {
                files.remove(path);
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )),
        }
    }
}

/// Writer that appends straight into the shared mock entry.
struct MockWriter {
    path: PathBuf,
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut files = self.files.lock().unwrap();
        match files.get_mut(&self.path) {
            Some(MockEntry::File { content, .. }) => {
                content.extend_from_slice(buf);
                Ok(buf.len())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file removed while writing: {:?}", self.path),
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
