//! Read-only memory-mapped payload files.
//!
//! A [`FileResource`] owns both the descriptor and the mapping. Dropping it
//! unmaps first, then closes; there is no way to observe one without the
//! other.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;

use crate::error::FileError;

/// Contents of a file to be sent after a transfer frame.
pub trait Payload {
    /// The full file contents.
    fn bytes(&self) -> &[u8];

    /// Size in bytes.
    fn size(&self) -> u64 {
        self.bytes().len() as u64
    }
}

/// Opens payload files for a [`Dispatcher`](crate::Dispatcher).
pub trait FileSource {
    /// Handle type; released when dropped.
    type File: Payload;

    /// Opens `path` for a single transfer.
    fn open(&self, path: &Path) -> Result<Self::File, FileError>;
}

/// [`FileSource`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappedFiles;

impl FileSource for MappedFiles {
    type File = FileResource;

    fn open(&self, path: &Path) -> Result<FileResource, FileError> {
        FileResource::open(path)
    }
}

/// A local file mapped read-only into memory.
#[derive(Debug)]
pub struct FileResource {
    /// Mapping of the whole file; `None` for empty files, which can't be mapped.
    map: Option<Mmap>,
    /// Open descriptor backing `map`, held until after it is unmapped.
    _file: File,
    /// Path as given, for diagnostics.
    path: PathBuf,
}

impl FileResource {
    /// Opens and maps `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let path = path.as_ref().to_path_buf();

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Err(FileError::NotFound { path, source });
            }
            Err(source) => return Err(FileError::NotReadable { path, source }),
        };

        let meta = match file.metadata() {
            Ok(m) => m,
            Err(source) => return Err(FileError::StatFailed { path, source }),
        };
        if !meta.is_file() {
            return Err(FileError::NotReadable {
                path,
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }

        let map = if meta.len() == 0 {
            None
        } else {
            match map_file(&file) {
                Ok(m) => Some(m),
                Err(source) => return Err(FileError::MapFailed { path, source }),
            }
        };

        debug!(path = %path.display(), size = meta.len(), "mapped file");
        Ok(Self {
            map,
            _file: file,
            path,
        })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes.
    pub fn len(&self) -> u64 {
        self.as_bytes().len() as u64
    }

    /// Returns `true` if the file is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_none()
    }

    /// The mapped contents.
    pub fn as_bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or_default()
    }

}

/// Maps the whole of `file` read-only.
#[allow(unsafe_code)]
fn map_file(file: &File) -> io::Result<Mmap> {
    // SAFETY: the mapping is read-only and is dropped before `file`.
    // Truncation by another process while mapped is outside our control.
    unsafe { Mmap::map(file) }
}

impl Payload for FileResource {
    fn bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl Drop for FileResource {
    fn drop(&mut self) {
        // Unmap before the descriptor field is dropped.
        drop(self.map.take());
        debug!(path = %self.path.display(), "released file");
    }
}
