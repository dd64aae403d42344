//! Read-only VFS over the registry: getattr/readdir/open/read_at on a flat
//! root directory of generated files.

use std::sync::Arc;

use crate::r#gen::layout::BlockLayout;
use crate::r#gen::reader::BlockReader;
use crate::registry::{FileRegistry, TestFile};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    File,
    Dir,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileAttr {
    pub kind: FileType,
    pub size: u64,
}

/// Explicit read-only filesystem interface, implemented by a single
/// backend type and adapted to whatever userspace-filesystem binding the
/// platform provides. Errors are errno values so adapters can pass them
/// through unchanged.
pub trait ReadOnlyFs {
    /// Attributes for `name`, or `None` if unknown. The root directory is
    /// `"/"` (or the empty name).
    fn getattr(&self, name: &str) -> Option<FileAttr>;

    /// Names in the root directory, in registration order. There are no
    /// subdirectories.
    fn readdir(&self) -> Vec<String>;

    /// Validate an open: `EACCES` unless the access mode is read-only,
    /// `ENOENT` for unknown names.
    fn open(&self, name: &str, flags: u32) -> Result<(), i32>;

    /// Read up to `len` bytes at `offset`, clamped to the file size.
    /// `None` for unknown names.
    fn read_at(&self, name: &str, offset: u64, len: usize) -> Option<Vec<u8>>;
}

/// Backend serving deterministic generated content. Cheap to share: the
/// registry is immutable and reads touch no shared mutable state, so
/// concurrent requests need no locks.
pub struct SeedVfs {
    registry: Arc<FileRegistry>,
    reader: BlockReader,
}

impl SeedVfs {
    pub fn new(layout: BlockLayout, registry: Arc<FileRegistry>) -> Self {
        Self {
            registry,
            reader: BlockReader::new(layout),
        }
    }

    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    pub fn reader(&self) -> &BlockReader {
        &self.reader
    }

    fn resolve(&self, name: &str) -> Option<&TestFile> {
        self.registry.lookup(strip_root(name))
    }
}

/// Accept both bare names and absolute paths from binding layers.
fn strip_root(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

impl ReadOnlyFs for SeedVfs {
    fn getattr(&self, name: &str) -> Option<FileAttr> {
        let name = strip_root(name);
        if name.is_empty() {
            return Some(FileAttr {
                kind: FileType::Dir,
                size: 0,
            });
        }
        self.registry.lookup(name).map(|f| FileAttr {
            kind: FileType::File,
            size: f.size,
        })
    }

    fn readdir(&self) -> Vec<String> {
        self.registry.names().map(str::to_string).collect()
    }

    fn open(&self, name: &str, flags: u32) -> Result<(), i32> {
        if self.resolve(name).is_none() {
            return Err(libc::ENOENT);
        }
        if flags as i32 & libc::O_ACCMODE != libc::O_RDONLY {
            return Err(libc::EACCES);
        }
        Ok(())
    }

    fn read_at(&self, name: &str, offset: u64, len: usize) -> Option<Vec<u8>> {
        let file = self.resolve(name)?;
        Some(self.reader.read(file, offset, len))
    }
}
