//! FUSE adapter and request handling
//!
//! Implements the rfuse3 `Filesystem` trait for [`SeedVfs`], translating
//! kernel requests into calls on the read-only VFS interface. The
//! filesystem is a single flat root directory; every entry is a regular
//! read-only file whose content is generated on demand.
//!
//! Inode scheme: the root is inode 1 and the file registered at position
//! `p` is inode `p + 2`. The registry never changes after startup, so the
//! mapping is stable for the life of the mount.
//!
//! Main components:
//! - Implementation of the `Filesystem` trait for `SeedVfs` (read-only
//!   subset; writes are answered by the rfuse3 defaults).
//! - `mount`: helpers for mounting via fusermount3.
pub mod mount;

use std::ffi::{OsStr, OsString};
use std::num::NonZeroU32;
use std::pin::Pin;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use futures_util::stream::{self, Stream};
use log::debug;
use rfuse3::Result as FuseResult;
use rfuse3::raw::reply::{
    DirectoryEntry, DirectoryEntryPlus, ReplyAttr, ReplyData, ReplyDirectory, ReplyDirectoryPlus,
    ReplyEntry, ReplyInit, ReplyOpen, ReplyStatFs,
};
use rfuse3::raw::{Filesystem, Request};
use rfuse3::{FileType as FuseFileType, Timestamp};

use crate::registry::TestFile;
use crate::vfs::fs::{ReadOnlyFs, SeedVfs};

const ROOT_INO: u64 = 1;
const TTL: Duration = Duration::from_secs(1);

impl SeedVfs {
    fn ino_of(&self, name: &str) -> Option<u64> {
        self.registry().position(name).map(|p| p as u64 + 2)
    }

    fn file_by_ino(&self, ino: u64) -> Option<&TestFile> {
        self.registry().get(ino.checked_sub(2)? as usize)
    }
}

impl Filesystem for SeedVfs {
    type DirEntryStream<'a>
        = Pin<Box<dyn Stream<Item = FuseResult<DirectoryEntry>> + Send + 'a>>
    where
        Self: 'a;

    type DirEntryPlusStream<'a>
        = Pin<Box<dyn Stream<Item = FuseResult<DirectoryEntryPlus>> + Send + 'a>>
    where
        Self: 'a;

    async fn init(&self, _req: Request) -> FuseResult<ReplyInit> {
        let max_write = NonZeroU32::new(64 * 1024).unwrap();
        Ok(ReplyInit { max_write })
    }

    async fn destroy(&self, _req: Request) {}

    async fn lookup(&self, req: Request, parent: u64, name: &OsStr) -> FuseResult<ReplyEntry> {
        // flat namespace: only the root has children
        if parent != ROOT_INO {
            return Err(libc::ENOENT.into());
        }
        let name = name.to_string_lossy();
        let Some(ino) = self.ino_of(name.as_ref()) else {
            return Err(libc::ENOENT.into());
        };
        let Some(file) = self.file_by_ino(ino) else {
            return Err(libc::ENOENT.into());
        };
        Ok(ReplyEntry {
            ttl: TTL,
            attr: file_attr(ino, file.size, &req),
            generation: 0,
        })
    }

    async fn getattr(
        &self,
        req: Request,
        ino: u64,
        _fh: Option<u64>,
        _flags: u32,
    ) -> FuseResult<ReplyAttr> {
        let attr = if ino == ROOT_INO {
            root_attr(&req)
        } else {
            let Some(file) = self.file_by_ino(ino) else {
                return Err(libc::ENOENT.into());
            };
            file_attr(ino, file.size, &req)
        };
        Ok(ReplyAttr { ttl: TTL, attr })
    }

    async fn open(&self, _req: Request, ino: u64, flags: u32) -> FuseResult<ReplyOpen> {
        if ino == ROOT_INO {
            return Err(libc::EISDIR.into());
        }
        let Some(file) = self.file_by_ino(ino) else {
            return Err(libc::ENOENT.into());
        };
        // stateless IO: validate the access mode, return fh=0
        ReadOnlyFs::open(self, &file.name, flags).map_err(rfuse3::Errno::from)?;
        Ok(ReplyOpen { fh: 0, flags: 0 })
    }

    async fn opendir(&self, _req: Request, ino: u64, _flags: u32) -> FuseResult<ReplyOpen> {
        if ino != ROOT_INO {
            if self.file_by_ino(ino).is_some() {
                return Err(libc::ENOTDIR.into());
            }
            return Err(libc::ENOENT.into());
        }
        Ok(ReplyOpen { fh: 0, flags: 0 })
    }

    async fn read(
        &self,
        _req: Request,
        ino: u64,
        _fh: u64,
        offset: u64,
        size: u32,
    ) -> FuseResult<ReplyData> {
        let Some(file) = self.file_by_ino(ino) else {
            return Err(libc::ENOENT.into());
        };
        debug!(
            "read {} offset={} size={}",
            file.name, offset, size
        );
        let data = self.reader().read(file, offset, size as usize);
        Ok(ReplyData {
            data: Bytes::from(data),
        })
    }

    async fn readdir<'a>(
        &'a self,
        _req: Request,
        ino: u64,
        _fh: u64,
        offset: i64,
    ) -> FuseResult<ReplyDirectory<Self::DirEntryStream<'a>>> {
        if ino != ROOT_INO {
            if self.file_by_ino(ino).is_some() {
                return Err(libc::ENOTDIR.into());
            }
            return Err(libc::ENOENT.into());
        }

        // "." and ".." first; offset is the offset of the last entry the
        // kernel has seen, so resume from offset+1
        let mut all: Vec<DirectoryEntry> = Vec::with_capacity(self.registry().len() + 2);
        all.push(DirectoryEntry {
            inode: ROOT_INO,
            kind: FuseFileType::Directory,
            name: OsString::from("."),
            offset: 1,
        });
        all.push(DirectoryEntry {
            inode: ROOT_INO,
            kind: FuseFileType::Directory,
            name: OsString::from(".."),
            offset: 2,
        });
        for (i, file) in self.registry().iter().enumerate() {
            all.push(DirectoryEntry {
                inode: i as u64 + 2,
                kind: FuseFileType::RegularFile,
                name: OsString::from(file.name.clone()),
                offset: (i as i64) + 3,
            });
        }

        let start = if offset <= 0 { 0 } else { offset as usize };
        let rest = if start >= all.len() {
            Vec::new()
        } else {
            all[start..].to_vec()
        };
        let entries: Self::DirEntryStream<'a> = Box::pin(stream::iter(rest.into_iter().map(Ok)));
        Ok(ReplyDirectory { entries })
    }

    async fn readdirplus<'a>(
        &'a self,
        req: Request,
        ino: u64,
        _fh: u64,
        offset: u64,
        _lock_owner: u64,
    ) -> FuseResult<ReplyDirectoryPlus<Self::DirEntryPlusStream<'a>>> {
        if ino != ROOT_INO {
            if self.file_by_ino(ino).is_some() {
                return Err(libc::ENOTDIR.into());
            }
            return Err(libc::ENOENT.into());
        }

        let mut all: Vec<DirectoryEntryPlus> = Vec::with_capacity(self.registry().len() + 2);
        for (name, off) in [(".", 1i64), ("..", 2)] {
            all.push(DirectoryEntryPlus {
                inode: ROOT_INO,
                generation: 0,
                kind: FuseFileType::Directory,
                name: OsString::from(name),
                offset: off,
                attr: root_attr(&req),
                entry_ttl: TTL,
                attr_ttl: TTL,
            });
        }
        for (i, file) in self.registry().iter().enumerate() {
            let ino = i as u64 + 2;
            all.push(DirectoryEntryPlus {
                inode: ino,
                generation: 0,
                kind: FuseFileType::RegularFile,
                name: OsString::from(file.name.clone()),
                offset: (i as i64) + 3,
                attr: file_attr(ino, file.size, &req),
                entry_ttl: TTL,
                attr_ttl: TTL,
            });
        }

        let start = if offset == 0 { 0 } else { offset as usize };
        let rest = if start >= all.len() {
            Vec::new()
        } else {
            all[start..].to_vec()
        };
        let entries: Self::DirEntryPlusStream<'a> =
            Box::pin(stream::iter(rest.into_iter().map(Ok)));
        Ok(ReplyDirectoryPlus { entries })
    }

    async fn statfs(&self, _req: Request, _ino: u64) -> FuseResult<ReplyStatFs> {
        let bsize = self.reader().layout().block_size;
        Ok(ReplyStatFs {
            blocks: 0,
            bfree: 0,
            bavail: 0,
            files: self.registry().len() as u64,
            ffree: 0,
            bsize,
            namelen: 255,
            frsize: bsize,
        })
    }

    // ===== stateless handles: nothing to release or flush =====

    async fn release(
        &self,
        _req: Request,
        _inode: u64,
        _fh: u64,
        _flags: u32,
        _lock_owner: u64,
        _flush: bool,
    ) -> FuseResult<()> {
        Ok(())
    }

    async fn flush(
        &self,
        _req: Request,
        _inode: u64,
        _fh: u64,
        _lock_owner: u64,
    ) -> FuseResult<()> {
        Ok(())
    }

    async fn releasedir(
        &self,
        _req: Request,
        _inode: u64,
        _fh: u64,
        _flags: u32,
    ) -> FuseResult<()> {
        Ok(())
    }

    async fn forget(&self, _req: Request, _inode: u64, _nlookup: u64) {}

    async fn batch_forget(&self, _req: Request, _inodes: &[(u64, u64)]) {}

    async fn interrupt(&self, _req: Request, _unique: u64) -> FuseResult<()> {
        Ok(())
    }
}

// =============== helpers ===============

fn root_attr(req: &Request) -> rfuse3::raw::reply::FileAttr {
    attr(ROOT_INO, FuseFileType::Directory, 0, 0o755, 2, req)
}

fn file_attr(ino: u64, size: u64, req: &Request) -> rfuse3::raw::reply::FileAttr {
    attr(ino, FuseFileType::RegularFile, size, 0o444, 1, req)
}

fn attr(
    ino: u64,
    kind: FuseFileType,
    size: u64,
    perm: u16,
    nlink: u32,
    req: &Request,
) -> rfuse3::raw::reply::FileAttr {
    let now = Timestamp::from(SystemTime::now());
    rfuse3::raw::reply::FileAttr {
        ino,
        size,
        blocks: size.div_ceil(512),
        atime: now,
        mtime: now,
        ctime: now,
        #[cfg(target_os = "macos")]
        crtime: now,
        kind,
        perm,
        nlink,
        uid: req.uid,
        gid: req.gid,
        rdev: 0,
        #[cfg(target_os = "macos")]
        flags: 0,
        blksize: 4096,
    }
}

#[cfg(all(test, target_os = "linux"))]
mod mount_tests {
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    use crate::fuse::mount::mount_seed_vfs;
    use crate::r#gen::layout::BlockLayout;
    use crate::r#gen::reader::BlockReader;
    use crate::registry::FileRegistry;
    use crate::vfs::fs::SeedVfs;

    // Mount smoke test, gated by an env var like the rest of our
    // privileged tests: set SEEDFS_FUSE_TEST=1 to enable.
    #[tokio::test]
    async fn smoke_mount_and_read_back() {
        if std::env::var("SEEDFS_FUSE_TEST").ok().as_deref() != Some("1") {
            eprintln!("skip fuse mount test: set SEEDFS_FUSE_TEST=1 to enable");
            return;
        }

        let registry = Arc::new(FileRegistry::from_spec_list("testfile_1M,1M,1").unwrap());
        let layout = BlockLayout::default();
        let fs = SeedVfs::new(layout, registry.clone());

        let mnt = tempfile::tempdir().expect("tmp mount");
        let handle = match mount_seed_vfs(fs, mnt.path(), false, false).await {
            Ok(h) => h,
            Err(e) => {
                eprintln!("skip fuse test: mount failed: {e}");
                return;
            }
        };
        tokio::time::sleep(StdDuration::from_millis(1000)).await;

        let names = std::fs::read_dir(mnt.path())
            .expect("readdir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect::<Vec<_>>();
        assert!(names.iter().any(|n| n.to_string_lossy() == "testfile_1M"));

        let through_kernel = std::fs::read(mnt.path().join("testfile_1M")).expect("read");
        let direct = BlockReader::new(layout).read(registry.lookup("testfile_1M").unwrap(), 0, 1 << 20);
        assert_eq!(through_kernel, direct);

        if let Err(e) = handle.unmount().await {
            eprintln!("unmount error: {e}");
        }
    }
}
