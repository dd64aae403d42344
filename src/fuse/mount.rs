//! Mount helpers for starting/stopping FUSE
//!
//! Notes:
//! - Only supported on Linux. The default path is an unprivileged mount
//!   via fusermount3; `privileged` uses the plain mount syscall and needs
//!   root.
//! - These helpers are thin wrappers over rfuse3 raw Session APIs.

use std::path::Path;

#[cfg(target_os = "linux")]
use rfuse3::MountOptions;

use crate::vfs::fs::SeedVfs;

/// Build mount options for a seedfs mount. The filesystem is read-only by
/// construction; telling the kernel lets it reject writes early.
#[cfg(target_os = "linux")]
fn mount_options(allow_other: bool) -> MountOptions {
    let uid = unsafe { libc::getuid() };
    let gid = unsafe { libc::getgid() };
    let mut mo = MountOptions::default();
    mo.fs_name("seedfs")
        .read_only(true)
        .uid(uid)
        .gid(gid)
        .allow_other(allow_other);
    mo
}

/// Mount a [`SeedVfs`] on the given empty directory.
#[cfg(target_os = "linux")]
pub async fn mount_seed_vfs(
    fs: SeedVfs,
    mount_point: impl AsRef<Path>,
    allow_other: bool,
    privileged: bool,
) -> std::io::Result<rfuse3::raw::MountHandle> {
    let session = rfuse3::raw::Session::new(mount_options(allow_other));
    if privileged {
        session.mount(fs, mount_point).await
    } else {
        // requires fusermount3 in PATH
        session.mount_with_unprivileged(fs, mount_point).await
    }
}

/// Fallback stub for non-Linux targets.
#[cfg(not(target_os = "linux"))]
pub async fn mount_seed_vfs(
    _fs: SeedVfs,
    _mount_point: impl AsRef<Path>,
    _allow_other: bool,
    _privileged: bool,
) -> std::io::Result<rfuse3::raw::MountHandle> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "FUSE mount is only supported on Linux in this build",
    ))
}
