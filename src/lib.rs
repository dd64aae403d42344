// Library crate for seedfs: re-export internal modules for reuse by the
// mount binary and integration tests.

pub mod fuse;
pub mod r#gen;
pub mod registry;
pub mod vfs;
