//! Virtual filesystem surface
//!
//! Responsibilities:
//! - Define the explicit read-only filesystem interface (`ReadOnlyFs`)
//!   consumed by the FUSE adapter: attributes, directory listing, open
//!   validation and range reads.
//! - Provide the backend implementation (`SeedVfs`) that resolves names
//!   through the registry and serves content through the block reader.
//!
//! Submodules:
//! - `fs`: interface and backend implementation
pub mod fs;
