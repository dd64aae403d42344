//! Test-file registry: immutable name -> (size, seed) mapping built once
//! from the command-line file specs.
//!
//! A spec list is slash-delimited, each entry a comma-delimited
//! `name,size,seed` triple, e.g. `testfile_1M,1M,1/testfile_1G,1G,0x02`.
//! Sizes accept decimal or `0x` hex with an optional `k`/`m`/`g` suffix
//! (powers of 1024); seeds are non-zero 32-bit decimal or `0x` hex.
//!
//! The registry never mutates after construction, so any number of threads
//! may look files up concurrently without synchronization.

use std::collections::HashMap;
use thiserror::Error;

/// One virtual file served by the filesystem. Created at startup from a
/// parsed spec, immutable for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFile {
    pub name: String,
    /// Total file size in bytes, always non-zero.
    pub size: u64,
    /// Per-file seed, always non-zero. Files with the same size and seed
    /// have byte-identical content.
    pub seed: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("no test files specified")]
    Empty,
    #[error("invalid file spec {0:?}: expected name,size,seed")]
    MissingField(String),
    #[error("invalid file spec {0:?}: empty name")]
    EmptyName(String),
    #[error("invalid size {0:?}: expected a non-zero number with optional k/m/g suffix")]
    InvalidSize(String),
    #[error("invalid seed {0:?}: expected a non-zero 32-bit number")]
    InvalidSeed(String),
    #[error("duplicate file name {0:?}")]
    DuplicateName(String),
}

/// Immutable mapping from file name to metadata, preserving spec order.
/// Spec order drives directory listing and inode assignment, so it must be
/// stable across the process lifetime.
#[derive(Debug)]
pub struct FileRegistry {
    files: Vec<TestFile>,
    by_name: HashMap<String, usize>,
}

impl FileRegistry {
    /// Parse a slash-delimited list of `name,size,seed` triples. Any
    /// malformed entry fails the whole list; startup treats that as fatal.
    pub fn from_spec_list(list: &str) -> Result<Self, SpecError> {
        let mut files = Vec::new();
        let mut by_name = HashMap::new();
        for spec in list.split('/').filter(|s| !s.is_empty()) {
            let mut fields = spec.splitn(3, ',');
            let (Some(name), Some(size_str), Some(seed_str)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(SpecError::MissingField(spec.to_string()));
            };
            if name.is_empty() {
                return Err(SpecError::EmptyName(spec.to_string()));
            }
            let size = parse_size(size_str)
                .ok_or_else(|| SpecError::InvalidSize(size_str.to_string()))?;
            let seed = parse_seed(seed_str)
                .ok_or_else(|| SpecError::InvalidSeed(seed_str.to_string()))?;
            if by_name.insert(name.to_string(), files.len()).is_some() {
                return Err(SpecError::DuplicateName(name.to_string()));
            }
            files.push(TestFile {
                name: name.to_string(),
                size,
                seed,
            });
        }
        if files.is_empty() {
            return Err(SpecError::Empty);
        }
        Ok(Self { files, by_name })
    }

    pub fn lookup(&self, name: &str) -> Option<&TestFile> {
        self.by_name.get(name).map(|&i| &self.files[i])
    }

    /// Position of `name` in spec order; the FUSE layer derives stable
    /// inode numbers from it.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, position: usize) -> Option<&TestFile> {
        self.files.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestFile> {
        self.files.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Decimal or `0x`-prefixed hexadecimal.
fn parse_number(s: &str) -> Option<u64> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

fn parse_size(s: &str) -> Option<u64> {
    let (digits, unit) = match s.char_indices().last()? {
        (i, 'k') | (i, 'K') => (&s[..i], 1u64 << 10),
        (i, 'm') | (i, 'M') => (&s[..i], 1u64 << 20),
        (i, 'g') | (i, 'G') => (&s[..i], 1u64 << 30),
        _ => (s, 1),
    };
    let size = parse_number(digits)?.checked_mul(unit)?;
    (size > 0).then_some(size)
}

fn parse_seed(s: &str) -> Option<u32> {
    let seed = u32::try_from(parse_number(s)?).ok()?;
    (seed != 0).then_some(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_single_spec() {
        let reg = FileRegistry::from_spec_list("testfile_1M,1M,1").unwrap();
        assert_eq!(reg.len(), 1);
        let f = reg.lookup("testfile_1M").unwrap();
        assert_eq!(f.size, 1 << 20);
        assert_eq!(f.seed, 1);
    }

    #[test]
    fn test_parses_multiple_specs_in_order() {
        let reg = FileRegistry::from_spec_list("a,1k,1/b,2m,2/c,3g,0x03").unwrap();
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(reg.lookup("a").unwrap().size, 1024);
        assert_eq!(reg.lookup("b").unwrap().size, 2 << 20);
        assert_eq!(reg.lookup("c").unwrap().size, 3 << 30);
        assert_eq!(reg.position("c"), Some(2));
    }

    #[test]
    fn test_size_suffixes_and_hex() {
        assert_eq!(parse_size("512"), Some(512));
        assert_eq!(parse_size("4k"), Some(4096));
        assert_eq!(parse_size("4K"), Some(4096));
        assert_eq!(parse_size("1M"), Some(1 << 20));
        assert_eq!(parse_size("2G"), Some(2 << 30));
        assert_eq!(parse_size("0x10"), Some(16));
        assert_eq!(parse_size("0x10k"), Some(16 * 1024));
        assert_eq!(parse_size("0"), None);
        assert_eq!(parse_size("1x"), None);
        assert_eq!(parse_size("k"), None);
        assert_eq!(parse_size(""), None);
    }

    #[test]
    fn test_seed_parsing() {
        assert_eq!(parse_seed("1"), Some(1));
        assert_eq!(parse_seed("0x02"), Some(2));
        assert_eq!(parse_seed("4294967295"), Some(u32::MAX));
        // zero, overflow and trailing garbage are rejected
        assert_eq!(parse_seed("0"), None);
        assert_eq!(parse_seed("4294967296"), None);
        assert_eq!(parse_seed("1z"), None);
    }

    #[test]
    fn test_rejects_malformed_specs() {
        assert_eq!(FileRegistry::from_spec_list("").unwrap_err(), SpecError::Empty);
        assert!(matches!(
            FileRegistry::from_spec_list("nameonly"),
            Err(SpecError::MissingField(_))
        ));
        assert!(matches!(
            FileRegistry::from_spec_list("a,1M"),
            Err(SpecError::MissingField(_))
        ));
        assert!(matches!(
            FileRegistry::from_spec_list(",1M,1"),
            Err(SpecError::EmptyName(_))
        ));
        assert!(matches!(
            FileRegistry::from_spec_list("a,0,1"),
            Err(SpecError::InvalidSize(_))
        ));
        assert!(matches!(
            FileRegistry::from_spec_list("a,1M,0"),
            Err(SpecError::InvalidSeed(_))
        ));
        // a fourth field ends up glued to the seed and is rejected there
        assert!(matches!(
            FileRegistry::from_spec_list("a,1M,1,extra"),
            Err(SpecError::InvalidSeed(_))
        ));
        assert!(matches!(
            FileRegistry::from_spec_list("a,1M,1/a,2M,2"),
            Err(SpecError::DuplicateName(_))
        ));
    }
}
