//! Block layout: fixed power-of-two block size and offset math.

/// Default block size (64 KiB).
pub const DEFAULT_BLOCK_SIZE: u32 = 64 * 1024;

/// Describes how a file's byte space is carved into fixed-size blocks.
///
/// Blocks are addressed by 32-bit indices, which caps the representable
/// offset space at `block_size * 2^32` bytes (256 TiB at the default
/// 64 KiB). Tests use a reduced layout to make block-boundary cases
/// tractable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    /// Block size in bytes; a power of two, at least one generator word.
    pub block_size: u32,
}

impl Default for BlockLayout {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE)
    }
}

impl BlockLayout {
    pub fn new(block_size: u32) -> Self {
        assert!(
            block_size.is_power_of_two(),
            "block size must be a power of two"
        );
        assert!(block_size >= 4, "block size must hold a generator word");
        Self { block_size }
    }

    /// Index of the block containing absolute byte `offset`.
    pub fn block_index_of(&self, offset: u64) -> u32 {
        (offset / self.block_size as u64) as u32
    }

    /// Byte position of `offset` within its block.
    pub fn offset_in_block(&self, offset: u64) -> u32 {
        (offset % self.block_size as u64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_math() {
        let layout = BlockLayout::default();
        assert_eq!(layout.block_index_of(0), 0);
        assert_eq!(layout.block_index_of(65535), 0);
        assert_eq!(layout.block_index_of(65536), 1);
        assert_eq!(layout.offset_in_block(65537), 1);
    }

    #[test]
    fn test_small_layout_math() {
        let layout = BlockLayout::new(16);
        assert_eq!(layout.block_index_of(15), 0);
        assert_eq!(layout.block_index_of(16), 1);
        assert_eq!(layout.offset_in_block(31), 15);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn test_rejects_non_power_of_two() {
        let _ = BlockLayout::new(24);
    }
}
