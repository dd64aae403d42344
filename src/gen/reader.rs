//! BlockReader: services arbitrary byte ranges by regenerating the spanned
//! blocks and copying out the requested sub-ranges.

use super::block::fill_block;
use super::layout::BlockLayout;
use super::seed::{GLOBAL_SEED, mix_seed};
use crate::registry::TestFile;

pub struct BlockReader {
    layout: BlockLayout,
}

impl BlockReader {
    pub fn new(layout: BlockLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> BlockLayout {
        self.layout
    }

    /// Read up to `len` bytes of `file` starting at `offset`.
    ///
    /// The length is clamped to the file size; a request at or past EOF
    /// returns an empty vector. Each spanned block is regenerated exactly
    /// once per call and never cached across calls. Block-aligned spans are
    /// generated straight into the output; only boundary fragments go
    /// through a scratch block.
    pub fn read(&self, file: &TestFile, offset: u64, len: usize) -> Vec<u8> {
        if len == 0 || offset >= file.size {
            return Vec::new();
        }
        let len = (len as u64).min(file.size - offset) as usize;
        let block_size = self.layout.block_size as usize;

        let mut out = vec![0u8; len];
        let mut pos = 0usize;
        let mut abs = offset;
        while pos < len {
            let index = self.layout.block_index_of(abs);
            let in_block = self.layout.offset_in_block(abs) as usize;
            let take = (len - pos).min(block_size - in_block);
            let mixed = mix_seed(GLOBAL_SEED, file.seed, index);
            if in_block == 0 && take == block_size {
                fill_block(mixed, &mut out[pos..pos + block_size]);
            } else {
                let mut block = vec![0u8; block_size];
                fill_block(mixed, &mut block);
                out[pos..pos + take].copy_from_slice(&block[in_block..in_block + take]);
            }
            pos += take;
            abs += take as u64;
        }
        out
    }
}
