//! Deterministic content generation (gen)
//!
//! Responsibilities:
//! - Mix the global seed, a per-file seed and a block index into one
//!   diffused 32-bit value.
//! - Expand a mixed seed into a fixed-size block of pseudo-random bytes.
//! - Service arbitrary byte ranges by regenerating the spanned blocks and
//!   assembling the requested sub-ranges.
//!
//! Every function here is pure over immutable inputs: the same parameters
//! produce bit-identical output on any machine, in any process, under any
//! degree of concurrency. Blocks are never cached; they are recomputed on
//! every access.
//!
//! Submodules:
//! - `layout`: block size and offset math
//! - `seed`: CRC-style seed mixing
//! - `block`: xorshift block generator
//! - `reader`: range-read servicing
pub mod block;
pub mod layout;
pub mod reader;
pub mod seed;
