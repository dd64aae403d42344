//! Block generator: expands a mixed seed into pseudo-random bytes with a
//! xorshift128 variant. Fast and statistically well spread, but not
//! cryptographically secure.

/// Fill `out` with the block contents keyed by `mixed_seed`.
///
/// Generator words are emitted little-endian regardless of host byte order
/// so the stream is identical across architectures. `out.len()` must be a
/// multiple of 4; the block layout guarantees this.
pub fn fill_block(mixed_seed: u32, out: &mut [u8]) {
    debug_assert_eq!(out.len() % 4, 0, "block length must be word-aligned");
    let mut x = mixed_seed;
    let mut y: u32 = 362_436_069;
    let mut z: u32 = 521_288_629;
    let mut w: u32 = 88_675_123;
    for word in out.chunks_exact_mut(4) {
        let t = x ^ (x << 11);
        x = y;
        y = z;
        z = w;
        w = w ^ (w >> 19) ^ (t ^ (t >> 8));
        word.copy_from_slice(&w.to_le_bytes());
    }
}
