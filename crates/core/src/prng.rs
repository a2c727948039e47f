//! Small deterministic PRNG for effects that need randomness.
//!
//! Same seed, same sequence, on every platform. Effects use it to pick keys
//! so a scene renders identically run after run.

/// Xorshift64 generator with shifts (13, 7, 17).
///
/// A zero seed would lock the generator at zero forever, so it is replaced
/// with a fixed non-zero seed.
#[derive(Debug, Clone)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const ZERO_SEED_REPLACEMENT: u64 = 0x9E37_79B9_7F4A_7C15;

    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 {
                Self::ZERO_SEED_REPLACEMENT
            } else {
                seed
            },
        }
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform-ish value in `[0, max)`; 0 when `max` is 0.
    pub fn next_below(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_u64() % max as u64) as usize
    }
}
