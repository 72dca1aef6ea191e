//! Deterministic Random Number Generator
//!
//! MT19937 (32-bit Mersenne Twister) with the reference `init_by_array`
//! seeding used by the most common independent verifiers. Given the same
//! seed it produces an identical sequence on every platform, which is what
//! lets a third party re-derive a board from a revealed server seed.

const N: usize = 624;
const M: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// Fixed seed `init_by_array` starts from before mixing in the key.
const INIT_BY_ARRAY_SEED: u32 = 19_650_218;

/// Deterministic PRNG using the MT19937 algorithm.
///
/// # Determinism Guarantee
///
/// Given the same seed, this RNG produces the exact same sequence of
/// 32-bit words on any platform. Integer seeds are split into
/// little-endian 32-bit words before `init_by_array`, so a `u64` seed
/// that fits in 32 bits uses a one-word key (zero included).
///
/// # Example
///
/// ```
/// use mines_fair::core::rng::DeterministicRng;
///
/// let mut rng = DeterministicRng::new(42);
/// assert_eq!(rng.next_u32(), 2746317213); // Always the same!
/// ```
#[derive(Clone)]
pub struct DeterministicRng {
    state: Box<[u32; N]>,
    index: usize,
}

impl std::fmt::Debug for DeterministicRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeterministicRng")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit integer seed.
    pub fn new(seed: u64) -> Self {
        let low = seed as u32;
        let high = (seed >> 32) as u32;

        if high == 0 {
            Self::from_key(&[low])
        } else {
            Self::from_key(&[low, high])
        }
    }

    /// Create a new RNG from an explicit `init_by_array` key.
    ///
    /// An empty key is treated as `[0]`.
    pub fn from_key(key: &[u32]) -> Self {
        let key: &[u32] = if key.is_empty() { &[0] } else { key };

        let mut state = Box::new([0u32; N]);
        init_genrand(&mut state, INIT_BY_ARRAY_SEED);

        let mut i = 1usize;
        let mut j = 0usize;
        for _ in 0..N.max(key.len()) {
            let prev = state[i - 1] ^ (state[i - 1] >> 30);
            state[i] = (state[i] ^ prev.wrapping_mul(1_664_525))
                .wrapping_add(key[j])
                .wrapping_add(j as u32);
            i += 1;
            j += 1;
            if i >= N {
                state[0] = state[N - 1];
                i = 1;
            }
            if j >= key.len() {
                j = 0;
            }
        }

        for _ in 0..N - 1 {
            let prev = state[i - 1] ^ (state[i - 1] >> 30);
            state[i] = (state[i] ^ prev.wrapping_mul(1_566_083_941)).wrapping_sub(i as u32);
            i += 1;
            if i >= N {
                state[0] = state[N - 1];
                i = 1;
            }
        }

        // MSB is 1, assuring a non-zero initial array
        state[0] = UPPER_MASK;

        Self { state, index: N }
    }

    /// Generate the next 32-bit random value.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        if self.index >= N {
            self.twist();
        }

        let mut y = self.state[self.index];
        self.index += 1;

        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^ (y >> 18)
    }

    /// Draw `bits` random bits (1..=32) from the top of the next word.
    #[inline]
    pub fn next_bits(&mut self, bits: u32) -> u32 {
        debug_assert!((1..=32).contains(&bits), "bit count {} out of range", bits);
        self.next_u32() >> (32 - bits)
    }

    /// Generate a random integer in range [0, max).
    ///
    /// Uses rejection sampling on `bit_length(max)` bits, so the result is
    /// exactly uniform and matches the reference `randbelow`.
    #[inline]
    pub fn next_below(&mut self, max: u32) -> u32 {
        if max <= 1 {
            return 0;
        }
        let bits = u32::BITS - max.leading_zeros();
        loop {
            let value = self.next_bits(bits);
            if value < max {
                return value;
            }
        }
    }

    /// Shuffle a slice in place using the Fisher-Yates algorithm.
    ///
    /// Walks from the last position down to 1, swapping each position with
    /// a uniformly drawn index in `[0, i]`.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        let len = slice.len();
        for i in (1..len).rev() {
            let j = self.next_below((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    /// Regenerate the internal block of `N` words.
    fn twist(&mut self) {
        let mt = &mut self.state;
        for kk in 0..N {
            let y = (mt[kk] & UPPER_MASK) | (mt[(kk + 1) % N] & LOWER_MASK);
            let mag = if y & 1 == 0 { 0 } else { MATRIX_A };
            mt[kk] = mt[(kk + M) % N] ^ (y >> 1) ^ mag;
        }
        self.index = 0;
    }
}

/// Linear seeding of the state array from a single word.
fn init_genrand(state: &mut [u32; N], seed: u32) {
    state[0] = seed;
    for i in 1..N {
        let prev = state[i - 1] ^ (state[i - 1] >> 30);
        state[i] = 1_812_433_253u32.wrapping_mul(prev).wrapping_add(i as u32);
    }
}

// =============================================================================
// TESTS
// =============================================================================
