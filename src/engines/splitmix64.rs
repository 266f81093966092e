// Copyright 2023 Developers of the reverse_rand project.
// Copyright 2018 Developers of the Rand project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The SplitMix64 seeding generator.

use rand_core::{impls, le, Error, RngCore, SeedableRng};
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::Engine;

/// A SplitMix64 random number generator.
///
/// This is a fixed-increment version of Java 8's SplittableRandom
/// generator, see <https://dx.doi.org/10.1145/2714064.2660195>. It is a
/// very fast generator passing BigCrush, used here to expand 64-bit seeds
/// into the larger state of [`Xoshiro256Plus`](super::Xoshiro256Plus).
/// It is forward-only and not a reversal primitive.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct SplitMix64 {
    x: u64,
}

impl SplitMix64 {
    /// Creates a generator whose accumulator starts at `seed`.
    pub fn new(seed: u64) -> Self {
        SplitMix64 { x: seed }
    }
}

impl Engine for SplitMix64 {
    type Word = u64;

    #[inline]
    fn next_word(&mut self) -> u64 {
        self.x = self.x.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.x;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }
}

impl RngCore for SplitMix64 {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.next_word() as u32
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.next_word()
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for SplitMix64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        let mut seed_u64 = [0u64; 1];
        le::read_u64_into(&seed, &mut seed_u64);
        Self::new(seed_u64[0])
    }

    fn seed_from_u64(seed: u64) -> Self {
        Self::new(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference() {
        // Values produced by the reference implementation with seed 0.
        let mut rng = SplitMix64::new(0);
        assert_eq!(rng.next_word(), 0xe220a8397b1dcdaf);
        assert_eq!(rng.next_word(), 0x6e789e6aa1b965f4);
        assert_eq!(rng.next_word(), 0x06c45d188009454f);
    }

    #[test]
    fn seeded_reference() {
        let mut rng = SplitMix64::new(42);
        let expected: [u64; 4] = [
            13679457532755275413,
            2949826092126892291,
            5139283748462763858,
            6349198060258255764,
        ];
        for &e in &expected {
            assert_eq!(rng.next_word(), e);
        }
    }
}
