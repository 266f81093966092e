// Copyright 2023 Developers of the reverse_rand project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A reversible Mersenne Twister.

use core::fmt;
use std::str::FromStr;

use rand_core::{impls, le, Error, RngCore, SeedableRng};
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::codec::{FromTokens, ParseError, Tokens};
use crate::{Engine, ReversibleEngine};

const WORD_SIZE: u32 = 64;
const STATE_SIZE: usize = 312;
const SHIFT_SIZE: usize = 156;
const UPPER_MASK: u64 = u64::MAX << 31;
const LOWER_MASK: u64 = !UPPER_MASK;
const XOR_MASK: u64 = 0xb5026f5aa96619e9;
const FIRST_MASK: u64 = 0x8000000000000000;
const TEMPERING_U: u32 = 29;
const TEMPERING_D: u64 = 0x5555555555555555;
const TEMPERING_S: u32 = 17;
const TEMPERING_B: u64 = 0x71d67fffeda60000;
const TEMPERING_T: u32 = 37;
const TEMPERING_C: u64 = 0xfff7eee000000000;
const TEMPERING_L: u32 = 43;
const INIT_MULTIPLIER: u64 = 6364136223846793005;

/// A reversible Mersenne Twister (`mt19937_64` parameterization).
///
/// The forward direction is the standard 64-bit Mersenne Twister: a
/// 312-word state refreshed block-wise by the twist transformation, with
/// each output produced by tempering one state word. The reverse direction
/// inverts the twist when the read position crosses the start of a block;
/// tempering itself never needs to be inverted because only the state
/// transition runs backwards.
///
/// Statistical quality matches `mt19937_64` (it is known to fail a few
/// linear-complexity test batteries); the reversal machinery does not
/// change the output sequence.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct ReversibleMersenne {
    #[cfg_attr(feature = "serde1", serde(with = "state_serde"))]
    state: [u64; STATE_SIZE],
    pos: usize,
}

impl ReversibleMersenne {
    /// The seed used by [`Default`], from the reference `mt19937_64`.
    pub const DEFAULT_SEED: u64 = 5489;

    fn twist(&mut self) {
        for k in 0..STATE_SIZE {
            let y = (self.state[k] & UPPER_MASK)
                | (self.state[(k + 1) % STATE_SIZE] & LOWER_MASK);
            self.state[k] = self.state[(k + SHIFT_SIZE) % STATE_SIZE]
                ^ (y >> 1)
                ^ if y & 1 != 0 { XOR_MASK } else { 0 };
        }

        self.pos = 0;
    }

    // https://jazzy.id.au/2010/09/25/cracking_random_number_generators_part_4.html
    fn untwist(&mut self) {
        for k in (0..STATE_SIZE).rev() {
            let mut y = self.state[k] ^ self.state[(k + SHIFT_SIZE) % STATE_SIZE];
            if y & FIRST_MASK != 0 {
                y ^= XOR_MASK;
            }
            self.state[k] = (y << 1) & UPPER_MASK;

            let mut z = self.state[(k + STATE_SIZE - 1) % STATE_SIZE]
                ^ self.state[(k + SHIFT_SIZE - 1) % STATE_SIZE];
            if z & FIRST_MASK != 0 {
                z ^= XOR_MASK;
                self.state[k] |= 1;
            }
            self.state[k] |= (z << 1) & LOWER_MASK;
        }

        self.pos = STATE_SIZE;
    }

    fn temper(mut z: u64) -> u64 {
        z ^= (z >> TEMPERING_U) & TEMPERING_D;
        z ^= (z << TEMPERING_S) & TEMPERING_B;
        z ^= (z << TEMPERING_T) & TEMPERING_C;
        z ^= z >> TEMPERING_L;
        z
    }
}

impl Default for ReversibleMersenne {
    fn default() -> Self {
        Self::seed_from_u64(Self::DEFAULT_SEED)
    }
}

// Custom Debug implementation that does not expose the internal state
impl fmt::Debug for ReversibleMersenne {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ReversibleMersenne {{}}")
    }
}

impl Engine for ReversibleMersenne {
    type Word = u64;

    #[inline]
    fn next_word(&mut self) -> u64 {
        if self.pos >= STATE_SIZE {
            self.twist();
        }

        let value = Self::temper(self.state[self.pos]);
        self.pos += 1;
        value
    }

    fn discard(&mut self, mut n: u64) {
        while n > (STATE_SIZE - self.pos) as u64 {
            n -= (STATE_SIZE - self.pos) as u64;
            self.twist();
        }

        self.pos += n as usize;
    }
}

impl ReversibleEngine for ReversibleMersenne {
    #[inline]
    fn previous_word(&mut self) -> u64 {
        if self.pos == 0 {
            self.untwist();
        }

        self.pos -= 1;
        Self::temper(self.state[self.pos])
    }
}

impl RngCore for ReversibleMersenne {
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

impl SeedableRng for ReversibleMersenne {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        let mut seed_u64 = [0u64; 1];
        le::read_u64_into(&seed, &mut seed_u64);
        Self::seed_from_u64(seed_u64[0])
    }

    /// The `mt19937_64` state initialization.
    fn seed_from_u64(seed: u64) -> Self {
        let mut state = [0u64; STATE_SIZE];
        state[0] = seed;
        for i in 1..STATE_SIZE {
            let x = state[i - 1];
            let x = x ^ (x >> (WORD_SIZE - 2));
            state[i] = x.wrapping_mul(INIT_MULTIPLIER).wrapping_add(i as u64);
        }

        ReversibleMersenne {
            state,
            pos: STATE_SIZE,
        }
    }
}

impl fmt::Display for ReversibleMersenne {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in &self.state {
            write!(f, "{} ", word)?;
        }
        write!(f, "{}", self.pos)
    }
}

impl FromTokens for ReversibleMersenne {
    fn from_tokens(tokens: &mut Tokens<'_>) -> Result<Self, ParseError> {
        let mut state = [0u64; STATE_SIZE];
        for word in &mut state {
            *word = tokens.parse()?;
        }
        let pos = tokens.parse()?;
        if pos > STATE_SIZE {
            return Err(ParseError::InvalidValue);
        }
        Ok(Self { state, pos })
    }
}

impl FromStr for ReversibleMersenne {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, ParseError> {
        let mut tokens = Tokens::new(s);
        let mersenne = Self::from_tokens(&mut tokens)?;
        tokens.finish()?;
        Ok(mersenne)
    }
}

#[cfg(feature = "serde1")]
mod state_serde {
    use super::STATE_SIZE;

    use core::fmt;
    use core::marker::PhantomData;

    use serde::de::{self, SeqAccess, Visitor};
    use serde::ser::SerializeTuple;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(state: &[u64; STATE_SIZE], ser: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = ser.serialize_tuple(STATE_SIZE)?;
        for word in state.iter() {
            seq.serialize_element(word)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(de: D) -> Result<[u64; STATE_SIZE], D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ArrayVisitor {
            _pd: PhantomData<u64>,
        }

        impl<'de> Visitor<'de> for ArrayVisitor {
            type Value = [u64; STATE_SIZE];

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("Mersenne state array")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<[u64; STATE_SIZE], A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut out = [0u64; STATE_SIZE];
                for (i, word) in out.iter_mut().enumerate() {
                    match seq.next_element()? {
                        Some(value) => *word = value,
                        None => return Err(de::Error::invalid_length(i, &self)),
                    }
                }
                Ok(out)
            }
        }

        de.deserialize_tuple(STATE_SIZE, ArrayVisitor { _pd: PhantomData })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference() {
        // The canonical first outputs of std::mt19937_64 with seed 5489.
        let mut rng = ReversibleMersenne::default();
        let expected: [u64; 10] = [
            14514284786278117030,
            4620546740167642908,
            13109570281517897720,
            17462938647148434322,
            355488278567739596,
            7469126240319926998,
            4635995468481642529,
            418970542659199878,
            9604170989252516556,
            6358044926049913402,
        ];
        for &e in &expected {
            assert_eq!(rng.next_word(), e);
        }
    }

    #[test]
    fn seeded_reference() {
        let mut rng = ReversibleMersenne::seed_from_u64(42);
        let expected: [u64; 4] = [
            13930160852258120406,
            11788048577503494824,
            13874630024467741450,
            2513787319205155662,
        ];
        for &e in &expected {
            assert_eq!(rng.next_word(), e);
        }
    }

    #[test]
    fn reverses_across_twist_boundaries() {
        // 1000 outputs span three twists of the 312-word state.
        let mut rng = ReversibleMersenne::seed_from_u64(123);
        let forward: Vec<u64> = (0..1000).map(|_| rng.next_word()).collect();
        let backward: Vec<u64> = (0..1000).map(|_| rng.previous_word()).collect();
        assert!(forward.iter().rev().eq(backward.iter()));

        let fresh = ReversibleMersenne::seed_from_u64(123);
        let replay: Vec<u64> = (0..1000).map(|_| rng.next_word()).collect();
        let reference: Vec<u64> = {
            let mut fresh = fresh;
            (0..1000).map(|_| fresh.next_word()).collect()
        };
        assert_eq!(replay, reference);
    }

    #[test]
    fn discard_equals_repeated_next() {
        for n in [0u64, 1, 311, 312, 313, 1000] {
            let mut rng1 = ReversibleMersenne::default();
            let mut rng2 = ReversibleMersenne::default();
            rng1.discard(n);
            for _ in 0..n {
                rng2.next_word();
            }
            assert_eq!(rng1, rng2);
            assert_eq!(rng1.next_word(), rng2.next_word());
        }
    }

    #[test]
    fn parse_round_trip() {
        let mut rng = ReversibleMersenne::seed_from_u64(7);
        rng.discard(12345);
        let decoded: ReversibleMersenne = rng.to_string().parse().unwrap();
        assert_eq!(rng, decoded);
    }

    #[test]
    fn parse_rejects_bad_position() {
        let mut encoded = ReversibleMersenne::default().to_string();
        encoded.push_str("0"); // corrupt the trailing position field
        assert!(encoded.parse::<ReversibleMersenne>().is_err());
    }

    #[cfg(feature = "serde1")]
    #[test]
    fn serde_round_trip() {
        let mut rng = ReversibleMersenne::seed_from_u64(0);
        rng.discard(400);
        let encoded = bincode::serialize(&rng).expect("could not serialize");
        let mut decoded: ReversibleMersenne =
            bincode::deserialize(&encoded).expect("could not deserialize");
        for _ in 0..16 {
            assert_eq!(rng.next_word(), decoded.next_word());
        }
    }
}
