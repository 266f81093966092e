// Copyright 2023 Developers of the reverse_rand project.
// Copyright 2018-2021 Developers of the Rand project.
// Copyright 2014-2017, 2019 Melissa O'Neill and PCG Project contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Reversible PCG generators with 128-bit state.

use core::fmt;
use std::str::FromStr;

use rand_core::{impls, le, Error, RngCore, SeedableRng};
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::codec::{FromTokens, ParseError, Tokens};
use crate::{Engine, ReversibleEngine};

// Multiplier, increment and default seed from the PCG reference
// implementation.
const MULTIPLIER: u128 = (2549297995355413924 << 64) | 4865540595714422341;
// Modular multiplicative inverse of MULTIPLIER (mod 2^128).
const MULTIPLIER_INVERSE: u128 = (566787436162029664 << 64) | 11001107174925446285;
const DEFAULT_STATE: u128 = 0xcafef00dd15ea5e5;
const DEFAULT_INCREMENT: u128 = (6364136223846793005 << 64) | 1442695040888963407;

/// A reversible PCG random number generator (XSL RR 128/64 (LCG) variant).
///
/// Permuted Congruential Generator with 128-bit state, internal Linear
/// Congruential Generator, and 64-bit output via "xorshift low (bits),
/// random rotation" output function. This corresponds to
/// `pcg_engines::setseq_xsl_rr_128_64` (`pcg64`) from pcg-cpp, extended
/// with a [`previous_word`] step that unwinds the LCG through the
/// precomputed inverse multiplier.
///
/// The output is computed from the freshly updated state, so
/// `previous_word` applies the output permutation to the current state and
/// undoes the bump afterwards.
///
/// [`previous_word`]: ReversibleEngine::previous_word
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct ReversiblePcg64 {
    state: u128,
    increment: u128,
}

impl ReversiblePcg64 {
    /// Construct an instance compatible with PCG seed and stream.
    ///
    /// PCG specifies `state = 0xcafef00dd15ea5e5` as the default seed.
    pub fn new(state: u128, stream: u128) -> Self {
        // The increment must be odd.
        let increment = (stream << 1) | 1;
        Self::from_state_incr(state, increment)
    }

    #[inline]
    fn from_state_incr(state: u128, increment: u128) -> Self {
        let mut pcg = Self { state, increment };
        // Move away from the initial value:
        pcg.state = pcg.state.wrapping_add(pcg.increment);
        pcg.step();
        pcg
    }

    /// Multi-step advance functions (jump-ahead, jump-back)
    ///
    /// The method used here is based on Brown, "Random Number Generation
    /// with Arbitrary Stride,", Transactions of the American Nuclear
    /// Society (Nov. 1994). The algorithm is very similar to fast
    /// exponentiation.
    ///
    /// Using this function is equivalent to calling
    /// [`next_word`](Engine::next_word) `delta` times and discarding the
    /// results.
    #[inline]
    pub fn advance(&mut self, delta: u128) {
        let mut acc_mult: u128 = 1;
        let mut acc_plus: u128 = 0;
        let mut cur_mult = MULTIPLIER;
        let mut cur_plus = self.increment;
        let mut mdelta = delta;

        while mdelta > 0 {
            if (mdelta & 1) != 0 {
                acc_mult = acc_mult.wrapping_mul(cur_mult);
                acc_plus = acc_plus.wrapping_mul(cur_mult).wrapping_add(cur_plus);
            }
            cur_plus = cur_mult.wrapping_add(1).wrapping_mul(cur_plus);
            cur_mult = cur_mult.wrapping_mul(cur_mult);
            mdelta /= 2;
        }
        self.state = acc_mult.wrapping_mul(self.state).wrapping_add(acc_plus);
    }

    #[inline(always)]
    fn step(&mut self) {
        self.state = self
            .state
            .wrapping_mul(MULTIPLIER)
            .wrapping_add(self.increment);
    }

    #[inline(always)]
    fn unstep(&mut self) {
        self.state = self
            .state
            .wrapping_sub(self.increment)
            .wrapping_mul(MULTIPLIER_INVERSE);
    }
}

#[inline(always)]
pub(super) fn output_xsl_rr(state: u128) -> u64 {
    let rot = (state >> 122) as u32;
    let xored = ((state >> 64) as u64) ^ (state as u64);
    xored.rotate_right(rot)
}

impl Default for ReversiblePcg64 {
    fn default() -> Self {
        Self::from_state_incr(DEFAULT_STATE, DEFAULT_INCREMENT)
    }
}

// Custom Debug implementation that does not expose the internal state
impl fmt::Debug for ReversiblePcg64 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ReversiblePcg64 {{}}")
    }
}

impl Engine for ReversiblePcg64 {
    type Word = u64;

    #[inline]
    fn next_word(&mut self) -> u64 {
        self.step();
        output_xsl_rr(self.state)
    }

    #[inline]
    fn discard(&mut self, n: u64) {
        self.advance(u128::from(n));
    }
}

impl ReversibleEngine for ReversiblePcg64 {
    #[inline]
    fn previous_word(&mut self) -> u64 {
        let value = output_xsl_rr(self.state);
        self.unstep();
        value
    }
}

impl RngCore for ReversiblePcg64 {
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

impl SeedableRng for ReversiblePcg64 {
    type Seed = [u8; 32];

    /// We use a single 255-bit seed to initialise the state and select a
    /// stream. One `seed` bit (lowest bit of `seed[16]`) is ignored.
    fn from_seed(seed: Self::Seed) -> Self {
        let mut seed_u64 = [0u64; 4];
        le::read_u64_into(&seed, &mut seed_u64);
        let state = u128::from(seed_u64[0]) | (u128::from(seed_u64[1]) << 64);
        let incr = u128::from(seed_u64[2]) | (u128::from(seed_u64[3]) << 64);

        // The increment must be odd, hence we discard one bit:
        Self::from_state_incr(state, incr | 1)
    }

    /// Reinitializes with `state` as the seed and the default stream,
    /// matching the single-argument `pcg64::seed` of the reference
    /// implementation.
    fn seed_from_u64(state: u64) -> Self {
        Self::from_state_incr(u128::from(state), DEFAULT_INCREMENT)
    }
}

impl fmt::Display for ReversiblePcg64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.state, self.increment)
    }
}

impl FromTokens for ReversiblePcg64 {
    fn from_tokens(tokens: &mut Tokens<'_>) -> Result<Self, ParseError> {
        let state = tokens.parse()?;
        let increment = tokens.parse()?;
        Ok(Self { state, increment })
    }
}

impl FromStr for ReversiblePcg64 {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, ParseError> {
        let mut tokens = Tokens::new(s);
        let pcg = Self::from_tokens(&mut tokens)?;
        tokens.finish()?;
        Ok(pcg)
    }
}

/// A reversible PCG random number generator (XSL RR 128/64 (MCG) variant).
///
/// As [`ReversiblePcg64`], but with a multiplicative congruential state
/// transition (increment zero), corresponding to
/// `pcg_engines::mcg_xsl_rr_128_64` (`pcg64_fast`) from pcg-cpp. The state
/// is always odd, which reduces the period to 2^126.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct ReversiblePcg64Mcg {
    state: u128,
}

impl ReversiblePcg64Mcg {
    /// Construct an instance compatible with PCG seeding.
    pub fn new(state: u128) -> Self {
        // Force the state to be odd:
        Self { state: state | 3 }
    }

    /// Multi-step advance (jump-ahead, jump-back) by fast exponentiation
    /// of the multiplier.
    #[inline]
    pub fn advance(&mut self, delta: u128) {
        let mut acc_mult: u128 = 1;
        let mut cur_mult = MULTIPLIER;
        let mut mdelta = delta;

        while mdelta > 0 {
            if (mdelta & 1) != 0 {
                acc_mult = acc_mult.wrapping_mul(cur_mult);
            }
            cur_mult = cur_mult.wrapping_mul(cur_mult);
            mdelta /= 2;
        }
        self.state = acc_mult.wrapping_mul(self.state);
    }
}

impl Default for ReversiblePcg64Mcg {
    fn default() -> Self {
        Self::new(DEFAULT_STATE)
    }
}

// Custom Debug implementation that does not expose the internal state
impl fmt::Debug for ReversiblePcg64Mcg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ReversiblePcg64Mcg {{}}")
    }
}

impl Engine for ReversiblePcg64Mcg {
    type Word = u64;

    #[inline]
    fn next_word(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(MULTIPLIER);
        output_xsl_rr(self.state)
    }

    #[inline]
    fn discard(&mut self, n: u64) {
        self.advance(u128::from(n));
    }
}

impl ReversibleEngine for ReversiblePcg64Mcg {
    #[inline]
    fn previous_word(&mut self) -> u64 {
        let value = output_xsl_rr(self.state);
        self.state = self.state.wrapping_mul(MULTIPLIER_INVERSE);
        value
    }
}

impl RngCore for ReversiblePcg64Mcg {
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

impl SeedableRng for ReversiblePcg64Mcg {
    type Seed = [u8; 16];

    fn from_seed(seed: Self::Seed) -> Self {
        let mut seed_u64 = [0u64; 2];
        le::read_u64_into(&seed, &mut seed_u64);
        Self::new(u128::from(seed_u64[0]) | (u128::from(seed_u64[1]) << 64))
    }

    /// Reinitializes with `state` as the seed, matching the
    /// single-argument `pcg64_fast::seed` of the reference implementation.
    fn seed_from_u64(state: u64) -> Self {
        Self::new(u128::from(state))
    }
}

impl fmt::Display for ReversiblePcg64Mcg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.state)
    }
}

impl FromTokens for ReversiblePcg64Mcg {
    fn from_tokens(tokens: &mut Tokens<'_>) -> Result<Self, ParseError> {
        let state = tokens.parse()?;
        Ok(Self { state })
    }
}

impl FromStr for ReversiblePcg64Mcg {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, ParseError> {
        let mut tokens = Tokens::new(s);
        let pcg = Self::from_tokens(&mut tokens)?;
        tokens.finish()?;
        Ok(pcg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_inverse() {
        assert_eq!(MULTIPLIER.wrapping_mul(MULTIPLIER_INVERSE), 1);
    }

    #[test]
    fn reference() {
        // Numbers copied from the pcg-cpp demo output for pcg64(42, 54).
        let mut rng = ReversiblePcg64::new(42, 54);
        let expected: [u64; 6] = [
            0x86b1da1d72062b68,
            0x1304aa46c9853d39,
            0xa3670e9e0dd50358,
            0xf9090e529a7dae00,
            0xc85b9fd837996f2c,
            0x606121f8e3919196,
        ];
        for &e in &expected {
            assert_eq!(rng.next_word(), e);
        }
        for &e in expected.iter().rev() {
            assert_eq!(rng.previous_word(), e);
        }
        assert_eq!(rng, ReversiblePcg64::new(42, 54));
    }

    #[test]
    fn mcg_reference() {
        // First number determined using pcg-cpp `pcg64_fast(42)`.
        let mut rng = ReversiblePcg64Mcg::new(42);
        let expected: [u64; 4] = [
            0x63b4a3a813ce700a,
            4046858236687002404,
            12104978356884820174,
            15498338131123926839,
        ];
        for &e in &expected {
            assert_eq!(rng.next_word(), e);
        }
        for &e in expected.iter().rev() {
            assert_eq!(rng.previous_word(), e);
        }
        assert_eq!(rng, ReversiblePcg64Mcg::new(42));
    }

    #[test]
    fn seed_from_u64_matches_reference_seeding() {
        let mut rng = ReversiblePcg64::seed_from_u64(42);
        let expected: [u64; 4] = [
            2915081201720324186,
            13533757442135995717,
            13172715927431628928,
            13789878565430171748,
        ];
        for &e in &expected {
            assert_eq!(rng.next_word(), e);
        }
    }

    #[test]
    fn advance_equals_repeated_next() {
        for seed in 0..20 {
            let mut rng1 = ReversiblePcg64::seed_from_u64(seed);
            let mut rng2 = rng1.clone();
            for _ in 0..20 {
                rng1.next_word();
            }
            rng2.advance(20);
            assert_eq!(rng1, rng2);

            let mut rng3 = ReversiblePcg64Mcg::seed_from_u64(seed);
            let mut rng4 = rng3.clone();
            for _ in 0..20 {
                rng3.next_word();
            }
            rng4.advance(20);
            assert_eq!(rng3, rng4);
        }
    }

    #[test]
    fn parse_round_trip() {
        let mut rng = ReversiblePcg64::seed_from_u64(9);
        rng.discard(1000);
        let decoded: ReversiblePcg64 = rng.to_string().parse().unwrap();
        assert_eq!(rng, decoded);

        let mut rng = ReversiblePcg64Mcg::seed_from_u64(9);
        rng.discard(1000);
        let decoded: ReversiblePcg64Mcg = rng.to_string().parse().unwrap();
        assert_eq!(rng, decoded);
    }

    #[cfg(feature = "serde1")]
    #[test]
    fn serde_round_trip() {
        let mut rng = ReversiblePcg64::seed_from_u64(0);
        let encoded = bincode::serialize(&rng).expect("could not serialize");
        let mut decoded: ReversiblePcg64 =
            bincode::deserialize(&encoded).expect("could not deserialize");
        for _ in 0..16 {
            assert_eq!(rng.next_word(), decoded.next_word());
        }
    }
}
