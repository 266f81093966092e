// Copyright 2023 Developers of the reverse_rand project.
// Copyright 2018-2021 Developers of the Rand project.
// Copyright 2014-2017, 2019 Melissa O'Neill and PCG Project contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Reversible PCG generator with 64-bit state.

use core::fmt;
use std::str::FromStr;

use rand_core::{impls, le, Error, RngCore, SeedableRng};
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::codec::{FromTokens, ParseError, Tokens};
use crate::{Engine, ReversibleEngine};

// Multiplier, increment and default seed from the PCG reference
// implementation.
const MULTIPLIER: u64 = 6364136223846793005;
// Modular multiplicative inverse of MULTIPLIER (mod 2^64).
const MULTIPLIER_INVERSE: u64 = 13877824140714322085;
const DEFAULT_STATE: u64 = 0xcafef00dd15ea5e5;
const DEFAULT_STREAM: u64 = 0xa02bdbf7bb3c0a7;

/// A reversible PCG random number generator (XSH RR 64/32 (LCG) variant).
///
/// Permuted Congruential Generator with 64-bit state, internal Linear
/// Congruential Generator, and 32-bit output via "xorshift high (bits),
/// random rotation" output function. This corresponds to
/// `pcg_engines::setseq_xsh_rr_64_32` (`pcg32`) from pcg-cpp, extended
/// with a [`previous_word`] step that unwinds the LCG through the
/// precomputed inverse multiplier.
///
/// The output is computed from the pre-update state, so `previous_word`
/// first undoes the state bump and then reapplies the output permutation.
///
/// [`previous_word`]: ReversibleEngine::previous_word
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct ReversiblePcg32 {
    state: u64,
    increment: u64,
}

impl ReversiblePcg32 {
    /// Construct an instance compatible with PCG seed and stream.
    ///
    /// PCG specifies the following default values for both parameters:
    ///
    /// - `state = 0xcafef00dd15ea5e5`
    /// - `stream = 0xa02bdbf7bb3c0a7`
    pub fn new(state: u64, stream: u64) -> Self {
        // The increment must be odd.
        let increment = (stream << 1) | 1;
        Self::from_state_incr(state, increment)
    }

    #[inline]
    fn from_state_incr(state: u64, increment: u64) -> Self {
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
    pub fn advance(&mut self, delta: u64) {
        let mut acc_mult: u64 = 1;
        let mut acc_plus: u64 = 0;
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
        // prepare the LCG for the next round
        self.state = self
            .state
            .wrapping_mul(MULTIPLIER)
            .wrapping_add(self.increment);
    }

    #[inline(always)]
    fn unstep(&mut self) {
        // rewind the LCG by one round
        self.state = self
            .state
            .wrapping_sub(self.increment)
            .wrapping_mul(MULTIPLIER_INVERSE);
    }
}

#[inline(always)]
fn output_xsh_rr(state: u64) -> u32 {
    let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
    let rot = (state >> 59) as u32;
    xorshifted.rotate_right(rot)
}

impl Default for ReversiblePcg32 {
    fn default() -> Self {
        Self::new(DEFAULT_STATE, DEFAULT_STREAM)
    }
}

// Custom Debug implementation that does not expose the internal state
impl fmt::Debug for ReversiblePcg32 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ReversiblePcg32 {{}}")
    }
}

impl Engine for ReversiblePcg32 {
    type Word = u32;

    #[inline]
    fn next_word(&mut self) -> u32 {
        let value = output_xsh_rr(self.state);
        self.step();
        value
    }

    #[inline]
    fn discard(&mut self, n: u64) {
        self.advance(n);
    }
}

impl ReversibleEngine for ReversiblePcg32 {
    #[inline]
    fn previous_word(&mut self) -> u32 {
        self.unstep();
        output_xsh_rr(self.state)
    }
}

impl RngCore for ReversiblePcg32 {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
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

impl SeedableRng for ReversiblePcg32 {
    type Seed = [u8; 16];

    /// We use a single 127-bit seed to initialise the state and select a
    /// stream. One `seed` bit (lowest bit of `seed[8]`) is ignored.
    fn from_seed(seed: Self::Seed) -> Self {
        let mut seed_u64 = [0u64; 2];
        le::read_u64_into(&seed, &mut seed_u64);

        // The increment must be odd, hence we discard one bit:
        Self::from_state_incr(seed_u64[0], seed_u64[1] | 1)
    }

    /// Reinitializes with `state` as the seed and the default stream,
    /// matching the single-argument `pcg32::seed` of the reference
    /// implementation.
    fn seed_from_u64(state: u64) -> Self {
        Self::new(state, DEFAULT_STREAM)
    }
}

impl fmt::Display for ReversiblePcg32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.state, self.increment)
    }
}

impl FromTokens for ReversiblePcg32 {
    fn from_tokens(tokens: &mut Tokens<'_>) -> Result<Self, ParseError> {
        let state = tokens.parse()?;
        let increment = tokens.parse()?;
        Ok(Self { state, increment })
    }
}

impl FromStr for ReversiblePcg32 {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, ParseError> {
        let mut tokens = Tokens::new(s);
        let pcg = Self::from_tokens(&mut tokens)?;
        tokens.finish()?;
        Ok(pcg)
    }
}
