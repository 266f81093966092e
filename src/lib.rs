// Copyright 2023 Developers of the reverse_rand project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Reversible pseudo-random number generators.
//!
//! A reversible generator exposes two complementary stepping operations,
//! *next* and *previous*, such that any sequence produced by `next` can be
//! walked backwards indefinitely, value by value, by `previous`. For any
//! state and any `N`, `N` calls to `next` followed by `N` calls to
//! `previous` restore the state and yield the same `N` values in reverse.
//!
//! The crate is built from three layers:
//!
//! - **Engines** ([`engines`]): uniform bit generators whose state
//!   transitions have explicit inverses. [`engines::ReversiblePcg32`],
//!   [`engines::ReversiblePcg64`] and friends unwind their linear
//!   congruential step through a precomputed inverse multiplier;
//!   [`engines::ReversibleMersenne`] inverts the Mersenne Twister block
//!   transformation.
//! - **Distributions** ([`distr`]): uniform integer, uniform real, normal
//!   and exponential samplers that consume a fixed, direction-agnostic
//!   pattern of engine words per sample, so that sampling through a
//!   [`ReversedEngine`] replays earlier values exactly.
//! - **The [`ReversibleRng`] wrapper**: owns an engine and a distribution,
//!   tracks a signed position, and exposes `next`/`previous` with bulk,
//!   seeding, equality and textual encode/decode support.
//!
//! ```
//! use reverse_rand::UniformRng;
//!
//! let mut rng = UniformRng::<f64>::new(0.0, 1.0).unwrap();
//! let forward = rng.next_n(1000);
//! let backward = rng.previous_n(1000);
//! assert_eq!(forward, backward);
//! assert_eq!(rng.position(), 0);
//! ```
//!
//! Engines also implement [`rand_core::RngCore`] and
//! [`rand_core::SeedableRng`], so they plug into the wider `rand`
//! ecosystem as ordinary (forward) generators.
//!
//! These are statistical generators; none of them is cryptographically
//! secure, and no instance may be shared between threads without external
//! synchronization.

#![doc(
    html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128-blk.png",
    html_favicon_url = "https://www.rust-lang.org/favicon.ico"
)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

use core::fmt;

pub mod codec;
pub mod distr;
pub mod engines;
pub mod utils;

mod reversed;
mod rng;

pub use rand_core;

pub use self::codec::ParseError;
pub use self::reversed::ReversedEngine;
pub use self::rng::{ExponentialRng, NormalRng, ReversibleRng, UniformRng};

mod sealed {
    pub trait Sealed {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
}

/// An unsigned output word type of a reversible engine.
///
/// Implemented for `u32` and `u64`; an engine producing words of type `W`
/// spans the full range `[0, W::MAX]`, so the distributions can derive the
/// engine range from the word type alone.
pub trait Word:
    sealed::Sealed + Copy + Eq + Ord + fmt::Debug + fmt::Display + 'static
{
    /// The number of bits per word.
    const BITS: u32;

    /// Maps the word to the unit interval `[0, 1)` using its high bits.
    ///
    /// 64-bit words keep 53 bits of the mantissa ([`utils::float64`]);
    /// 32-bit words keep 24 bits ([`utils::float32`]) and are widened
    /// afterwards, which is lossless.
    fn unit_f64(self) -> f64;
}

impl Word for u32 {
    const BITS: u32 = 32;

    #[inline]
    fn unit_f64(self) -> f64 {
        f64::from(utils::float32(self))
    }
}

impl Word for u64 {
    const BITS: u32 = 64;

    #[inline]
    fn unit_f64(self) -> f64 {
        utils::float64(self)
    }
}

/// A uniform random bit generator producing fixed-width words.
///
/// This is the capability the distribution samplers are written against.
/// Both the reversible engines and the forward-only helpers
/// ([`engines::SplitMix64`], [`engines::Xoshiro256Plus`]) implement it, as
/// does [`ReversedEngine`], which is how the same sampler code runs in
/// either direction.
pub trait Engine {
    /// The word type produced by one step of the engine.
    type Word: Word;

    /// Advances the state and returns the next output word.
    fn next_word(&mut self) -> Self::Word;

    /// Advances the engine by `n` steps, discarding the outputs.
    ///
    /// Must be indistinguishable from calling [`next_word`] `n` times;
    /// engines with an algebraic jump override the default loop.
    ///
    /// [`next_word`]: Engine::next_word
    fn discard(&mut self, n: u64) {
        for _ in 0..n {
            self.next_word();
        }
    }
}

/// An [`Engine`] whose state transition has an explicit inverse.
///
/// For any reachable state and any `N`, `N` calls to
/// [`next_word`](Engine::next_word) followed by `N` calls to
/// [`previous_word`](ReversibleEngine::previous_word) restore the state and
/// yield the same `N` words in reverse order.
pub trait ReversibleEngine: Engine {
    /// Retreats the state and returns the word the last forward step
    /// produced.
    fn previous_word(&mut self) -> Self::Word;
}
