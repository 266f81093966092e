// Copyright 2023 Developers of the reverse_rand project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The position-tracking reversible generator.

use core::fmt;
use std::str::FromStr;

use rand_core::SeedableRng;
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::codec::{FromTokens, ParseError, Tokens};
use crate::distr::{
    Exp, Normal, ReversibleDistribution, SampleUniform, Uniform, UniformError,
};
use crate::engines::ReversiblePcg64;
use crate::reversed::ReversedEngine;
use crate::ReversibleEngine;

/// A reversible random number generator over a probability distribution.
///
/// Owns an engine, a distribution, and a signed position counter that
/// advances by one per [`next`](ReversibleRng::next) and retreats by one
/// per [`previous`](ReversibleRng::previous). The central law: for any
/// state and any `N`,
///
/// ```
/// # use reverse_rand::UniformRng;
/// # let mut rng = UniformRng::<f64>::new(0.0, 1.0).unwrap();
/// # let n = 100;
/// let position = rng.position();
/// let forward = rng.next_n(n);
/// assert_eq!(rng.previous_n(n), forward);
/// assert_eq!(rng.position(), position);
/// ```
///
/// Two generators compare equal iff their engines, distributions and
/// positions are all equal. The `Display`/`FromStr` encoding is
/// `<engine> <distribution> <position>` in space-separated decimal fields.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct ReversibleRng<D, E> {
    engine: E,
    distribution: D,
    position: i64,
}

impl<D, E> ReversibleRng<D, E>
where
    E: ReversibleEngine,
    D: ReversibleDistribution<E::Word>,
{
    /// Combines a distribution with an explicitly constructed engine.
    pub fn with_engine(distribution: D, engine: E) -> Self {
        ReversibleRng {
            engine,
            distribution,
            position: 0,
        }
    }

    /// Combines a distribution with an engine freshly seeded from the
    /// operating system's entropy source; the read happens once, here.
    pub fn from_entropy(distribution: D) -> Self
    where
        E: SeedableRng,
    {
        Self::with_engine(distribution, E::from_entropy())
    }

    /// Returns the next random value.
    pub fn next(&mut self) -> D::Sample {
        self.position += 1;
        self.distribution.sample(&mut self.engine)
    }

    /// Returns the previous random value.
    pub fn previous(&mut self) -> D::Sample {
        self.position -= 1;
        let mut reversed = ReversedEngine::new(&mut self.engine);
        self.distribution.sample(&mut reversed)
    }

    /// Returns the next `n` random values in order.
    pub fn next_n(&mut self, n: usize) -> Vec<D::Sample> {
        (0..n).map(|_| self.next()).collect()
    }

    /// Returns the previous `n` random values, arranged so that the
    /// result equals what the preceding `n` forward draws produced, in
    /// forward order.
    pub fn previous_n(&mut self, n: usize) -> Vec<D::Sample> {
        let mut values: Vec<D::Sample> = (0..n).map(|_| self.previous()).collect();
        values.reverse();
        values
    }

    /// Advances by `n` samples, discarding the values.
    pub fn discard(&mut self, n: u64) {
        for _ in 0..n {
            self.next();
        }
    }

    /// Net number of forward samples drawn since construction or the last
    /// reseed; negative after rewinding past the starting point.
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Reseeds the engine from a single integer and resets the position.
    pub fn seed(&mut self, seed: u64)
    where
        E: SeedableRng,
    {
        self.engine = E::seed_from_u64(seed);
        self.position = 0;
    }

    /// Reseeds the engine from a full-width seed and resets the position.
    pub fn seed_from(&mut self, seed: E::Seed)
    where
        E: SeedableRng,
    {
        self.engine = E::from_seed(seed);
        self.position = 0;
    }

    /// Returns the underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns the distribution being sampled.
    pub fn distribution(&self) -> &D {
        &self.distribution
    }
}

impl<D: fmt::Display, E: fmt::Display> fmt::Display for ReversibleRng<D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.engine, self.distribution, self.position)
    }
}

impl<D: FromTokens, E: FromTokens> FromTokens for ReversibleRng<D, E> {
    fn from_tokens(tokens: &mut Tokens<'_>) -> Result<Self, ParseError> {
        let engine = E::from_tokens(tokens)?;
        let distribution = D::from_tokens(tokens)?;
        let position = tokens.parse()?;
        Ok(ReversibleRng {
            engine,
            distribution,
            position,
        })
    }
}

impl<D: FromTokens, E: FromTokens> FromStr for ReversibleRng<D, E> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, ParseError> {
        let mut tokens = Tokens::new(s);
        let rng = Self::from_tokens(&mut tokens)?;
        tokens.finish()?;
        Ok(rng)
    }
}

/// A reversible generator over a uniform range of `X`: closed `[a, b]`
/// for the integer types, half-open `[a, b)` for `f32` and `f64`.
pub type UniformRng<X, E = ReversiblePcg64> = ReversibleRng<Uniform<X>, E>;

/// A reversible generator over the normal distribution
/// `N(mean, std_dev**2)`.
pub type NormalRng<F, E = ReversiblePcg64> = ReversibleRng<Normal<F>, E>;

/// A reversible generator over the exponential distribution
/// `Exp(lambda)`.
pub type ExponentialRng<F, E = ReversiblePcg64> = ReversibleRng<Exp<F>, E>;

impl<X, E> ReversibleRng<Uniform<X>, E>
where
    X: SampleUniform,
    E: ReversibleEngine + SeedableRng,
    Uniform<X>: ReversibleDistribution<E::Word, Sample = X>,
{
    /// Entropy-seeded generator over `[low, high]` (integers) or
    /// `[low, high)` (reals).
    ///
    /// Fails with [`EmptyRange`](UniformError::EmptyRange) when the
    /// bounds are out of order and with
    /// [`RangeUnsupported`](UniformError::RangeUnsupported) when the
    /// range has no reversible sampling path.
    pub fn new(low: X, high: X) -> Result<Self, UniformError> {
        Ok(Self::from_entropy(Uniform::new(low, high)?))
    }
}

macro_rules! real_rng_impl {
    ($ty:ty) => {
        impl<E> ReversibleRng<Normal<$ty>, E>
        where
            E: ReversibleEngine<Word = u64> + SeedableRng,
        {
            /// Entropy-seeded generator over `N(mean, std_dev**2)`;
            /// `std_dev` must be strictly positive.
            pub fn new(mean: $ty, std_dev: $ty) -> Result<Self, crate::distr::NormalError> {
                Ok(Self::from_entropy(Normal::<$ty>::new(mean, std_dev)?))
            }
        }

        impl<E> ReversibleRng<Exp<$ty>, E>
        where
            E: ReversibleEngine<Word = u64> + SeedableRng,
        {
            /// Entropy-seeded generator over `Exp(lambda)`; `lambda` must
            /// be strictly positive.
            pub fn new(lambda: $ty) -> Result<Self, crate::distr::ExpError> {
                Ok(Self::from_entropy(Exp::<$ty>::new(lambda)?))
            }
        }
    };
}

real_rng_impl! { f32 }
real_rng_impl! { f64 }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::{ReversiblePcg32, ReversibleMersenne};

    #[test]
    fn position_tracks_direction() {
        let mut rng = UniformRng::<f64>::new(0.0, 1.0).unwrap();
        rng.next();
        rng.next();
        assert_eq!(rng.position(), 2);
        rng.previous();
        rng.previous();
        rng.previous();
        assert_eq!(rng.position(), -1);
    }

    #[test]
    fn previous_n_matches_forward_order() {
        let mut rng = UniformRng::<i32>::new(-5, 5).unwrap();
        let forward = rng.next_n(100);
        let backward = rng.previous_n(100);
        assert_eq!(forward, backward);
        assert_eq!(rng.position(), 0);
    }

    #[test]
    fn seed_resets_position() {
        let mut rng = NormalRng::<f64>::new(0.0, 1.0).unwrap();
        rng.discard(50);
        assert_eq!(rng.position(), 50);
        rng.seed(99);
        assert_eq!(rng.position(), 0);

        let mut other = NormalRng::<f64>::new(0.0, 1.0).unwrap();
        other.seed(99);
        assert_eq!(rng, other);
        assert_eq!(rng.next(), other.next());
    }

    #[test]
    fn wide_ranges_need_wide_engines() {
        assert_eq!(
            UniformRng::<u128>::new(0, u128::MAX).unwrap_err(),
            UniformError::RangeUnsupported
        );
        assert!(UniformRng::<u128>::new(0, u128::from(u64::MAX)).is_ok());
        assert!(UniformRng::<u64>::new(0, u64::MAX).is_ok());
        assert!(UniformRng::<u64, ReversiblePcg32>::new(0, u64::MAX).is_ok());
    }

    #[test]
    fn parse_round_trip_with_every_field() {
        let mut rng = UniformRng::<i32, ReversibleMersenne>::new(-3, 12).unwrap();
        rng.discard(500);
        rng.previous();
        let encoded = rng.to_string();
        let decoded: UniformRng<i32, ReversibleMersenne> = encoded.parse().unwrap();
        assert_eq!(rng, decoded);

        let truncated: Vec<&str> = encoded.split_whitespace().take(100).collect();
        assert!(truncated
            .join(" ")
            .parse::<UniformRng<i32, ReversibleMersenne>>()
            .is_err());
    }

    #[test]
    fn equality_includes_position() {
        let mut a = ExponentialRng::<f64>::new(1.0).unwrap();
        a.seed(4);
        let mut b = ExponentialRng::<f64>::new(1.0).unwrap();
        b.seed(4);
        assert_eq!(a, b);
        a.next();
        a.previous();
        assert_eq!(a, b);
        a.next();
        assert_ne!(a, b);
    }
}
