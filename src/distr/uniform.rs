// Copyright 2023 Developers of the reverse_rand project.
// Copyright 2018-2020 Developers of the Rand project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Uniform distributions over integer and floating point ranges.

use core::fmt;
use std::error;
use std::str::FromStr;

use rand_core::SeedableRng;
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use super::ReversibleDistribution;
use crate::codec::{FromTokens, ParseError, Tokens};
use crate::engines::Xoshiro256Plus;
use crate::{utils, Engine, Word};

/// Error type returned from the uniform distribution constructors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The lower bound is greater than the upper bound.
    EmptyRange,
    /// The requested range has no reversible sampling path on the
    /// selected engine width.
    RangeUnsupported,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::EmptyRange => "uniform bounds are in the wrong order",
            Error::RangeUnsupported => "uniform range exceeds the reversible span of the engine",
        })
    }
}

impl error::Error for Error {}

/// Helper trait for creating uniformly sampleable types; this enables
/// `Uniform::new(a, b)` and `UniformRng::new(a, b)` to select the integer
/// or floating point back-end by result type.
pub trait SampleUniform: Sized {
    /// The sampler backing `Uniform<Self>`.
    type Sampler: UniformSampler<X = Self>
        + Clone
        + Copy
        + PartialEq
        + Default
        + fmt::Debug
        + fmt::Display
        + FromTokens;
}

/// Construction interface shared by the uniform sampler back-ends.
pub trait UniformSampler: Sized {
    /// The type sampled.
    type X;

    /// Constructs the sampler over `[low, high]` for integers or
    /// `[low, high)` for reals. Fails with [`Error::EmptyRange`] when
    /// `low > high` (or either bound is NaN), and with
    /// [`Error::RangeUnsupported`] when the span exceeds the widest
    /// reversible path (128-bit ranges spanning more than 64 bits).
    fn new(low: Self::X, high: Self::X) -> Result<Self, Error>;
}

/// A uniform distribution over a range of `X`.
///
/// Integer ranges are closed, `[a, b]`; floating point ranges are
/// half-open, `[a, b)`. The back-end is chosen by [`SampleUniform`]:
/// [`UniformInt`] for the integer types, [`UniformReal`] for `f32` and
/// `f64`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde1",
    serde(bound(serialize = "X::Sampler: Serialize"))
)]
#[cfg_attr(
    feature = "serde1",
    serde(bound(deserialize = "X::Sampler: Deserialize<'de>"))
)]
pub struct Uniform<X: SampleUniform>(X::Sampler);

impl<X: SampleUniform> Uniform<X> {
    /// Constructs the distribution over `[low, high]` (integers) or
    /// `[low, high)` (reals); see [`UniformSampler::new`] for the error
    /// conditions.
    pub fn new(low: X, high: X) -> Result<Uniform<X>, Error> {
        X::Sampler::new(low, high).map(Uniform)
    }
}

impl<X: SampleUniform> Default for Uniform<X> {
    fn default() -> Self {
        Uniform(X::Sampler::default())
    }
}

impl<X: SampleUniform, W: Word> ReversibleDistribution<W> for Uniform<X>
where
    X::Sampler: ReversibleDistribution<W, Sample = X>,
{
    type Sample = X;

    #[inline]
    fn sample<E>(&self, engine: &mut E) -> X
    where
        E: Engine<Word = W> + ?Sized,
    {
        self.0.sample(engine)
    }
}

impl<X: SampleUniform> fmt::Display for Uniform<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<X: SampleUniform> FromTokens for Uniform<X> {
    fn from_tokens(tokens: &mut Tokens<'_>) -> Result<Self, ParseError> {
        X::Sampler::from_tokens(tokens).map(Uniform)
    }
}

impl<X: SampleUniform> FromStr for Uniform<X> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, ParseError> {
        let mut tokens = Tokens::new(s);
        let uniform = Self::from_tokens(&mut tokens)?;
        tokens.finish()?;
        Ok(uniform)
    }
}

/// The back-end implementing uniform sampling for integer types.
///
/// The bounds are inclusive. Sampling draws whatever number of engine
/// words the range requires, always in a pattern that reads the same under
/// reversal:
///
/// - a range equal to the engine's span passes one word through;
/// - a narrower range on 64-bit engines uses the Lemire reduction;
/// - a narrower range on 32-bit engines uses threshold rejection;
/// - a range wider than one 32-bit word folds three words into a
///   palindromic 64-bit seed and drives an ephemeral
///   [`Xoshiro256Plus`] through the 64-bit path.
///
/// 128-bit result types are limited to spans that fit one 64-bit word;
/// [`UniformSampler::new`] rejects anything wider with
/// [`Error::RangeUnsupported`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct UniformInt<X> {
    a: X,
    b: X,
}

impl<X: Copy> UniformInt<X> {
    /// Returns the inclusive lower bound.
    pub fn a(&self) -> X {
        self.a
    }

    /// Returns the inclusive upper bound.
    pub fn b(&self) -> X {
        self.b
    }
}

/// The back-end implementing uniform sampling for floating point types.
///
/// Samples lie in the half-open range `[a, b)`. Exactly one engine word is
/// consumed per sample and mapped to the unit interval through its high
/// bits ([`utils::float64`] / [`utils::float32`]).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct UniformReal<X> {
    a: X,
    b: X,
}

impl<X: Copy> UniformReal<X> {
    /// Returns the inclusive lower bound.
    pub fn a(&self) -> X {
        self.a
    }

    /// Returns the exclusive upper bound.
    pub fn b(&self) -> X {
        self.b
    }
}

/// Uniform sample over `[0, dist_range]` from a 64-bit engine.
fn sample_span_u64<E>(engine: &mut E, dist_range: u64) -> u64
where
    E: Engine<Word = u64> + ?Sized,
{
    if dist_range == u64::MAX {
        // The range covers the engine's whole span.
        engine.next_word()
    } else {
        utils::lemire(engine, dist_range + 1)
    }
}

/// Uniform sample over `[0, dist_range]` from a 32-bit engine.
fn sample_span_u32<E>(engine: &mut E, dist_range: u64) -> u64
where
    E: Engine<Word = u32> + ?Sized,
{
    if dist_range == u64::from(u32::MAX) {
        return u64::from(engine.next_word());
    }

    if dist_range < u64::from(u32::MAX) {
        let m = dist_range as u32 + 1;
        let threshold = u32::MAX - u32::MAX % m;
        loop {
            let word = engine.next_word();
            if word < threshold {
                return u64::from(word % m);
            }
        }
    }

    // The range is wider than one word. Fold three words into a 64-bit
    // seed; XORing the outer pair makes the seed invariant under reversal
    // of the draw order, and the seeded engine is a pure function of it.
    let (u1, u2, u3) = (engine.next_word(), engine.next_word(), engine.next_word());
    let seed = u64::from(u1 ^ u3) << 32 | u64::from(u2);
    let mut helper = Xoshiro256Plus::seed_from_u64(seed);
    sample_span_u64(&mut helper, dist_range)
}

macro_rules! uniform_int_impl {
    ($ty:ty, $uty:ty) => {
        impl SampleUniform for $ty {
            type Sampler = UniformInt<$ty>;
        }

        impl UniformSampler for UniformInt<$ty> {
            type X = $ty;

            fn new(low: $ty, high: $ty) -> Result<Self, Error> {
                if low > high {
                    return Err(Error::EmptyRange);
                }
                Ok(UniformInt { a: low, b: high })
            }
        }

        impl Default for UniformInt<$ty> {
            fn default() -> Self {
                UniformInt {
                    a: 0,
                    b: <$ty>::MAX,
                }
            }
        }

        impl ReversibleDistribution<u64> for UniformInt<$ty> {
            type Sample = $ty;

            #[inline]
            fn sample<E>(&self, engine: &mut E) -> $ty
            where
                E: Engine<Word = u64> + ?Sized,
            {
                let dist_range = self.b.wrapping_sub(self.a) as $uty as u64;
                self.a.wrapping_add(sample_span_u64(engine, dist_range) as $ty)
            }
        }

        impl ReversibleDistribution<u32> for UniformInt<$ty> {
            type Sample = $ty;

            #[inline]
            fn sample<E>(&self, engine: &mut E) -> $ty
            where
                E: Engine<Word = u32> + ?Sized,
            {
                let dist_range = self.b.wrapping_sub(self.a) as $uty as u64;
                self.a.wrapping_add(sample_span_u32(engine, dist_range) as $ty)
            }
        }

        impl fmt::Display for UniformInt<$ty> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", self.a, self.b)
            }
        }

        impl FromTokens for UniformInt<$ty> {
            fn from_tokens(tokens: &mut Tokens<'_>) -> Result<Self, ParseError> {
                let a = tokens.parse()?;
                let b = tokens.parse()?;
                if a > b {
                    return Err(ParseError::InvalidValue);
                }
                Ok(UniformInt { a, b })
            }
        }
    };
}

uniform_int_impl! { i8, u8 }
uniform_int_impl! { i16, u16 }
uniform_int_impl! { i32, u32 }
uniform_int_impl! { i64, u64 }
uniform_int_impl! { isize, usize }
uniform_int_impl! { u8, u8 }
uniform_int_impl! { u16, u16 }
uniform_int_impl! { u32, u32 }
uniform_int_impl! { u64, u64 }
uniform_int_impl! { usize, usize }

macro_rules! uniform_int_128_impl {
    ($ty:ty) => {
        impl SampleUniform for $ty {
            type Sampler = UniformInt<$ty>;
        }

        impl UniformSampler for UniformInt<$ty> {
            type X = $ty;

            fn new(low: $ty, high: $ty) -> Result<Self, Error> {
                if low > high {
                    return Err(Error::EmptyRange);
                }
                // Both word widths funnel wide ranges through the 64-bit
                // path, so the span must fit in one 64-bit word.
                if high.wrapping_sub(low) as u128 > u128::from(u64::MAX) {
                    return Err(Error::RangeUnsupported);
                }
                Ok(UniformInt { a: low, b: high })
            }
        }

        impl Default for UniformInt<$ty> {
            fn default() -> Self {
                // The widest span with a reversible path.
                UniformInt {
                    a: 0,
                    b: u64::MAX as $ty,
                }
            }
        }

        impl ReversibleDistribution<u64> for UniformInt<$ty> {
            type Sample = $ty;

            fn sample<E>(&self, engine: &mut E) -> $ty
            where
                E: Engine<Word = u64> + ?Sized,
            {
                let dist_range = self.b.wrapping_sub(self.a) as u128;
                let dist_range = require_span_u64(dist_range);
                self.a.wrapping_add(sample_span_u64(engine, dist_range) as $ty)
            }
        }

        impl ReversibleDistribution<u32> for UniformInt<$ty> {
            type Sample = $ty;

            fn sample<E>(&self, engine: &mut E) -> $ty
            where
                E: Engine<Word = u32> + ?Sized,
            {
                let dist_range = self.b.wrapping_sub(self.a) as u128;
                let dist_range = require_span_u64(dist_range);
                self.a.wrapping_add(sample_span_u32(engine, dist_range) as $ty)
            }
        }

        impl fmt::Display for UniformInt<$ty> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", self.a, self.b)
            }
        }

        impl FromTokens for UniformInt<$ty> {
            fn from_tokens(tokens: &mut Tokens<'_>) -> Result<Self, ParseError> {
                let a: $ty = tokens.parse()?;
                let b: $ty = tokens.parse()?;
                if a > b || b.wrapping_sub(a) as u128 > u128::from(u64::MAX) {
                    return Err(ParseError::InvalidValue);
                }
                Ok(UniformInt { a, b })
            }
        }
    };
}

uniform_int_128_impl! { i128 }
uniform_int_128_impl! { u128 }

/// The 128-bit constructors and decoders only admit spans that fit one
/// 64-bit word; this backstops that invariant at the sampling site.
fn require_span_u64(dist_range: u128) -> u64 {
    assert!(
        dist_range <= u128::from(u64::MAX),
        "uniform range spans more than 64 bits; no reversible path"
    );
    dist_range as u64
}

macro_rules! uniform_real_impl {
    ($ty:ty) => {
        impl SampleUniform for $ty {
            type Sampler = UniformReal<$ty>;
        }

        impl UniformSampler for UniformReal<$ty> {
            type X = $ty;

            fn new(low: $ty, high: $ty) -> Result<Self, Error> {
                if !(low <= high) {
                    return Err(Error::EmptyRange);
                }
                Ok(UniformReal { a: low, b: high })
            }
        }

        impl Default for UniformReal<$ty> {
            fn default() -> Self {
                UniformReal { a: 0.0, b: 1.0 }
            }
        }

        impl<W: Word> ReversibleDistribution<W> for UniformReal<$ty> {
            type Sample = $ty;

            #[inline]
            fn sample<E>(&self, engine: &mut E) -> $ty
            where
                E: Engine<Word = W> + ?Sized,
            {
                let unit = engine.next_word().unit_f64();
                (unit * f64::from(self.b - self.a) + f64::from(self.a)) as $ty
            }
        }

        impl fmt::Display for UniformReal<$ty> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", self.a, self.b)
            }
        }

        impl FromTokens for UniformReal<$ty> {
            fn from_tokens(tokens: &mut Tokens<'_>) -> Result<Self, ParseError> {
                let a = tokens.parse()?;
                let b = tokens.parse()?;
                if !(a <= b) {
                    return Err(ParseError::InvalidValue);
                }
                Ok(UniformReal { a, b })
            }
        }
    };
}

uniform_real_impl! { f32 }
uniform_real_impl! { f64 }
