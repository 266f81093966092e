// Copyright 2023 Developers of the reverse_rand project.
// Copyright 2018 Developers of the Rand project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The normal distribution.

use core::fmt;
use std::error;
use std::str::FromStr;

use rand_core::SeedableRng;
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use super::ziggurat_tables::{FN, KN, R, WN};
use super::ReversibleDistribution;
use crate::codec::{FromTokens, ParseError, Tokens};
use crate::engines::Xoshiro256Plus;
use crate::utils::float64;
use crate::Engine;

/// Error type returned from [`Normal::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The standard deviation is not strictly positive.
    StdDevTooSmall,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::StdDevTooSmall => "standard deviation is not positive in normal distribution",
        })
    }
}

impl error::Error for Error {}

/// The normal distribution `N(mean, std_dev**2)`.
///
/// Sampled with a 128-rectangle Ziggurat over a single 64-bit engine word
/// per attempt: the low 7 bits select the rectangle and the high bits form
/// a signed 24-bit magnitude. When the fast path rejects, all further
/// randomness for the tail and wedge branches comes from an ephemeral
/// [`Xoshiro256Plus`] seeded with the very word that was just consumed, so
/// the outer engine never advances more than once per attempt and replay
/// in either direction reproduces the branch decisions exactly.
///
/// Only 64-bit engines can drive this distribution.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct Normal<F> {
    mean: F,
    std_dev: F,
}

impl<F: Copy> Normal<F> {
    /// Returns the mean of the distribution.
    pub fn mean(&self) -> F {
        self.mean
    }

    /// Returns the standard deviation of the distribution.
    pub fn std_dev(&self) -> F {
        self.std_dev
    }
}

/// Standard normal deviate from one or more 64-bit engine words.
fn ziggurat<E>(engine: &mut E) -> f64
where
    E: Engine<Word = u64> + ?Sized,
{
    loop {
        let word = engine.next_word();
        let index = (word & 0x7f) as usize;
        let r = (word >> 8) as u32 as i32;

        let x = f64::from(r) * WN[index];
        if r.unsigned_abs() < KN[index] {
            // Inside one of the 127 rectangles; ~98.78% of samples.
            return x;
        }

        // Tail and wedge randomness is a pure function of the consumed word.
        let mut helper = Xoshiro256Plus::seed_from_u64(word);

        if index == 0 {
            loop {
                // log1p(-u) = log(1 - u) avoids log(0)
                let xx = -(-float64(helper.next_word())).ln_1p() / R;
                let yy = -(-float64(helper.next_word())).ln_1p();
                if yy + yy >= xx * xx {
                    return if r > 0 { R + xx } else { -(R + xx) };
                }
            }
        }

        if FN[index] + float64(helper.next_word()) * (FN[index - 1] - FN[index])
            < (-0.5 * x * x).exp()
        {
            return x;
        }
    }
}

macro_rules! normal_impl {
    ($ty:ty) => {
        impl Normal<$ty> {
            /// Constructs the distribution; `std_dev` must be strictly
            /// positive.
            pub fn new(mean: $ty, std_dev: $ty) -> Result<Normal<$ty>, Error> {
                if !(std_dev > 0.0) {
                    return Err(Error::StdDevTooSmall);
                }
                Ok(Normal { mean, std_dev })
            }
        }

        impl ReversibleDistribution<u64> for Normal<$ty> {
            type Sample = $ty;

            fn sample<E>(&self, engine: &mut E) -> $ty
            where
                E: Engine<Word = u64> + ?Sized,
            {
                (ziggurat(engine) * f64::from(self.std_dev) + f64::from(self.mean)) as $ty
            }
        }

        impl fmt::Display for Normal<$ty> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", self.mean, self.std_dev)
            }
        }

        impl FromTokens for Normal<$ty> {
            fn from_tokens(tokens: &mut Tokens<'_>) -> Result<Self, ParseError> {
                let mean = tokens.parse()?;
                let std_dev: $ty = tokens.parse()?;
                if !(std_dev > 0.0) {
                    return Err(ParseError::InvalidValue);
                }
                Ok(Normal { mean, std_dev })
            }
        }

        impl FromStr for Normal<$ty> {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, ParseError> {
                let mut tokens = Tokens::new(s);
                let normal = Self::from_tokens(&mut tokens)?;
                tokens.finish()?;
                Ok(normal)
            }
        }
    };
}

normal_impl! { f32 }
normal_impl! { f64 }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::ReversiblePcg64;
    use crate::ReversedEngine;

    #[test]
    fn rejects_non_positive_std_dev() {
        assert_eq!(Normal::<f64>::new(0.0, 0.0).unwrap_err(), Error::StdDevTooSmall);
        assert_eq!(Normal::<f64>::new(0.0, -1.0).unwrap_err(), Error::StdDevTooSmall);
        assert_eq!(
            Normal::<f64>::new(0.0, f64::NAN).unwrap_err(),
            Error::StdDevTooSmall
        );
        assert!(Normal::<f64>::new(0.0, 1.0).is_ok());
    }

    #[test]
    fn standard_reference() {
        // Fast-path samples are exact products of table entries, so they
        // are bit-stable across implementations.
        let normal = Normal::<f64>::new(0.0, 1.0).unwrap();
        let mut engine = ReversiblePcg64::seed_from_u64(42);
        let samples: Vec<f64> = (0..8).map(|_| normal.sample(&mut engine)).collect();
        let expected = [
            -0.352182480851696,
            -0.9972214759910251,
            2.55429832078058,
            2.0746122892019447,
            -0.8197116927191678,
            -0.15764220189918718,
            0.8593011041168336,
            0.0678001771596536,
        ];
        assert_eq!(samples, expected);
    }

    #[test]
    fn reverses_across_all_branches() {
        // 100k samples take the tail and wedge branches thousands of
        // times; every one must replay exactly under reversal.
        let normal = Normal::<f64>::new(0.0, 1.0).unwrap();
        let mut engine = ReversiblePcg64::seed_from_u64(7);
        let forward: Vec<f64> = (0..100_000).map(|_| normal.sample(&mut engine)).collect();
        let backward: Vec<f64> = (0..100_000)
            .map(|_| normal.sample(&mut ReversedEngine::new(&mut engine)))
            .collect();
        assert!(forward.iter().rev().eq(backward.iter()));
        assert_eq!(engine, ReversiblePcg64::seed_from_u64(7));
    }

    #[test]
    fn moments_are_plausible() {
        let normal = Normal::<f64>::new(3.0, 2.0).unwrap();
        let mut engine = ReversiblePcg64::seed_from_u64(11);
        let n = 200_000;
        let samples: Vec<f64> = (0..n).map(|_| normal.sample(&mut engine)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n as f64;
        assert!((mean - 3.0).abs() < 0.05);
        assert!((var - 4.0).abs() < 0.1);
    }

    #[test]
    fn scales_and_shifts() {
        let standard = Normal::<f64>::new(0.0, 1.0).unwrap();
        let scaled = Normal::<f64>::new(5.0, 0.5).unwrap();
        let mut e1 = ReversiblePcg64::seed_from_u64(3);
        let mut e2 = ReversiblePcg64::seed_from_u64(3);
        for _ in 0..1000 {
            let z = standard.sample(&mut e1);
            assert_eq!(scaled.sample(&mut e2), z * 0.5 + 5.0);
        }
    }

    #[test]
    fn parse_round_trip() {
        let normal = Normal::<f64>::new(-2.5, 0.75).unwrap();
        let decoded: Normal<f64> = normal.to_string().parse().unwrap();
        assert_eq!(normal, decoded);

        assert!("0 0".parse::<Normal<f64>>().is_err());
        assert!("0".parse::<Normal<f64>>().is_err());
    }
}
