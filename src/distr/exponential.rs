// Copyright 2023 Developers of the reverse_rand project.
// Copyright 2018 Developers of the Rand project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The exponential distribution.

use core::fmt;
use std::error;
use std::str::FromStr;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use super::ReversibleDistribution;
use crate::codec::{FromTokens, ParseError, Tokens};
use crate::utils::float64;
use crate::Engine;

/// Error type returned from [`Exp::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The rate parameter is not strictly positive.
    LambdaTooSmall,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::LambdaTooSmall => "lambda is not positive in exponential distribution",
        })
    }
}

impl error::Error for Error {}

/// The exponential distribution `Exp(lambda)`.
///
/// Sampled by inverting the CDF on a single 64-bit engine word mapped to
/// the unit interval, so exactly one word is consumed per sample in either
/// direction. Only 64-bit engines can drive this distribution.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct Exp<F> {
    lambda: F,
}

impl<F: Copy> Exp<F> {
    /// Returns the inverse scale parameter of the distribution.
    pub fn lambda(&self) -> F {
        self.lambda
    }
}

macro_rules! exp_impl {
    ($ty:ty) => {
        impl Exp<$ty> {
            /// Constructs the distribution; `lambda` must be strictly
            /// positive.
            pub fn new(lambda: $ty) -> Result<Exp<$ty>, Error> {
                if !(lambda > 0.0) {
                    return Err(Error::LambdaTooSmall);
                }
                Ok(Exp { lambda })
            }
        }

        impl ReversibleDistribution<u64> for Exp<$ty> {
            type Sample = $ty;

            #[inline]
            fn sample<E>(&self, engine: &mut E) -> $ty
            where
                E: Engine<Word = u64> + ?Sized,
            {
                (-(1.0 - float64(engine.next_word())).ln() / f64::from(self.lambda)) as $ty
            }
        }

        impl fmt::Display for Exp<$ty> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.lambda)
            }
        }

        impl FromTokens for Exp<$ty> {
            fn from_tokens(tokens: &mut Tokens<'_>) -> Result<Self, ParseError> {
                let lambda: $ty = tokens.parse()?;
                if !(lambda > 0.0) {
                    return Err(ParseError::InvalidValue);
                }
                Ok(Exp { lambda })
            }
        }

        impl FromStr for Exp<$ty> {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, ParseError> {
                let mut tokens = Tokens::new(s);
                let exp = Self::from_tokens(&mut tokens)?;
                tokens.finish()?;
                Ok(exp)
            }
        }
    };
}

exp_impl! { f32 }
exp_impl! { f64 }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::ReversiblePcg64;
    use crate::ReversedEngine;
    use rand_core::SeedableRng;

    #[test]
    fn rejects_non_positive_lambda() {
        assert_eq!(Exp::<f64>::new(0.0).unwrap_err(), Error::LambdaTooSmall);
        assert_eq!(Exp::<f64>::new(-3.0).unwrap_err(), Error::LambdaTooSmall);
        assert_eq!(Exp::<f64>::new(f64::NAN).unwrap_err(), Error::LambdaTooSmall);
        assert!(Exp::<f64>::new(1.5).is_ok());
    }

    #[test]
    fn reference() {
        let exp = Exp::<f64>::new(1.5).unwrap();
        let mut engine = ReversiblePcg64::seed_from_u64(42);
        let expected = [
            0.11467145046196779,
            0.8820038998614002,
            0.8347289714852159,
            0.9176968652244321,
        ];
        for &e in &expected {
            let sample: f64 = exp.sample(&mut engine);
            assert!((sample - e).abs() < 1e-12);
        }
    }

    #[test]
    fn consumes_one_word_per_sample() {
        let exp = Exp::<f64>::new(2.0).unwrap();
        let mut engine = ReversiblePcg64::seed_from_u64(5);
        let mut reference = engine.clone();
        for _ in 0..1000 {
            let _: f64 = exp.sample(&mut engine);
        }
        reference.discard(1000);
        assert_eq!(engine, reference);
    }

    #[test]
    fn reverses() {
        let exp = Exp::<f64>::new(0.5).unwrap();
        let mut engine = ReversiblePcg64::seed_from_u64(8);
        let forward: Vec<f64> = (0..10_000).map(|_| exp.sample(&mut engine)).collect();
        let backward: Vec<f64> = (0..10_000)
            .map(|_| exp.sample(&mut ReversedEngine::new(&mut engine)))
            .collect();
        assert!(forward.iter().rev().eq(backward.iter()));
    }

    #[test]
    fn samples_are_non_negative() {
        let exp = Exp::<f64>::new(1.0).unwrap();
        let mut engine = ReversiblePcg64::seed_from_u64(13);
        for _ in 0..10_000 {
            let sample: f64 = exp.sample(&mut engine);
            assert!(sample >= 0.0);
            assert!(sample.is_finite());
        }
    }

    #[test]
    fn parse_round_trip() {
        let exp = Exp::<f64>::new(2.25).unwrap();
        let decoded: Exp<f64> = exp.to_string().parse().unwrap();
        assert_eq!(exp, decoded);

        assert!("0".parse::<Exp<f64>>().is_err());
        assert!("".parse::<Exp<f64>>().is_err());
    }
}
