// Copyright 2023 Developers of the reverse_rand project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Textual state encoding.
//!
//! Engines, distributions and [`ReversibleRng`](crate::ReversibleRng)
//! encode their state as decimal fields separated by single spaces, via
//! `fmt::Display`, and decode it via `str::FromStr`. The format is
//! locale-independent and self round-tripping: `decode(encode(x)) == x`
//! for every valid state.
//!
//! Composite states are decoded field by field through [`Tokens`] and
//! [`FromTokens`], which is what lets the wrapper parse
//! `<engine> <distribution> <position>` without knowing how many fields
//! each part occupies.

use std::str::{FromStr, SplitWhitespace};
use std::{error, fmt};

/// Error produced when decoding a textual generator state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The input ended before every state field was read.
    UnexpectedEnd,
    /// A field could not be parsed as a decimal number.
    InvalidNumber,
    /// A parsed field violates the invariants of the target type.
    InvalidValue,
    /// Input remained after the last state field.
    TrailingInput,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParseError::UnexpectedEnd => "input ended before every state field was read",
            ParseError::InvalidNumber => "state field is not a valid decimal number",
            ParseError::InvalidValue => "state field violates the target type's invariants",
            ParseError::TrailingInput => "input remained after the last state field",
        })
    }
}

impl error::Error for ParseError {}

/// A cursor over the whitespace-separated fields of an encoded state.
#[derive(Debug)]
pub struct Tokens<'a> {
    fields: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    /// Starts reading fields from `input`.
    pub fn new(input: &'a str) -> Self {
        Tokens {
            fields: input.split_whitespace(),
        }
    }

    /// Reads and parses the next field.
    pub fn parse<T: FromStr>(&mut self) -> Result<T, ParseError> {
        self.fields
            .next()
            .ok_or(ParseError::UnexpectedEnd)?
            .parse()
            .map_err(|_| ParseError::InvalidNumber)
    }

    /// Asserts that no fields remain.
    pub fn finish(mut self) -> Result<(), ParseError> {
        match self.fields.next() {
            Some(_) => Err(ParseError::TrailingInput),
            None => Ok(()),
        }
    }
}

/// Types that can decode their state from a field cursor.
///
/// This is the composable half of `FromStr`: a composite type decodes each
/// part in sequence from the same [`Tokens`] cursor.
pub trait FromTokens: Sized {
    /// Decodes one value, consuming exactly the fields it encodes to.
    fn from_tokens(tokens: &mut Tokens<'_>) -> Result<Self, ParseError>;
}
