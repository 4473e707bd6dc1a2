//! The text format of program images, consumed by the virtual machine's loader.
//!
//! An image is written as one decimal word per line. A word may be followed by a comment
//! starting with `#`, which describes where the word came from:
//!
//! ```text
//! 24 # prologue -- LoadImmediateToBus
//! 4
//! 13 # JumpWithBusValueRelative
//! 0 # number x
//! 24 # loadi x 5 -- LoadImmediateToBus
//! 5
//! 2 # SaveValueInBusToLocation
//! 3
//! 100 # halt -- Halt
//! ```

use std::result::Result as StdResult;

use itertools::Itertools;
use nom::{
    bytes::complete::take_while,
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res, opt, recognize, rest},
    error::context,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use crate::error::ParseError;
use crate::layout::Image;

/// Options controlling the emitted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    /// Append the `# comment` describing each word.
    pub comments: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions { comments: true }
    }
}

/// Writes the image as newline separated words.
pub fn emit(image: &Image, options: &EmitOptions) -> String {
    image
        .words()
        .iter()
        .map(|word| match (&word.comment, options.comments) {
            (Some(comment), true) => format!("{} # {}", word.value, comment),
            _ => word.value.to_string(),
        })
        .join("\n")
}

type Result<'a, T> = IResult<&'a str, T, ParseError>;

const SPACE_CHARACTERS: &str = " \t";

fn sp(input: &str) -> Result<&str> {
    take_while(|c| SPACE_CHARACTERS.contains(c))(input)
}

fn take_word(input: &str) -> Result<i32> {
    context(
        "word",
        map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| s.parse::<i32>()),
    )(input)
}

fn comment(input: &str) -> Result<&str> {
    preceded(char('#'), rest)(input)
}

fn parse_line(input: &str) -> Result<Option<i32>> {
    terminated(delimited(sp, opt(take_word), sp), opt(comment))(input)
}

/// Reads emitted text back into words. Blank lines and comments are skipped.
pub fn parse_words(text: &str) -> StdResult<Vec<i32>, ParseError> {
    let mut words = Vec::new();

    for (index, line) in text.lines().enumerate() {
        match all_consuming(parse_line)(line) {
            Ok((_, Some(word))) => words.push(word),
            Ok((_, None)) => (),
            Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => {
                return Err(err.at_line(index))
            }
            Err(nom::Err::Incomplete(_)) => {
                let err = <ParseError as nom::error::ParseError<&str>>::from_error_kind(
                    line,
                    nom::error::ErrorKind::Eof,
                );

                return Err(err.at_line(index));
            }
        }
    }

    Ok(words)
}
