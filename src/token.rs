//! Tokens and a tokenizer for DSL assembly source lines.

use logos::{Lexer, Logos};

use std::fmt;
use std::num::ParseIntError;
use std::ops::Range;

/// Enumeration of all tokens of the assembly format.
#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Errorneous token that could not be interpreted as any of the other variants.
    #[error]
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)]
    Error,

    /// The `.data` section directive.
    #[token(".data")]
    DataSection,

    /// The `.text` section directive.
    #[token(".text")]
    TextSection,

    /// A name which begins with a letter, `_` or `$` and can contain the characters
    /// `A-Za-z0-9_$`. Mnemonics, variable names and type names are all identifiers.
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", Lexer::slice)]
    Ident(&'a str),

    /// A label declaration or reference, eg. `@loop`. Holds the name without the `@`.
    #[regex(r"@[A-Za-z_$][A-Za-z0-9_$]*", label_callback)]
    Label(&'a str),

    /// A signed integer literal in decimal, hexadecimal (`0x`) or binary (`0b`) notation.
    #[regex("-?[0-9]+", decimal_callback)]
    #[regex("-?0[xX][0-9a-fA-F]+", hex_callback)]
    #[regex("0[bB][01]+", binary_callback)]
    Number(i32),

    /// A double quoted string literal with its escapes already processed.
    #[regex(r#""([^"\\]|\\.)*""#, string_callback)]
    Str(String),

    /// Token (`[`) that begins the offset of an operand. (Eg. `arr[2]`).
    #[token("[")]
    IndexBegin,

    /// Token (`]`) that ends the offset of an operand. (Eg. `arr[i]`).
    #[token("]")]
    IndexEnd,

    /// Token (`,`) that can be used to separate arguments of a single instruction.
    #[token(",")]
    Separator,

    #[token("=")]
    Assign,

    /// Token (`;`) that closes an array declaration.
    #[token(";")]
    Terminator,

    #[token(":")]
    Colon,

    #[token("+")]
    Plus,
}

fn label_callback<'a>(lex: &mut Lexer<'a, Token<'a>>) -> &'a str {
    &lex.slice()[1..]
}

fn decimal_callback<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Result<i32, ParseIntError> {
    lex.slice().parse()
}

fn hex_callback<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Result<i32, ParseIntError> {
    let slice = lex.slice();

    let (negative, digits) = match slice.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, slice),
    };

    // Hex literals denote raw word bits, so 0xFFFFFFFF is -1.
    let value = u32::from_str_radix(&digits[2..], 16)? as i32;

    Ok(if negative { value.wrapping_neg() } else { value })
}

fn binary_callback<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Result<i32, ParseIntError> {
    u32::from_str_radix(&lex.slice()[2..], 2).map(|value| value as i32)
}

fn string_callback<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Option<String> {
    let slice = lex.slice();
    let body = &slice[1..slice.len() - 1];

    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }

        let escaped = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            _ => return None,
        };

        value.push(escaped);
    }

    Some(value)
}

/// Splits a line into tokens and their byte ranges within the line.
pub fn tokenize(line: &str) -> Vec<(Token, Range<usize>)> {
    Token::lexer(line).spanned().collect()
}

impl<'t> fmt::Display for Token<'t> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Error => write!(f, "<error>"),
            Token::DataSection => write!(f, ".data"),
            Token::TextSection => write!(f, ".text"),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Label(name) => write!(f, "@{}", name),
            Token::Number(num) => write!(f, "{}", num),
            Token::Str(value) => write!(f, "{:?}", value),
            Token::IndexBegin => write!(f, "["),
            Token::IndexEnd => write!(f, "]"),
            Token::Separator => write!(f, ","),
            Token::Assign => write!(f, "="),
            Token::Terminator => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::Plus => write!(f, "+"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(line: &str) -> Vec<Token> {
        tokenize(line).into_iter().map(|(token, _)| token).collect()
    }

    #[test]
    fn test_instruction_line() {
        assert_eq!(
            tokens("beq a, b[2] @end // compare"),
            vec![
                Token::Ident("beq"),
                Token::Ident("a"),
                Token::Separator,
                Token::Ident("b"),
                Token::IndexBegin,
                Token::Number(2),
                Token::IndexEnd,
                Token::Label("end"),
            ],
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokens("-12 0x1F 0b101 -0x10"), vec![
            Token::Number(-12),
            Token::Number(31),
            Token::Number(5),
            Token::Number(-16),
        ]);

        // Hex literals are raw word bits.
        assert_eq!(tokens("0xFFFFFFFF -0x80000000 0x7FFFFFFF"), vec![
            Token::Number(-1),
            Token::Number(i32::MIN),
            Token::Number(i32::MAX),
        ]);
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#"var s string = "a\"b\n""#),
            vec![
                Token::Ident("var"),
                Token::Ident("s"),
                Token::Ident("string"),
                Token::Assign,
                Token::Str("a\"b\n".to_string()),
            ],
        );
    }

    #[test]
    fn test_comment_only() {
        assert!(tokens("   // nothing here").is_empty());
    }

    #[test]
    fn test_unknown_character() {
        assert!(tokens("add x # y").contains(&Token::Error));
    }
}
