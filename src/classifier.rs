//! Classification of single source lines.
//!
//! A line is classified on its own, knowing only the section it appears in. Whether a
//! continuation line actually has an open declaration to continue is decided by the
//! [Assembler](crate::assembler::Assembler).

use std::ops::Range;

use crate::error::ErrorKind;
use crate::program::VariableType;
use crate::token::{tokenize, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Data,
    Text,
}

/// A single instruction argument: its tokens and the source text they were read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument<'a> {
    pub text: &'a str,
    pub tokens: Vec<Token<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Line<'a> {
    Blank,
    Comment,

    /// A `.data` or `.text` directive.
    Section(Section),

    /// `@name` or `@name:` on a line of its own.
    Label(&'a str),

    /// `var <name> <type> = <value...>`
    GlobalStart {
        name: &'a str,
        ty: VariableType,
        values: Vec<i32>,
        /// `false` for an array declaration that continues on the following lines.
        terminated: bool,
    },

    /// Bare integers continuing an open array declaration.
    GlobalContinue {
        values: Vec<i32>,
        terminated: bool,
    },

    /// `<mnemonic> <args...>`
    Statement {
        mnemonic: &'a str,
        args: Vec<Argument<'a>>,
    },
}

type Spanned<'a> = (Token<'a>, Range<usize>);

fn invalid<S: Into<String>>(reason: S) -> ErrorKind {
    ErrorKind::InvalidDeclaration(reason.into())
}

/// Classifies one raw source line.
///
/// # Parameters
/// - `line`: The line without its line terminator.
/// - `section`: The section the line appears in, `None` before the first directive.
pub fn classify(line: &str, section: Option<Section>) -> Result<Line, ErrorKind> {
    let line = line.trim();

    if line.is_empty() {
        return Ok(Line::Blank);
    }

    if line.starts_with("//") {
        return Ok(Line::Comment);
    }

    let tokens = tokenize(line);

    let directive = match tokens.as_slice() {
        [(Token::DataSection, _)] => Some(Section::Data),
        [(Token::TextSection, _)] => Some(Section::Text),
        _ => None,
    };

    match (directive, section) {
        (Some(directive), _) => return Ok(Line::Section(directive)),
        (None, None) => return Err(ErrorKind::SectionOrder),
        (None, Some(_)) => (),
    }

    if let Some((_, span)) = tokens.iter().find(|(token, _)| *token == Token::Error) {
        return Err(ErrorKind::Syntax(format!("unexpected input '{}'", &line[span.clone()])));
    }

    if let Some((token, _)) = tokens
        .iter()
        .find(|(token, _)| *token == Token::DataSection || *token == Token::TextSection)
    {
        return Err(ErrorKind::Syntax(format!("'{}' must be alone on its line", token)));
    }

    match section {
        Some(Section::Data) => classify_data(&tokens),
        _ => classify_text(line, &tokens),
    }
}

fn classify_data<'a>(tokens: &[Spanned<'a>]) -> Result<Line<'a>, ErrorKind> {
    match tokens.first() {
        Some((Token::Ident("var"), _)) => global_start(&tokens[1..]),
        _ => {
            let (values, terminated) = integers(tokens)?;
            Ok(Line::GlobalContinue { values, terminated })
        }
    }
}

fn global_start<'a>(rest: &[Spanned<'a>]) -> Result<Line<'a>, ErrorKind> {
    let name = match rest.get(0) {
        Some((Token::Ident(name), _)) => *name,
        _ => return Err(invalid("expected a variable name after 'var'")),
    };

    let ty = match rest.get(1) {
        Some((Token::Ident(ty), _)) => VariableType::from_name(ty).ok_or_else(|| {
            invalid(format!(
                "unknown type '{}' for '{}', expected number, string or array",
                ty, name
            ))
        })?,
        _ => return Err(invalid(format!("expected a type after 'var {}'", name))),
    };

    match rest.get(2) {
        Some((Token::Assign, _)) => (),
        _ => return Err(invalid(format!("expected '=' after 'var {} {}'", name, ty))),
    }

    let (values, terminated) = match (ty, &rest[3..]) {
        (VariableType::Number, [(Token::Number(value), _)])
        | (VariableType::Number, [(Token::Number(value), _), (Token::Terminator, _)]) => {
            (vec![*value], true)
        }
        (VariableType::Number, _) => {
            return Err(invalid(format!("number '{}' takes exactly one integer value", name)))
        }

        (VariableType::String, [(Token::Str(value), _)])
        | (VariableType::String, [(Token::Str(value), _), (Token::Terminator, _)]) => {
            (value.chars().map(|ch| ch as i32).collect(), true)
        }
        (VariableType::String, _) => {
            return Err(invalid(format!("string '{}' takes exactly one string literal", name)))
        }

        (VariableType::Array, values) => integers(values)?,
    };

    Ok(Line::GlobalStart {
        name,
        ty,
        values,
        terminated,
    })
}

/// Reads integers up to an optional terminating `;`. Commas between the values are allowed.
fn integers(tokens: &[Spanned]) -> Result<(Vec<i32>, bool), ErrorKind> {
    let mut values = Vec::new();
    let mut iter = tokens.iter();

    while let Some((token, _)) = iter.next() {
        match token {
            Token::Number(value) => values.push(*value),
            Token::Separator => (),
            Token::Terminator => {
                if let Some((extra, _)) = iter.next() {
                    return Err(invalid(format!("unexpected '{}' after ';'", extra)));
                }

                return Ok((values, true));
            }
            other => return Err(invalid(format!("expected an integer, found '{}'", other))),
        }
    }

    Ok((values, false))
}

fn classify_text<'a>(line: &'a str, tokens: &[Spanned<'a>]) -> Result<Line<'a>, ErrorKind> {
    match tokens {
        [(Token::Label(name), _)] | [(Token::Label(name), _), (Token::Colon, _)] => {
            Ok(Line::Label(*name))
        }
        [(Token::Label(name), _), ..] => Err(ErrorKind::Syntax(format!(
            "label '@{}' must not have anything else on the same line",
            name
        ))),
        [(Token::Ident(mnemonic), _), rest @ ..] => Ok(Line::Statement {
            mnemonic: *mnemonic,
            args: group_arguments(line, rest)?,
        }),
        [(other, _), ..] => Err(ErrorKind::Syntax(format!(
            "expected an instruction or a label, found '{}'",
            other
        ))),
        [] => Ok(Line::Blank),
    }
}

/// Splits the tokens after a mnemonic into arguments.
///
/// Arguments are separated by commas or by whitespace. Tokens inside `[...]` and a `[`
/// following a name always belong to the same argument.
fn group_arguments<'a>(line: &'a str, tokens: &[Spanned<'a>]) -> Result<Vec<Argument<'a>>, ErrorKind> {
    let mut args = Vec::new();
    let mut current: Vec<Spanned<'a>> = Vec::new();
    let mut depth = 0usize;

    let flush = move |current: &mut Vec<Spanned<'a>>, args: &mut Vec<Argument<'a>>| {
        let start = match current.first() {
            Some((_, span)) => span.start,
            None => return Err(ErrorKind::Syntax("empty argument".to_string())),
        };
        let end = current.last().map(|(_, span)| span.end).unwrap_or(start);

        args.push(Argument {
            text: &line[start..end],
            tokens: current.drain(..).map(|(token, _)| token).collect(),
        });

        Ok(())
    };

    for (token, span) in tokens {
        if *token == Token::Separator && depth == 0 {
            flush(&mut current, &mut args)?;
            continue;
        }

        let detached = match current.last() {
            Some((_, previous)) => previous.end != span.start,
            None => false,
        };

        if detached && depth == 0 && *token != Token::IndexBegin {
            flush(&mut current, &mut args)?;
        }

        match token {
            Token::IndexBegin => depth += 1,
            Token::IndexEnd => depth = depth.saturating_sub(1),
            _ => (),
        }

        current.push((token.clone(), span.clone()));
    }

    if !current.is_empty() {
        flush(&mut current, &mut args)?;
    } else if !tokens.is_empty() {
        // The line ends with a separator.
        return Err(ErrorKind::Syntax("empty argument".to_string()));
    }

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<String> {
        match classify(line, Some(Section::Text)).unwrap() {
            Line::Statement { args, .. } => args.iter().map(|arg| arg.text.to_string()).collect(),
            other => panic!("not a statement: {:?}", other),
        }
    }

    #[test]
    fn test_blank_and_comment_outside_sections() {
        assert_eq!(classify("   ", None), Ok(Line::Blank));
        assert_eq!(classify("  // header", None), Ok(Line::Comment));
        assert_eq!(classify(".data", None), Ok(Line::Section(Section::Data)));
        assert_eq!(classify(" .text ", None), Ok(Line::Section(Section::Text)));
    }

    #[test]
    fn test_anything_else_before_section_is_fatal() {
        let err = classify("loadi x 5", None).unwrap_err();
        assert_eq!(err, ErrorKind::SectionOrder);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_globals() {
        assert_eq!(
            classify("var x number = 5", Some(Section::Data)),
            Ok(Line::GlobalStart {
                name: "x",
                ty: VariableType::Number,
                values: vec![5],
                terminated: true,
            }),
        );

        assert_eq!(
            classify("var s string = \"hi\"", Some(Section::Data)),
            Ok(Line::GlobalStart {
                name: "s",
                ty: VariableType::String,
                values: vec![104, 105],
                terminated: true,
            }),
        );

        assert_eq!(
            classify("var a array = 1 2", Some(Section::Data)),
            Ok(Line::GlobalStart {
                name: "a",
                ty: VariableType::Array,
                values: vec![1, 2],
                terminated: false,
            }),
        );

        assert_eq!(
            classify("3, 4 ;", Some(Section::Data)),
            Ok(Line::GlobalContinue {
                values: vec![3, 4],
                terminated: true,
            }),
        );
    }

    #[test]
    fn test_invalid_globals() {
        for line in &[
            "var",
            "var x",
            "var x float = 1",
            "var x number 1",
            "var x number = 1 2",
            "var x array = 1 ; 2",
            "var s string = 5",
        ] {
            match classify(line, Some(Section::Data)) {
                Err(ErrorKind::InvalidDeclaration(_)) => (),
                other => panic!("{:?} classified as {:?}", line, other),
            }
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(classify("@end", Some(Section::Text)), Ok(Line::Label("end")));
        assert_eq!(classify("@end:", Some(Section::Text)), Ok(Line::Label("end")));

        match classify("@end halt", Some(Section::Text)) {
            Err(ErrorKind::Syntax(_)) => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_argument_grouping() {
        assert_eq!(texts("add d,a,b"), vec!["d", "a", "b"]);
        assert_eq!(texts("add d a b"), vec!["d", "a", "b"]);
        assert_eq!(texts("loadi arr[ i ] -5"), vec!["arr[ i ]", "-5"]);
        assert_eq!(texts("beq x[2], y @loop"), vec!["x[2]", "y", "@loop"]);
        assert_eq!(texts("halt"), Vec::<String>::new());
    }

    #[test]
    fn test_trailing_separator() {
        match classify("add d, a,", Some(Section::Text)) {
            Err(ErrorKind::Syntax(_)) => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_directive_with_trailing_input() {
        match classify(".text now", Some(Section::Data)) {
            Err(ErrorKind::Syntax(_)) => (),
            other => panic!("{:?}", other),
        }
    }
}
