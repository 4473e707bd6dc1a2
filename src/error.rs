//! Error types of the assembler and of the word stream loader.

use std::fmt::{self, Display};

use itertools::Itertools;
use nom::error::ErrorKind as NomErrorKind;

/// Reason why a single source line could not be assembled.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// Something other than `.data` or `.text` appeared before the first section directive.
    SectionOrder,

    /// An array declaration was still open when it had to be complete.
    IncompleteDeclaration {
        /// Name of the open variable.
        name: String,
    },

    /// The mnemonic is not part of the instruction set.
    UnknownInstruction {
        mnemonic: String,
        /// The closest known mnemonic, if any is close enough.
        suggestion: Option<String>,
    },

    /// The instruction received the wrong number of arguments.
    Arity {
        mnemonic: String,
        expected: usize,
        got: usize,
        /// Description of the first missing parameter, eg. `parameter 3 (Source)`.
        missing: Option<String>,
    },

    /// An argument does not have the form its parameter requires.
    MalformedOperand {
        operand: String,
        reason: String,
    },

    DuplicateLabel(String),
    DuplicateVariable(String),

    /// A referenced label or variable was never declared.
    UndefinedSymbol {
        /// `"label"` or `"variable"`.
        kind: &'static str,
        name: String,
    },

    /// A global variable declaration or continuation could not be understood.
    InvalidDeclaration(String),

    /// The line fits none of the line forms.
    Syntax(String),
}

impl ErrorKind {
    /// Fatal errors abort the compilation instead of being collected.
    pub fn is_fatal(&self) -> bool {
        match self {
            ErrorKind::SectionOrder | ErrorKind::IncompleteDeclaration { .. } => true,
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::SectionOrder => "SectionOrderError",
            ErrorKind::IncompleteDeclaration { .. } => "IncompleteDeclarationError",
            ErrorKind::UnknownInstruction { .. } => "UnknownInstruction",
            ErrorKind::Arity { .. } => "ArityError",
            ErrorKind::MalformedOperand { .. } => "MalformedOperand",
            ErrorKind::DuplicateLabel(_) => "DuplicateLabel",
            ErrorKind::DuplicateVariable(_) => "DuplicateVariable",
            ErrorKind::UndefinedSymbol { .. } => "UndefinedSymbol",
            ErrorKind::InvalidDeclaration(_) => "InvalidDeclaration",
            ErrorKind::Syntax(_) => "SyntaxError",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::SectionOrder => write!(f, ".text or .data must be first in program"),
            ErrorKind::IncompleteDeclaration { name } => {
                write!(f, "declaration of '{}' is not terminated with ';'", name)
            }
            ErrorKind::UnknownInstruction { mnemonic, suggestion: Some(suggestion) } => {
                write!(f, "invalid operation '{}', did you mean '{}'?", mnemonic, suggestion)
            }
            ErrorKind::UnknownInstruction { mnemonic, suggestion: None } => {
                write!(f, "invalid operation '{}'", mnemonic)
            }
            ErrorKind::Arity { mnemonic, missing: Some(missing), .. } => {
                write!(f, "'{}' is missing {}", mnemonic, missing)
            }
            ErrorKind::Arity { mnemonic, expected, got, missing: None } => {
                write!(f, "'{}' takes {} parameters, got {}", mnemonic, expected, got)
            }
            ErrorKind::MalformedOperand { operand, reason } => {
                write!(f, "malformed operand '{}': {}", operand, reason)
            }
            ErrorKind::DuplicateLabel(name) => write!(f, "already have a label '{}'", name),
            ErrorKind::DuplicateVariable(name) => write!(f, "already have a variable '{}'", name),
            ErrorKind::UndefinedSymbol { kind, name } => {
                write!(f, "cannot find {} '{}'", kind, name)
            }
            ErrorKind::InvalidDeclaration(reason) => write!(f, "{}", reason),
            ErrorKind::Syntax(reason) => write!(f, "{}", reason),
        }
    }
}

/// An [ErrorKind] attributed to a source line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineError {
    /// Zero based index of the line in the source.
    pub line: usize,
    pub kind: ErrorKind,
}

impl Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind.name(), self.line, self.kind)
    }
}

/// Error returned when a program could not be compiled.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Compilation stopped at the first error, the rest of the source was not examined.
    Fatal(LineError),

    /// Every line error found in the source, ordered by line.
    Aggregate(Vec<LineError>),
}

impl CompileError {
    pub(crate) fn aggregate(mut errors: Vec<LineError>) -> CompileError {
        errors.sort_by_key(|err| err.line);
        CompileError::Aggregate(errors)
    }

    /// All errors carried by this error.
    pub fn errors(&self) -> &[LineError] {
        match self {
            CompileError::Fatal(err) => std::slice::from_ref(err),
            CompileError::Aggregate(errors) => errors,
        }
    }

    pub fn is_fatal(&self) -> bool {
        match self {
            CompileError::Fatal(_) => true,
            CompileError::Aggregate(_) => false,
        }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.errors().iter().join("\n"))
    }
}

impl std::error::Error for CompileError {}

#[derive(Debug, Clone, PartialEq)]
enum InnerError {
    Context(&'static str),
    Nom(NomErrorKind),
}

impl Display for InnerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InnerError::Context(ctx) => write!(f, "invalid {}", ctx),
            InnerError::Nom(_err) => write!(f, "unexpected input"),
        }
    }
}

/// Error produced while reading an emitted word stream back into words.
///
/// Contains the reason of the error and the unconsumed input of the offending line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Zero based index of the offending line.
    pub line: usize,
    stack: Vec<(String, InnerError)>,
}

impl ParseError {
    pub(crate) fn at_line(mut self, line: usize) -> ParseError {
        self.line = line;
        self
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // The outermost context describes the failure best.
        let (rest, kind) = match self.stack.last() {
            Some(entry) => entry,
            None => return write!(f, "at line {}: unexpected input", self.line),
        };

        let rest: String = rest.chars().take(20).collect();

        write!(f, "at line {}: {} at '{}'", self.line, kind, rest)
    }
}

impl std::error::Error for ParseError {}

impl nom::error::ParseError<&str> for ParseError {
    fn from_error_kind(input: &str, kind: NomErrorKind) -> Self {
        ParseError {
            line: 0,
            stack: vec![(input.to_string(), InnerError::Nom(kind))],
        }
    }

    fn append(input: &str, kind: NomErrorKind, mut other: Self) -> Self {
        other.stack.push((input.to_string(), InnerError::Nom(kind)));
        other
    }

    fn add_context(input: &str, ctx: &'static str, mut other: Self) -> Self {
        other.stack.push((input.to_string(), InnerError::Context(ctx)));
        other
    }
}
