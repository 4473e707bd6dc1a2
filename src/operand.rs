//! Variable operands and the load/save operations they resolve to.

use std::fmt;

use crate::classifier::Argument;
use crate::error::ErrorKind;
use crate::opcode::OpCode;
use crate::program::{BoundOperation, Param};
use crate::symbol_table::SymbolRef;
use crate::token::Token;

/// The part of an operand inside the brackets.
#[derive(Debug, Clone, PartialEq)]
pub enum Offset {
    /// `name`
    None,

    /// `name[k]`, resolved when assembling.
    Constant(i32),

    /// `name[other]`, added by the machine when executing.
    Indexed(String),
}

/// An operand naming a global variable, eg. `x`, `arr[2]` or `arr[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableReference {
    pub name: String,
    pub offset: Offset,
}

fn malformed(argument: &Argument, reason: &str) -> ErrorKind {
    ErrorKind::MalformedOperand {
        operand: argument.text.to_string(),
        reason: reason.to_string(),
    }
}

impl VariableReference {
    pub fn parse(argument: &Argument) -> Result<VariableReference, ErrorKind> {
        let (name, rest) = match argument.tokens.as_slice() {
            [Token::Ident(name), rest @ ..] => (name.to_string(), rest),
            _ => return Err(malformed(argument, "expected a variable name")),
        };

        let offset = match rest {
            [] => Offset::None,
            [Token::IndexBegin, Token::Number(k), Token::IndexEnd] => Offset::Constant(*k),
            [Token::IndexBegin, Token::Ident(index), Token::IndexEnd] => {
                Offset::Indexed(index.to_string())
            }
            [Token::Plus, ..] | [Token::Number(_), ..] => {
                return Err(malformed(argument, "offsets are written as name[k]"))
            }
            [Token::IndexBegin, ..] => {
                return Err(malformed(argument, "an offset is an integer or a variable name"))
            }
            _ => return Err(malformed(argument, "unexpected input after the variable name")),
        };

        Ok(VariableReference { name, offset })
    }

    fn address(&self) -> Param {
        Param::Address(SymbolRef::global(self.name.as_str()))
    }

    /// The operation that puts the referenced value on the bus.
    pub fn load(&self) -> BoundOperation {
        self.access(
            OpCode::LoadValueAtAddressIntoBus,
            OpCode::LoadWithConstantOffsetToBus,
            OpCode::LoadWithVariableOffsetToBus,
        )
    }

    /// The operation that stores the bus into the referenced location.
    pub fn save(&self) -> BoundOperation {
        self.access(
            OpCode::SaveValueInBusToLocation,
            OpCode::SaveFromBusWithConstantOffset,
            OpCode::SaveFromBusWithVariableOffset,
        )
    }

    fn access(&self, bare: OpCode, constant: OpCode, indexed: OpCode) -> BoundOperation {
        match &self.offset {
            Offset::None => BoundOperation::with(bare, self.address()),
            Offset::Constant(k) => {
                BoundOperation::new(constant, vec![self.address(), Param::Immediate(*k)])
            }
            Offset::Indexed(index) => BoundOperation::new(
                indexed,
                vec![self.address(), Param::Address(SymbolRef::global(index.as_str()))],
            ),
        }
    }
}

impl fmt::Display for VariableReference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.offset {
            Offset::None => write!(f, "{}", self.name),
            Offset::Constant(k) => write!(f, "{}[{}]", self.name, k),
            Offset::Indexed(index) => write!(f, "{}[{}]", self.name, index),
        }
    }
}
