//! The mnemonic table: instructions of the assembly language and their expansion into
//! primitive operations.

use std::collections::BTreeMap;
use std::fmt;

use edit_distance::edit_distance;
use lazy_static::lazy_static;

use crate::classifier::Argument;
use crate::error::ErrorKind;
use crate::opcode::{CompareMode, OpCode};
use crate::operand::VariableReference;
use crate::program::{BoundOperation, Param};
use crate::symbol_table::SymbolRef;
use crate::token::Token;

/// The form an instruction expects an argument to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// A variable operand that is written to.
    Destination,

    /// A variable operand that is read from.
    Source,

    /// An integer literal.
    Immediate,

    /// A label reference, eg. `@loop`.
    Label,

    /// An integer literal selecting a host call.
    Code,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ParamKind::Destination => "Destination",
            ParamKind::Source => "Source",
            ParamKind::Immediate => "Immediate",
            ParamKind::Label => "Label",
            ParamKind::Code => "Code",
        };

        write!(f, "{}", name)
    }
}

/// Arguments of a single instruction statement, already checked for count.
///
/// Every accessor takes the zero based index of the argument.
pub struct Operands<'s, 'a> {
    args: &'s [Argument<'a>],
}

impl<'s, 'a> Operands<'s, 'a> {
    fn malformed(&self, index: usize, reason: &str) -> ErrorKind {
        ErrorKind::MalformedOperand {
            operand: self.args[index].text.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn variable(&self, index: usize) -> Result<VariableReference, ErrorKind> {
        VariableReference::parse(&self.args[index])
    }

    /// The operation that loads the argument onto the bus.
    pub fn load(&self, index: usize) -> Result<BoundOperation, ErrorKind> {
        Ok(self.variable(index)?.load())
    }

    /// The operation that stores the bus into the argument.
    pub fn save(&self, index: usize) -> Result<BoundOperation, ErrorKind> {
        Ok(self.variable(index)?.save())
    }

    pub fn integer(&self, index: usize) -> Result<i32, ErrorKind> {
        match self.args[index].tokens.as_slice() {
            [Token::Number(value)] => Ok(*value),
            _ => Err(self.malformed(index, "expected an integer")),
        }
    }

    pub fn immediate(&self, index: usize) -> Result<Param, ErrorKind> {
        self.integer(index).map(Param::Immediate)
    }

    /// A reference to the address of a label, resolved after layout.
    pub fn label(&self, index: usize) -> Result<Param, ErrorKind> {
        match self.args[index].tokens.as_slice() {
            [Token::Label(name)] => Ok(Param::Address(SymbolRef::label(*name))),
            _ => Err(self.malformed(index, "expected a label, eg. @loop")),
        }
    }
}

type Expansion = dyn Fn(&Operands) -> Result<Vec<BoundOperation>, ErrorKind> + Send + Sync;

/// An instruction definition: its parameters and how it expands.
pub struct InstructionDef {
    params: Vec<ParamKind>,
    expand: Box<Expansion>,
}

impl InstructionDef {
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }
}

impl fmt::Debug for InstructionDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("InstructionDef")
            .field("params", &self.params)
            .finish()
    }
}

/// A table of instructions keyed by mnemonic.
///
/// Mnemonics are case sensitive.
#[derive(Debug, Default)]
pub struct InstructionSet {
    instructions: BTreeMap<String, InstructionDef>,
}

lazy_static! {
    /// The standard instruction set, built once per process.
    pub static ref STANDARD_INSTRUCTIONS: InstructionSet = InstructionSet::standard();
}

fn bare(opcode: OpCode) -> BoundOperation {
    BoundOperation::bare(opcode)
}

/// `d = a <op> b`, reading the result with `result`.
fn arithmetic(
    ops: &Operands,
    operation: OpCode,
    result: OpCode,
) -> Result<Vec<BoundOperation>, ErrorKind> {
    Ok(vec![
        ops.load(1)?,
        bare(OpCode::AluPushFromBus),
        ops.load(2)?,
        bare(operation),
        bare(result),
        ops.save(0)?,
    ])
}

fn branch(ops: &Operands, mode: CompareMode, link: bool) -> Result<Vec<BoundOperation>, ErrorKind> {
    let mut operations = vec![
        ops.load(0)?,
        bare(OpCode::AluPushFromBus),
        ops.load(1)?,
        BoundOperation::with(
            OpCode::AluDoComparisonWithMode,
            Param::Immediate(mode.as_word()),
        ),
    ];

    if link {
        operations.push(bare(OpCode::LinkIfBranched));
    }

    operations.push(BoundOperation::with(OpCode::BranchTo, ops.label(2)?));

    Ok(operations)
}

impl InstructionSet {
    /// An empty instruction set.
    pub fn new() -> InstructionSet {
        InstructionSet::default()
    }

    /// Adds an instruction or replaces an existing one with the same mnemonic.
    ///
    /// # Parameters
    /// - `mnemonic`: Name of the instruction.
    /// - `params`: The expected arguments. Statements with a different argument count are
    ///   rejected before `expand` is called.
    /// - `expand`: Produces the primitive operations of a statement.
    pub fn define<F>(&mut self, mnemonic: &str, params: &[ParamKind], expand: F)
    where
        F: Fn(&Operands) -> Result<Vec<BoundOperation>, ErrorKind> + Send + Sync + 'static,
    {
        self.instructions.insert(
            mnemonic.to_string(),
            InstructionDef {
                params: params.to_vec(),
                expand: Box::new(expand),
            },
        );
    }

    pub fn get(&self, mnemonic: &str) -> Option<&InstructionDef> {
        self.instructions.get(mnemonic)
    }

    /// All mnemonics in alphabetical order.
    pub fn mnemonics(&self) -> impl Iterator<Item = &str> {
        self.instructions.keys().map(String::as_str)
    }

    /// The closest known mnemonic within an edit distance of two.
    fn suggest(&self, mnemonic: &str) -> Option<String> {
        self.mnemonics()
            .map(|known| (edit_distance(known, mnemonic), known))
            .filter(|(distance, _)| *distance <= 2)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, known)| known.to_string())
    }

    /// Expands a statement into primitive operations.
    pub fn expand(&self, mnemonic: &str, args: &[Argument]) -> Result<Vec<BoundOperation>, ErrorKind> {
        let def = self
            .get(mnemonic)
            .ok_or_else(|| ErrorKind::UnknownInstruction {
                mnemonic: mnemonic.to_string(),
                suggestion: self.suggest(mnemonic),
            })?;

        if args.len() != def.params.len() {
            return Err(ErrorKind::Arity {
                mnemonic: mnemonic.to_string(),
                expected: def.params.len(),
                got: args.len(),
                missing: def
                    .params
                    .get(args.len())
                    .map(|kind| format!("parameter {} ({})", args.len() + 1, kind)),
            });
        }

        (def.expand)(&Operands { args })
    }

    /// The instruction set of the DSL virtual machine.
    pub fn standard() -> InstructionSet {
        use ParamKind::*;

        let mut set = InstructionSet::new();

        set.define("noop", &[], |_| Ok(vec![bare(OpCode::Noop)]));
        set.define("halt", &[], |_| Ok(vec![bare(OpCode::Halt)]));
        set.define("pause", &[], |_| Ok(vec![bare(OpCode::Pause)]));
        set.define("tofloat", &[], |_| Ok(vec![bare(OpCode::AluToFloat)]));
        set.define("toint", &[], |_| Ok(vec![bare(OpCode::AluToInt)]));

        set.define("loadi", &[Destination, Immediate], |ops| {
            Ok(vec![
                BoundOperation::with(OpCode::LoadImmediateToBus, ops.immediate(1)?),
                ops.save(0)?,
            ])
        });

        set.define("move", &[Destination, Source], |ops| {
            Ok(vec![ops.load(1)?, ops.save(0)?])
        });

        set.define("add", &[Destination, Source, Source], |ops| {
            arithmetic(ops, OpCode::AluDoAdd, OpCode::AluHiToBus)
        });

        set.define("addi", &[Destination, Source, Immediate], |ops| {
            Ok(vec![
                ops.load(1)?,
                bare(OpCode::AluPushFromBus),
                BoundOperation::with(OpCode::LoadImmediateToBus, ops.immediate(2)?),
                bare(OpCode::AluDoAdd),
                bare(OpCode::AluHiToBus),
                ops.save(0)?,
            ])
        });

        set.define("mul", &[Destination, Source, Source], |ops| {
            arithmetic(ops, OpCode::AluMultiply, OpCode::AluLoToBus)
        });

        set.define("div", &[Destination, Source, Source], |ops| {
            arithmetic(ops, OpCode::AluDivide, OpCode::AluLoToBus)
        });

        set.define("mod", &[Destination, Source, Source], |ops| {
            arithmetic(ops, OpCode::AluDivide, OpCode::AluHiToBus)
        });

        set.define("goto", &[Label], |ops| {
            Ok(vec![
                BoundOperation::with(OpCode::LoadImmediateToBus, ops.label(0)?),
                bare(OpCode::JumpWithBusValueRelative),
            ])
        });

        for mode in CompareMode::ALL.iter().copied() {
            set.define(&format!("b{}", mode.suffix()), &[Source, Source, Label], move |ops| {
                branch(ops, mode, false)
            });

            set.define(&format!("b{}al", mode.suffix()), &[Source, Source, Label], move |ops| {
                branch(ops, mode, true)
            });
        }

        set.define("captureLink", &[Destination], |ops| Ok(vec![ops.save(0)?]));

        // The link points at LinkIfBranched, execution resumes after the BranchTo that follows it.
        set.define("return", &[Source], |ops| {
            Ok(vec![
                ops.load(0)?,
                bare(OpCode::AluPushFromBus),
                BoundOperation::with(OpCode::LoadImmediateToBus, Param::Immediate(3)),
                bare(OpCode::AluDoAdd),
                bare(OpCode::AluHiToBus),
                bare(OpCode::JumpWithBusValueRelative),
            ])
        });

        set.define("here", &[Destination], |ops| {
            Ok(vec![bare(OpCode::GetCurrentPosition), ops.save(0)?])
        });

        set.define("syscall", &[Code, Source], |ops| {
            Ok(vec![
                ops.load(1)?,
                BoundOperation::with(OpCode::Syscall, Param::Immediate(ops.integer(0)?)),
            ])
        });

        set.define("newblock", &[Destination], |ops| {
            Ok(vec![bare(OpCode::NewBlock), ops.save(0)?])
        });

        set
    }
}
