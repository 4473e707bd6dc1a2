//! An assembler for the DSL assembly language of the DSL virtual machine.
//!
//! The assembler turns line oriented assembly source into a flat image of integer words which
//! the virtual machine loads into its memory. It is a classic two pass assembler:
//!
//! 1. Every line is [classified](classifier) and instructions are [expanded](instruction) into
//!    primitive [operations](opcode) whose label and variable parameters are left unresolved.
//!    Broken lines are collected instead of stopping the scan. See [assembler].
//! 2. [Layout](layout) places the global variables after a short prologue, the instructions
//!    after the variables, and then resolves every symbol reference.
//!
//! The resulting [Image](layout::Image) is written out by the [emitter].
//!
//! # Example
//! ```
//! let source = r#"
//! .data
//! var x number = 0
//!
//! .text
//! // Store five into x.
//! loadi x 5
//! halt
//! "#;
//!
//! let text = dsla::compile(source.lines()).expect("program should compile");
//!
//! assert_eq!(
//!     dsla::emitter::parse_words(&text).unwrap(),
//!     vec![24, 4, 13, 0, 24, 5, 2, 3, 100, 100],
//! );
//! ```
//!
//! # Language
//!
//! ```text
//! .data
//! var count number = 3
//! var i number = 1
//! var greeting string = "hi\n"
//! var table array = 1 2 3
//!     4 5 6 ;
//!
//! .text
//! @loop:
//!     add count, count, table[2]
//!     blt count table[i] @loop
//!     syscall 1 greeting
//! ```
//!
//! # Executables
//!
//! ## `dslac`
//!
//! Compiles a source file into the word format. Built with the `dslac` feature.
//!
//! ```text
//! dslac program.dsla -o program.words
//! ```
pub mod opcode;
pub mod token;
pub mod classifier;
pub mod symbol_table;
pub mod program;
pub mod operand;
pub mod instruction;
pub mod assembler;
pub mod layout;
pub mod emitter;
pub mod source_map;
pub mod error;

use slog::Logger;

use assembler::Assembler;
use emitter::EmitOptions;
use error::CompileError;
use instruction::STANDARD_INSTRUCTIONS;
use layout::Image;

/// Assembles source lines with the standard instruction set.
pub fn assemble<'l, I>(lines: I) -> Result<Image, CompileError>
where
    I: IntoIterator<Item = &'l str>,
{
    assemble_with_logger(lines, None)
}

pub fn assemble_with_logger<'l, I, L>(lines: I, logger: L) -> Result<Image, CompileError>
where
    I: IntoIterator<Item = &'l str>,
    L: Into<Option<Logger>>,
{
    let logger = logger.into();

    let program = Assembler::with_logger(&STANDARD_INSTRUCTIONS, logger.clone()).assemble(lines)?;

    layout::layout_with_logger(program, logger)
}

/// Compiles source lines into the commented word format.
pub fn compile<'l, I>(lines: I) -> Result<String, CompileError>
where
    I: IntoIterator<Item = &'l str>,
{
    compile_with_logger(lines, None)
}

pub fn compile_with_logger<'l, I, L>(lines: I, logger: L) -> Result<String, CompileError>
where
    I: IntoIterator<Item = &'l str>,
    L: Into<Option<Logger>>,
{
    let image = assemble_with_logger(lines, logger)?;

    Ok(emitter::emit(&image, &EmitOptions::default()))
}
