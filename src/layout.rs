//! Address assignment and relocation of a scanned [Program].
//!
//! Layout runs in two passes. The first pass places the global variables right after the
//! prologue and every instruction after the data segment, giving each element its address.
//! The second pass resolves the symbol references of every operation and produces the final
//! words of the image.
//!
//! The resulting memory image looks like this:
//!
//! ```text
//! 0  LoadImmediateToBus
//! 1  <code start>
//! 2  JumpWithBusValueRelative
//! 3  <global variables, in declaration order>
//!    <instructions, in source order, ending with halt>
//! ```

use std::collections::BTreeMap;

use itertools::Itertools;
use slog::{debug, o, trace, Discard, Logger};

use crate::error::{CompileError, LineError};
use crate::opcode::OpCode;
use crate::program::{ElementKind, Program};
use crate::source_map::SourceMap;

/// Number of words of the entry prologue that jumps over the data segment.
pub const PROLOGUE_LEN: usize = 3;

/// A single word of the memory image.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub value: i32,

    /// Human readable description of the word. Carries no meaning for the machine.
    pub comment: Option<String>,

    /// The source line that produced the word.
    pub line: Option<usize>,
}

impl Word {
    fn new(value: i32, comment: Option<String>, line: Option<usize>) -> Word {
        Word {
            value,
            comment,
            line,
        }
    }
}

/// A fully resolved memory image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    words: Vec<Word>,
    globals: BTreeMap<String, i32>,
    labels: BTreeMap<String, i32>,
    code_start: i32,
}

impl Image {
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// The raw words of the image, starting from address zero.
    pub fn to_words(&self) -> Vec<i32> {
        self.words.iter().map(|word| word.value).collect()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn global_address(&self, name: &str) -> Option<i32> {
        self.globals.get(name).copied()
    }

    pub fn label_address(&self, name: &str) -> Option<i32> {
        self.labels.get(name).copied()
    }

    /// Addresses of every global variable, ordered by name.
    pub fn globals(&self) -> &BTreeMap<String, i32> {
        &self.globals
    }

    /// Addresses of every label, ordered by name.
    pub fn labels(&self) -> &BTreeMap<String, i32> {
        &self.labels
    }

    /// Address of the first instruction.
    pub fn code_start(&self) -> i32 {
        self.code_start
    }

    /// Number of words occupied by global variables.
    pub fn data_len(&self) -> usize {
        self.code_start as usize - PROLOGUE_LEN
    }

    pub fn source_map(&self) -> SourceMap {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(addr, word)| word.line.map(|line| (addr, line)))
            .collect()
    }
}

pub fn layout(program: Program) -> Result<Image, CompileError> {
    layout_with_logger(program, None)
}

/// Assigns addresses to every element of `program` and resolves it into an [Image].
///
/// Every reference to an undeclared label or variable is reported as an
/// [UndefinedSymbol](crate::error::ErrorKind::UndefinedSymbol) error on the line of the
/// instruction that made it.
pub fn layout_with_logger<L>(mut program: Program, logger: L) -> Result<Image, CompileError>
where
    L: Into<Option<Logger>>,
{
    let logger = logger
        .into()
        .unwrap_or(Logger::root(Discard, o!()))
        .new(o!("stage" => "layout"));

    let code_start = allocate_globals(&mut program, &logger);
    place_code(&mut program, code_start, &logger);

    let mut words = Vec::new();
    let mut globals = BTreeMap::new();
    let mut labels = BTreeMap::new();
    let mut errors = Vec::new();

    words.push(Word::new(
        OpCode::LoadImmediateToBus.as_word(),
        Some(format!("prologue -- {}", OpCode::LoadImmediateToBus)),
        None,
    ));
    words.push(Word::new(code_start, None, None));
    words.push(Word::new(
        OpCode::JumpWithBusValueRelative.as_word(),
        Some(OpCode::JumpWithBusValueRelative.to_string()),
        None,
    ));

    for element in program.elements() {
        if let ElementKind::GlobalVariable(variable) = &element.kind {
            if let Some(address) = element.address() {
                globals.insert(variable.name.clone(), address);
            }

            let values = variable.words();
            let last = values.len() - 1;

            for (offset, value) in values.into_iter().enumerate() {
                let comment = match offset {
                    0 => Some(format!("{} {}", variable.ty, variable.name)),
                    _ if offset == last && variable.ty.is_array() => {
                        Some(format!("null terminate {}", variable.name))
                    }
                    _ => None,
                };

                words.push(Word::new(value, comment, element.line));
            }
        }
    }

    let mut pending_labels = Vec::new();

    for element in program.elements() {
        let instruction = match &element.kind {
            ElementKind::Label(name) => {
                if let Some(address) = element.address() {
                    labels.insert(name.clone(), address);
                }

                pending_labels.push(format!("@{}", name));
                continue;
            }
            ElementKind::Instruction(instruction) => instruction,
            ElementKind::GlobalVariable(_) => continue,
        };

        let mut header = Some(match pending_labels.is_empty() {
            true => format!("{} -- ", instruction.text),
            false => format!("{} -- {} -- ", pending_labels.drain(..).join(" "), instruction.text),
        });

        let mut line_errors = Vec::new();

        for operation in &instruction.operations {
            let encoded = match operation.resolve(&program) {
                Ok(encoded) => encoded,
                Err(kind) => {
                    if !line_errors.contains(&kind) {
                        line_errors.push(kind);
                    }

                    // Keep the addresses of the following words intact.
                    vec![0; operation.size()]
                }
            };

            for (index, value) in encoded.into_iter().enumerate() {
                let comment = match index {
                    0 => Some(format!(
                        "{}{}",
                        header.take().unwrap_or_default(),
                        operation.opcode
                    )),
                    _ => None,
                };

                words.push(Word::new(value, comment, element.line));
            }
        }

        for kind in line_errors {
            let line = element.line.unwrap_or_default();
            debug!(logger, "unresolved reference"; "line" => line, "error" => %kind);
            errors.push(LineError { line, kind });
        }
    }

    if !errors.is_empty() {
        return Err(CompileError::aggregate(errors));
    }

    trace!(logger, "layout complete"; "words" => words.len(), "code_start" => code_start);

    Ok(Image {
        words,
        globals,
        labels,
        code_start,
    })
}

/// Places the global variables right after the prologue. Returns the first address after the
/// data segment.
fn allocate_globals(program: &mut Program, logger: &Logger) -> i32 {
    let mut address = PROLOGUE_LEN as i32;

    for element in program.elements_mut() {
        let size = match &element.kind {
            ElementKind::GlobalVariable(variable) => {
                trace!(logger, "allocate variable"; "name" => &variable.name, "address" => address, "size" => variable.size());
                variable.size()
            }
            _ => continue,
        };

        element.set_address(address);
        address += size as i32;
    }

    address
}

/// Gives every instruction its address. A label gets the address of the instruction that
/// follows it.
fn place_code(program: &mut Program, code_start: i32, logger: &Logger) {
    let elements = program.elements_mut();
    let mut pending = Vec::new();
    let mut address = code_start;

    for index in 0..elements.len() {
        let size = match &elements[index].kind {
            ElementKind::Label(_) => {
                pending.push(index);
                continue;
            }
            ElementKind::Instruction(instruction) => instruction.size(),
            ElementKind::GlobalVariable(_) => continue,
        };

        for label in pending.drain(..) {
            if let ElementKind::Label(name) = &elements[label].kind {
                trace!(logger, "place label"; "label" => name, "address" => address);
            }

            elements[label].set_address(address);
        }

        trace!(logger, "place instruction"; "line" => ?elements[index].line, "address" => address, "size" => size);

        elements[index].set_address(address);
        address += size as i32;
    }

    // The implicit halt always follows the last label.
    for label in pending {
        elements[label].set_address(address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Assembler;
    use crate::error::ErrorKind;
    use crate::instruction::STANDARD_INSTRUCTIONS;

    fn image(source: &str) -> Result<Image, CompileError> {
        let program = Assembler::new(&STANDARD_INSTRUCTIONS).assemble(source.lines())?;
        layout(program)
    }

    #[test]
    fn test_prologue_jumps_over_data() {
        let image = image(".data\nvar s string = \"ab\"\nvar n number = 7\n.text\nhalt").unwrap();

        assert_eq!(image.global_address("s"), Some(3));
        assert_eq!(image.global_address("n"), Some(6));
        assert_eq!(image.code_start(), 7);
        assert_eq!(image.data_len(), 4);
        assert_eq!(image.to_words(), vec![24, 7, 13, 97, 98, 0, 7, 100, 100]);
    }

    #[test]
    fn test_labels_take_next_instruction_address() {
        let image = image(".text\n@start\nnoop\n@a\n@b:\nhalt\n@end").unwrap();

        assert_eq!(image.label_address("start"), Some(3));
        assert_eq!(image.label_address("a"), Some(4));
        assert_eq!(image.label_address("b"), Some(4));
        // Only the implicit halt follows @end.
        assert_eq!(image.label_address("end"), Some(5));
        assert_eq!(image.len(), 6);
        assert!(!image.is_empty());
    }

    #[test]
    fn test_undefined_symbols_are_all_reported() {
        let err = image(".text\nadd x y y\ngoto @nowhere\nhalt").unwrap_err();

        let errors: Vec<_> = err.errors().iter().map(|err| (err.line, err.kind.clone())).collect();
        assert_eq!(
            errors,
            vec![
                (1, ErrorKind::UndefinedSymbol { kind: "variable", name: "y".into() }),
                (1, ErrorKind::UndefinedSymbol { kind: "variable", name: "x".into() }),
                (2, ErrorKind::UndefinedSymbol { kind: "label", name: "nowhere".into() }),
            ],
        );
    }

    #[test]
    fn test_comments() {
        let image = image(".data\nvar a array = 1;\n.text\n@top\nloadi a[0] 2").unwrap();

        let comments: Vec<_> = image.words().iter().map(|word| word.comment.as_deref()).collect();
        assert_eq!(
            comments,
            vec![
                Some("prologue -- LoadImmediateToBus"),
                None,
                Some("JumpWithBusValueRelative"),
                Some("array a"),
                Some("null terminate a"),
                Some("@top -- loadi a[0] 2 -- LoadImmediateToBus"),
                None,
                Some("SaveFromBusWithConstantOffset"),
                None,
                None,
                Some("halt -- Halt"),
            ],
        );
    }

    #[test]
    fn test_source_map() {
        let image = image(".data\nvar x number = 0\n.text\nloadi x 5").unwrap();
        let map = image.source_map();

        assert_eq!(map.get_source_line(3), Some(1));
        assert_eq!(map.addresses_for_line(3), vec![4, 5, 6, 7]);
        assert_eq!(map.get_source_line(0), None);
        // The implicit halt has no line.
        assert_eq!(map.get_source_line(8), None);
    }
}
