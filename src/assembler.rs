//! Scanning of source lines into a [Program].
//!
//! Every line is classified and expanded on its own. A line that fails is recorded and the
//! scan continues with the next one, so that a single compilation reports every broken line
//! at once. Only [fatal](ErrorKind::is_fatal) errors stop the scan.

use itertools::Itertools;
use slog::{debug, o, trace, Discard, Logger};

use crate::classifier::{classify, Line, Section};
use crate::error::{CompileError, ErrorKind, LineError};
use crate::instruction::InstructionSet;
use crate::opcode::OpCode;
use crate::program::{BoundOperation, ElementKind, GlobalVariable, Instruction, Program};
use crate::symbol_table::ElementId;

/// Builds a [Program] from source lines fed one at a time.
pub struct Assembler<'i> {
    instructions: &'i InstructionSet,
    program: Program,
    section: Option<Section>,

    /// The array declaration still waiting for its terminating `;`.
    open: Option<ElementId>,

    errors: Vec<LineError>,
    line: usize,
    logger: Logger,
}

impl<'i> Assembler<'i> {
    pub fn new(instructions: &'i InstructionSet) -> Assembler<'i> {
        Assembler::with_logger(instructions, None)
    }

    pub fn with_logger<L>(instructions: &'i InstructionSet, logger: L) -> Assembler<'i>
    where
        L: Into<Option<Logger>>,
    {
        let logger = logger
            .into()
            .unwrap_or(Logger::root(Discard, o!()))
            .new(o!("stage" => "classification"));

        Assembler {
            instructions,
            program: Program::new(),
            section: None,
            open: None,
            errors: Vec::new(),
            line: 0,
            logger,
        }
    }

    /// Index of the next line to be fed.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The program scanned so far.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Line errors recorded so far.
    pub fn errors(&self) -> &[LineError] {
        &self.errors
    }

    /// Scans the next source line.
    ///
    /// Returns an error only if the line is fatally broken. The scan must not be continued
    /// after that.
    pub fn feed_line(&mut self, source: &str) -> Result<(), CompileError> {
        let line = self.line;
        self.line += 1;

        let section = self.section;
        let result = classify(source, section).and_then(|class| self.accept(line, class));

        match result {
            Ok(()) => Ok(()),
            Err(kind) if kind.is_fatal() => {
                debug!(self.logger, "fatal error"; "line" => line, "error" => %kind);
                Err(CompileError::Fatal(LineError { line, kind }))
            }
            Err(kind) => {
                debug!(self.logger, "line error"; "line" => line, "error" => %kind);
                self.errors.push(LineError { line, kind });
                Ok(())
            }
        }
    }

    fn open_declaration(&self) -> Result<(), ErrorKind> {
        let id = match self.open {
            Some(id) => id,
            None => return Ok(()),
        };

        let name = match &self.program.element(id).kind {
            ElementKind::GlobalVariable(variable) => variable.name.clone(),
            _ => String::new(),
        };

        Err(ErrorKind::IncompleteDeclaration { name })
    }

    fn accept(&mut self, line: usize, class: Line) -> Result<(), ErrorKind> {
        match class {
            Line::Blank | Line::Comment => Ok(()),

            Line::Section(section) => {
                self.open_declaration()?;
                trace!(self.logger, "enter section"; "line" => line, "section" => ?section);
                self.section = Some(section);
                Ok(())
            }

            Line::Label(name) => {
                self.program.declare_label(line, name)?;
                trace!(self.logger, "declare label"; "line" => line, "label" => name);
                Ok(())
            }

            Line::GlobalStart {
                name,
                ty,
                values,
                terminated,
            } => {
                self.open_declaration()?;

                let id = self.program.declare_global(
                    line,
                    GlobalVariable {
                        name: name.to_string(),
                        ty,
                        values,
                        open: !terminated,
                    },
                )?;

                trace!(self.logger, "declare variable"; "line" => line, "name" => name, "type" => %ty);

                if !terminated {
                    self.open = Some(id);
                }

                Ok(())
            }

            Line::GlobalContinue { values, terminated } => {
                let outside = || {
                    ErrorKind::InvalidDeclaration("values outside of an array declaration".to_string())
                };

                let id = self.open.ok_or_else(outside)?;
                let variable = self.program.global_mut(id).ok_or_else(outside)?;

                variable.values.extend(values);
                variable.open = !terminated;

                trace!(self.logger, "continue declaration"; "line" => line, "name" => &variable.name);

                if terminated {
                    self.open = None;
                }

                Ok(())
            }

            Line::Statement { mnemonic, args } => {
                let operations = self.instructions.expand(mnemonic, &args)?;

                let text = std::iter::once(mnemonic)
                    .chain(args.iter().map(|arg| arg.text))
                    .join(" ");

                trace!(self.logger, "expand instruction"; "line" => line, "instruction" => &text, "operations" => operations.len());

                self.program.push_instruction(
                    Some(line),
                    Instruction {
                        mnemonic: mnemonic.to_string(),
                        text,
                        operations,
                    },
                );

                Ok(())
            }
        }
    }

    /// Ends the scan and returns the program with the implicit trailing `halt` appended.
    pub fn finish(mut self) -> Result<Program, CompileError> {
        if let Err(kind) = self.open_declaration() {
            let line = self
                .open
                .and_then(|id| self.program.element(id).line)
                .unwrap_or(self.line);

            debug!(self.logger, "fatal error"; "line" => line, "error" => %kind);
            return Err(CompileError::Fatal(LineError { line, kind }));
        }

        self.program.push_instruction(
            None,
            Instruction {
                mnemonic: "halt".to_string(),
                text: "halt".to_string(),
                operations: vec![BoundOperation::bare(OpCode::Halt)],
            },
        );

        if !self.errors.is_empty() {
            return Err(CompileError::aggregate(self.errors));
        }

        trace!(self.logger, "scan complete"; "elements" => self.program.elements().len());

        Ok(self.program)
    }

    /// Feeds every line and finishes the scan.
    pub fn assemble<'l, I>(mut self, lines: I) -> Result<Program, CompileError>
    where
        I: IntoIterator<Item = &'l str>,
    {
        for line in lines {
            self.feed_line(line)?;
        }

        self.finish()
    }
}
