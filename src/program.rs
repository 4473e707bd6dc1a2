//! The intermediate representation produced by scanning the source and consumed by layout.

use std::fmt;

use crate::error::ErrorKind;
use crate::opcode::OpCode;
use crate::symbol_table::{ElementId, SymbolEntry, SymbolKind, SymbolRef, SymbolTable};

/// A parameter word of an operation whose value may not be known yet.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// A value known while scanning.
    Immediate(i32),

    /// The final address of a label or a variable, known only after layout.
    Address(SymbolRef),
}

/// Source of final symbol addresses.
pub trait Resolve {
    /// Returns the address of `symbol` or an [UndefinedSymbol](ErrorKind::UndefinedSymbol)
    /// error.
    fn address_of(&self, symbol: &SymbolRef) -> Result<i32, ErrorKind>;
}

/// A primitive operation bound to its (possibly unresolved) parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundOperation {
    pub opcode: OpCode,
    pub params: Vec<Param>,
}

impl BoundOperation {
    pub fn new(opcode: OpCode, params: Vec<Param>) -> BoundOperation {
        debug_assert_eq!(params.len(), opcode.arity(), "wrong parameter count for {}", opcode);
        BoundOperation { opcode, params }
    }

    /// An operation without parameters.
    pub fn bare(opcode: OpCode) -> BoundOperation {
        BoundOperation::new(opcode, Vec::new())
    }

    /// An operation with a single parameter.
    pub fn with(opcode: OpCode, param: Param) -> BoundOperation {
        BoundOperation::new(opcode, vec![param])
    }

    pub fn size(&self) -> usize {
        self.opcode.size()
    }

    /// Produces the final encoding of the operation. Only meaningful once every referenced
    /// symbol has an address.
    pub fn resolve<R: Resolve + ?Sized>(&self, symbols: &R) -> Result<Vec<i32>, ErrorKind> {
        let params = self
            .params
            .iter()
            .map(|param| match param {
                Param::Immediate(value) => Ok(*value),
                Param::Address(symbol) => symbols.address_of(symbol),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.opcode.encode(&params))
    }
}

/// Declared type of a global variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// A single word.
    Number,

    /// A null terminated sequence of character codes.
    String,

    /// A null terminated sequence of words, possibly declared over several lines.
    Array,
}

impl VariableType {
    pub fn from_name(name: &str) -> Option<VariableType> {
        match name {
            "number" => Some(VariableType::Number),
            "string" => Some(VariableType::String),
            "array" => Some(VariableType::Array),
            _ => None,
        }
    }

    pub fn is_array(self) -> bool {
        self != VariableType::Number
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VariableType::Number => write!(f, "number"),
            VariableType::String => write!(f, "string"),
            VariableType::Array => write!(f, "array"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalVariable {
    pub name: String,
    pub ty: VariableType,
    pub values: Vec<i32>,

    /// Set while an array declaration still expects continuation lines.
    pub(crate) open: bool,
}

impl GlobalVariable {
    /// Words occupied in the data segment, including the null terminator of arrays.
    pub fn size(&self) -> usize {
        match self.ty.is_array() {
            true => self.values.len() + 1,
            false => 1,
        }
    }

    /// The words of the variable in memory order.
    pub fn words(&self) -> Vec<i32> {
        let mut words = self.values.clone();

        if self.ty.is_array() {
            words.push(0);
        }

        words
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub mnemonic: String,

    /// The instruction as written, normalized to single spaces.
    pub text: String,

    pub operations: Vec<BoundOperation>,
}

impl Instruction {
    pub fn size(&self) -> usize {
        self.operations.iter().map(BoundOperation::size).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Label(String),
    Instruction(Instruction),
    GlobalVariable(GlobalVariable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,

    /// The source line the element was declared on. `None` for the implicit `halt`.
    pub line: Option<usize>,

    address: Option<i32>,
}

impl Element {
    pub fn new(kind: ElementKind, line: Option<usize>) -> Element {
        Element {
            kind,
            line,
            address: None,
        }
    }

    /// The address assigned during layout.
    pub fn address(&self) -> Option<i32> {
        self.address
    }

    pub(crate) fn set_address(&mut self, address: i32) {
        debug_assert!(self.address.is_none(), "element placed twice");
        self.address = Some(address);
    }
}

/// A scanned program: elements in source order and the symbols declared by them.
#[derive(Debug, Default, Clone)]
pub struct Program {
    elements: Vec<Element>,
    symbols: SymbolTable,
}

impl Program {
    pub fn new() -> Program {
        Program::default()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub(crate) fn elements_mut(&mut self) -> &mut [Element] {
        &mut self.elements
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    fn push(&mut self, kind: ElementKind, line: Option<usize>) -> ElementId {
        self.elements.push(Element::new(kind, line));
        ElementId(self.elements.len() - 1)
    }

    fn next_id(&self) -> ElementId {
        ElementId(self.elements.len())
    }

    pub(crate) fn declare_label(&mut self, line: usize, name: &str) -> Result<ElementId, ErrorKind> {
        let element = self.next_id();

        self.symbols
            .define(SymbolKind::Label, name, SymbolEntry { element, line })?;

        Ok(self.push(ElementKind::Label(name.to_string()), Some(line)))
    }

    pub(crate) fn declare_global(
        &mut self,
        line: usize,
        variable: GlobalVariable,
    ) -> Result<ElementId, ErrorKind> {
        let element = self.next_id();

        self.symbols
            .define(SymbolKind::Global, &variable.name, SymbolEntry { element, line })?;

        Ok(self.push(ElementKind::GlobalVariable(variable), Some(line)))
    }

    pub(crate) fn push_instruction(&mut self, line: Option<usize>, instruction: Instruction) -> ElementId {
        self.push(ElementKind::Instruction(instruction), line)
    }

    pub(crate) fn global_mut(&mut self, id: ElementId) -> Option<&mut GlobalVariable> {
        match self.elements.get_mut(id.0).map(|element| &mut element.kind) {
            Some(ElementKind::GlobalVariable(variable)) => Some(variable),
            _ => None,
        }
    }
}

impl Resolve for Program {
    fn address_of(&self, symbol: &SymbolRef) -> Result<i32, ErrorKind> {
        self.symbols
            .get(symbol)
            .and_then(|entry| self.elements[entry.element.0].address())
            .ok_or_else(|| ErrorKind::UndefinedSymbol {
                kind: symbol.kind.describe(),
                name: symbol.name.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_after_placement() {
        let mut program = Program::new();

        let id = program.declare_label(0, "start").unwrap();
        let op = BoundOperation::with(OpCode::BranchTo, Param::Address(SymbolRef::label("start")));

        assert_eq!(
            op.resolve(&program),
            Err(ErrorKind::UndefinedSymbol { kind: "label", name: "start".into() }),
        );

        program.elements_mut()[id.index()].set_address(42);

        assert_eq!(op.resolve(&program), Ok(vec![14, 42]));
    }

    #[test]
    fn test_array_size_counts_terminator() {
        let array = GlobalVariable {
            name: "a".into(),
            ty: VariableType::Array,
            values: vec![1, 2, 3],
            open: false,
        };

        assert_eq!(array.size(), 4);
        assert_eq!(array.words(), vec![1, 2, 3, 0]);

        let number = GlobalVariable {
            name: "n".into(),
            ty: VariableType::Number,
            values: vec![9],
            open: false,
        };

        assert_eq!(number.size(), 1);
        assert_eq!(number.words(), vec![9]);
    }
}
