//! Name lookup for labels and global variables.
//!
//! The table does not store addresses itself. Each entry points at the [Element] that declared
//! the symbol, and the address is read from that element once layout has assigned it. This
//! lets instructions refer to symbols that are declared further down in the source.
//!
//! [Element]: crate::program::Element

use std::collections::hash_map::{Entry, HashMap};

use crate::error::ErrorKind;

/// The namespace a symbol lives in. Labels and variables may share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Global,
    Label,
}

impl SymbolKind {
    pub fn describe(self) -> &'static str {
        match self {
            SymbolKind::Global => "variable",
            SymbolKind::Label => "label",
        }
    }
}

/// An unresolved reference to a symbol, resolved by looking it up in a [SymbolTable].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolRef {
    pub kind: SymbolKind,
    pub name: String,
}

impl SymbolRef {
    pub fn global<S: Into<String>>(name: S) -> SymbolRef {
        SymbolRef {
            kind: SymbolKind::Global,
            name: name.into(),
        }
    }

    pub fn label<S: Into<String>>(name: S) -> SymbolRef {
        SymbolRef {
            kind: SymbolKind::Label,
            name: name.into(),
        }
    }
}

/// Index of an element in the element arena of a [Program](crate::program::Program).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    /// The element that declared the symbol.
    pub element: ElementId,

    /// The source line of the declaration.
    pub line: usize,
}

#[derive(Default, Debug, Clone)]
pub struct SymbolTable {
    globals: HashMap<String, SymbolEntry>,
    labels: HashMap<String, SymbolEntry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    fn namespace(&self, kind: SymbolKind) -> &HashMap<String, SymbolEntry> {
        match kind {
            SymbolKind::Global => &self.globals,
            SymbolKind::Label => &self.labels,
        }
    }

    /// Declares a new symbol. Symbols can't be redeclared.
    pub(crate) fn define(
        &mut self,
        kind: SymbolKind,
        name: &str,
        entry: SymbolEntry,
    ) -> Result<(), ErrorKind> {
        let namespace = match kind {
            SymbolKind::Global => &mut self.globals,
            SymbolKind::Label => &mut self.labels,
        };

        match namespace.entry(name.to_string()) {
            Entry::Occupied(_) => Err(match kind {
                SymbolKind::Global => ErrorKind::DuplicateVariable(name.to_string()),
                SymbolKind::Label => ErrorKind::DuplicateLabel(name.to_string()),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                Ok(())
            }
        }
    }

    pub fn get(&self, symbol: &SymbolRef) -> Option<&SymbolEntry> {
        self.namespace(symbol.kind).get(&symbol.name)
    }

    pub fn get_global<S: AsRef<str>>(&self, name: S) -> Option<&SymbolEntry> {
        self.globals.get(name.as_ref())
    }

    pub fn get_label<S: AsRef<str>>(&self, name: S) -> Option<&SymbolEntry> {
        self.labels.get(name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.globals.len() + self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: usize) -> SymbolEntry {
        SymbolEntry {
            element: ElementId(index),
            line: index,
        }
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let mut table = SymbolTable::new();

        table.define(SymbolKind::Label, "loop", entry(0)).unwrap();
        table.define(SymbolKind::Global, "x", entry(1)).unwrap();

        assert_eq!(
            table.define(SymbolKind::Label, "loop", entry(2)),
            Err(ErrorKind::DuplicateLabel("loop".into())),
        );
        assert_eq!(
            table.define(SymbolKind::Global, "x", entry(3)),
            Err(ErrorKind::DuplicateVariable("x".into())),
        );

        // The first declaration survives.
        assert_eq!(table.get_label("loop"), Some(&entry(0)));
        assert_eq!(table.get_global("x"), Some(&entry(1)));
    }

    #[test]
    fn test_namespaces_are_separate() {
        let mut table = SymbolTable::new();

        table.define(SymbolKind::Label, "x", entry(0)).unwrap();
        table.define(SymbolKind::Global, "x", entry(1)).unwrap();

        assert_eq!(table.get(&SymbolRef::label("x")), Some(&entry(0)));
        assert_eq!(table.get(&SymbolRef::global("x")), Some(&entry(1)));
        assert_eq!(table.len(), 2);
    }
}
