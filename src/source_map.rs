//! Mapping between memory addresses and source lines.

use std::collections::HashMap;
use std::iter::FromIterator;

/// Mapping from memory addresses into the zero based index of the source line which defined
/// the word at that address. Words of the prologue and of the implicit trailing `halt` have
/// no source line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMap {
    inner: HashMap<usize, usize>,
}

impl FromIterator<(usize, usize)> for SourceMap {
    fn from_iter<I>(iter: I) -> Self
        where I: IntoIterator<Item = (usize, usize)>
    {
        SourceMap {
            inner: HashMap::from_iter(iter),
        }
    }
}

impl SourceMap {
    /// Returns the line in the original source code which
    /// defined the value for the given memory location.
    pub fn get_source_line(&self, addr: usize) -> Option<usize> {
        self.inner.get(&addr).copied()
    }

    /// Every address defined by the given source line, in ascending order.
    ///
    /// A debugger sets a breakpoint on a line by picking the first of these.
    pub fn addresses_for_line(&self, line: usize) -> Vec<usize> {
        let mut addresses: Vec<usize> = self
            .inner
            .iter()
            .filter(|(_, source)| **source == line)
            .map(|(addr, _)| *addr)
            .collect();

        addresses.sort_unstable();
        addresses
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_both_ways() {
        let map: SourceMap = vec![(5, 2), (3, 1), (6, 2), (4, 2)].into_iter().collect();

        assert_eq!(map.get_source_line(3), Some(1));
        assert_eq!(map.get_source_line(0), None);
        assert_eq!(map.addresses_for_line(2), vec![4, 5, 6]);
        assert!(map.addresses_for_line(9).is_empty());
    }
}
