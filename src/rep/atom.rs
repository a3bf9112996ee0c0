//! Atom addressing — the 1..N id space over mutable program units
//!
//! An atom is the smallest unit a mutation operator can touch. Ids are
//! 1-based and inclusive of `max_atom()`. Edits applied to a variant are
//! recorded as `Edit` values so a variant can be named and replayed.

use super::RepError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of one atom, always >= 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtomId(usize);

impl AtomId {
    /// Create an id, rejecting zero
    pub fn new(id: usize) -> Option<Self> {
        if id == 0 { None } else { Some(Self(id)) }
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// Zero-based position of this atom in a backing sequence
    pub fn index(self) -> usize {
        self.0 - 1
    }

    /// The id one above this one
    pub fn next(self) -> AtomId {
        AtomId(self.0 + 1)
    }

    /// The id one below this one, if there is one
    pub fn prev(self) -> Option<AtomId> {
        AtomId::new(self.0 - 1)
    }

    /// Validate against the current bound, returning the zero-based index
    pub fn checked_index(self, max_atom: usize) -> Result<usize, RepError> {
        if self.0 > max_atom {
            return Err(RepError::InvalidAtom { id: self.0, max: max_atom });
        }
        Ok(self.index())
    }

    /// Iterate every id in 1..=max_atom
    pub fn all(max_atom: usize) -> impl Iterator<Item = AtomId> {
        (1..=max_atom).map(AtomId)
    }
}

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AtomId {
    type Err = RepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<usize>()
            .ok()
            .and_then(AtomId::new)
            .ok_or_else(|| RepError::MalformedEdit(format!("not an atom id: '{}'", s)))
    }
}

/// What `delete` does to the id space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Content is emptied in place; ids and `max_atom()` are unchanged
    #[default]
    Tombstone,
    /// Atom is removed; later ids shift down and `max_atom()` shrinks by one
    Compact,
}

/// One applied mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edit {
    Delete(AtomId),
    Append { dst: AtomId, src: AtomId },
    Swap(AtomId, AtomId),
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::Delete(id) => write!(f, "d({})", id),
            Edit::Append { dst, src } => write!(f, "a({},{})", dst, src),
            Edit::Swap(a, b) => write!(f, "s({},{})", a, b),
        }
    }
}

impl FromStr for Edit {
    type Err = RepError;

    /// Parses the `Display` form: `d(5)`, `a(3,7)`, `s(2,4)`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RepError::MalformedEdit(s.to_string());
        let s = s.trim();
        let (op, rest) = s.split_at(s.find('(').ok_or_else(malformed)?);
        let args = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(malformed)?;
        let ids = args
            .split(',')
            .map(AtomId::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        match (op, ids.as_slice()) {
            ("d", [id]) => Ok(Edit::Delete(*id)),
            ("a", [dst, src]) => Ok(Edit::Append { dst: *dst, src: *src }),
            ("s", [a, b]) => Ok(Edit::Swap(*a, *b)),
            _ => Err(malformed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> AtomId {
        AtomId::new(n).unwrap()
    }

    #[test]
    fn test_zero_is_not_an_atom() {
        assert!(AtomId::new(0).is_none());
        assert_eq!(id(1).index(), 0);
    }

    #[test]
    fn test_checked_index_bounds() {
        assert_eq!(id(10).checked_index(10).unwrap(), 9);
        match id(11).checked_index(10) {
            Err(RepError::InvalidAtom { id, max }) => {
                assert_eq!(id, 11);
                assert_eq!(max, 10);
            }
            other => panic!("expected InvalidAtom, got {:?}", other),
        }
        assert!(id(1).checked_index(0).is_err());
    }

    #[test]
    fn test_edit_display_and_parse() {
        let edits = vec![
            Edit::Delete(id(5)),
            Edit::Append { dst: id(3), src: id(7) },
            Edit::Swap(id(2), id(4)),
        ];
        let names: Vec<String> = edits.iter().map(|e| e.to_string()).collect();
        assert_eq!(names, vec!["d(5)", "a(3,7)", "s(2,4)"]);
        for (edit, name) in edits.iter().zip(&names) {
            assert_eq!(&name.parse::<Edit>().unwrap(), edit);
        }
    }

    #[test]
    fn test_malformed_edits_rejected() {
        for bad in ["d5", "d(0)", "x(1)", "a(1)", "s(1,2,3)", "d(one)", "a(1,2"] {
            assert!(bad.parse::<Edit>().is_err(), "{} should not parse", bad);
        }
    }
}
