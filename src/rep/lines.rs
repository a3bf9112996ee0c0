//! Line-oriented backend: every source line is one atom
//!
//! Suits assembly-style programs, where a line is an instruction, label or
//! directive. A tombstoned atom is an empty line, so rendering and
//! re-parsing always yields the same atom sequence.

use super::{AtomId, Backend, DeletePolicy, RepError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineProgram {
    lines: Vec<String>,
}

impl LineProgram {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn atom(&self, id: AtomId) -> Option<&str> {
        self.lines.get(id.index()).map(String::as_str)
    }
}

impl Backend for LineProgram {
    const KIND: &'static str = "lines";

    fn parse(text: &str) -> Result<Self, RepError> {
        Ok(Self::new(text.lines().map(str::to_owned).collect()))
    }

    fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if !self.lines.is_empty() {
            out.push('\n');
        }
        out
    }

    fn atom_count(&self) -> usize {
        self.lines.len()
    }

    fn remove(&mut self, index: usize, policy: DeletePolicy) {
        match policy {
            DeletePolicy::Tombstone => self.lines[index].clear(),
            DeletePolicy::Compact => {
                self.lines.remove(index);
            }
        }
    }

    fn insert_copy_after(&mut self, dst: usize, src: usize) {
        let copy = self.lines[src].clone();
        self.lines.insert(dst + 1, copy);
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.lines.swap(a, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> AtomId {
        AtomId::new(n).unwrap()
    }

    #[test]
    fn test_render_round_trip() {
        for text in ["", "\n", "mov a, b\n", "a\n\nb\n", "a\nb", "a\n\n"] {
            let program = LineProgram::parse(text).unwrap();
            let reparsed = LineProgram::parse(&program.render()).unwrap();
            assert_eq!(reparsed, program, "round trip of {:?}", text);
        }
    }

    #[test]
    fn test_tombstone_round_trip() {
        let mut program = LineProgram::parse("a\nb\nc\n").unwrap();
        program.remove(1, DeletePolicy::Tombstone);
        assert_eq!(program.atom_count(), 3);
        assert_eq!(program.render(), "a\n\nc\n");
        assert_eq!(LineProgram::parse(&program.render()).unwrap(), program);
    }

    #[test]
    fn test_edits() {
        let mut program = LineProgram::parse("a\nb\nc\n").unwrap();
        program.insert_copy_after(0, 2);
        assert_eq!(program.lines(), &["a", "c", "b", "c"]);
        program.swap(0, 3);
        assert_eq!(program.atom(id(1)), Some("c"));
        assert_eq!(program.atom(id(4)), Some("a"));
        program.remove(0, DeletePolicy::Compact);
        assert_eq!(program.lines(), &["c", "b", "a"]);
        assert_eq!(program.atom(id(4)), None);
    }
}
