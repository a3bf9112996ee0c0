//! The representation contract every backend satisfies
//!
//! A representation owns one variant's program state and its fault
//! localization. Mutation is destructive and in place; `copy()` is the
//! only way to branch, so a driver that explores alternatives from one
//! parent without copying first is misusing the contract.

use super::{AtomId, Edit, LocalizationEntry};
use crate::eval::{EvalContext, TestCase, TestOutcome};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum RepError {
    #[error("operation not implemented by this representation: {0}")]
    Unimplemented(&'static str),

    #[error("atom {id} out of range 1..={max}")]
    InvalidAtom { id: usize, max: usize },

    #[error("sanity check failed: {0}")]
    SanityCheck(String),

    #[error("invalid snapshot: {0}")]
    Snapshot(String),

    #[error("malformed edit: {0}")]
    MalformedEdit(String),

    #[error("fault localization: {0}")]
    Localization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

impl RepError {
    /// Errors that must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RepError::Unimplemented(_) | RepError::InvalidAtom { .. } | RepError::SanityCheck(_)
        )
    }
}

pub trait Representation: Sized {
    /// Independent deep copy of all variant state
    fn copy(&self) -> Self;

    /// Stable human-readable identifier
    fn name(&self) -> String;

    fn from_source(ctx: EvalContext, text: &str) -> Result<Self, RepError>;

    fn output_source(&self) -> String;

    /// Write the full state, localization included
    fn save_binary(&self, _path: &Path) -> Result<(), RepError> {
        Err(RepError::Unimplemented("save_binary"))
    }

    fn load_binary(_ctx: EvalContext, _path: &Path) -> Result<Self, RepError> {
        Err(RepError::Unimplemented("load_binary"))
    }

    /// The unmodified program must compile, pass every positive test and
    /// fail every negative test
    fn sanity_check(&mut self) -> Result<(), RepError>;

    fn compute_fault_localization(&mut self) -> Result<(), RepError>;

    /// `Ok(false)` on compiler failure, which is an ordinary outcome
    fn compile(&mut self, keep_source: bool, source_path: &Path, exe_path: &Path) -> Result<bool, RepError>;

    fn test_case(&mut self, test: TestCase) -> Result<TestOutcome, RepError>;

    fn max_atom(&self) -> usize;

    /// Entries worth mutating
    fn get_localization(&self) -> Vec<LocalizationEntry>;

    /// One entry per atom
    fn get_full_localization(&self) -> Vec<LocalizationEntry>;

    fn delete(&mut self, id: AtomId) -> Result<(), RepError>;

    /// Insert a copy of `src` immediately after `dst`
    fn append(&mut self, dst: AtomId, src: AtomId) -> Result<(), RepError>;

    fn swap(&mut self, a: AtomId, b: AtomId) -> Result<(), RepError>;

    fn apply(&mut self, edit: &Edit) -> Result<(), RepError> {
        match *edit {
            Edit::Delete(id) => self.delete(id),
            Edit::Append { dst, src } => self.append(dst, src),
            Edit::Swap(a, b) => self.swap(a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepairConfig;
    use crate::eval::{CommandCompiler, CommandHarness, TestCache};
    use std::rc::Rc;

    /// Keeps nothing but an atom count; serialization is left to the defaults
    struct Counter {
        atoms: usize,
    }

    impl Representation for Counter {
        fn copy(&self) -> Self {
            Counter { atoms: self.atoms }
        }
        fn name(&self) -> String {
            format!("counter-{}", self.atoms)
        }
        fn from_source(_ctx: EvalContext, text: &str) -> Result<Self, RepError> {
            Ok(Counter { atoms: text.lines().count() })
        }
        fn output_source(&self) -> String {
            "x\n".repeat(self.atoms)
        }
        fn sanity_check(&mut self) -> Result<(), RepError> {
            Ok(())
        }
        fn compute_fault_localization(&mut self) -> Result<(), RepError> {
            Ok(())
        }
        fn compile(&mut self, _keep: bool, _source: &Path, _exe: &Path) -> Result<bool, RepError> {
            Ok(true)
        }
        fn test_case(&mut self, _test: TestCase) -> Result<TestOutcome, RepError> {
            Ok(TestOutcome::Pass)
        }
        fn max_atom(&self) -> usize {
            self.atoms
        }
        fn get_localization(&self) -> Vec<LocalizationEntry> {
            Vec::new()
        }
        fn get_full_localization(&self) -> Vec<LocalizationEntry> {
            Vec::new()
        }
        fn delete(&mut self, id: AtomId) -> Result<(), RepError> {
            id.checked_index(self.atoms)?;
            self.atoms -= 1;
            Ok(())
        }
        fn append(&mut self, dst: AtomId, src: AtomId) -> Result<(), RepError> {
            dst.checked_index(self.atoms)?;
            src.checked_index(self.atoms)?;
            self.atoms += 1;
            Ok(())
        }
        fn swap(&mut self, a: AtomId, b: AtomId) -> Result<(), RepError> {
            a.checked_index(self.atoms)?;
            b.checked_index(self.atoms)?;
            Ok(())
        }
    }

    fn ctx() -> EvalContext {
        let config = RepairConfig::default();
        EvalContext::with_collaborators(
            config.clone(),
            Rc::new(CommandCompiler::from_config(&config)),
            Rc::new(CommandHarness::from_config(&config)),
            TestCache::new(&config.cache_path),
        )
    }

    #[test]
    fn test_optional_operations_report_unimplemented() {
        let counter = Counter::from_source(ctx(), "a\nb\n").unwrap();
        let path = Path::new("unused.bin");
        match counter.save_binary(path) {
            Err(e @ RepError::Unimplemented("save_binary")) => assert!(e.is_fatal()),
            other => panic!("expected Unimplemented, got {:?}", other),
        }
        assert!(matches!(
            Counter::load_binary(ctx(), path),
            Err(RepError::Unimplemented("load_binary"))
        ));
    }

    #[test]
    fn test_apply_dispatches_edits() {
        let mut counter = Counter::from_source(ctx(), "a\nb\nc\n").unwrap();
        counter.apply(&"a(1,3)".parse().unwrap()).unwrap();
        assert_eq!(counter.max_atom(), 4);
        counter.apply(&"d(4)".parse().unwrap()).unwrap();
        assert_eq!(counter.max_atom(), 3);
        let err = counter.apply(&"s(1,9)".parse().unwrap()).unwrap_err();
        assert!(matches!(err, RepError::InvalidAtom { id: 9, max: 3 }));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(RepError::SanityCheck("x".into()).is_fatal());
        assert!(!RepError::Snapshot("x".into()).is_fatal());
        assert!(!RepError::MalformedEdit("x".into()).is_fatal());
    }
}
