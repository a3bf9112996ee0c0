//! Test oracle references and outcomes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One oracle case. Positive tests pass on the original program; negative
/// tests expose the fault. Indices are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TestCase {
    Positive(u32),
    Negative(u32),
}

impl TestCase {
    pub fn index(&self) -> u32 {
        match self {
            TestCase::Positive(i) | TestCase::Negative(i) => *i,
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, TestCase::Positive(_))
    }

    /// Whether the unmodified program is expected to pass this case
    pub fn expected_on_original(&self) -> bool {
        self.is_positive()
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestCase::Positive(i) => write!(f, "p{}", i),
            TestCase::Negative(i) => write!(f, "n{}", i),
        }
    }
}

impl FromStr for TestCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let index = s
            .get(1..)
            .and_then(|i| i.parse::<u32>().ok())
            .filter(|i| *i > 0)
            .ok_or_else(|| format!("invalid test name '{}'", s))?;
        match s.chars().next() {
            Some('p') => Ok(TestCase::Positive(index)),
            Some('n') => Ok(TestCase::Negative(index)),
            _ => Err(format!("invalid test name '{}'", s)),
        }
    }
}

/// Result of running one test against one build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestOutcome {
    Pass,
    Fail,
    /// The harness gave up on the run; not a deterministic verdict
    Timeout,
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, TestOutcome::Pass)
    }

    /// The boolean to memoize, if this outcome may be cached
    pub fn cacheable(&self) -> Option<bool> {
        match self {
            TestOutcome::Pass => Some(true),
            TestOutcome::Fail => Some(false),
            TestOutcome::Timeout => None,
        }
    }
}

impl From<bool> for TestOutcome {
    fn from(passed: bool) -> Self {
        if passed { TestOutcome::Pass } else { TestOutcome::Fail }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestOutcome::Pass => "pass",
            TestOutcome::Fail => "fail",
            TestOutcome::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(TestCase::Positive(3).to_string(), "p3");
        assert_eq!("n12".parse::<TestCase>().unwrap(), TestCase::Negative(12));
        assert!("p0".parse::<TestCase>().is_err());
        assert!("x1".parse::<TestCase>().is_err());
        assert!("p".parse::<TestCase>().is_err());
    }

    #[test]
    fn test_identity_is_polarity_and_index() {
        assert_ne!(TestCase::Positive(1), TestCase::Negative(1));
        assert!(TestCase::Positive(1).expected_on_original());
        assert!(!TestCase::Negative(1).expected_on_original());
    }

    #[test]
    fn test_timeouts_are_not_cacheable() {
        assert_eq!(TestOutcome::Pass.cacheable(), Some(true));
        assert_eq!(TestOutcome::Fail.cacheable(), Some(false));
        assert_eq!(TestOutcome::Timeout.cacheable(), None);
        assert!(!TestOutcome::Timeout.passed());
    }
}
