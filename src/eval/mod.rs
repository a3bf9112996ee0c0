//! Evaluation — compiling variants, running tests, memoizing outcomes
//!
//! - **Oracle**: positive/negative test references and run outcomes
//! - **Cache**: content-digest keyed test outcomes, persisted across runs
//! - **Toolchain**: compiler and test-harness collaborators
//! - **Context**: the bundle of the above shared by every variant

mod oracle;
mod cache;
mod toolchain;
mod context;

pub use oracle::{TestCase, TestOutcome};
pub use cache::{CacheError, ContentDigest, TestCache, DEFAULT_CACHE_PATH};
pub use toolchain::{
    Compiler, TestHarness, CommandCompiler, CommandHarness,
    expand_template, outcome_from_status, TIMEOUT_EXIT_CODE,
};
pub use context::{EvalContext, EvalStats};
