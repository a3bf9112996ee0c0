//! Evaluation context shared by every representation in a run
//!
//! Holds the read-only configuration, the compiler and harness
//! collaborators, the process-wide test cache and evaluation counters.
//! Cloning a context shares all of these; the search is single-threaded,
//! so shared state lives behind `Rc`/`RefCell`/`Cell`.

use super::{CommandCompiler, CommandHarness, Compiler, TestCache, TestHarness};
use crate::config::RepairConfig;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Counters observed across all variants of a run
#[derive(Debug, Default)]
pub struct EvalStats {
    compilations: Cell<u64>,
    compile_failures: Cell<u64>,
    test_runs: Cell<u64>,
    cache_hits: Cell<u64>,
}

impl EvalStats {
    pub fn record_compilation(&self, success: bool) {
        self.compilations.set(self.compilations.get() + 1);
        if !success {
            self.compile_failures.set(self.compile_failures.get() + 1);
        }
    }

    pub fn record_test_run(&self) {
        self.test_runs.set(self.test_runs.get() + 1);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.set(self.cache_hits.get() + 1);
    }

    pub fn compilations(&self) -> u64 {
        self.compilations.get()
    }

    pub fn compile_failures(&self) -> u64 {
        self.compile_failures.get()
    }

    pub fn test_runs(&self) -> u64 {
        self.test_runs.get()
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.get()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} compilations ({} failed) | {} test runs | {} cache hits",
            self.compilations(), self.compile_failures(), self.test_runs(), self.cache_hits()
        )
    }
}

#[derive(Clone)]
pub struct EvalContext {
    config: Rc<RepairConfig>,
    compiler: Rc<dyn Compiler>,
    harness: Rc<dyn TestHarness>,
    cache: Rc<RefCell<TestCache>>,
    stats: Rc<EvalStats>,
}

impl EvalContext {
    /// Command-driven collaborators; the cache is restored from
    /// `cache_path` when caching is enabled
    pub fn new(config: RepairConfig) -> Self {
        let compiler = Rc::new(CommandCompiler::from_config(&config));
        let harness = Rc::new(CommandHarness::from_config(&config));
        let cache = if config.use_cache {
            TestCache::restore(&config.cache_path)
        } else {
            TestCache::new(&config.cache_path)
        };
        Self::with_collaborators(config, compiler, harness, cache)
    }

    pub fn with_collaborators(
        config: RepairConfig,
        compiler: Rc<dyn Compiler>,
        harness: Rc<dyn TestHarness>,
        cache: TestCache,
    ) -> Self {
        Self {
            config: Rc::new(config),
            compiler,
            harness,
            cache: Rc::new(RefCell::new(cache)),
            stats: Rc::new(EvalStats::default()),
        }
    }

    pub fn config(&self) -> &RepairConfig {
        &self.config
    }

    pub fn compiler(&self) -> &dyn Compiler {
        self.compiler.as_ref()
    }

    pub fn harness(&self) -> &dyn TestHarness {
        self.harness.as_ref()
    }

    pub fn cache(&self) -> Ref<'_, TestCache> {
        self.cache.borrow()
    }

    pub fn cache_mut(&self) -> RefMut<'_, TestCache> {
        self.cache.borrow_mut()
    }

    pub fn stats(&self) -> &EvalStats {
        &self.stats
    }
}

impl fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("config", &self.config)
            .field("cached_outcomes", &self.cache.borrow().len())
            .field("stats", &self.stats)
            .finish()
    }
}
