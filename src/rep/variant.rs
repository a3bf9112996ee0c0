//! Variant — the generic representation over a program backend
//!
//! A backend only knows how to parse, render and edit its atom sequence.
//! `Variant` layers everything else on top: localization bookkeeping, edit
//! history, snapshots, compilation into scratch files, and cached test
//! evaluation through the run's `EvalContext`.

use super::{AtomId, DeletePolicy, Edit, FaultLocalization, LocalizationEntry, RepError, Representation};
use crate::eval::{ContentDigest, EvalContext, TestCase, TestOutcome};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const SNAPSHOT_VERSION: u32 = 1;

/// The atom model of one program encoding
pub trait Backend: fmt::Debug + Clone + Serialize + DeserializeOwned {
    /// Tag written into snapshots and scratch file names
    const KIND: &'static str;

    fn parse(text: &str) -> Result<Self, RepError>;

    fn render(&self) -> String;

    fn atom_count(&self) -> usize;

    // Indices below are zero-based and already bounds-checked.

    fn remove(&mut self, index: usize, policy: DeletePolicy);

    /// Insert a copy of atom `src` at position `dst + 1`
    fn insert_copy_after(&mut self, dst: usize, src: usize);

    fn swap(&mut self, a: usize, b: usize);
}

/// The last successful compilation
#[derive(Debug, Clone)]
struct Build {
    digest: ContentDigest,
    /// `None` once the scratch source has been removed
    source: Option<PathBuf>,
    exe: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct Snapshot<B> {
    kind: String,
    version: u32,
    program: B,
    localization: FaultLocalization,
    edits: Vec<Edit>,
}

#[derive(Debug, Clone)]
pub struct Variant<B: Backend> {
    program: B,
    localization: FaultLocalization,
    edits: Vec<Edit>,
    build: Option<Build>,
    /// Content that last failed to compile
    failed_build: Option<ContentDigest>,
    ctx: EvalContext,
}

impl<B: Backend> Variant<B> {
    pub fn new(ctx: EvalContext, program: B) -> Self {
        Self {
            program,
            localization: FaultLocalization::new(),
            edits: Vec::new(),
            build: None,
            failed_build: None,
            ctx,
        }
    }

    pub fn program(&self) -> &B {
        &self.program
    }

    pub fn localization(&self) -> &FaultLocalization {
        &self.localization
    }

    /// Edits applied since the original, oldest first
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn context(&self) -> &EvalContext {
        &self.ctx
    }

    /// Digest of the rendered source; the test cache key
    pub fn digest(&self) -> ContentDigest {
        ContentDigest::of(self.output_source())
    }

    /// Content-addressed source and executable paths under `work_dir`
    fn scratch_paths(&self, digest: &ContentDigest) -> (PathBuf, PathBuf) {
        let config = self.ctx.config();
        let stem = format!("{}-{}", B::KIND, digest.short());
        let source = config
            .work_dir
            .join(format!("{}.{}", stem, config.source_extension));
        (source, config.work_dir.join(stem))
    }

    /// Reuse the last build if it matches `digest`, otherwise compile now.
    /// Content already known not to compile is not retried.
    fn ensure_built(&mut self, digest: &ContentDigest) -> Result<Option<Build>, RepError> {
        if let Some(build) = self.build.as_ref().filter(|b| b.digest == *digest) {
            return Ok(Some(build.clone()));
        }
        if self.failed_build.as_ref() == Some(digest) {
            return Ok(None);
        }
        let (source, exe) = self.scratch_paths(digest);
        let keep_source = self.ctx.config().keep_source;
        if self.compile(keep_source, &source, &exe)? {
            Ok(self.build.clone())
        } else {
            Ok(None)
        }
    }

    fn run_test(&self, build: &Build, test: TestCase) -> TestOutcome {
        self.ctx.stats().record_test_run();
        let source = build.source.as_deref().unwrap_or_else(|| Path::new(""));
        let outcome = self.ctx.harness().run(&build.exe, source, test);
        debug!("{} on '{}': {}", test, self.name(), outcome);
        outcome
    }

    fn record_outcome(&self, digest: ContentDigest, test: TestCase, outcome: TestOutcome) {
        let mut cache = self.ctx.cache_mut();
        cache.record_evaluation(digest, test);
        if self.ctx.config().use_cache {
            if let Some(passed) = outcome.cacheable() {
                cache.add(digest, test, passed);
            }
        }
    }
}

impl<B: Backend> Representation for Variant<B> {
    fn copy(&self) -> Self {
        self.clone()
    }

    fn name(&self) -> String {
        if self.edits.is_empty() {
            return "original".to_string();
        }
        self.edits
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn from_source(ctx: EvalContext, text: &str) -> Result<Self, RepError> {
        Ok(Self::new(ctx, B::parse(text)?))
    }

    fn output_source(&self) -> String {
        self.program.render()
    }

    fn save_binary(&self, path: &Path) -> Result<(), RepError> {
        let snapshot = Snapshot {
            kind: B::KIND.to_string(),
            version: SNAPSHOT_VERSION,
            program: self.program.clone(),
            localization: self.localization.clone(),
            edits: self.edits.clone(),
        };
        let data = bincode::serialize(&snapshot)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, data)?;
        info!("Saved '{}' ({} atoms) to {}", self.name(), self.max_atom(), path.display());
        Ok(())
    }

    fn load_binary(ctx: EvalContext, path: &Path) -> Result<Self, RepError> {
        let data = std::fs::read(path)?;
        let snapshot: Snapshot<B> = bincode::deserialize(&data)?;
        if snapshot.kind != B::KIND {
            return Err(RepError::Snapshot(format!(
                "{} holds a '{}' program, expected '{}'",
                path.display(), snapshot.kind, B::KIND
            )));
        }
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(RepError::Snapshot(format!(
                "{} has version {}, expected {}",
                path.display(), snapshot.version, SNAPSHOT_VERSION
            )));
        }
        Ok(Self {
            program: snapshot.program,
            localization: snapshot.localization,
            edits: snapshot.edits,
            build: None,
            failed_build: None,
            ctx,
        })
    }

    fn sanity_check(&mut self) -> Result<(), RepError> {
        let ctx = self.ctx.clone();
        info!("Sanity checking '{}' ({} atoms)", self.name(), self.max_atom());

        let digest = self.digest();
        let (source, exe) = self.scratch_paths(&digest);
        let keep_source = ctx.config().keep_source;
        if !self.compile(keep_source, &source, &exe)? {
            return Err(RepError::SanityCheck(format!(
                "original program does not compile ({})",
                source.display()
            )));
        }
        let build = self
            .build
            .clone()
            .ok_or_else(|| RepError::SanityCheck("no build after compilation".into()))?;

        // Straight to the harness: a stale cache must not vouch for the baseline.
        for test in ctx.config().all_tests() {
            let outcome = self.run_test(&build, test);
            self.record_outcome(digest, test, outcome);
            match (test.expected_on_original(), outcome) {
                (true, TestOutcome::Pass) | (false, TestOutcome::Fail) => {}
                (false, TestOutcome::Timeout) => {
                    warn!("Negative test {} timed out on the original program", test)
                }
                (expected, _) => {
                    return Err(RepError::SanityCheck(format!(
                        "{} gave {} on the original program, expected {}",
                        test, outcome, TestOutcome::from(expected)
                    )));
                }
            }
        }

        info!(
            "Sanity check passed: {} positive pass, {} negative fail",
            ctx.config().pos_tests, ctx.config().neg_tests
        );
        Ok(())
    }

    fn compute_fault_localization(&mut self) -> Result<(), RepError> {
        let config = self.ctx.config();
        let localization = config
            .fault_scheme
            .compute(self.max_atom(), config.positive_path_weight)?;
        self.localization = localization;
        Ok(())
    }

    fn compile(&mut self, keep_source: bool, source_path: &Path, exe_path: &Path) -> Result<bool, RepError> {
        let source = self.output_source();
        if let Some(dir) = source_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(source_path, &source)?;

        let built = self.ctx.compiler().compile(source_path, exe_path);
        let kept_source = if keep_source {
            Some(source_path.to_path_buf())
        } else {
            if let Err(e) = std::fs::remove_file(source_path) {
                debug!("Could not remove {}: {}", source_path.display(), e);
            }
            None
        };
        self.ctx.stats().record_compilation(built.is_some());

        match built {
            Some(exe) => {
                self.build = Some(Build {
                    digest: ContentDigest::of(&source),
                    source: kept_source,
                    exe,
                });
                self.failed_build = None;
                Ok(true)
            }
            None => {
                debug!(
                    "'{}' failed to compile ({} failures this run)",
                    self.name(), self.ctx.stats().compile_failures()
                );
                self.build = None;
                self.failed_build = Some(ContentDigest::of(&source));
                Ok(false)
            }
        }
    }

    fn test_case(&mut self, test: TestCase) -> Result<TestOutcome, RepError> {
        let digest = self.digest();
        let cached = if self.ctx.config().use_cache {
            self.ctx.cache().query(&digest, test)
        } else {
            None
        };
        if let Some(passed) = cached {
            self.ctx.stats().record_cache_hit();
            return Ok(TestOutcome::from(passed));
        }

        let outcome = match self.ensure_built(&digest)? {
            Some(build) => self.run_test(&build, test),
            None => TestOutcome::Fail,
        };
        self.record_outcome(digest, test, outcome);
        Ok(outcome)
    }

    fn max_atom(&self) -> usize {
        self.program.atom_count()
    }

    fn get_localization(&self) -> Vec<LocalizationEntry> {
        self.localization.filtered()
    }

    fn get_full_localization(&self) -> Vec<LocalizationEntry> {
        self.localization
            .full(self.max_atom(), self.ctx.config().default_weight)
    }

    fn delete(&mut self, id: AtomId) -> Result<(), RepError> {
        let index = id.checked_index(self.max_atom())?;
        let policy = self.ctx.config().delete_policy;
        self.program.remove(index, policy);
        if policy == DeletePolicy::Compact {
            self.localization.shift_after_delete(id);
        }
        self.edits.push(Edit::Delete(id));
        Ok(())
    }

    fn append(&mut self, dst: AtomId, src: AtomId) -> Result<(), RepError> {
        let max = self.max_atom();
        let dst_index = dst.checked_index(max)?;
        let src_index = src.checked_index(max)?;
        self.program.insert_copy_after(dst_index, src_index);
        self.localization.shift_for_insert(dst.next());
        self.edits.push(Edit::Append { dst, src });
        Ok(())
    }

    /// `swap(a, a)` is a no-op and is not recorded
    fn swap(&mut self, a: AtomId, b: AtomId) -> Result<(), RepError> {
        let max = self.max_atom();
        let a_index = a.checked_index(max)?;
        let b_index = b.checked_index(max)?;
        if a_index != b_index {
            self.program.swap(a_index, b_index);
            self.edits.push(Edit::Swap(a, b));
        }
        Ok(())
    }
}
