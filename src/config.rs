//! Run configuration
//!
//! Read once at startup and shared read-only with every representation
//! through `EvalContext`. Fields missing from the JSON file take their
//! defaults.

use crate::eval::{TestCase, DEFAULT_CACHE_PATH};
use crate::rep::{DeletePolicy, FaultScheme};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Compiler executable substituted for `__COMPILER_NAME__`
    pub compiler_name: String,
    /// Extra flags substituted for `__COMPILER_OPTIONS__`
    pub compiler_options: String,
    /// Shell template that builds `__EXE_NAME__` from `__SOURCE_NAME__`
    pub compiler_command: String,
    /// Test script substituted for `__TEST_SCRIPT__`
    pub test_script: String,
    /// Shell template running `__TEST_NAME__` against `__EXE_NAME__`
    pub test_command: String,
    /// Seed for every random choice made during the run
    pub seed: u64,
    /// Positive tests `p1..=pos_tests`, which the original passes
    pub pos_tests: u32,
    /// Negative tests `n1..=neg_tests`, which the original fails
    pub neg_tests: u32,
    /// Extension of rendered source files, without the dot
    pub source_extension: String,
    /// Directory for scratch sources and executables
    pub work_dir: PathBuf,
    /// Keep rendered scratch sources after compiling them for tests
    pub keep_source: bool,
    /// Test cache file restored at startup and persisted on exit
    pub cache_path: PathBuf,
    /// Serve repeated (content, test) pairs from the cache
    pub use_cache: bool,
    /// Whether deleting an atom empties it or removes it and renumbers
    pub delete_policy: DeletePolicy,
    /// How fault localization weights are computed
    pub fault_scheme: FaultScheme,
    /// Weight of atoms visited by both passing and failing runs
    pub positive_path_weight: f64,
    /// Weight reported for atoms without a localization entry
    pub default_weight: f64,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            compiler_name: "gcc".into(),
            compiler_options: String::new(),
            compiler_command:
                "__COMPILER_NAME__ -o __EXE_NAME__ __SOURCE_NAME__ __COMPILER_OPTIONS__ >/dev/null 2>&1".into(),
            test_script: "./test.sh".into(),
            test_command: "__TEST_SCRIPT__ __EXE_NAME__ __TEST_NAME__ >/dev/null 2>&1".into(),
            seed: 0,
            pos_tests: 5,
            neg_tests: 1,
            source_extension: "s".into(),
            work_dir: PathBuf::from("."),
            keep_source: false,
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            use_cache: true,
            delete_policy: DeletePolicy::default(),
            fault_scheme: FaultScheme::default(),
            positive_path_weight: 0.1,
            default_weight: 0.0,
        }
    }
}

impl RepairConfig {
    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        info!(
            "Loaded config from {}: {} positive / {} negative tests, seed {}",
            path.display(), config.pos_tests, config.neg_tests, config.seed
        );
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.neg_tests == 0 {
            return Err(ConfigError::Invalid("at least one negative test is required".into()));
        }
        for (name, w) in [
            ("positive_path_weight", self.positive_path_weight),
            ("default_weight", self.default_weight),
        ] {
            if !(0.0..=1.0).contains(&w) {
                return Err(ConfigError::Invalid(format!("{} must lie in [0, 1], got {}", name, w)));
            }
        }
        if self.source_extension.is_empty() {
            return Err(ConfigError::Invalid("source_extension must not be empty".into()));
        }
        Ok(())
    }

    pub fn positive_tests(&self) -> Vec<TestCase> {
        (1..=self.pos_tests).map(TestCase::Positive).collect()
    }

    pub fn negative_tests(&self) -> Vec<TestCase> {
        (1..=self.neg_tests).map(TestCase::Negative).collect()
    }

    /// Positive tests first, then negative
    pub fn all_tests(&self) -> Vec<TestCase> {
        let mut tests = self.positive_tests();
        tests.extend(self.negative_tests());
        tests
    }

    /// Deterministic generator for this run
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "compiler_name": "as",
            "pos_tests": 3,
            "delete_policy": "compact",
            "fault_scheme": { "scheme": "weighted", "path": "weights.txt" }
        }"#;
        let config: RepairConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.compiler_name, "as");
        assert_eq!(config.neg_tests, 1);
        assert_eq!(config.delete_policy, DeletePolicy::Compact);
        assert_eq!(
            config.fault_scheme,
            FaultScheme::Weighted { path: PathBuf::from("weights.txt") }
        );
        assert!(config.use_cache);
    }

    #[test]
    fn test_test_lists() {
        let config = RepairConfig { pos_tests: 2, neg_tests: 1, ..RepairConfig::default() };
        assert_eq!(
            config.all_tests(),
            vec![TestCase::Positive(1), TestCase::Positive(2), TestCase::Negative(1)]
        );
    }

    #[test]
    fn test_validate() {
        assert!(RepairConfig::default().validate().is_ok());
        let bad = RepairConfig { neg_tests: 0, ..RepairConfig::default() };
        assert!(bad.validate().is_err());
        let bad = RepairConfig { positive_path_weight: 1.5, ..RepairConfig::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("repair-config-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("repair.json");

        let config = RepairConfig { seed: 42, pos_tests: 7, ..RepairConfig::default() };
        config.save(&path).unwrap();
        assert_eq!(RepairConfig::load(&path).unwrap(), config);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
