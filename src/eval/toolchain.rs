//! External compiler and test-harness collaborators
//!
//! Both are reached through command templates run with `sh -c`. The
//! harness owns fixtures, comparison and timeouts; here only its exit
//! status is interpreted.

use super::{TestCase, TestOutcome};
use crate::config::RepairConfig;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Exit status `timeout(1)` reports for a killed command
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Turns a source file into an executable
pub trait Compiler {
    /// Returns the executable path on success
    fn compile(&self, source: &Path, exe: &Path) -> Option<PathBuf>;
}

/// Runs one test against one executable
pub trait TestHarness {
    fn run(&self, exe: &Path, source: &Path, test: TestCase) -> TestOutcome;
}

/// Replace every `(placeholder, value)` pair in `template`
pub fn expand_template(template: &str, substitutions: &[(&str, &str)]) -> String {
    substitutions
        .iter()
        .fold(template.to_string(), |acc, (key, value)| acc.replace(key, value))
}

fn run_shell(command: &str) -> std::io::Result<ExitStatus> {
    debug!("Running: {}", command);
    Command::new("sh").arg("-c").arg(command).status()
}

/// Compiler driven by `compiler_command`
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    template: String,
    compiler_name: String,
    compiler_options: String,
}

impl CommandCompiler {
    pub fn from_config(config: &RepairConfig) -> Self {
        Self {
            template: config.compiler_command.clone(),
            compiler_name: config.compiler_name.clone(),
            compiler_options: config.compiler_options.clone(),
        }
    }

    pub fn command_line(&self, source: &Path, exe: &Path) -> String {
        expand_template(
            &self.template,
            &[
                ("__COMPILER_NAME__", self.compiler_name.as_str()),
                ("__COMPILER_OPTIONS__", self.compiler_options.as_str()),
                ("__SOURCE_NAME__", &*source.to_string_lossy()),
                ("__EXE_NAME__", &*exe.to_string_lossy()),
            ],
        )
    }
}

impl Compiler for CommandCompiler {
    fn compile(&self, source: &Path, exe: &Path) -> Option<PathBuf> {
        match run_shell(&self.command_line(source, exe)) {
            Ok(status) if status.success() => Some(exe.to_path_buf()),
            Ok(status) => {
                debug!("Compiler exited with {} for {}", status, source.display());
                None
            }
            Err(e) => {
                warn!("Failed to launch compiler: {}", e);
                None
            }
        }
    }
}

/// Harness driven by `test_command`
#[derive(Debug, Clone)]
pub struct CommandHarness {
    template: String,
    test_script: String,
}

impl CommandHarness {
    pub fn from_config(config: &RepairConfig) -> Self {
        Self {
            template: config.test_command.clone(),
            test_script: config.test_script.clone(),
        }
    }

    pub fn command_line(&self, exe: &Path, source: &Path, test: TestCase) -> String {
        expand_template(
            &self.template,
            &[
                ("__TEST_SCRIPT__", self.test_script.as_str()),
                ("__EXE_NAME__", &*exe.to_string_lossy()),
                ("__TEST_NAME__", test.to_string().as_str()),
                ("__SOURCE_NAME__", &*source.to_string_lossy()),
            ],
        )
    }
}

/// Exit 0 passes; `TIMEOUT_EXIT_CODE` or death by signal is a timeout
pub fn outcome_from_status(status: ExitStatus) -> TestOutcome {
    match status.code() {
        Some(0) => TestOutcome::Pass,
        Some(TIMEOUT_EXIT_CODE) | None => TestOutcome::Timeout,
        Some(_) => TestOutcome::Fail,
    }
}

impl TestHarness for CommandHarness {
    fn run(&self, exe: &Path, source: &Path, test: TestCase) -> TestOutcome {
        match run_shell(&self.command_line(exe, source, test)) {
            Ok(status) => outcome_from_status(status),
            Err(e) => {
                warn!("Failed to launch test {}: {}", test, e);
                TestOutcome::Fail
            }
        }
    }
}
