//! repair-core — program representations for search-based program repair
//!
//! A repair search copies a faulty program, mutates the copy at atoms that
//! fault localization marks as suspicious, then compiles and tests it.
//! This crate provides the representation contract those searches are
//! built on, a line-per-atom backend, and the content-addressed test cache
//! that lets identical variants skip recompilation and reruns.

pub mod config;
pub mod eval;
pub mod rep;

pub use config::{ConfigError, RepairConfig};
pub use eval::{ContentDigest, EvalContext, TestCache, TestCase, TestOutcome};
pub use rep::{AtomId, Edit, LineProgram, RepError, Representation, Variant};
