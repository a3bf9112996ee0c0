//! Program representations — the mutable variant state of a repair search
//!
//! A representation exposes its program as numbered atoms, carries fault
//! localization weights over those atoms, and can be compiled and tested.
//! `Variant` implements the contract once for any `Backend`; `LineProgram`
//! is the line-per-atom backend.

mod atom;
mod localization;
mod contract;
mod variant;
mod lines;

pub use atom::{AtomId, DeletePolicy, Edit};
pub use localization::{
    FaultLocalization, FaultScheme, LocalizationEntry,
    parse_path_file, parse_weight_file,
};
pub use contract::{RepError, Representation};
pub use variant::{Backend, Variant};
pub use lines::LineProgram;
