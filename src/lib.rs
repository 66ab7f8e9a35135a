//! Schur-specgen: explicit specialization generator for Schur elimination.
//!
//! This crate provides:
//! - Block-size model (fixed sizes and the dynamic sentinel)
//! - An ordered catalog of (row, e, f) specializations
//! - Generation of per-specialization units, the umbrella unit and the
//!   runtime factory from text templates
//! - A dispatch model mirroring the generated factory
//! - Idempotent writing and staleness checks for generated files
//! - Python bindings via PyO3 (feature `python`)

pub mod catalog;
pub mod codegen;
pub mod config;
pub mod dispatch;
pub mod output;
pub mod size;

#[cfg(feature = "python")]
mod python;

// Re-exports for convenience
pub use catalog::{Catalog, CatalogError, Position, Specialization};
pub use codegen::{CodeGenConfig, CodeGenerator, GeneratedUnit, TemplateSet, UnitKind};
pub use config::{ConfigError, GeneratorConfig};
pub use dispatch::{BlockSizes, Dispatcher, Resolution};
pub use output::{check_units, write_units, CheckReport, OutputError, WriteReport};
pub use size::{SizeError, SizeSpec};
