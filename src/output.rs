//! Writing generated units to disk.
//!
//! Units are independent, so they are written in parallel. A file whose
//! content already matches is not rewritten, which keeps regeneration
//! idempotent down to modification times.

use crate::codegen::GeneratedUnit;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while writing or checking units.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("two units map to {0}; the catalog has a duplicate entry")]
    DuplicatePath(PathBuf),
}

/// Outcome of writing one unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Paths written or left alone by [`write_units`], in unit order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

impl WriteReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.unchanged.len()
    }
}

/// Result of comparing rendered units with the files on disk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub up_to_date: Vec<PathBuf>,
    pub stale: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.stale.is_empty() && self.missing.is_empty()
    }
}

/// Fail if two units would land on the same path.
pub fn check_collisions(units: &[GeneratedUnit]) -> Result<(), OutputError> {
    let mut seen = FxHashSet::default();
    for unit in units {
        if !seen.insert(unit.path.as_path()) {
            return Err(OutputError::DuplicatePath(unit.path.clone()));
        }
    }
    Ok(())
}

/// Write every unit under `root`.
///
/// Collisions are detected before anything is written. A failed write does
/// not affect the other units.
pub fn write_units(root: &Path, units: &[GeneratedUnit]) -> Result<WriteReport, OutputError> {
    check_collisions(units)?;

    let dirs: FxHashSet<PathBuf> = units
        .iter()
        .filter_map(|u| root.join(&u.path).parent().map(Path::to_path_buf))
        .collect();
    for dir in &dirs {
        fs::create_dir_all(dir).map_err(|source| OutputError::Io {
            path: dir.clone(),
            source,
        })?;
    }

    let outcomes = units
        .par_iter()
        .map(|unit| write_unit(root, unit).map(|outcome| (unit.path.clone(), outcome)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = WriteReport::default();
    for (path, outcome) in outcomes {
        match outcome {
            WriteOutcome::Written => report.written.push(path),
            WriteOutcome::Unchanged => report.unchanged.push(path),
        }
    }
    tracing::info!(
        "{} units under {}: {} written, {} unchanged",
        report.total(),
        root.display(),
        report.written.len(),
        report.unchanged.len()
    );
    Ok(report)
}

/// Write one unit unless the file already holds the same text.
pub fn write_unit(root: &Path, unit: &GeneratedUnit) -> Result<WriteOutcome, OutputError> {
    let path = root.join(&unit.path);
    match fs::read(&path) {
        Ok(existing) if existing == unit.text.as_bytes() => {
            tracing::trace!("unchanged {}", path.display());
            return Ok(WriteOutcome::Unchanged);
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(OutputError::Io { path, source }),
    }

    fs::write(&path, &unit.text).map_err(|source| OutputError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::debug!("wrote {} ({})", path.display(), unit.kind);
    Ok(WriteOutcome::Written)
}

/// Compare units with what is checked in under `root`.
pub fn check_units(root: &Path, units: &[GeneratedUnit]) -> Result<CheckReport, OutputError> {
    check_collisions(units)?;

    let mut report = CheckReport::default();
    for unit in units {
        let path = root.join(&unit.path);
        match fs::read(&path) {
            Ok(existing) if existing == unit.text.as_bytes() => {
                report.up_to_date.push(unit.path.clone())
            }
            Ok(_) => report.stale.push(unit.path.clone()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => report.missing.push(unit.path.clone()),
            Err(source) => return Err(OutputError::Io { path, source }),
        }
    }
    Ok(report)
}
