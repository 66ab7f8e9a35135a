//! The catalog of block-size specializations.
//!
//! Entries keep the order they were configured in. That order decides the
//! layout of the generated files and the branch order of the factory, so
//! the catalog never sorts or deduplicates.

use crate::size::{SizeError, SizeSpec};
use rustc_hash::FxHashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while building a catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog is empty")]
    Empty,
    #[error("catalog has no all-dynamic entry (d, d, d); the factory fallback needs it")]
    MissingDynamic,
    #[error("entry {index} ({text:?}): {source}")]
    InvalidEntry {
        index: usize,
        text: String,
        #[source]
        source: SizeError,
    },
    #[error("entry {index} ({text:?}): expected 3 block sizes, found {found}")]
    Arity {
        index: usize,
        text: String,
        found: usize,
    },
}

/// Position of a block size within a specialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    Row,
    E,
    F,
}

impl Position {
    pub const ALL: [Position; 3] = [Position::Row, Position::E, Position::F];

    /// Name used by the solver options (`row`, `e`, `f`).
    pub fn name(&self) -> &'static str {
        match self {
            Position::Row => "row",
            Position::E => "e",
            Position::F => "f",
        }
    }
}

/// One (row, e, f) combination selected for a dedicated compiled variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Specialization {
    pub row: SizeSpec,
    pub e: SizeSpec,
    pub f: SizeSpec,
}

impl Specialization {
    pub fn new(row: SizeSpec, e: SizeSpec, f: SizeSpec) -> Self {
        Specialization { row, e, f }
    }

    /// The all-dynamic specialization.
    pub fn dynamic() -> Self {
        Specialization::new(SizeSpec::Dynamic, SizeSpec::Dynamic, SizeSpec::Dynamic)
    }

    pub fn is_all_dynamic(&self) -> bool {
        self.sizes().iter().all(SizeSpec::is_dynamic)
    }

    pub fn sizes(&self) -> [SizeSpec; 3] {
        [self.row, self.e, self.f]
    }

    pub fn get(&self, position: Position) -> SizeSpec {
        match position {
            Position::Row => self.row,
            Position::E => self.e,
            Position::F => self.f,
        }
    }

    /// Fixed positions with their required values, in (row, e, f) order.
    pub fn constraints(&self) -> impl Iterator<Item = (Position, u32)> + '_ {
        Position::ALL
            .into_iter()
            .filter_map(move |p| self.get(p).value().map(|v| (p, v)))
    }

    /// Whether the observed sizes select this specialization.
    #[inline]
    pub fn matches(&self, row: i32, e: i32, f: i32) -> bool {
        self.row.accepts(row) && self.e.accepts(e) && self.f.accepts(f)
    }

    /// Whether every runtime triple that selects `other` also selects `self`.
    pub fn covers(&self, other: &Specialization) -> bool {
        Position::ALL.iter().all(|&p| match self.get(p) {
            SizeSpec::Dynamic => true,
            fixed => fixed == other.get(p),
        })
    }

    /// Filename tokens joined with `_`, e.g. `2_3_d`.
    pub fn suffix(&self) -> String {
        self.sizes()
            .iter()
            .map(SizeSpec::filename_token)
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.row, self.e, self.f)
    }
}

impl FromStr for Specialization {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_entry(0, s)
    }
}

fn parse_entry(index: usize, text: &str) -> Result<Specialization, CatalogError> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() != 3 {
        return Err(CatalogError::Arity {
            index,
            text: text.to_string(),
            found: parts.len(),
        });
    }

    let mut sizes = [SizeSpec::Dynamic; 3];
    for (slot, part) in sizes.iter_mut().zip(&parts) {
        *slot = part.parse().map_err(|source| CatalogError::InvalidEntry {
            index,
            text: text.to_string(),
            source,
        })?;
    }
    Ok(Specialization::new(sizes[0], sizes[1], sizes[2]))
}

/// A repeated entry: `index` repeats the entry first seen at `first`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Duplicate {
    pub first: usize,
    pub index: usize,
    pub specialization: Specialization,
}

/// An entry that can never be selected because an earlier entry covers it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shadowed {
    pub index: usize,
    pub by: usize,
}

/// Ordered, immutable list of specializations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<Specialization>,
}

impl Catalog {
    /// Build a catalog, checking that the all-dynamic entry is present.
    pub fn new(entries: Vec<Specialization>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        if !entries.iter().any(Specialization::is_all_dynamic) {
            return Err(CatalogError::MissingDynamic);
        }
        Ok(Catalog { entries })
    }

    /// Parse entries written as `row,e,f` (e.g. `"2,3,d"`).
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, CatalogError> {
        let parsed = entries
            .iter()
            .enumerate()
            .map(|(i, text)| parse_entry(i, text.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Catalog::new(parsed)
    }

    /// The stock Ceres specialization list.
    pub fn ceres_default() -> Self {
        const DEFAULT: &[&str] = &[
            "2,2,2", "2,2,3", "2,2,4", "2,2,d",
            "2,3,3", "2,3,4", "2,3,6", "2,3,9", "2,3,d",
            "2,4,3", "2,4,4", "2,4,6", "2,4,8", "2,4,9", "2,4,d",
            "2,d,d",
            "3,3,3",
            "4,4,2", "4,4,3", "4,4,4", "4,4,d",
            "d,d,d",
        ];
        Catalog {
            entries: DEFAULT
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specialization> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[Specialization] {
        &self.entries
    }

    /// Entries with at least one fixed size, with their catalog index.
    ///
    /// These become the per-specialization units and the factory branches.
    /// The all-dynamic entry is served by the umbrella unit and the
    /// factory fallback instead.
    pub fn branches(&self) -> impl Iterator<Item = (usize, &Specialization)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_all_dynamic())
    }

    /// Entries repeated later in the catalog.
    pub fn duplicates(&self) -> Vec<Duplicate> {
        let mut seen: FxHashMap<Specialization, usize> = FxHashMap::default();
        let mut dups = Vec::new();
        for (index, spec) in self.entries.iter().enumerate() {
            match seen.get(spec) {
                Some(&first) => dups.push(Duplicate {
                    first,
                    index,
                    specialization: *spec,
                }),
                None => {
                    seen.insert(*spec, index);
                }
            }
        }
        dups
    }

    /// Branch entries that an earlier, different branch entry covers.
    ///
    /// Exact repeats are reported by [`Catalog::duplicates`] instead.
    pub fn shadowed(&self) -> Vec<Shadowed> {
        let branches: Vec<(usize, &Specialization)> = self.branches().collect();
        let mut result = Vec::new();
        for (pos, &(index, spec)) in branches.iter().enumerate() {
            let earlier = branches[..pos]
                .iter()
                .find(|(_, prev)| *prev != spec && prev.covers(spec));
            if let Some(&(by, _)) = earlier {
                result.push(Shadowed { index, by });
            }
        }
        result
    }

    /// Index of the all-dynamic entry if it is not the last one.
    pub fn dynamic_not_last(&self) -> Option<usize> {
        let index = self.entries.iter().position(Specialization::is_all_dynamic)?;
        (index + 1 != self.entries.len()).then_some(index)
    }

    /// Log every diagnostic through `tracing`. Returns how many were found.
    pub fn report_diagnostics(&self) -> usize {
        let duplicates = self.duplicates();
        for dup in &duplicates {
            tracing::warn!(
                "catalog entry {} <{}> repeats entry {}; its unit will collide",
                dup.index,
                dup.specialization,
                dup.first
            );
        }

        let shadowed = self.shadowed();
        for s in &shadowed {
            tracing::warn!(
                "catalog entry {} <{}> is unreachable: entry {} <{}> matches first",
                s.index,
                self.entries[s.index],
                s.by,
                self.entries[s.by]
            );
        }

        let misplaced = self.dynamic_not_last();
        if let Some(index) = misplaced {
            tracing::warn!(
                "all-dynamic entry is at position {} of {}; it is always dispatched last",
                index,
                self.entries.len()
            );
        }

        duplicates.len() + shadowed.len() + usize::from(misplaced.is_some())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::ceres_default()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Specialization;
    type IntoIter = std::slice::Iter<'a, Specialization>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
