//! Runtime dispatch over a catalog.
//!
//! [`Dispatcher`] answers the question the generated factory answers at
//! runtime: given observed block sizes, which compiled variant is built?
//! It walks the same branch list the factory is rendered from, so the two
//! always agree.

use crate::catalog::{Catalog, Specialization};
use std::fmt;

/// Block sizes observed on a problem.
///
/// A size the structure detection could not pin down is reported as
/// [`BlockSizes::DYNAMIC`], which only dynamic positions accept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockSizes {
    pub row: i32,
    pub e: i32,
    pub f: i32,
}

impl BlockSizes {
    /// Value of `Eigen::Dynamic`.
    pub const DYNAMIC: i32 = -1;

    pub fn new(row: i32, e: i32, f: i32) -> Self {
        BlockSizes { row, e, f }
    }
}

impl fmt::Display for BlockSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{},{},{}>", self.row, self.e, self.f)
    }
}

/// Which variant a call to the factory constructs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// A catalog entry matched; `index` is its catalog position.
    Specialized {
        index: usize,
        specialization: Specialization,
    },
    /// Nothing matched; the all-dynamic variant is built.
    Fallback,
}

impl Resolution {
    /// The variant that gets constructed.
    pub fn specialization(&self) -> Specialization {
        match self {
            Resolution::Specialized { specialization, .. } => *specialization,
            Resolution::Fallback => Specialization::dynamic(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::Fallback)
    }
}

/// First-match dispatch over the fixed entries of a catalog.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    branches: Vec<(usize, Specialization)>,
    restricted: bool,
}

impl Dispatcher {
    pub fn new(catalog: &Catalog) -> Self {
        Dispatcher {
            branches: catalog.branches().map(|(i, s)| (i, *s)).collect(),
            restricted: false,
        }
    }

    /// Model a build with the restrict flag set: every branch is compiled
    /// out and each call takes the fallback.
    pub fn restricted(mut self, restricted: bool) -> Self {
        self.restricted = restricted;
        self
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Number of conditional branches ahead of the fallback.
    pub fn branch_count(&self) -> usize {
        if self.restricted {
            0
        } else {
            self.branches.len()
        }
    }

    /// Resolve observed sizes to exactly one variant.
    pub fn resolve(&self, sizes: BlockSizes) -> Resolution {
        if !self.restricted {
            let hit = self
                .branches
                .iter()
                .find(|(_, spec)| spec.matches(sizes.row, sizes.e, sizes.f));
            if let Some(&(index, specialization)) = hit {
                return Resolution::Specialized {
                    index,
                    specialization,
                };
            }
        }

        tracing::debug!("Template specializations not found for {}", sizes);
        Resolution::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(entries: &[&str]) -> Catalog {
        Catalog::parse(entries).unwrap()
    }

    #[test]
    fn test_exact_match_wins_over_fallback() {
        let dispatcher = Dispatcher::new(&catalog(&["4,2,3", "d,d,d"]));
        let res = dispatcher.resolve(BlockSizes::new(4, 2, 3));
        assert_eq!(
            res,
            Resolution::Specialized {
                index: 0,
                specialization: "4,2,3".parse().unwrap(),
            }
        );
        assert!(dispatcher.resolve(BlockSizes::new(4, 2, 4)).is_fallback());
    }

    #[test]
    fn test_dynamic_position_is_wildcard() {
        let dispatcher = Dispatcher::new(&catalog(&["d,2,3", "d,d,d"]));
        let wildcard: Specialization = "d,2,3".parse().unwrap();

        assert_eq!(dispatcher.resolve(BlockSizes::new(7, 2, 3)).specialization(), wildcard);
        assert_eq!(dispatcher.resolve(BlockSizes::new(99, 2, 3)).specialization(), wildcard);
        assert!(dispatcher.resolve(BlockSizes::new(7, 5, 3)).is_fallback());
    }

    #[test]
    fn test_first_match_in_catalog_order() {
        let general_first = Dispatcher::new(&catalog(&["2,d,d", "2,3,4", "d,d,d"]));
        let res = general_first.resolve(BlockSizes::new(2, 3, 4));
        assert!(matches!(res, Resolution::Specialized { index: 0, .. }));

        let specific_first = Dispatcher::new(&catalog(&["2,3,4", "2,d,d", "d,d,d"]));
        let res = specific_first.resolve(BlockSizes::new(2, 3, 4));
        assert!(matches!(res, Resolution::Specialized { index: 0, .. }));
        let res = specific_first.resolve(BlockSizes::new(2, 9, 9));
        assert!(matches!(res, Resolution::Specialized { index: 1, .. }));
    }

    #[test]
    fn test_dynamic_entry_position_does_not_matter() {
        let dispatcher = Dispatcher::new(&catalog(&["d,d,d", "3,3,3"]));
        let res = dispatcher.resolve(BlockSizes::new(3, 3, 3));
        assert!(matches!(res, Resolution::Specialized { index: 1, .. }));
    }

    #[test]
    fn test_observed_dynamic_only_matches_wildcards() {
        let dispatcher = Dispatcher::new(&catalog(&["2,2,2", "2,2,d", "d,d,d"]));
        let res = dispatcher.resolve(BlockSizes::new(2, 2, BlockSizes::DYNAMIC));
        assert!(matches!(res, Resolution::Specialized { index: 1, .. }));
    }

    #[test]
    fn test_restricted_always_falls_back() {
        let dispatcher = Dispatcher::new(&Catalog::ceres_default()).restricted(true);
        assert_eq!(dispatcher.branch_count(), 0);
        assert!(dispatcher.resolve(BlockSizes::new(2, 2, 2)).is_fallback());
    }

    #[test]
    fn test_resolution_is_total() {
        let dispatcher = Dispatcher::new(&Catalog::ceres_default());
        let values = [BlockSizes::DYNAMIC, 1, 2, 3, 4, 6, 8, 9, 12];
        for &row in &values {
            for &e in &values {
                for &f in &values {
                    let sizes = BlockSizes::new(row, e, f);
                    let chosen = dispatcher.resolve(sizes).specialization();
                    assert!(chosen.matches(row, e, f), "{} resolved to <{}>", sizes, chosen);
                }
            }
        }
    }
}
