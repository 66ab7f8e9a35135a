//! Generator for explicit specialization units.
//!
//! Given a [`Catalog`] and a [`TemplateSet`], the generator renders:
//! - one guarded unit per fixed catalog entry, in catalog order,
//! - the umbrella unit instantiating the all-dynamic variant,
//! - the factory unit dispatching between them.
//!
//! Rendering is pure: the same catalog and templates always produce the
//! same units, byte for byte. Nothing touches the filesystem here; see
//! [`crate::output`] for that.
//!
//! # Example
//!
//! ```rust
//! use schur_specgen::codegen::{CodeGenConfig, CodeGenerator, TemplateSet};
//! use schur_specgen::Catalog;
//!
//! let catalog = Catalog::parse(&["2,2,2", "2,3,d", "d,d,d"]).unwrap();
//! let templates = TemplateSet::schur_eliminator();
//! let generator = CodeGenerator::new(&catalog, &templates, CodeGenConfig::default());
//!
//! let units = generator.generate();
//! // two specializations, the umbrella and the factory
//! assert_eq!(units.len(), 4);
//! assert_eq!(units[1].path.to_str(), Some("generated/schur_eliminator_2_3_d.cc"));
//! ```

use crate::catalog::{Catalog, Position};
use crate::codegen::factory::factory_unit;
use crate::codegen::template::TemplateSet;
use crate::codegen::units::{specialization_unit, umbrella_unit, GeneratedUnit};
use std::path::PathBuf;

/// Placeholder for the position name inside [`CodeGenConfig::size_expr`].
pub const POSITION_PLACEHOLDER: &str = "{position}";

/// Layout and naming options for generated units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeGenConfig {
    /// Directory for specialization and umbrella units, relative to the
    /// directory holding the factory.
    pub generated_dir: PathBuf,
    /// File extension of every unit.
    pub extension: String,
    /// Expression reading an observed block size in the factory, with
    /// `{position}` standing for `row`, `e` or `f`.
    pub size_expr: String,
}

impl Default for CodeGenConfig {
    fn default() -> Self {
        Self::ceres()
    }
}

impl CodeGenConfig {
    /// The stock Ceres layout: `generated/*.cc` next to the factories.
    pub fn ceres() -> Self {
        Self {
            generated_dir: PathBuf::from("generated"),
            extension: "cc".to_string(),
            size_expr: "options.{position}_block_size".to_string(),
        }
    }

    /// Put every unit in one directory.
    pub fn flat() -> Self {
        Self {
            generated_dir: PathBuf::new(),
            ..Self::ceres()
        }
    }

    /// The factory's expression for the size at `position`.
    pub fn observed_size(&self, position: Position) -> String {
        self.size_expr.replace(POSITION_PLACEHOLDER, position.name())
    }

    /// Path of a specialization or umbrella unit with the given stem.
    pub fn generated_path(&self, stem: &str) -> PathBuf {
        self.generated_dir.join(self.file_name(stem))
    }

    /// Path of the factory unit for a template set.
    pub fn factory_path(&self, name: &str) -> PathBuf {
        PathBuf::from(self.file_name(name))
    }

    fn file_name(&self, stem: &str) -> String {
        if self.extension.is_empty() {
            stem.to_string()
        } else {
            format!("{}.{}", stem, self.extension)
        }
    }
}

/// Renders the units for one catalog and template set.
pub struct CodeGenerator<'a> {
    pub catalog: &'a Catalog,
    pub templates: &'a TemplateSet,
    pub config: CodeGenConfig,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(catalog: &'a Catalog, templates: &'a TemplateSet, config: CodeGenConfig) -> Self {
        CodeGenerator {
            catalog,
            templates,
            config,
        }
    }

    /// All units: specializations in catalog order, umbrella, factory.
    ///
    /// The umbrella is emitted once per all-dynamic catalog entry, so a
    /// repeated `(d, d, d)` collides on write like any other duplicate.
    pub fn generate(&self) -> Vec<GeneratedUnit> {
        let mut units = self.specialization_units();
        for _ in self.catalog.iter().filter(|s| s.is_all_dynamic()) {
            units.push(self.umbrella_unit());
        }
        units.push(self.factory_unit());

        tracing::debug!(
            "rendered {} units for {}",
            units.len(),
            self.templates.name
        );
        units
    }

    /// One guarded unit per fixed catalog entry.
    pub fn specialization_units(&self) -> Vec<GeneratedUnit> {
        self.catalog
            .branches()
            .map(|(_, spec)| specialization_unit(self.templates, spec, &self.config))
            .collect()
    }

    pub fn umbrella_unit(&self) -> GeneratedUnit {
        umbrella_unit(self.templates, &self.config)
    }

    pub fn factory_unit(&self) -> GeneratedUnit {
        factory_unit(self.templates, self.catalog, &self.config)
    }
}

/// Render every template set against the same catalog.
///
/// Catalog diagnostics (duplicates, unreachable entries) are logged once.
pub fn generate_all(
    catalog: &Catalog,
    template_sets: &[TemplateSet],
    config: &CodeGenConfig,
) -> Vec<GeneratedUnit> {
    catalog.report_diagnostics();
    template_sets
        .iter()
        .flat_map(|templates| CodeGenerator::new(catalog, templates, config.clone()).generate())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::units::UnitKind;
    use crate::output::{check_collisions, OutputError};

    #[test]
    fn test_generate_layout() {
        let catalog = Catalog::parse(&["4,4,d", "2,2,2", "d,d,d"]).unwrap();
        let templates = TemplateSet::schur_eliminator();
        let units = CodeGenerator::new(&catalog, &templates, CodeGenConfig::default()).generate();

        let paths: Vec<String> = units
            .iter()
            .map(|u| u.path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            paths,
            vec![
                "generated/schur_eliminator_4_4_d.cc",
                "generated/schur_eliminator_2_2_2.cc",
                "generated/schur_eliminator_d_d_d.cc",
                "schur_eliminator.cc",
            ]
        );

        let kinds: Vec<UnitKind> = units.iter().map(|u| u.kind).collect();
        assert_eq!(
            kinds,
            vec![
                UnitKind::Specialization,
                UnitKind::Specialization,
                UnitKind::Umbrella,
                UnitKind::Factory,
            ]
        );
    }

    #[test]
    fn test_repeated_dynamic_entry_collides() {
        let catalog = Catalog::parse(&["d,d,d", "2,2,2", "d,d,d"]).unwrap();
        let templates = TemplateSet::schur_eliminator();
        let units = CodeGenerator::new(&catalog, &templates, CodeGenConfig::default()).generate();

        let umbrellas = units.iter().filter(|u| u.kind == UnitKind::Umbrella).count();
        assert_eq!(umbrellas, 2);
        assert!(matches!(
            check_collisions(&units),
            Err(OutputError::DuplicatePath(ref p)) if p == &PathBuf::from("generated/schur_eliminator_d_d_d.cc")
        ));
    }

    #[test]
    fn test_flat_layout() {
        let config = CodeGenConfig::flat();
        assert_eq!(config.generated_path("a_2_2_2"), PathBuf::from("a_2_2_2.cc"));
        assert_eq!(config.factory_path("a"), PathBuf::from("a.cc"));
    }

    #[test]
    fn test_size_expr() {
        let config = CodeGenConfig {
            size_expr: "sizes.{position}".to_string(),
            extension: String::new(),
            ..CodeGenConfig::default()
        };
        assert_eq!(config.observed_size(Position::F), "sizes.f");
        assert_eq!(config.factory_path("x"), PathBuf::from("x"));
    }

    #[test]
    fn test_generate_all_sets() {
        let catalog = Catalog::ceres_default();
        let units = generate_all(&catalog, &TemplateSet::builtins(), &CodeGenConfig::default());
        // 21 specializations + umbrella + factory, per set
        assert_eq!(units.len(), 2 * (21 + 2));
        assert_eq!(
            units.iter().filter(|u| u.kind == UnitKind::Factory).count(),
            2
        );
    }
}
