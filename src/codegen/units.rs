//! Per-specialization and umbrella units.
//!
//! Each fixed catalog entry becomes one small translation unit holding a
//! single explicit instantiation, so no one file has to compile the whole
//! family of variants. The umbrella unit instantiates the all-dynamic
//! variant outside the restrict guard and always compiles.

use crate::catalog::Specialization;
use crate::codegen::generator::CodeGenConfig;
use crate::codegen::template::{substitute, TemplateSet};
use std::fmt;
use std::path::PathBuf;

/// What a generated unit is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Specialization,
    Umbrella,
    Factory,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitKind::Specialization => "specialization",
            UnitKind::Umbrella => "umbrella",
            UnitKind::Factory => "factory",
        };
        f.write_str(s)
    }
}

/// A rendered source file. `path` is relative to the output root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedUnit {
    pub path: PathBuf,
    pub text: String,
    pub kind: UnitKind,
}

/// `schur_eliminator_2_3_d`, without extension.
pub fn unit_stem(templates: &TemplateSet, spec: &Specialization) -> String {
    format!("{}_{}", templates.name, spec.suffix())
}

/// Text of the unit instantiating `spec` behind the restrict guard.
pub fn render_specialization(templates: &TemplateSet, spec: &Specialization) -> String {
    let mut text = String::with_capacity(templates.header.len() + templates.specialization.len());
    text.push_str(&templates.header);
    text.push_str(&substitute(&templates.specialization, spec));
    text
}

/// Text of the unguarded all-dynamic unit.
pub fn render_umbrella(templates: &TemplateSet) -> String {
    let mut text = String::with_capacity(templates.header.len() + templates.umbrella.len());
    text.push_str(&templates.header);
    text.push_str(&substitute(&templates.umbrella, &Specialization::dynamic()));
    text
}

pub fn specialization_unit(
    templates: &TemplateSet,
    spec: &Specialization,
    config: &CodeGenConfig,
) -> GeneratedUnit {
    GeneratedUnit {
        path: config.generated_path(&unit_stem(templates, spec)),
        text: render_specialization(templates, spec),
        kind: UnitKind::Specialization,
    }
}

pub fn umbrella_unit(templates: &TemplateSet, config: &CodeGenConfig) -> GeneratedUnit {
    GeneratedUnit {
        path: config.generated_path(&unit_stem(templates, &Specialization::dynamic())),
        text: render_umbrella(templates),
        kind: UnitKind::Umbrella,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(s: &str) -> Specialization {
        s.parse().unwrap()
    }

    #[test]
    fn test_unit_stem() {
        let templates = TemplateSet::schur_eliminator();
        assert_eq!(unit_stem(&templates, &spec("2,2,d")), "schur_eliminator_2_2_d");
        assert_eq!(unit_stem(&templates, &spec("d,2,3")), "schur_eliminator_d_2_3");
    }

    #[test]
    fn test_specialization_unit() {
        let templates = TemplateSet::schur_eliminator();
        let unit = specialization_unit(&templates, &spec("2,3,d"), &CodeGenConfig::default());

        assert_eq!(unit.kind, UnitKind::Specialization);
        assert_eq!(unit.path, PathBuf::from("generated/schur_eliminator_2_3_d.cc"));
        assert!(unit.text.starts_with("// Ceres Solver - A fast non-linear least squares minimizer\n"));
        assert!(unit.text.contains("template class SchurEliminator<2, 3, Eigen::Dynamic>;"));
        assert!(unit.text.ends_with("#endif  // CERES_RESTRICT_SCHUR_SPECIALIZATION\n"));
        assert!(!unit.text.contains("{row}"));
    }

    #[test]
    fn test_umbrella_unit_is_unguarded() {
        let templates = TemplateSet::partitioned_matrix_view();
        let unit = umbrella_unit(&templates, &CodeGenConfig::default());

        assert_eq!(unit.kind, UnitKind::Umbrella);
        assert_eq!(
            unit.path,
            PathBuf::from("generated/partitioned_matrix_view_d_d_d.cc")
        );
        assert!(unit.text.contains(
            "template class PartitionedMatrixView<Eigen::Dynamic, Eigen::Dynamic, Eigen::Dynamic>;"
        ));
        assert!(!unit.text.contains("#ifndef"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let templates = TemplateSet::schur_eliminator();
        let s = spec("4,4,2");
        assert_eq!(
            render_specialization(&templates, &s),
            render_specialization(&templates, &s)
        );
    }
}
