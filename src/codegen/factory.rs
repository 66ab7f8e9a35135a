//! The factory unit.
//!
//! The factory picks a compiled variant from the block sizes observed at
//! runtime. It tests the catalog's fixed entries in catalog order and
//! returns the first match; when nothing matches, or when the restrict
//! flag compiles the branches out, the footer logs the miss and returns
//! the all-dynamic variant. The cascade is first-match: putting specific
//! entries before general ones is up to the catalog.

use crate::catalog::{Catalog, Position, Specialization};
use crate::codegen::generator::CodeGenConfig;
use crate::codegen::template::{substitute, TemplateSet};
use crate::codegen::units::{GeneratedUnit, UnitKind};
use std::fmt::Write;

const BRANCH_INDENT: &str = "  ";
const BODY_INDENT: &str = "    ";
// Aligns continuation lines under the first condition of `  if ((`.
const CONTINUATION_INDENT: &str = "      ";

/// The equality tests a branch performs, one per fixed position.
pub fn conditions(spec: &Specialization, config: &CodeGenConfig) -> Vec<String> {
    spec.constraints()
        .map(|(position, value)| format!("{} == {}", config.observed_size(position), value))
        .collect()
}

/// Render one `if` branch. `None` for the all-dynamic entry, which has no
/// conditions and is handled by the footer.
pub fn render_branch(
    templates: &TemplateSet,
    spec: &Specialization,
    config: &CodeGenConfig,
) -> Option<String> {
    let conds = conditions(spec, config);
    let test = match conds.len() {
        0 => return None,
        1 => format!("({})", conds[0]),
        _ => {
            let joined = conds
                .iter()
                .map(|c| format!("({})", c))
                .collect::<Vec<_>>()
                .join(&format!(" &&\n{}", CONTINUATION_INDENT));
            format!("({})", joined)
        }
    };

    let body = substitute(templates.factory_branch.trim_end(), spec);
    let mut code = String::new();
    writeln!(code, "{}if {} {{", BRANCH_INDENT, test).unwrap();
    for line in body.lines() {
        if line.trim().is_empty() {
            code.push('\n');
        } else {
            writeln!(code, "{}{}", BODY_INDENT, line).unwrap();
        }
    }
    writeln!(code, "{}}}", BRANCH_INDENT).unwrap();
    Some(code)
}

/// Full text of the factory unit for `catalog`.
pub fn render_factory(templates: &TemplateSet, catalog: &Catalog, config: &CodeGenConfig) -> String {
    let mut code = String::new();
    code.push_str(&templates.header);
    code.push_str(&templates.factory_header);
    for (_, spec) in catalog.branches() {
        if let Some(branch) = render_branch(templates, spec, config) {
            code.push_str(&branch);
        }
    }
    code.push_str(&templates.factory_footer);
    code
}

pub fn factory_unit(templates: &TemplateSet, catalog: &Catalog, config: &CodeGenConfig) -> GeneratedUnit {
    GeneratedUnit {
        path: config.factory_path(&templates.name),
        text: render_factory(templates, catalog, config),
        kind: UnitKind::Factory,
    }
}

/// Positions a branch for `spec` leaves unconstrained.
pub fn wildcards(spec: &Specialization) -> Vec<Position> {
    Position::ALL
        .into_iter()
        .filter(|&p| spec.get(p).is_dynamic())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(s: &str) -> Specialization {
        s.parse().unwrap()
    }

    #[test]
    fn test_branch_all_fixed() {
        let branch = render_branch(
            &TemplateSet::schur_eliminator(),
            &spec("2,3,4"),
            &CodeGenConfig::default(),
        )
        .unwrap();
        assert_eq!(
            branch,
            "  if ((options.row_block_size == 2) &&\n\
            \x20     (options.e_block_size == 3) &&\n\
            \x20     (options.f_block_size == 4)) {\n\
            \x20   return std::make_unique<SchurEliminator<2, 3, 4>>(options);\n\
            \x20 }\n"
        );
    }

    #[test]
    fn test_branch_single_condition() {
        let branch = render_branch(
            &TemplateSet::schur_eliminator(),
            &spec("2,d,d"),
            &CodeGenConfig::default(),
        )
        .unwrap();
        assert_eq!(
            branch,
            "  if (options.row_block_size == 2) {\n\
            \x20   return std::make_unique<SchurEliminator<2, Eigen::Dynamic, Eigen::Dynamic>>(options);\n\
            \x20 }\n"
        );
    }

    #[test]
    fn test_multiline_branch_body_is_indented() {
        let templates = TemplateSet {
            factory_branch: "auto p = std::make_unique<Foo<{row}, {e}, {f}>>(options);\n\
                             \n\
                             return p;\n"
                .into(),
            ..TemplateSet::schur_eliminator()
        };
        let branch = render_branch(&templates, &spec("2,d,d"), &CodeGenConfig::default()).unwrap();
        assert_eq!(
            branch,
            "  if (options.row_block_size == 2) {\n\
            \x20   auto p = std::make_unique<Foo<2, Eigen::Dynamic, Eigen::Dynamic>>(options);\n\
            \n\
            \x20   return p;\n\
            \x20 }\n"
        );
    }

    #[test]
    fn test_branch_skips_dynamic_positions() {
        let config = CodeGenConfig::default();
        let conds = conditions(&spec("d,2,3"), &config);
        assert_eq!(
            conds,
            vec!["options.e_block_size == 2", "options.f_block_size == 3"]
        );
        assert_eq!(wildcards(&spec("d,2,3")), vec![Position::Row]);
    }

    #[test]
    fn test_dynamic_entry_has_no_branch() {
        assert!(render_branch(
            &TemplateSet::schur_eliminator(),
            &Specialization::dynamic(),
            &CodeGenConfig::default()
        )
        .is_none());
    }

    #[test]
    fn test_factory_ends_with_fallback() {
        let catalog = Catalog::parse(&["4,2,3", "d,d,d"]).unwrap();
        let templates = TemplateSet::schur_eliminator();
        let text = render_factory(&templates, &catalog, &CodeGenConfig::default());

        let guard = text.find("#ifndef CERES_RESTRICT_SCHUR_SPECIALIZATION").unwrap();
        let branch = text.find("SchurEliminator<4, 2, 3>").unwrap();
        let endif = text.rfind("#endif").unwrap();
        let fallback = text.rfind("VLOG(1)").unwrap();
        assert!(guard < branch && branch < endif && endif < fallback);
        assert!(text.ends_with("}  // namespace ceres\n"));
        assert_eq!(text.matches(" if ").count(), 1);
    }

    #[test]
    fn test_factory_unit_path() {
        let catalog = Catalog::default();
        let unit = factory_unit(
            &TemplateSet::partitioned_matrix_view(),
            &catalog,
            &CodeGenConfig::default(),
        );
        assert_eq!(unit.kind, UnitKind::Factory);
        assert_eq!(unit.path, std::path::PathBuf::from("partitioned_matrix_view.cc"));
        assert_eq!(unit.text.matches("  if ").count(), catalog.branches().count());
    }
}
