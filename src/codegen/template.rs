//! Source templates for the generated units.
//!
//! A [`TemplateSet`] holds the six pieces of text needed to generate the
//! units for one templated class. Templates use `{row}`, `{e}` and `{f}`
//! as placeholders for the block sizes. Sets are plain values; nothing
//! here is global.

use crate::catalog::Specialization;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ROW_PLACEHOLDER: &str = "{row}";
pub const E_PLACEHOLDER: &str = "{e}";
pub const F_PLACEHOLDER: &str = "{f}";

/// Names of the built-in template sets.
pub const BUILTIN_NAMES: &[&str] = &["schur_eliminator", "partitioned_matrix_view"];

/// Files making up a template set on disk.
const HEADER_FILE: &str = "header.in";
const SPECIALIZATION_FILE: &str = "specialization.in";
const UMBRELLA_FILE: &str = "umbrella.in";
const FACTORY_HEADER_FILE: &str = "factory_header.in";
const FACTORY_BRANCH_FILE: &str = "factory_branch.in";
const FACTORY_FOOTER_FILE: &str = "factory_footer.in";

/// Errors raised while resolving or loading a template set.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("unknown template set {0:?} (built-in sets: {})", BUILTIN_NAMES.join(", "))]
    Unknown(String),
    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("template {file} of set {template:?} is missing placeholder {placeholder}")]
    MissingPlaceholder {
        template: String,
        file: &'static str,
        placeholder: &'static str,
    },
}

/// The text templates for one templated class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateSet {
    /// Base name of the generated files (`schur_eliminator`).
    pub name: Cow<'static, str>,
    /// License and autogenerated banner, prepended to every unit.
    pub header: Cow<'static, str>,
    /// Per-specialization unit, guarded by the restrict flag.
    pub specialization: Cow<'static, str>,
    /// Unguarded all-dynamic instantiation.
    pub umbrella: Cow<'static, str>,
    /// Factory includes, signature and opening guard.
    pub factory_header: Cow<'static, str>,
    /// Statement returning one specialization from the factory.
    pub factory_branch: Cow<'static, str>,
    /// Closing guard, diagnostic and dynamic fallback.
    pub factory_footer: Cow<'static, str>,
}

impl TemplateSet {
    /// Templates for `SchurEliminator`.
    pub fn schur_eliminator() -> Self {
        TemplateSet {
            name: Cow::Borrowed("schur_eliminator"),
            header: Cow::Borrowed(include_str!("templates/schur_eliminator/header.in")),
            specialization: Cow::Borrowed(include_str!(
                "templates/schur_eliminator/specialization.in"
            )),
            umbrella: Cow::Borrowed(include_str!("templates/schur_eliminator/umbrella.in")),
            factory_header: Cow::Borrowed(include_str!(
                "templates/schur_eliminator/factory_header.in"
            )),
            factory_branch: Cow::Borrowed(include_str!(
                "templates/schur_eliminator/factory_branch.in"
            )),
            factory_footer: Cow::Borrowed(include_str!(
                "templates/schur_eliminator/factory_footer.in"
            )),
        }
    }

    /// Templates for `PartitionedMatrixView`.
    pub fn partitioned_matrix_view() -> Self {
        TemplateSet {
            name: Cow::Borrowed("partitioned_matrix_view"),
            header: Cow::Borrowed(include_str!("templates/partitioned_matrix_view/header.in")),
            specialization: Cow::Borrowed(include_str!(
                "templates/partitioned_matrix_view/specialization.in"
            )),
            umbrella: Cow::Borrowed(include_str!(
                "templates/partitioned_matrix_view/umbrella.in"
            )),
            factory_header: Cow::Borrowed(include_str!(
                "templates/partitioned_matrix_view/factory_header.in"
            )),
            factory_branch: Cow::Borrowed(include_str!(
                "templates/partitioned_matrix_view/factory_branch.in"
            )),
            factory_footer: Cow::Borrowed(include_str!(
                "templates/partitioned_matrix_view/factory_footer.in"
            )),
        }
    }

    /// Look up a built-in set by name.
    pub fn builtin(name: &str) -> Result<Self, TemplateError> {
        match name {
            "schur_eliminator" => Ok(Self::schur_eliminator()),
            "partitioned_matrix_view" => Ok(Self::partitioned_matrix_view()),
            _ => Err(TemplateError::Unknown(name.to_string())),
        }
    }

    /// All built-in sets, in a fixed order.
    pub fn builtins() -> Vec<Self> {
        vec![Self::schur_eliminator(), Self::partitioned_matrix_view()]
    }

    /// Load a custom set from a directory holding the six `.in` files.
    ///
    /// The set is named after the directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let dir = dir.as_ref();
        let read = |file: &str| -> Result<Cow<'static, str>, TemplateError> {
            let path = dir.join(file);
            std::fs::read_to_string(&path)
                .map(Cow::Owned)
                .map_err(|source| TemplateError::Io { path, source })
        };

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".to_string());

        let set = TemplateSet {
            name: Cow::Owned(name),
            header: read(HEADER_FILE)?,
            specialization: read(SPECIALIZATION_FILE)?,
            umbrella: read(UMBRELLA_FILE)?,
            factory_header: read(FACTORY_HEADER_FILE)?,
            factory_branch: read(FACTORY_BRANCH_FILE)?,
            factory_footer: read(FACTORY_FOOTER_FILE)?,
        };
        set.validate()?;
        Ok(set)
    }

    /// Check that every size-dependent template names all three sizes.
    pub fn validate(&self) -> Result<(), TemplateError> {
        let parts = [
            (SPECIALIZATION_FILE, &self.specialization),
            (UMBRELLA_FILE, &self.umbrella),
            (FACTORY_BRANCH_FILE, &self.factory_branch),
        ];
        for (file, text) in parts {
            for placeholder in [ROW_PLACEHOLDER, E_PLACEHOLDER, F_PLACEHOLDER] {
                if !text.contains(placeholder) {
                    return Err(TemplateError::MissingPlaceholder {
                        template: self.name.to_string(),
                        file,
                        placeholder,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Substitute the template tokens of `spec` into `template`.
pub fn substitute(template: &str, spec: &Specialization) -> String {
    template
        .replace(ROW_PLACEHOLDER, &spec.row.template_token())
        .replace(E_PLACEHOLDER, &spec.e.template_token())
        .replace(F_PLACEHOLDER, &spec.f.template_token())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_valid() {
        for set in TemplateSet::builtins() {
            set.validate().unwrap();
            assert!(set.header.contains("THIS FILE IS AUTOGENERATED. DO NOT EDIT."));
            assert!(set.specialization.contains("#ifndef CERES_RESTRICT_SCHUR_SPECIALIZATION"));
            assert!(!set.umbrella.contains("CERES_RESTRICT_SCHUR_SPECIALIZATION"));
        }
        assert_eq!(TemplateSet::builtins().len(), BUILTIN_NAMES.len());
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(TemplateSet::builtin("schur_eliminator").unwrap().name, "schur_eliminator");
        let err = TemplateSet::builtin("nope").unwrap_err();
        assert!(matches!(err, TemplateError::Unknown(ref n) if n == "nope"));
        assert!(err.to_string().contains("partitioned_matrix_view"));
    }

    #[test]
    fn test_substitute() {
        let spec: Specialization = "2,d,9".parse().unwrap();
        assert_eq!(
            substitute("Foo<{row}, {e}, {f}>", &spec),
            "Foo<2, Eigen::Dynamic, 9>"
        );
    }

    #[test]
    fn test_from_dir_roundtrips_builtin() {
        let dir = tempfile::TempDir::new().unwrap();
        let set_dir = dir.path().join("my_view");
        std::fs::create_dir(&set_dir).unwrap();

        let builtin = TemplateSet::schur_eliminator();
        let files = [
            (HEADER_FILE, &builtin.header),
            (SPECIALIZATION_FILE, &builtin.specialization),
            (UMBRELLA_FILE, &builtin.umbrella),
            (FACTORY_HEADER_FILE, &builtin.factory_header),
            (FACTORY_BRANCH_FILE, &builtin.factory_branch),
            (FACTORY_FOOTER_FILE, &builtin.factory_footer),
        ];
        for (file, text) in files {
            std::fs::write(set_dir.join(file), text.as_bytes()).unwrap();
        }

        let loaded = TemplateSet::from_dir(&set_dir).unwrap();
        assert_eq!(loaded.name, "my_view");
        assert_eq!(loaded.specialization, builtin.specialization);
    }

    #[test]
    fn test_from_dir_rejects_missing_placeholder() {
        let dir = tempfile::TempDir::new().unwrap();
        let builtin = TemplateSet::schur_eliminator();
        for (file, text) in [
            (HEADER_FILE, &*builtin.header),
            (SPECIALIZATION_FILE, "template class Foo<{row}, {e}, 3>;\n"),
            (UMBRELLA_FILE, &*builtin.umbrella),
            (FACTORY_HEADER_FILE, &*builtin.factory_header),
            (FACTORY_BRANCH_FILE, &*builtin.factory_branch),
            (FACTORY_FOOTER_FILE, &*builtin.factory_footer),
        ] {
            std::fs::write(dir.path().join(file), text).unwrap();
        }

        let err = TemplateSet::from_dir(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::MissingPlaceholder { file: SPECIALIZATION_FILE, placeholder: F_PLACEHOLDER, .. }
        ));
    }

    #[test]
    fn test_from_dir_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            TemplateSet::from_dir(dir.path()),
            Err(TemplateError::Io { .. })
        ));
    }
}
