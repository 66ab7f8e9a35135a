//! Generator configuration file.
//!
//! ```toml
//! output_dir = "internal/ceres"
//! generated_dir = "generated"
//! extension = "cc"
//! templates = ["schur_eliminator", "partitioned_matrix_view"]
//! template_dirs = ["tools/templates/block_jacobi"]
//! specializations = ["2,2,2", "2,3,d", "d,d,d"]
//! ```
//!
//! Every key is optional. Without `specializations` the stock Ceres
//! catalog is used. Relative `template_dirs` are resolved against the
//! directory of the configuration file; `output_dir` is taken as given.

use crate::catalog::{Catalog, CatalogError};
use crate::codegen::{generate_all, CodeGenConfig, GeneratedUnit, TemplateError, TemplateSet};
use crate::output::{check_units, write_units, CheckReport, OutputError, WriteReport};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or interpreting a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("no template sets selected")]
    NoTemplates,
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Contents of a generator configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Directory receiving the factory units.
    pub output_dir: PathBuf,
    /// Directory for the other units, relative to `output_dir`.
    pub generated_dir: PathBuf,
    pub extension: String,
    /// Built-in template sets to generate.
    pub templates: Vec<String>,
    /// Extra template sets loaded from disk.
    pub template_dirs: Vec<PathBuf>,
    /// Catalog entries written as `row,e,f`.
    pub specializations: Option<Vec<String>>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let layout = CodeGenConfig::ceres();
        GeneratorConfig {
            output_dir: PathBuf::from("."),
            generated_dir: layout.generated_dir,
            extension: layout.extension,
            templates: vec![
                "schur_eliminator".to_string(),
                "partitioned_matrix_view".to_string(),
            ],
            template_dirs: Vec::new(),
            specializations: None,
            base_dir: None,
        }
    }
}

impl GeneratorConfig {
    /// Load from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&contents)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parse TOML text.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Build and validate the catalog.
    pub fn catalog(&self) -> Result<Catalog, ConfigError> {
        match &self.specializations {
            Some(entries) => Ok(Catalog::parse(entries)?),
            None => Ok(Catalog::ceres_default()),
        }
    }

    /// Resolve the built-in and on-disk template sets, in configured order.
    pub fn template_sets(&self) -> Result<Vec<TemplateSet>, ConfigError> {
        let mut sets = self
            .templates
            .iter()
            .map(|name| TemplateSet::builtin(name))
            .collect::<Result<Vec<_>, _>>()?;
        for dir in &self.template_dirs {
            sets.push(TemplateSet::from_dir(self.resolve(dir))?);
        }
        Ok(sets)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Keep only the template sets whose names are listed.
    pub fn select_templates(&mut self, names: &[String]) {
        if !names.is_empty() {
            self.templates.retain(|t| names.contains(t));
            self.template_dirs.retain(|dir| {
                dir.file_name()
                    .map(|n| names.iter().any(|name| n == name.as_str()))
                    .unwrap_or(false)
            });
        }
    }

    pub fn codegen_config(&self) -> CodeGenConfig {
        CodeGenConfig {
            generated_dir: self.generated_dir.clone(),
            extension: self.extension.clone(),
            ..CodeGenConfig::ceres()
        }
    }

    /// Validate the catalog and template sets, then render every unit.
    ///
    /// Nothing is written, so any error leaves the output tree untouched.
    pub fn render(&self) -> Result<Vec<GeneratedUnit>, ConfigError> {
        let catalog = self.catalog()?;
        let sets = self.template_sets()?;
        if sets.is_empty() {
            return Err(ConfigError::NoTemplates);
        }
        tracing::info!(
            "{} catalog entries, {} template sets",
            catalog.len(),
            sets.len()
        );
        Ok(generate_all(&catalog, &sets, &self.codegen_config()))
    }

    /// Render and write every unit under `output_dir`.
    pub fn generate(&self) -> Result<WriteReport, ConfigError> {
        let units = self.render()?;
        Ok(write_units(&self.output_dir, &units)?)
    }

    /// Render every unit and compare with the files under `output_dir`.
    pub fn check(&self) -> Result<CheckReport, ConfigError> {
        let units = self.render()?;
        Ok(check_units(&self.output_dir, &units)?)
    }
}
