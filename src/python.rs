//! Python bindings, so build scripts can drive generation in-process.

use crate::catalog::Catalog;
use crate::codegen::{generate_all, CodeGenConfig, CodeGenerator, TemplateSet};
use crate::dispatch::{BlockSizes, Dispatcher, Resolution};
use crate::output::write_units;
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList, PyTuple};
use std::path::PathBuf;

fn to_catalog(entries: Option<Vec<String>>) -> PyResult<Catalog> {
    match entries {
        Some(entries) => Catalog::parse(&entries).map_err(|e| PyValueError::new_err(e.to_string())),
        None => Ok(Catalog::ceres_default()),
    }
}

fn to_templates(names: Option<Vec<String>>) -> PyResult<Vec<TemplateSet>> {
    match names {
        Some(names) => names
            .iter()
            .map(|n| TemplateSet::builtin(n).map_err(|e| PyValueError::new_err(e.to_string())))
            .collect(),
        None => Ok(TemplateSet::builtins()),
    }
}

/// Python wrapper for Catalog.
#[pyclass(name = "Catalog")]
#[derive(Clone)]
struct PyCatalog {
    inner: Catalog,
}

#[pymethods]
impl PyCatalog {
    /// Build from `row,e,f` strings; the stock catalog when omitted.
    #[new]
    #[pyo3(signature = (entries=None))]
    fn new(entries: Option<Vec<String>>) -> PyResult<Self> {
        Ok(PyCatalog {
            inner: to_catalog(entries)?,
        })
    }

    /// Entries as `row,e,f` strings, in order.
    fn entries(&self) -> Vec<String> {
        self.inner.iter().map(|s| s.to_string()).collect()
    }

    /// Resolve observed block sizes. Returns `(index, "row,e,f")`, or
    /// `None` when the fallback is taken.
    #[pyo3(signature = (row, e, f, restricted=false))]
    fn resolve(&self, row: i32, e: i32, f: i32, restricted: bool, py: Python) -> PyObject {
        let dispatcher = Dispatcher::new(&self.inner).restricted(restricted);
        match dispatcher.resolve(BlockSizes::new(row, e, f)) {
            Resolution::Specialized {
                index,
                specialization,
            } => PyTuple::new(py, vec![index.into_py(py), specialization.to_string().into_py(py)])
                .into_py(py),
            Resolution::Fallback => py.None(),
        }
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!("Catalog({} entries)", self.inner.len())
    }
}

/// Render one template set. Returns a list of `(path, text)` tuples.
#[pyfunction]
#[pyo3(signature = (catalog, template="schur_eliminator"))]
fn render_units(catalog: &PyCatalog, template: &str, py: Python) -> PyResult<PyObject> {
    let templates =
        TemplateSet::builtin(template).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let units = CodeGenerator::new(&catalog.inner, &templates, CodeGenConfig::default()).generate();
    let py_units: Vec<PyObject> = units
        .iter()
        .map(|u| {
            let path = u.path.to_string_lossy().into_owned().into_py(py);
            PyTuple::new(py, vec![path, u.text.clone().into_py(py)]).into_py(py)
        })
        .collect();
    Ok(PyList::new(py, py_units).into_py(py))
}

/// Write all units under `output_dir`. Returns the written and unchanged
/// paths.
#[pyfunction]
#[pyo3(signature = (output_dir, entries=None, templates=None))]
fn generate(
    output_dir: PathBuf,
    entries: Option<Vec<String>>,
    templates: Option<Vec<String>>,
    py: Python,
) -> PyResult<PyObject> {
    let catalog = to_catalog(entries)?;
    let sets = to_templates(templates)?;
    let units = generate_all(&catalog, &sets, &CodeGenConfig::default());
    let report = write_units(&output_dir, &units).map_err(|e| PyIOError::new_err(e.to_string()))?;

    let paths = |ps: &[PathBuf]| -> Vec<String> {
        ps.iter().map(|p| p.to_string_lossy().into_owned()).collect()
    };
    let dict = PyDict::new(py);
    dict.set_item("written", paths(&report.written))?;
    dict.set_item("unchanged", paths(&report.unchanged))?;
    Ok(dict.into_py(py))
}

/// Python module definition.
#[pymodule]
fn schur_specgen(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyCatalog>()?;
    m.add_function(wrap_pyfunction!(render_units, m)?)?;
    m.add_function(wrap_pyfunction!(generate, m)?)?;
    m.add("DYNAMIC", BlockSizes::DYNAMIC)?;
    Ok(())
}
