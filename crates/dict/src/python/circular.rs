// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2026 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Python bindings for the circular dictionary.
//!
//! Keys and values are arbitrary Python objects. Keys follow Python `hash()`
//! and `==` semantics, and each entry costs `sys.getsizeof(key) +
//! sys.getsizeof(value)` bytes.
//!
//! Every method releases the GIL while it waits for the dictionary lock, so a
//! thread holding the lock can always re-acquire the GIL to compare keys.

use std::hash::{Hash, Hasher};

use circular_dict_core::size::FnSizer;
use pyo3::{
    exceptions::PyKeyError,
    prelude::*,
    types::{PyIterator, PyList},
};

use crate::cache::{CircularDict, CircularDictConfig, CircularDictError};

type PySizer = FnSizer<fn(&PyKey) -> usize, fn(&PyValue) -> usize>;

fn getsizeof(object: &Bound<'_, PyAny>) -> PyResult<usize> {
    let size: usize = PyModule::import(object.py(), "sys")?
        .getattr("getsizeof")?
        .call1((object,))?
        .extract()?;
    Ok(size)
}

/// A hashable Python object with its `hash()` and `sys.getsizeof` cached.
#[derive(Debug)]
pub struct PyKey {
    object: Py<PyAny>,
    hash: isize,
    size: usize,
}

impl PyKey {
    fn new(object: &Bound<'_, PyAny>) -> PyResult<Self> {
        Ok(Self {
            hash: object.hash()?,
            size: getsizeof(object)?,
            object: object.clone().unbind(),
        })
    }

    const fn size(&self) -> usize {
        self.size
    }

    fn into_object(self) -> Py<PyAny> {
        self.object
    }
}

impl Hash for PyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl PartialEq for PyKey {
    fn eq(&self, other: &Self) -> bool {
        if self.object.as_ptr() == other.object.as_ptr() {
            return true;
        }
        // An exception raised by `__eq__` compares unequal
        self.hash == other.hash
            && Python::attach(|py| {
                self.object
                    .bind(py)
                    .eq(other.object.bind(py))
                    .unwrap_or(false)
            })
    }
}

impl Eq for PyKey {}

impl Clone for PyKey {
    fn clone(&self) -> Self {
        Python::attach(|py| Self {
            object: self.object.clone_ref(py),
            hash: self.hash,
            size: self.size,
        })
    }
}

/// A Python object with its `sys.getsizeof` cached.
#[derive(Debug)]
pub struct PyValue {
    object: Py<PyAny>,
    size: usize,
}

impl PyValue {
    fn new(object: &Bound<'_, PyAny>) -> PyResult<Self> {
        Ok(Self {
            size: getsizeof(object)?,
            object: object.clone().unbind(),
        })
    }

    const fn size(&self) -> usize {
        self.size
    }

    fn into_object(self) -> Py<PyAny> {
        self.object
    }
}

impl Clone for PyValue {
    fn clone(&self) -> Self {
        Python::attach(|py| Self {
            object: self.object.clone_ref(py),
            size: self.size,
        })
    }
}

/// A thread-safe circular dictionary bounded by `maxlen` entries and/or
/// `maxsize_bytes` accounted bytes.
#[pyo3::pyclass(name = "CircularDict", module = "circular_dict.dict")]
#[derive(Debug)]
pub struct PyCircularDict {
    inner: CircularDict<PyKey, PyValue, PySizer>,
}

#[pymethods]
impl PyCircularDict {
    #[new]
    #[pyo3(signature = (maxlen=None, maxsize_bytes=None))]
    fn py_new(maxlen: Option<usize>, maxsize_bytes: Option<usize>) -> PyResult<Self> {
        let config =
            CircularDictConfig::new(maxlen, maxsize_bytes).map_err(CircularDictError::from)?;
        let sizer = FnSizer::new(
            PyKey::size as fn(&PyKey) -> usize,
            PyValue::size as fn(&PyValue) -> usize,
        );
        Ok(Self {
            inner: CircularDict::with_sizer(config, sizer)?,
        })
    }

    fn __repr__(&self, py: Python<'_>) -> String {
        py.detach(|| {
            self.inner.with_map(|map| {
                format!(
                    "CircularDict(maxlen={:?}, maxsize_bytes={:?}, len={}, current_size={})",
                    map.max_len(),
                    map.max_size_bytes(),
                    map.len(),
                    map.current_size(),
                )
            })
        })
    }

    #[getter]
    fn maxlen(&self, py: Python<'_>) -> Option<usize> {
        py.detach(|| self.inner.max_len())
    }

    #[getter]
    fn maxsize_bytes(&self, py: Python<'_>) -> Option<usize> {
        py.detach(|| self.inner.max_size_bytes())
    }

    #[getter]
    fn current_size(&self, py: Python<'_>) -> usize {
        py.detach(|| self.inner.current_size())
    }

    fn __len__(&self, py: Python<'_>) -> usize {
        py.detach(|| self.inner.len())
    }

    fn __iter__<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyIterator>> {
        PyList::new(py, self.keys(py))?.try_iter()
    }

    fn __contains__(&self, py: Python<'_>, key: &Bound<'_, PyAny>) -> PyResult<bool> {
        let key = PyKey::new(key)?;
        Ok(py.detach(|| self.inner.contains_key(&key)))
    }

    fn __getitem__(&self, py: Python<'_>, key: &Bound<'_, PyAny>) -> PyResult<Py<PyAny>> {
        let lookup = PyKey::new(key)?;
        py.detach(|| self.inner.get(&lookup))
            .map(PyValue::into_object)
            .ok_or_else(|| PyKeyError::new_err(key.clone().unbind()))
    }

    fn __setitem__(
        &self,
        py: Python<'_>,
        key: &Bound<'_, PyAny>,
        value: &Bound<'_, PyAny>,
    ) -> PyResult<()> {
        let key = PyKey::new(key)?;
        let value = PyValue::new(value)?;
        py.detach(move || self.inner.insert(key, value))?;
        Ok(())
    }

    fn __delitem__(&self, py: Python<'_>, key: &Bound<'_, PyAny>) -> PyResult<()> {
        let key = PyKey::new(key)?;
        py.detach(|| self.inner.remove(&key));
        Ok(())
    }

    #[pyo3(signature = (key, default=None))]
    fn get(
        &self,
        py: Python<'_>,
        key: &Bound<'_, PyAny>,
        default: Option<Py<PyAny>>,
    ) -> PyResult<Option<Py<PyAny>>> {
        let key = PyKey::new(key)?;
        let found = py.detach(|| self.inner.get(&key));
        Ok(found.map(PyValue::into_object).or(default))
    }

    #[pyo3(signature = (key, default=None))]
    fn pop(
        &self,
        py: Python<'_>,
        key: &Bound<'_, PyAny>,
        default: Option<Py<PyAny>>,
    ) -> PyResult<Py<PyAny>> {
        let lookup = PyKey::new(key)?;
        match (py.detach(|| self.inner.pop(&lookup)), default) {
            (Ok(value), _) => Ok(value.into_object()),
            (Err(CircularDictError::KeyNotFound), Some(default)) => Ok(default),
            (Err(CircularDictError::KeyNotFound), None) => {
                Err(PyKeyError::new_err(key.clone().unbind()))
            }
            (Err(e), _) => Err(e.into()),
        }
    }

    #[pyo3(signature = (last=true))]
    fn popitem(&self, py: Python<'_>, last: bool) -> PyResult<(Py<PyAny>, Py<PyAny>)> {
        let (key, value) = py.detach(|| {
            if last {
                self.inner.pop_newest()
            } else {
                self.inner.pop_oldest()
            }
        })?;
        Ok((key.into_object(), value.into_object()))
    }

    fn clear(&self, py: Python<'_>) {
        py.detach(|| self.inner.clear());
    }

    fn keys(&self, py: Python<'_>) -> Vec<Py<PyAny>> {
        py.detach(|| self.inner.keys())
            .into_iter()
            .map(PyKey::into_object)
            .collect()
    }

    fn values(&self, py: Python<'_>) -> Vec<Py<PyAny>> {
        py.detach(|| self.inner.values())
            .into_iter()
            .map(PyValue::into_object)
            .collect()
    }

    fn items(&self, py: Python<'_>) -> Vec<(Py<PyAny>, Py<PyAny>)> {
        py.detach(|| self.inner.items())
            .into_iter()
            .map(|(k, v)| (k.into_object(), v.into_object()))
            .collect()
    }

    fn is_empty(&self, py: Python<'_>) -> bool {
        py.detach(|| self.inner.is_empty())
    }

    fn is_full(&self, py: Python<'_>) -> bool {
        py.detach(|| self.inner.is_full())
    }
}
