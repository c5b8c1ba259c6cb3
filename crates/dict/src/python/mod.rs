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

//! Python bindings from [PyO3](https://pyo3.rs).

pub mod circular;

use pyo3::{
    exceptions::{PyKeyError, PyMemoryError, PyOverflowError, PyValueError},
    prelude::*,
};

use crate::cache::CircularDictError;

impl From<CircularDictError> for PyErr {
    fn from(e: CircularDictError) -> Self {
        match e {
            CircularDictError::Config(_) => PyValueError::new_err(e.to_string()),
            CircularDictError::CapacityExceeded { .. } => PyMemoryError::new_err(e.to_string()),
            CircularDictError::SizeOverflow { .. } => PyOverflowError::new_err(e.to_string()),
            CircularDictError::KeyNotFound | CircularDictError::EmptyContainer => {
                PyKeyError::new_err(e.to_string())
            }
        }
    }
}

/// Loaded as `circular_dict.dict`.
///
/// # Errors
///
/// Returns a `PyErr` if registering any module components fails.
#[pymodule]
pub fn dict(_: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<circular::PyCircularDict>()?;
    Ok(())
}
