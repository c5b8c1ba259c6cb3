use pyo3::prelude::*;

use circular_dict::python::circular::PyCircularDict;

#[pymodule]
fn _circular_dict_pyo3(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyCircularDict>()?;
    Ok(())
}
