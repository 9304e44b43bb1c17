//! Python bindings using PyO3.
//!
//! This module provides Python-friendly wrappers around the core Rust types.

use pyo3::exceptions::{PyMemoryError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;

use crate::buffer::NativeBuffer;
use crate::strings;
use crate::utils::expand_environment_strings;
use crate::MarshalError;
use crate::{CharWidth, ValueData as RustValueData, ValueType as RustValueType};

/// Convert Rust MarshalError to Python exception
fn marshal_error_to_py(err: MarshalError) -> PyErr {
    match err {
        MarshalError::OutOfMemory { .. } => PyMemoryError::new_err(err.to_string()),
        MarshalError::InvalidLayout { .. }
        | MarshalError::TruncatedData { .. }
        | MarshalError::UnalignedWideBuffer { .. }
        | MarshalError::InvalidUtf16 { .. }
        | MarshalError::InvalidLink { .. } => PyValueError::new_err(err.to_string()),
    }
}

fn width_from_py(width: usize) -> PyResult<CharWidth> {
    CharWidth::from_bytes(width)
        .ok_or_else(|| PyValueError::new_err(format!("Invalid character width: {} (expected 1 or 2)", width)))
}

/// Python wrapper for ValueType
#[pyclass(name = "ValueType")]
#[derive(Clone)]
pub struct PyValueType {
    inner: RustValueType,
}

#[pymethods]
impl PyValueType {
    #[new]
    fn new(type_id: u32) -> Self {
        PyValueType {
            inner: RustValueType::from_u32(type_id),
        }
    }

    /// Get the type name as string (e.g., "REG_SZ", "REG_DWORD")
    fn type_name(&self) -> String {
        self.inner.name()
    }

    /// Get the numeric type ID
    fn type_id(&self) -> u32 {
        self.inner.to_u32()
    }

    fn __repr__(&self) -> String {
        format!("ValueType({})", self.inner.name())
    }

    fn __str__(&self) -> String {
        self.inner.name()
    }
}

/// Python wrapper for ValueData
#[pyclass(name = "ValueData")]
#[derive(Clone)]
pub struct PyValueData {
    inner: RustValueData,
}

#[pymethods]
impl PyValueData {
    /// Get the value type this data encodes as
    fn value_type(&self) -> PyValueType {
        PyValueType {
            inner: self.inner.value_type(),
        }
    }

    /// Check if this is an undecoded address passthrough
    fn is_address(&self) -> bool {
        matches!(self.inner, RustValueData::Address(_))
    }

    /// Check if this is a String value
    fn is_string(&self) -> bool {
        matches!(self.inner, RustValueData::String(_) | RustValueData::ExpandString(_))
    }

    /// Check if this is a MultiString value
    fn is_multi_string(&self) -> bool {
        matches!(self.inner, RustValueData::MultiString(_))
    }

    /// Get as string (if applicable)
    fn as_string(&self) -> PyResult<String> {
        match &self.inner {
            RustValueData::String(s) | RustValueData::ExpandString(s) => Ok(s.clone()),
            RustValueData::Link(url) => Ok(url.to_string()),
            _ => Err(PyTypeError::new_err("Not a string value")),
        }
    }

    /// Get as integer (if applicable)
    fn as_int(&self) -> PyResult<u64> {
        self.inner
            .as_u64()
            .ok_or_else(|| PyTypeError::new_err("Not an integer value"))
    }

    /// Get as multi-string (if applicable)
    fn as_multi_string(&self) -> PyResult<Vec<String>> {
        match &self.inner {
            RustValueData::MultiString(strings) => Ok(strings.clone()),
            _ => Err(PyTypeError::new_err("Not a multi-string value")),
        }
    }

    /// Get as raw address (if applicable)
    fn as_address(&self) -> PyResult<usize> {
        match &self.inner {
            RustValueData::Address(address) => Ok(address.raw()),
            _ => Err(PyTypeError::new_err("Not an address passthrough")),
        }
    }

    /// Encode back into registry wire bytes
    fn to_bytes<'py>(&self, py: Python<'py>) -> &'py PyBytes {
        PyBytes::new(py, &self.inner.to_bytes())
    }

    fn __repr__(&self) -> String {
        format!("ValueData({}: {})", self.inner.value_type(), self.inner)
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python wrapper for an owned native string buffer
///
/// The buffer is wiped and released when the object is collected or
/// `free()` is called, whichever comes first.
#[pyclass(name = "NativeString")]
pub struct PyNativeString {
    inner: Option<NativeBuffer>,
    width: CharWidth,
}

#[pymethods]
impl PyNativeString {
    #[new]
    #[pyo3(signature = (value=None, width=2))]
    fn new(value: Option<&str>, width: usize) -> PyResult<Self> {
        let width = width_from_py(width)?;
        let inner = strings::allocate_string(value, width).map_err(marshal_error_to_py)?;
        Ok(PyNativeString { inner, width })
    }

    /// Read the current contents back (None when empty)
    fn read(&self) -> PyResult<Option<String>> {
        strings::read_string(self.inner.as_ref(), self.width).map_err(marshal_error_to_py)
    }

    /// Replace the contents; returns the new length, or None when now empty
    #[pyo3(signature = (value=None))]
    fn refresh(&mut self, value: Option<&str>) -> PyResult<Option<usize>> {
        strings::refresh_string(&mut self.inner, value, self.width, crate::SystemAllocator)
            .map_err(marshal_error_to_py)
    }

    /// Wipe and release the buffer now
    fn free(&mut self) {
        strings::free_string(self.inner.take());
    }

    /// Base address of the buffer (0 when empty)
    #[getter]
    fn address(&self) -> usize {
        self.inner.as_ref().map_or(0, |buffer| buffer.address().raw())
    }

    /// Size of the buffer in bytes, terminator included
    fn __len__(&self) -> usize {
        self.inner.as_ref().map_or(0, NativeBuffer::len)
    }

    fn __repr__(&self) -> String {
        format!("NativeString(width={}, len={})", self.width.bytes(), self.__len__())
    }
}

/// Decode raw registry value bytes according to a type tag
#[pyfunction]
fn decode_value(data: &[u8], value_type: u32, py: Python) -> PyResult<PyValueData> {
    let owned = data.to_vec();
    // Release GIL during decoding
    let inner = py
        .allow_threads(move || RustValueData::from_bytes(&owned, RustValueType::from_u32(value_type)))
        .map_err(marshal_error_to_py)?;
    Ok(PyValueData { inner })
}

/// Encode a string at the given character width
#[pyfunction]
#[pyo3(signature = (value, include_terminator=true, width=2))]
fn get_bytes<'py>(py: Python<'py>, value: &str, include_terminator: bool, width: usize) -> PyResult<&'py PyBytes> {
    let width = width_from_py(width)?;
    Ok(PyBytes::new(py, &strings::get_bytes(value, include_terminator, width)))
}

/// Number of bytes `get_bytes` would produce (0 for None)
#[pyfunction]
#[pyo3(signature = (value, include_terminator=true, width=2))]
fn get_byte_count(value: Option<&str>, include_terminator: bool, width: usize) -> PyResult<usize> {
    let width = width_from_py(width)?;
    Ok(strings::get_byte_count(value, include_terminator, width))
}

/// Substitute %NAME% references from the process environment
#[pyfunction]
fn expand_environment(value: &str) -> String {
    expand_environment_strings(value)
}

/// Python module definition
#[pymodule]
fn reg_marshal(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyValueType>()?;
    m.add_class::<PyValueData>()?;
    m.add_class::<PyNativeString>()?;
    m.add_function(wrap_pyfunction!(decode_value, m)?)?;
    m.add_function(wrap_pyfunction!(get_bytes, m)?)?;
    m.add_function(wrap_pyfunction!(get_byte_count, m)?)?;
    m.add_function(wrap_pyfunction!(expand_environment, m)?)?;

    // Add version constant
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
