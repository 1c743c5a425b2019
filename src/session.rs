//! Glue shared by the Python-facing sessions.

use numpy::{PyArray1, PyArray2, PyArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::audio_engine::errors::SessionError;
use crate::messages::PcmBuffer;

impl From<SessionError> for PyErr {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Playback(err) => PyRuntimeError::new_err(err.to_string()),
            err => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Key symbol from a Python string holding exactly one character.
pub fn parse_key(key: &str) -> PyResult<char> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(symbol), None) => Ok(symbol),
        _ => Err(PyValueError::new_err(format!(
            "expected a single key symbol, got {key:?}"
        ))),
    }
}

/// Copies `buffer` into an `int16` array shaped `(frames, channels)`.
pub fn to_pyarray<'py>(
    py: Python<'py>,
    buffer: &PcmBuffer,
) -> PyResult<Bound<'py, PyArray2<i16>>> {
    PyArray1::from_slice(py, &buffer.samples)
        .reshape([buffer.frames(), usize::from(buffer.format.channels)])
}
