use crate::map::MapError;
use pyo3::exceptions::PyValueError;
use pyo3::PyErr;
use std::io;
use std::path::PathBuf;

/// Errors raised while setting up or rendering the environment.
#[derive(Debug, thiserror::Error)]
pub enum AntsError {
    #[error("could not read map file {path:?}: {source}")]
    ReadMap {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid map: {0}")]
    Map(#[from] MapError),
    #[error(transparent)]
    Options(#[from] clap::Error),
    #[error("unknown render mode '{0}', expected 'human' or 'ansi'")]
    UnknownRenderMode(String),
    #[error("could not render the board: {0}")]
    Render(#[from] io::Error),
}

impl From<AntsError> for PyErr {
    fn from(error: AntsError) -> PyErr {
        PyValueError::new_err(error.to_string())
    }
}
