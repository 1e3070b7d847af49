//! Errors raised while building meshes and decompositions, or while
//! writing diagnostic output

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagnosticError {
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("cannot split {size} indices among {nranks} processes")]
    Unsplittable { size: usize, nranks: usize },

    #[error("rank {rank} covers [{start}, {end}), expected it to start at {expected}")]
    OutOfOrder { rank: usize, start: usize, end: usize, expected: usize },

    #[error("unable to write '{}': {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("unexpected array shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("FITS output failed: {0}")]
    Fits(#[from] fitsio::errors::Error),
}

impl DiagnosticError {
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> DiagnosticError {
        let path = path.into();
        move |source| DiagnosticError::Io { path, source }
    }
}
