use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::error::DiagnosticError;

/// Saves the one-dimensional function `values`, sampled at `x`, to the
/// two-column text file `<folder><tag><index>.dat`, with the index
/// zero-padded to six digits. The first line holds the simulation
/// time.
///
/// Numbers are printed in shortest round-trip form, so the file can be
/// read back without loss. Purely local: callers choose which process
/// writes.
pub fn write_profile(values: &[f64], x: &[f64], tag: &str, folder: &str, index: usize, time: f64) -> Result<PathBuf, DiagnosticError> {
    assert_eq!(values.len(), x.len());
    let path = PathBuf::from(format!("{}{}{:06}.dat", folder, tag, index));

    let write = || -> std::io::Result<()> {
        let mut file = BufWriter::new(File::create(&path)?);
        writeln!(file, "{}", time)?;
        for (x, f) in x.iter().zip(values) {
            writeln!(file, "{} {}", x, f)?;
        }
        file.flush()
    };

    write().map_err(DiagnosticError::io(&path))?;
    Ok(path)
}

/// A scalar quantity recorded once per output, as `time value` lines
/// in `<folder><tag>.dat`.
pub struct TimeSeries {
    path: PathBuf,
    file: BufWriter<File>,
}

impl TimeSeries {
    pub fn create(folder: &str, tag: &str) -> Result<TimeSeries, DiagnosticError> {
        let path = PathBuf::from(format!("{}{}.dat", folder, tag));
        let file = File::create(&path).map_err(DiagnosticError::io(&path))?;
        Ok(TimeSeries {
            path: path,
            file: BufWriter::new(file),
        })
    }

    /// Appends a line, flushing so that partial runs leave usable output.
    pub fn record(&mut self, time: f64, value: f64) -> Result<(), DiagnosticError> {
        let file = &mut self.file;
        writeln!(file, "{} {}", time, value)
            .and_then(|_| file.flush())
            .map_err(DiagnosticError::io(&self.path))
    }
}
