//! Uniform one-dimensional meshes for the position and velocity axes

use ndarray::prelude::*;
use crate::error::DiagnosticError;

/// An immutable, uniformly spaced set of sample points spanning
/// `[min, max]`, both ends included.
#[derive(Clone, Debug)]
pub struct Mesh {
    samples: Array1<f64>,
    min: f64,
    max: f64,
}

impl Mesh {
    /// Constructs a mesh of `size` points, the first at `min` and
    /// the last at `max`.
    pub fn new(min: f64, max: f64, size: usize) -> Result<Mesh, DiagnosticError> {
        if size < 2 {
            return Err(DiagnosticError::InvalidMesh(format!("need at least two points, got {}", size)));
        }
        if !(max > min) {
            return Err(DiagnosticError::InvalidMesh(format!("bounds [{}, {}] are empty", min, max)));
        }

        let step = (max - min) / ((size - 1) as f64);
        let samples = Array1::from_shape_fn(size, |i| {
            if i == size - 1 {max} else {min + (i as f64) * step}
        });

        Ok(Mesh {
            samples: samples,
            min: min,
            max: max,
        })
    }

    pub fn samples(&self) -> &[f64] {
        // from_shape_fn always yields standard layout
        self.samples.as_slice().unwrap_or(&[])
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn size(&self) -> usize {
        self.samples.len()
    }

    /// Spacing used for quadrature, assuming uniform samples.
    pub fn delta(&self) -> f64 {
        (self.max - self.min) / ((self.size() - 1) as f64)
    }

    /// Length of the interval covered by the mesh.
    pub fn extent(&self) -> f64 {
        self.max - self.min
    }

    /// Maps `x` back into `[min, max)`, treating the mesh as periodic.
    pub fn wrap(&self, x: f64) -> f64 {
        self.min + (x - self.min).rem_euclid(self.extent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn endpoints_are_exact() {
        let mesh = Mesh::new(-6.0, 6.0, 97).unwrap();
        let v = mesh.samples();
        assert_eq!(v.len(), 97);
        assert_eq!(v[0], -6.0);
        assert_eq!(v[96], 6.0);
        assert!(v.windows(2).all(|w| w[1] > w[0]));
        assert_relative_eq!(mesh.delta(), 0.125);
    }

    #[test]
    fn rejects_degenerate_meshes() {
        assert!(Mesh::new(0.0, 1.0, 1).is_err());
        assert!(Mesh::new(1.0, 1.0, 8).is_err());
        assert!(Mesh::new(2.0, 1.0, 8).is_err());
    }

    #[test]
    fn wraps_into_domain() {
        let mesh = Mesh::new(0.0, 4.0, 5).unwrap();
        assert_relative_eq!(mesh.wrap(5.5), 1.5);
        assert_relative_eq!(mesh.wrap(-0.5), 3.5);
        assert_relative_eq!(mesh.wrap(4.0), 0.0);
    }
}
