//! Electrostatic field of the electron density, in units where the
//! ions form a fixed neutralizing background.

use crate::mesh::Mesh;

/// Integrates Gauss's law, `dE/dx = n_i - rho`, outward from the left
/// boundary with the trapezoidal rule.
///
/// For periodic domains the background `n_i` is the mean electron
/// density over the cell (the repeated endpoint is not counted) and the
/// field is shifted to have zero mean, otherwise `n_i = 1` and `E = 0`
/// at the left boundary.
pub fn electric_field(rho: &[f64], xmesh: &Mesh, is_periodic: bool) -> Vec<f64> {
    assert_eq!(rho.len(), xmesh.size());
    let n = rho.len();
    let dx = xmesh.delta();

    let background = if is_periodic {
        rho[..n - 1].iter().sum::<f64>() / ((n - 1) as f64)
    } else {
        1.0
    };

    let mut e = vec![0.0; n];
    for i in 1..n {
        let q = 0.5 * ((background - rho[i - 1]) + (background - rho[i]));
        e[i] = e[i - 1] + dx * q;
    }

    if is_periodic {
        let mean = e[..n - 1].iter().sum::<f64>() / ((n - 1) as f64);
        e.iter_mut().for_each(|e| *e -= mean);
    }

    e
}
