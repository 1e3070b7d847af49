use crate::comm::Collective;
use crate::layout::LayoutMode;
use crate::mesh::Mesh;
use crate::phase_space::PhaseSpace;

/// Returns the integral over x and v of `factor * v^2 / 2 * f`,
/// summed over all processes.
pub fn kinetic_energy(comm: &impl Collective, f: &mut PhaseSpace, xmesh: &Mesh, vmesh: &Mesh, factor: f64) -> f64 {
    f.ensure_layout(comm, LayoutMode::ByPosition);

    let v = vmesh.samples();
    let local = f.block()
        .outer_iter()
        .map(|row| row.iter().zip(v).map(|(f, v)| f * v * v).sum::<f64>())
        .sum::<f64>();

    let local = local * vmesh.delta() * xmesh.delta() * factor * 0.5;
    comm.all_reduce_sum(local)
}

/// Computes the charge density `rho(x) = int f(x, v) dv` by the
/// trapezoidal rule, and assembles it in full on every process.
pub fn spatial_density(comm: &impl Collective, f: &mut PhaseSpace, vmesh: &Mesh, rho: &mut [f64]) {
    f.ensure_layout(comm, LayoutMode::ByPosition);
    assert_eq!(vmesh.size(), f.nv());

    let dv = vmesh.delta();
    f.all_gather_rows(comm, 1, rho, |row, out| {
        let n = row.len();
        let interior = row.iter().skip(1).take(n - 2).sum::<f64>();
        out[0] = (0.5 * row[0] + interior + 0.5 * row[n - 1]) * dv;
    });
}

/// L2 norm of a field known on every process, by the left-rectangle
/// rule over the periodic cell (the last point is not counted).
pub fn field_energy(e: &[f64], x: &[f64]) -> f64 {
    assert!(x.len() >= 2 && e.len() >= x.len());
    let n = x.len() - 1;
    let dx = (x[n] - x[0]) / (n as f64);
    let sum = e[..n].iter().map(|e| e * e).sum::<f64>();
    (sum * dx).sqrt()
}
