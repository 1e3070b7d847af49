use std::error::Error;
use std::path::PathBuf;

use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod comm;
mod diag;
mod error;
mod layout;
mod mesh;
mod phase_space;
mod poisson;
mod setup;

use diag::*;
use error::DiagnosticError;
use layout::LayoutMode;
use mesh::Mesh;
use phase_space::PhaseSpace;
use setup::*;

fn run(world: &SimpleCommunicator) -> Result<(), Box<dyn Error>> {
    let id = world.rank();

    // Prepare configuration file

    let args: Vec<String> = std::env::args().collect();
    let path = args
        .get(1)
        .ok_or(InputError::InvalidInputFile("no file supplied"))?;
    let path = PathBuf::from(path);

    let mut config = Configuration::from_file(&path)?;
    config.with_context("constants");

    let input_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let output_dir = input_dir.join(config.string_or("output", "folder", ""));
    let folder = format!("{}/", output_dir.display());

    // Phase-space mesh

    let nx = config.count("control", "nx", 2)?;
    let nv = config.count("control", "nv", 2)?;
    let xmesh = Mesh::new(config.real("control", "xmin")?, config.real("control", "xmax")?, nx)?;
    let vmesh = Mesh::new(config.real("control", "vmin")?, config.real("control", "vmax")?, nv)?;
    let tend = config.real("control", "end")?;
    let n_outputs = config.count("control", "n_outputs", 1)?;
    let is_periodic = config.bool("control", "periodic").unwrap_or(true);

    let f0 = config.func2("distribution", "f0", ["x", "v"])?;
    let factor = config.real_or("distribution", "kinetic_factor", 1.0)?;

    let f_tag = config.string_or("output", "f", "f");
    let rho_tag = config.string_or("output", "rho", "rho");
    let e_tag = config.string_or("output", "E", "E");

    let mut f = PhaseSpace::new(world, nx, nv, LayoutMode::ByVelocity)?;
    let mut rho = vec![0.0; nx];
    let mut sink = FitsSink;

    let mut series = if id == 0 {
        std::fs::create_dir_all(&output_dir).map_err(DiagnosticError::io(&output_dir))?;
        Some((
            TimeSeries::create(&folder, "kinetic_energy")?,
            TimeSeries::create(&folder, "field_energy")?,
        ))
    } else {
        None
    };

    if id == 0 {
        info!(
            "Running on {} processes, {} x {} phase-space mesh, writing to {}...",
            f.nranks(), nx, nv, output_dir.display()
        );
    }

    let runtime = std::time::Instant::now();

    for i in 0..=n_outputs {
        let t = tend * (i as f64) / (n_outputs as f64);

        // Free streaming moves f along x, so needs whole rows in x
        f.ensure_layout(world, LayoutMode::ByVelocity);
        if is_periodic {
            f.fill(&xmesh, &vmesh, |x, v| f0(xmesh.wrap(x - v * t), v));
        } else {
            f.fill(&xmesh, &vmesh, |x, v| f0(x - v * t, v));
        }

        spatial_density(world, &mut f, &vmesh, &mut rho);
        let e = poisson::electric_field(&rho, &xmesh, is_periodic);

        let kinetic = kinetic_energy(world, &mut f, &xmesh, &vmesh, factor);
        let electrostatic = field_energy(&e, xmesh.samples());

        distribution_snapshot(world, &mut f, &xmesh, &vmesh, i, t, &f_tag, &folder, is_periodic, &mut sink)?;
        debug!("rank {}: output {} done, f is {}", id, i, f.layout());

        if let Some((ke, fe)) = series.as_mut() {
            write_profile(&rho, xmesh.samples(), &rho_tag, &folder, i, t)?;
            write_profile(&e, xmesh.samples(), &e_tag, &folder, i, t)?;
            ke.record(t, kinetic)?;
            fe.record(t, electrostatic)?;

            info!(
                "Output {: >4} at t = {: >8.3}, kinetic = {:.6e}, |E| = {:.6e}, RT = {}",
                i, t, kinetic, electrostatic, PrettyDuration::from(runtime.elapsed())
            );
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let universe = mpi::initialize().ok_or("unable to initialize MPI")?;
    let world = universe.world();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    if let Err(e) = run(&world) {
        error!("rank {}: {}", world.rank(), e);
        // the other processes may be waiting in a collective
        world.abort(1);
    }

    Ok(())
}
