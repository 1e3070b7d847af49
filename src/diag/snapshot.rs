use ndarray::prelude::*;
use fitsio::FitsFile;
use tracing::debug;

use crate::comm::Collective;
use crate::error::DiagnosticError;
use crate::layout::LayoutMode;
use crate::mesh::Mesh;
use crate::phase_space::PhaseSpace;

/// The complete distribution function at one output time.
pub struct Snapshot<'a> {
    pub index: usize,
    pub time: f64,
    pub tag: &'a str,
    pub folder: &'a str,
    pub xmesh: &'a Mesh,
    pub vmesh: &'a Mesh,
    /// Indexed `[position][velocity]`.
    pub values: Array2<f64>,
}

/// Somewhere to put snapshots. Only ever invoked on rank 0.
pub trait SnapshotSink {
    fn write(&mut self, snapshot: &Snapshot) -> Result<(), DiagnosticError>;
}

/// Writes each snapshot as a FITS image, `<folder><tag><index>.fits`,
/// overwriting any existing file. Velocity is the first (fastest) image
/// axis and position the second.
pub struct FitsSink;

impl SnapshotSink for FitsSink {
    fn write(&mut self, snapshot: &Snapshot) -> Result<(), DiagnosticError> {
        use fitsio::images::{ImageDescription, ImageType};

        let filename = format!("!{}{}{:06}.fits", snapshot.folder, snapshot.tag, snapshot.index);
        let (nx, nv) = snapshot.values.dim();
        let dimensions = [nx, nv];
        let desc = ImageDescription {
            data_type: ImageType::Double,
            dimensions: &dimensions,
        };
        let mut file = FitsFile::create(&filename).with_custom_primary(&desc).open()?;
        let hdu = file.hdu(0)?;

        let axes = [("v", snapshot.vmesh), ("x", snapshot.xmesh)];
        for (i, (name, mesh)) in axes.iter().enumerate() {
            hdu.write_key(&mut file, &format!("CRPIX{}", i+1), 1.0)?;
            hdu.write_key(&mut file, &format!("CRVAL{}", i+1), mesh.min())?;
            hdu.write_key(&mut file, &format!("CDELT{}", i+1), mesh.delta())?;
            hdu.write_key(&mut file, &format!("CNAME{}", i+1), *name)?;
        }

        hdu.write_key(&mut file, "TIME", snapshot.time)?;
        hdu.write_key(&mut file, "INDEX", snapshot.index as i64)?;
        hdu.write_key(&mut file, "OBJECT", snapshot.tag)?;

        let min = snapshot.values.iter().cloned().fold(std::f64::INFINITY, f64::min);
        let max = snapshot.values.iter().cloned().fold(-std::f64::INFINITY, f64::max);
        hdu.write_key(&mut file, "DATAMIN", min)?;
        hdu.write_key(&mut file, "DATAMAX", max)?;

        let data: Vec<f64> = snapshot.values.iter().cloned().collect();
        hdu.write_image(&mut file, &data[..])?;

        Ok(())
    }
}

/// Assembles the whole distribution function and passes it to `sink`
/// on rank 0. For periodic domains the last position row is replaced by
/// the first, closing the domain.
///
/// Collective: every process pays for the gather, but only rank 0 writes.
pub fn distribution_snapshot<S: SnapshotSink>(
    comm: &impl Collective, f: &mut PhaseSpace,
    xmesh: &Mesh, vmesh: &Mesh,
    index: usize, time: f64, tag: &str, folder: &str,
    is_periodic: bool, sink: &mut S) -> Result<(), DiagnosticError> {

    f.ensure_layout(comm, LayoutMode::ByPosition);
    let (nx, nv) = (f.nx(), f.nv());
    assert_eq!((xmesh.size(), vmesh.size()), (nx, nv));

    let mut minf = std::f64::INFINITY;
    let mut maxf = -std::f64::INFINITY;
    let mut values = vec![0.0; nx * nv];

    f.all_gather_rows(comm, nv, &mut values, |row, out| {
        for (o, &s) in out.iter_mut().zip(row.iter()) {
            *o = s;
            minf = minf.min(s);
            maxf = maxf.max(s);
        }
    });

    debug!("rank {}: (min, max) of {} = ({:e}, {:e})", comm.rank(), tag, minf, maxf);

    if comm.rank() != 0 {
        return Ok(());
    }

    let mut values = Array2::from_shape_vec((nx, nv), values)?;
    if is_periodic {
        let first = values.row(0).to_owned();
        values.row_mut(nx - 1).assign(&first);
    }

    sink.write(&Snapshot {
        index: index,
        time: time,
        tag: tag,
        folder: folder,
        xmesh: xmesh,
        vmesh: vmesh,
        values: values,
    })
}
