use log::{info, warn};
use nalgebra::{DMatrix, SymmetricEigen, Vector3};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::{EIGEN_MAX_ITERATIONS, EIGEN_TOLERANCE};
use crate::errors::{Result, TbError};
use crate::interfaces::Dimension;
use crate::lattice::{BrillouinZoneBuilder, LatticeBasis};
use crate::model::{BlochHamiltonian, UnitCell};
use crate::spectrum::mesh::{generate_mesh, MeshSpec};
use crate::symmetries::BandPath;

/// Completed points out of the total of one solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Cooperative cancellation flag and optional progress channel for a solve
#[derive(Debug, Clone, Default)]
pub struct SolveControl {
    cancel: Arc<AtomicBool>,
    progress: Option<Sender<Progress>>,
}

impl SolveControl {
    pub fn new(cancel: Arc<AtomicBool>, progress: Option<Sender<Progress>>) -> Self {
        Self { cancel, progress }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn report(&self, completed: usize, total: usize) {
        if let Some(sender) = &self.progress {
            // A dropped receiver only means nobody is listening
            let _ = sender.send(Progress { completed, total });
        }
    }
}

/// Eigen-decomposition at one k-point; empty on numerical failure
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumPoint {
    pub k: Vector3<f64>,
    /// Ascending eigenvalues
    pub eigenvalues: Vec<f64>,
    /// Column n is the eigenvector of eigenvalue n
    pub eigenvectors: DMatrix<Complex64>,
    pub ok: bool,
}

/// Per-point eigenvalues and eigenvectors of a path or grid solve
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    points: Vec<SpectrumPoint>,
    state_count: usize,
}

impl Spectrum {
    pub fn points(&self) -> &[SpectrumPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn k_points(&self) -> Vec<Vector3<f64>> {
        self.points.iter().map(|p| p.k).collect()
    }

    /// Indices of points whose diagonalization failed
    pub fn failed_points(&self) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.ok)
            .map(|(i, _)| i)
            .collect()
    }

    /// Energy of band n at every point, NaN where the point failed
    pub fn band(&self, n: usize) -> Result<Vec<f64>> {
        if n >= self.state_count {
            return Err(TbError::UnknownState {
                index: n,
                count: self.state_count,
            });
        }
        Ok(self
            .points
            .iter()
            .map(|p| p.eigenvalues.get(n).copied().unwrap_or(f64::NAN))
            .collect())
    }

    /// Eigenvalues of all successful points, point-major
    pub fn all_eigenvalues(&self) -> Vec<f64> {
        self.points
            .iter()
            .filter(|p| p.ok)
            .flat_map(|p| p.eigenvalues.iter().copied())
            .collect()
    }

    /// Projection weights aligned with [`all_eigenvalues`](Self::all_eigenvalues)
    pub fn projection_weights(&self, subset: &[usize]) -> Result<Vec<f64>> {
        let mut weights = Vec::with_capacity(self.points.len() * self.state_count);
        for point in self.points.iter().filter(|p| p.ok) {
            weights.extend(projection(&point.eigenvectors, subset)?);
        }
        Ok(weights)
    }
}

/// Weight of every eigenvector (matrix column) on a subset of states: Σᵢ |vᵢ|²
pub fn projection(eigenvectors: &DMatrix<Complex64>, subset: &[usize]) -> Result<Vec<f64>> {
    let size = eigenvectors.nrows();
    if let Some(&index) = subset.iter().find(|&&i| i >= size) {
        return Err(TbError::UnknownState { index, count: size });
    }
    Ok(eigenvectors
        .column_iter()
        .map(|column| subset.iter().map(|&i| column[i].norm_sqr()).sum::<f64>())
        .collect())
}

/// Hermitian eigen-decomposition with ascending eigenvalues.
///
/// Only the lower triangle of `h` is read. Returns `None` if the iteration
/// does not converge or produces non-finite values.
pub fn diagonalize(h: DMatrix<Complex64>) -> Option<(Vec<f64>, DMatrix<Complex64>)> {
    let size = h.nrows();
    let eigen = SymmetricEigen::try_new(h, EIGEN_TOLERANCE, EIGEN_MAX_ITERATIONS)?;
    if eigen.eigenvalues.iter().any(|e| !e.is_finite()) {
        return None;
    }

    let mut order: Vec<usize> = (0..size).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

    let eigenvalues = order.iter().map(|&i| eigen.eigenvalues[i]).collect();
    let eigenvectors = DMatrix::from_fn(size, size, |row, col| eigen.eigenvectors[(row, order[col])]);
    Some((eigenvalues, eigenvectors))
}

/// Diagonalizes the Bloch Hamiltonian of one unit cell snapshot
#[derive(Debug, Clone)]
pub struct SpectralSolver {
    basis: LatticeBasis,
    hamiltonian: BlochHamiltonian,
}

impl SpectralSolver {
    /// Fails with [`TbError::DimensionMismatch`] for a 0D cell or a cell without states
    pub fn new(cell: &UnitCell) -> Result<Self> {
        if cell.basis().dimension() == Dimension::_0D {
            return Err(TbError::DimensionMismatch(
                "a 0D system has no Brillouin zone to sample".to_string(),
            ));
        }
        if cell.state_count() == 0 {
            return Err(TbError::DimensionMismatch("the unit cell has no states".to_string()));
        }
        Ok(Self {
            basis: cell.basis().clone(),
            hamiltonian: BlochHamiltonian::new(cell),
        })
    }

    pub fn state_count(&self) -> usize {
        self.hamiltonian.size()
    }

    pub fn solve_path(&self, path: &BandPath) -> Result<Spectrum> {
        self.solve_path_with(path, &SolveControl::default())
    }

    pub fn solve_path_with(&self, path: &BandPath, control: &SolveControl) -> Result<Spectrum> {
        self.solve_points(&path.k_points(), control)
    }

    pub fn solve_grid(&self, spec: &MeshSpec) -> Result<Spectrum> {
        self.solve_grid_with(spec, &SolveControl::default())
    }

    pub fn solve_grid_with(&self, spec: &MeshSpec, control: &SolveControl) -> Result<Spectrum> {
        let reciprocal = BrillouinZoneBuilder::new(&self.basis).reciprocal_vectors()?;
        let points = generate_mesh(&reciprocal, self.basis.dimension(), spec)?;
        self.solve_points(&points, control)
    }

    /// Solve at arbitrary cartesian k-points.
    ///
    /// The cancellation flag is checked before each point; a cancelled solve
    /// returns [`TbError::SolverCancelled`] and no partial data.
    pub fn solve_points(&self, k_points: &[Vector3<f64>], control: &SolveControl) -> Result<Spectrum> {
        let total = k_points.len();
        info!("solving {} k-points with {} states", total, self.state_count());

        let points = self.run(k_points, control)?;

        let failed = points.iter().filter(|p| !p.ok).count();
        if failed > 0 {
            warn!("{} of {} k-points failed to diagonalize", failed, total);
        }
        info!("solve finished: {} k-points", total);
        Ok(Spectrum {
            points,
            state_count: self.state_count(),
        })
    }

    fn solve_point(&self, k: &Vector3<f64>) -> SpectrumPoint {
        match diagonalize(self.hamiltonian.at(k)) {
            Some((eigenvalues, eigenvectors)) => SpectrumPoint {
                k: *k,
                eigenvalues,
                eigenvectors,
                ok: true,
            },
            None => {
                warn!("diagonalization failed at k = {:?}", k.as_slice());
                SpectrumPoint {
                    k: *k,
                    eigenvalues: Vec::new(),
                    eigenvectors: DMatrix::zeros(0, 0),
                    ok: false,
                }
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run(&self, k_points: &[Vector3<f64>], control: &SolveControl) -> Result<Vec<SpectrumPoint>> {
        let total = k_points.len();
        let mut points = Vec::with_capacity(total);
        for (index, k) in k_points.iter().enumerate() {
            if control.is_cancelled() {
                return Err(TbError::SolverCancelled);
            }
            points.push(self.solve_point(k));
            control.report(index + 1, total);
        }
        Ok(points)
    }

    // Chunks of one point per worker thread; cancellation and progress between chunks
    #[cfg(feature = "parallel")]
    fn run(&self, k_points: &[Vector3<f64>], control: &SolveControl) -> Result<Vec<SpectrumPoint>> {
        let total = k_points.len();
        let chunk_size = rayon::current_num_threads().max(1);
        let mut points = Vec::with_capacity(total);
        for chunk in k_points.chunks(chunk_size) {
            if control.is_cancelled() {
                return Err(TbError::SolverCancelled);
            }
            let solved: Vec<SpectrumPoint> = chunk.par_iter().map(|k| self.solve_point(k)).collect();
            points.extend(solved);
            control.report(points.len(), total);
        }
        Ok(points)
    }
}
