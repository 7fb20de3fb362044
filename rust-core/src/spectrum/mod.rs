// Spectrum module: Contains k-point meshes, the spectral solver and density of states estimation
// This module turns a Bloch Hamiltonian into band structures and DOS curves

// ======================== MODULE DECLARATIONS ========================
pub mod density_of_states;
pub mod mesh;
pub mod solver;
pub mod worker;

// Test modules
mod _tests_density_of_states;
mod _tests_worker;

// ======================== MESHES ========================
pub use mesh::{
    MeshSpec,       // struct - mesh kind and divisions (n1, n2, n3)
    mesh_fractions, // fn(kind: MeshKind, n: usize) -> Vec<f64> - fractional coordinates along one axis
    generate_mesh,  // fn(reciprocal: &Matrix3<f64>, dim: Dimension, spec: &MeshSpec) -> Result<Vec<Vector3<f64>>> - cartesian grid
};

// ======================== SPECTRAL SOLVER ========================
pub use solver::{
    Progress,       // struct - completed / total points
    SolveControl,   // struct - cancel flag and progress sender
    SpectralSolver, // struct - solve_path / solve_grid / solve_points
    Spectrum,       // struct - per-point eigenvalues, eigenvectors and success flags
    SpectrumPoint,  // struct - one k-point of a spectrum
    diagonalize,    // fn(h: DMatrix<Complex64>) -> Option<(Vec<f64>, DMatrix<Complex64>)> - ascending Hermitian eigenpairs
    projection,     // fn(eigenvectors: &DMatrix<Complex64>, subset: &[usize]) -> Result<Vec<f64>> - subset weights
};

// ======================== DENSITY OF STATES ========================
pub use density_of_states::{
    DosCurve,     // struct - energies and DOS values
    DosHistogram, // struct - bin edges and summed weights
    histogram,    // fn(eigenvalues: &[f64], num_bins: usize, weights: Option<&[f64]>) -> Result<DosHistogram>
    lorentzian,   // fn(eigenvalues: &[f64], num_points: usize, broadening: f64, weights: Option<&[f64]>) -> Result<DosCurve>
};

// ======================== WORKER ========================
pub use worker::{
    Session,      // struct - unit cell snapshot with at most one in-flight solve
    SolveHandle,  // struct - cancel / latest_progress / wait
    SolveRequest, // enum - Path(BandPath) or Grid(MeshSpec)
    spawn_solve,  // fn(cell: &UnitCell, request: SolveRequest) -> Result<SolveHandle> - starts a solver thread
};
