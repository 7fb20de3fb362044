// Constants

// Tolerances
pub const BASE_VECTOR_TOLERANCE: f64 = 1e-10; // For construction and projection of basis vectors
pub const LATTICE_TOLERANCE: f64 = 1e-10; // For most lattice operations (relative volume checks)
pub const ZONE_TOLERANCE: f64 = 1e-8; // Vertex merging and plane membership in zone construction
pub const HERMITICITY_TOLERANCE: f64 = 1e-12; // Conjugate-partner comparison of hopping amplitudes
pub const EIGEN_TOLERANCE: f64 = 1e-14; // Convergence threshold handed to the Hermitian eigensolver

// Algorithm parameters
pub const LLL_DELTA: f64 = 0.75; // Lovász condition parameter
pub const ZONE_NEIGHBOR_SHELL: usize = 2; // Coefficient range of reciprocal neighbors for zone construction
pub const EIGEN_MAX_ITERATIONS: usize = 100_000; // Per-point iteration cap before a point is flagged as failed

// Defaults exposed to front ends
pub const DEFAULT_GRID_DIVISIONS: (usize, usize, usize) = (30, 30, 30);
pub const DEFAULT_PATH_POINTS: usize = 100;
pub const DEFAULT_DOS_BINS: usize = 100;
pub const DEFAULT_DOS_POINTS: usize = 500;
pub const DEFAULT_BROADENING: f64 = 0.05;
