// Lattice module: Contains the lattice basis, its reduction and the Brillouin zone construction
// This module provides the real- and reciprocal-space geometry of a tight-binding unit cell

// ======================== MODULE DECLARATIONS ========================
pub mod base_matrix;
pub mod brillouin_zone;
pub mod lattice_algorithms;
pub mod lattice_construction;
pub mod polyhedron;
pub mod voronoi_cells;

mod _tests_lattice_algorithms;

// ======================== LATTICE BASIS ========================
pub use base_matrix::LatticeBasis; // struct - three basis vectors with the number of periodic directions
// LatticeBasis impl methods:
//   new(a1, a2, a3) -> Self                                       - unchecked 3D basis
//   from_base_vectors(a1, a2, a3, dim: Dimension) -> Result<Self>  - basis in the axis convention of dim
//   from_matrix(m: Matrix3<f64>, dim: Dimension) -> Result<Self>  - same, vectors as matrix columns
//   set_dimensionality(&self, n: usize) -> Result<Self>           - enforces the axis convention for n periodic axes
//   reduce(&self) -> Result<Self>                                 - LLL reduction of the periodic block
//   reduce_with_transform(&self) -> Result<(Self, Matrix3<i64>)>  - reduction plus unimodular U, reduced = original · U
//   periodic_volume(&self) -> f64                                 - length / area / volume of the periodic cell
//   ensure_non_degenerate(&self) -> Result<f64>                   - fails with DegenerateLattice on zero volume
//   translation(&self, d: &[i32; 3]) -> Vector3<f64>              - cartesian lattice translation
//   frac_to_cart / cart_to_frac                                   - coordinate conversions

// ======================== REDUCTION ALGORITHMS ========================
pub use lattice_algorithms::{
    Reduction,           // struct - reduced vectors plus unimodular transform
    gram_schmidt,        // fn(vectors: &[Vector3<f64>]) -> (Vec<Vector3<f64>>, [[f64; 3]; 3]) - orthogonalisation with μ coefficients
    lll_reduce,          // fn(vectors: &[Vector3<f64>], delta: f64) -> Reduction - LLL reduction of up to three vectors
    integer_determinant, // fn(m: &Matrix3<i64>) -> i64 - exact integer determinant
    unimodular_inverse,  // fn(m: &Matrix3<i64>) -> Option<Matrix3<i64>> - exact inverse of a unimodular matrix
};

// ======================== GEOMETRIC POLYHEDRONS ========================
pub use polyhedron::Polyhedron; // struct - point, segment, polygon or polyhedron of a Brillouin zone
// Polyhedron impl methods:
//   new() / point(p) / segment(a, b)             - constructors
//   contains(&self, point: Vector3<f64>) -> bool - dimension-aware containment (boundary included)
//   centroid / edge_midpoints / face_centers     - derived points used by the high symmetry catalog
//   measure(&self) -> f64                        - length, area or volume

// ======================== VORONOI CELL CONSTRUCTION ========================
pub use voronoi_cells::{
    LatticePoint,                         // struct - lattice point with its integer coefficients
    compute_voronoi_cell_2d,              // fn(basis: &[Vector3<f64>; 2], max_shell, tolerance) -> Polyhedron - Voronoi cell of an in-plane lattice
    compute_voronoi_cell_3d,              // fn(basis: &[Vector3<f64>; 3], max_shell, tolerance) -> Polyhedron - Voronoi cell of a 3D lattice
    generate_lattice_points_by_shell,     // fn(basis: &[Vector3<f64>], max_shell: usize) -> Vec<LatticePoint> - neighbor points by shell
    generate_lattice_points_within_radius, // fn(basis: &[Vector3<f64>], radius: f64) -> Vec<LatticePoint> - neighbor points within radius
    voronoi_relevant_vectors,             // fn(basis: &[Vector3<f64>], max_shell: usize) -> Vec<Vector3<f64>> - facet-defining neighbors
};

// ======================== BRILLOUIN ZONE ========================
pub use brillouin_zone::{
    BrillouinZone,        // struct - zone polytope, reciprocal basis and high symmetry catalog
    BrillouinZoneBuilder, // struct - reciprocal_vectors / compute_zone / high_symmetry_points / build
};

// ======================== LATTICE CONSTRUCTION UTILITIES ========================
pub use lattice_construction::{
    // === 1D / 2D LATTICE CONSTRUCTORS ===
    chain_lattice,               // fn(a: f64) -> Result<LatticeBasis> - 1D chain along x
    square_lattice,              // fn(a: f64) -> Result<LatticeBasis> - square lattice with parameter a
    rectangular_lattice,         // fn(a: f64, b: f64) -> Result<LatticeBasis> - rectangular lattice
    hexagonal_lattice,           // fn(a: f64) -> Result<LatticeBasis> - hexagonal lattice, 60° between a1 and a2
    oblique_lattice,             // fn(a: f64, b: f64, gamma: f64) -> Result<LatticeBasis> - oblique lattice with angle γ

    // === 3D LATTICE CONSTRUCTORS ===
    simple_cubic_lattice,        // fn(a: f64) -> Result<LatticeBasis> - simple cubic lattice
    face_centered_cubic_lattice, // fn(a: f64) -> Result<LatticeBasis> - FCC primitive vectors
    body_centered_cubic_lattice, // fn(a: f64) -> Result<LatticeBasis> - BCC primitive vectors
    tetragonal_lattice,          // fn(a: f64, c: f64) -> Result<LatticeBasis> - tetragonal lattice

    // === LATTICE TRANSFORMATIONS ===
    scale_lattice,               // fn(basis: &LatticeBasis, scale: f64) -> Result<LatticeBasis> - scales periodic vectors
};
