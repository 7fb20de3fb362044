// Symmetries module: Contains high symmetry points and band path sampling
// This module provides Brillouin zone navigation for dispersion calculations

// ======================== MODULE DECLARATIONS ========================
pub mod band_path;
pub mod high_symmetry_points;


// ======================== HIGH SYMMETRY POINTS ========================
pub use high_symmetry_points::{
    PointKind,           // enum - Gamma, Vertex, EdgeMidpoint, FaceCenter
    HighSymmetryPoint,   // struct - labelled point with kind and cartesian position
    HighSymmetryCatalog, // struct - deduplicated points of one zone
};

// HighSymmetryCatalog impl methods:
//   from_zone(dim, reciprocal: &Matrix3<f64>, zone: &Polyhedron, tol: f64) -> Self - populates the catalog
//   get_point(&self, label: &str) -> Option<&HighSymmetryPoint>                  - retrieves point by label
//   of_kind(&self, kind: PointKind) -> impl Iterator                             - points of one kind
//   positions(&self, labels: &[&str]) -> Result<Vec<Vector3<f64>>>               - anchors for a band path

// ======================== BAND PATHS ========================
pub use band_path::{
    BandPath,                 // struct - ordered k-points with cumulative arc length
    PathPoint,                // struct - k-point, arc length and anchor/interior tag
    PathPointKind,            // enum - Anchor(index) or Interior
    allocate_interior_points, // fn(lengths: &[f64], budget: usize) -> Vec<usize> - largest-remainder allocation
    build_path,               // fn(anchors: &[Vector3<f64>], target_count: usize) -> Result<BandPath> - samples a path
};
