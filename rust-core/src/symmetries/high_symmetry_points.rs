use log::debug;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TbError};
use crate::interfaces::Dimension;
use crate::lattice::polyhedron::Polyhedron;

/// Geometric origin of a high symmetry point in the Brillouin zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointKind {
    Gamma,        // Γ: Center of BZ (0,0,0)
    Vertex,       // Corner of the zone
    EdgeMidpoint, // Middle of a zone edge
    FaceCenter,   // Center of a zone face (3D only)
}

impl PointKind {
    /// Label prefix used when numbering points of this kind
    pub fn prefix(&self) -> &str {
        match self {
            Self::Gamma => "Γ",
            Self::Vertex => "V",
            Self::EdgeMidpoint => "E",
            Self::FaceCenter => "F",
        }
    }
}

/// A high symmetry point in the Brillouin zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighSymmetryPoint {
    /// Label for the point (Γ, V1, E2, F1, ...)
    pub label: String,
    pub kind: PointKind,
    /// Position in reciprocal space (cartesian coordinates)
    pub position: Vector3<f64>,
}

impl HighSymmetryPoint {
    /// Create a new high symmetry point
    pub fn new(label: impl Into<String>, kind: PointKind, position: Vector3<f64>) -> Self {
        Self {
            label: label.into(),
            kind,
            position,
        }
    }
}

/// Catalog of the high symmetry points of one Brillouin zone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighSymmetryCatalog {
    points: Vec<HighSymmetryPoint>,
}

impl HighSymmetryCatalog {
    /// Create new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the catalog from a zone polytope.
    ///
    /// Γ is always present. 1D adds both zone-boundary points. 2D adds vertices
    /// and edge midpoints, 3D additionally face centers. In 2D and 3D points that
    /// differ by a reciprocal lattice vector are merged, keeping the first.
    pub fn from_zone(
        dimension: Dimension,
        reciprocal: &Matrix3<f64>,
        zone: &Polyhedron,
        tolerance: f64,
    ) -> Self {
        let mut catalog = Self::new();
        catalog.add_point(HighSymmetryPoint::new(
            PointKind::Gamma.prefix(),
            PointKind::Gamma,
            Vector3::zeros(),
        ));

        let candidates: Vec<(PointKind, Vec<Vector3<f64>>)> = match dimension {
            Dimension::_0D => Vec::new(),
            Dimension::_1D => vec![(PointKind::Vertex, zone.vertices().to_vec())],
            Dimension::_2D => vec![
                (PointKind::Vertex, zone.vertices().to_vec()),
                (PointKind::EdgeMidpoint, zone.edge_midpoints()),
            ],
            Dimension::_3D => vec![
                (PointKind::Vertex, zone.vertices().to_vec()),
                (PointKind::EdgeMidpoint, zone.edge_midpoints()),
                (PointKind::FaceCenter, zone.face_centers()),
            ],
        };

        let merge_translations = matches!(dimension, Dimension::_2D | Dimension::_3D);
        let inverse = reciprocal.try_inverse();

        for (kind, positions) in candidates {
            let mut representatives: Vec<Vector3<f64>> = Vec::new();
            for position in positions {
                let duplicate = representatives.iter().any(|existing| match (&inverse, merge_translations) {
                    (Some(inverse), true) => {
                        is_lattice_translation(inverse * (position - existing), dimension, tolerance)
                    }
                    _ => (position - existing).norm() <= tolerance,
                });
                if !duplicate {
                    representatives.push(position);
                }
            }
            for (index, position) in representatives.into_iter().enumerate() {
                let label = format!("{}{}", kind.prefix(), index + 1);
                catalog.add_point(HighSymmetryPoint::new(label, kind, position));
            }
        }

        debug!(
            "high symmetry catalog: {} vertices, {} edge midpoints, {} face centers",
            catalog.of_kind(PointKind::Vertex).count(),
            catalog.of_kind(PointKind::EdgeMidpoint).count(),
            catalog.of_kind(PointKind::FaceCenter).count()
        );
        catalog
    }

    /// Add a high symmetry point
    pub fn add_point(&mut self, point: HighSymmetryPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[HighSymmetryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get a specific point by label
    pub fn get_point(&self, label: &str) -> Option<&HighSymmetryPoint> {
        self.points.iter().find(|p| p.label == label)
    }

    pub fn of_kind(&self, kind: PointKind) -> impl Iterator<Item = &HighSymmetryPoint> {
        self.points.iter().filter(move |p| p.kind == kind)
    }

    /// Cartesian positions for a list of labels, in order
    pub fn positions(&self, labels: &[&str]) -> Result<Vec<Vector3<f64>>> {
        labels
            .iter()
            .map(|label| {
                self.get_point(label)
                    .map(|p| p.position)
                    .ok_or_else(|| TbError::InvalidPath(format!("no high symmetry point labelled '{}'", label)))
            })
            .collect()
    }
}

// Whether fractional offset `delta` is an integer vector on periodic axes and zero elsewhere
fn is_lattice_translation(delta: Vector3<f64>, dimension: Dimension, tolerance: f64) -> bool {
    (0..3).all(|axis| {
        if dimension.is_periodic(axis) {
            (delta[axis] - delta[axis].round()).abs() <= tolerance
        } else {
            delta[axis].abs() <= tolerance
        }
    })
}
