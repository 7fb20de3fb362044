use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// ε that controls the numerical tolerance (works for zone sized data;
/// scale if the polytope spans many orders of magnitude).
const EPS: f64 = 1.0e-10;

/// Convex polytope of a Brillouin zone: a point, a segment, a polygon or a polyhedron.
///
/// Polygons keep their vertices in counter-clockwise order and carry no faces.
/// Polyhedron faces are ordered counter-clockwise seen from outside.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyhedron {
    /// Vertices of the polytope (cartesian reciprocal-space coordinates)
    pub vertices: Vec<Vector3<f64>>,
    /// Edges as pairs of vertex indices
    pub edges: Vec<(usize, usize)>,
    /// Faces as lists of vertex indices (empty below 3D)
    pub faces: Vec<Vec<usize>>,
    /// Length (1D), area (2D) or volume (3D); 0 for a point
    pub measure: f64,
}

impl Polyhedron {
    /// Create a new empty polytope
    pub fn new() -> Self {
        Self::default()
    }

    /// The single point at `position`
    pub fn point(position: Vector3<f64>) -> Self {
        Self {
            vertices: vec![position],
            ..Self::default()
        }
    }

    /// Segment between two end points
    pub fn segment(start: Vector3<f64>, end: Vector3<f64>) -> Self {
        Self {
            vertices: vec![start, end],
            edges: vec![(0, 1)],
            faces: Vec::new(),
            measure: (end - start).norm(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Check if a point lies on the segment (1D version)
    pub fn contains_1d(&self, point: Vector3<f64>) -> bool {
        if self.vertices.len() != 2 {
            return false;
        }
        let (start, end) = (self.vertices[0], self.vertices[1]);
        let direction = end - start;
        let length_sq = direction.norm_squared();
        if length_sq < EPS {
            return (point - start).norm() < EPS;
        }
        let t = (point - start).dot(&direction) / length_sq;
        let off_axis = (point - start - direction * t).norm();
        (-EPS..=1.0 + EPS).contains(&t) && off_axis < EPS.sqrt()
    }

    /// Check if a point is inside the polygon (2D version, boundary included)
    pub fn contains_2d(&self, point: Vector3<f64>) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        // Convex and counter-clockwise: the point must be left of every edge
        (0..n).all(|i| {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let cross = (b.x - a.x) * (point.y - a.y) - (b.y - a.y) * (point.x - a.x);
            cross >= -EPS * (b - a).norm().max(1.0)
        })
    }

    /// Return `true` if `point` lies inside – or on the boundary of – the
    /// convex polyhedron.  Works for any face ordering/orientation.
    pub fn contains_3d(&self, point: Vector3<f64>) -> bool {
        if self.faces.is_empty() {
            return false;
        }

        let centroid = self.centroid();

        for face in &self.faces {
            if face.len() < 3 {
                continue;
            }

            let v0 = self.vertices[face[0]];
            let v1 = self.vertices[face[1]];
            let v2 = self.vertices[face[2]];

            let mut normal = (v1 - v0).cross(&(v2 - v0));

            // Ensure the normal points *outward*.
            if normal.dot(&(centroid - v0)) > 0.0 {
                normal = -normal;
            }

            if normal.dot(&(point - v0)) > EPS * normal.norm().max(1.0) {
                return false;
            }
        }
        true
    }

    /// Dimension-aware containment test
    pub fn contains(&self, point: Vector3<f64>) -> bool {
        if !self.faces.is_empty() {
            self.contains_3d(point)
        } else if self.vertices.len() >= 3 {
            self.contains_2d(point)
        } else if self.vertices.len() == 2 {
            self.contains_1d(point)
        } else {
            self.vertices
                .first()
                .map(|v| (v - point).norm() < EPS)
                .unwrap_or(false)
        }
    }

    /// Arithmetic mean of all vertices
    pub fn centroid(&self) -> Vector3<f64> {
        if self.vertices.is_empty() {
            return Vector3::zeros();
        }
        self.vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v)
            / self.vertices.len() as f64
    }

    /// Midpoint of every edge, in edge order
    pub fn edge_midpoints(&self) -> Vec<Vector3<f64>> {
        self.edges
            .iter()
            .map(|&(i, j)| 0.5 * (self.vertices[i] + self.vertices[j]))
            .collect()
    }

    /// Vertex mean of every face, in face order
    pub fn face_centers(&self) -> Vec<Vector3<f64>> {
        self.faces
            .iter()
            .filter(|face| !face.is_empty())
            .map(|face| {
                face.iter()
                    .fold(Vector3::zeros(), |acc, &i| acc + self.vertices[i])
                    / face.len() as f64
            })
            .collect()
    }

    /// Get the length, area or volume of the polytope
    pub fn measure(&self) -> f64 {
        self.measure
    }

    /// Get vertices as a reference
    pub fn vertices(&self) -> &[Vector3<f64>] {
        &self.vertices
    }

    /// Get edges as a reference
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Get faces as a reference (empty below 3D)
    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }
}
