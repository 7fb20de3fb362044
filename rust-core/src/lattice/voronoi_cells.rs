// Voronoi cell computation for 2D and 3D lattices
//
// The cell of the origin is the intersection of the half-spaces bounded by the
// perpendicular bisectors of origin–neighbor segments. Only Voronoi-relevant
// neighbors contribute a facet, so they are filtered first; this keeps the
// 3D vertex enumeration to a few hundred plane triplets.

// ======================== IMPORTS ========================
use log::debug;
use nalgebra::{Matrix3, Vector2, Vector3};
use std::collections::{BTreeSet, HashMap};

use crate::lattice::polyhedron::Polyhedron;

// ======================== CONSTANTS ========================
const NUMERICAL_TOLERANCE: f64 = 1.0e-12;
const TIE_TOLERANCE: f64 = 1.0e-8; // Relative tolerance for equal-length coset minima

/// A lattice point together with its integer coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticePoint {
    pub coefficients: [i32; 3],
    pub position: Vector3<f64>,
}

// ======================== LATTICE POINT GENERATION ========================

/// Generate lattice points within specified shell index
///
/// Returns all integer linear combinations Σ nᵢ·bᵢ with |nᵢ| ≤ max_shell over
/// the given (one to three) basis vectors, excluding the origin.
pub fn generate_lattice_points_by_shell(
    basis_vectors: &[Vector3<f64>],
    max_shell: usize,
) -> Vec<LatticePoint> {
    let shell_limit = max_shell as i32;
    let n = basis_vectors.len().min(3);
    let range = |axis: usize| {
        if axis < n {
            -shell_limit..=shell_limit
        } else {
            0..=0
        }
    };

    let mut lattice_points = Vec::new();
    for i in range(0) {
        for j in range(1) {
            for k in range(2) {
                if i == 0 && j == 0 && k == 0 {
                    continue; // Skip origin
                }
                let coefficients = [i, j, k];
                let position = (0..n).fold(Vector3::zeros(), |acc, axis| {
                    acc + basis_vectors[axis] * coefficients[axis] as f64
                });
                lattice_points.push(LatticePoint {
                    coefficients,
                    position,
                });
            }
        }
    }
    lattice_points
}

/// Generate lattice points within specified radius (excluding the origin)
pub fn generate_lattice_points_within_radius(
    basis_vectors: &[Vector3<f64>],
    radius: f64,
) -> Vec<LatticePoint> {
    if radius <= 0.0 || basis_vectors.is_empty() {
        return Vec::new();
    }

    // Estimate required shell based on shortest lattice vector
    let min_length = basis_vectors
        .iter()
        .map(|v| v.norm())
        .fold(f64::MAX, f64::min);
    let estimated_shell = (radius / min_length).ceil() as usize;

    generate_lattice_points_by_shell(basis_vectors, estimated_shell)
        .into_iter()
        .filter(|point| point.position.norm() <= radius + NUMERICAL_TOLERANCE)
        .collect()
}

/// Voronoi-relevant vectors of the lattice spanned by `basis_vectors`.
///
/// A nonzero lattice vector v bounds a facet of the Voronoi cell iff ±v are the
/// only shortest vectors of the coset v + 2L. Candidates are drawn from the
/// coefficient box of size `max_shell`; for a reduced basis a shell of 2 holds
/// every coset minimum.
pub fn voronoi_relevant_vectors(basis_vectors: &[Vector3<f64>], max_shell: usize) -> Vec<Vector3<f64>> {
    let mut classes: HashMap<[i32; 3], Vec<LatticePoint>> = HashMap::new();
    for point in generate_lattice_points_by_shell(basis_vectors, max_shell) {
        let parity = point.coefficients.map(|c| c.rem_euclid(2));
        if parity == [0, 0, 0] {
            continue; // Coset of 2L itself holds no relevant vector
        }
        classes.entry(parity).or_default().push(point);
    }

    let mut relevant: Vec<LatticePoint> = Vec::new();
    for members in classes.values() {
        let shortest = members
            .iter()
            .map(|p| p.position.norm_squared())
            .fold(f64::INFINITY, f64::min);
        let minima: Vec<&LatticePoint> = members
            .iter()
            .filter(|p| p.position.norm_squared() <= shortest * (1.0 + TIE_TOLERANCE))
            .collect();
        if minima.len() == 2 {
            relevant.extend(minima.into_iter().copied());
        }
    }

    // Deterministic order independent of hashing
    relevant.sort_by(|a, b| a.coefficients.cmp(&b.coefficients));
    relevant.into_iter().map(|p| p.position).collect()
}

// ======================== 2D VORONOI CELL ========================

/// Voronoi cell of the origin for a lattice in the xy-plane.
///
/// Vertices are returned counter-clockwise; `measure` is the area.
pub fn compute_voronoi_cell_2d(basis_vectors: &[Vector3<f64>; 2], max_shell: usize, tolerance: f64) -> Polyhedron {
    let relevant = voronoi_relevant_vectors(basis_vectors, max_shell);
    let scale = relevant.iter().map(|v| v.norm()).fold(0.0, f64::max);
    if scale <= 0.0 {
        return Polyhedron::new();
    }
    debug!("2D Voronoi cell: {} relevant neighbors", relevant.len());

    // Start with a large bounding polygon (counter-clockwise)
    let bounding_size = 2.0 * scale;
    let mut polygon_vertices: Vec<Vector2<f64>> = vec![
        Vector2::new(-bounding_size, -bounding_size),
        Vector2::new(bounding_size, -bounding_size),
        Vector2::new(bounding_size, bounding_size),
        Vector2::new(-bounding_size, bounding_size),
    ];

    // Clip against perpendicular bisectors of vectors to neighbors
    for neighbor in &relevant {
        let neighbor_2d = Vector2::new(neighbor.x, neighbor.y);
        let bisector_normal = neighbor_2d.normalize();
        let bisector_distance = 0.5 * neighbor_2d.norm();

        polygon_vertices = clip_polygon_by_halfspace(&polygon_vertices, &bisector_normal, bisector_distance);
        if polygon_vertices.is_empty() {
            break; // Degenerate case
        }
    }

    // Remove duplicate consecutive vertices (within tolerance), including the wrap-around
    let merge_distance = tolerance * scale;
    let mut unique_vertices: Vec<Vector2<f64>> = Vec::with_capacity(polygon_vertices.len());
    for vertex in polygon_vertices {
        if unique_vertices
            .last()
            .map_or(true, |last: &Vector2<f64>| (last - vertex).norm() > merge_distance)
        {
            unique_vertices.push(vertex);
        }
    }
    while unique_vertices.len() > 1 {
        let first = unique_vertices[0];
        match unique_vertices.last() {
            Some(last) if (last - first).norm() <= merge_distance => {
                unique_vertices.pop();
            }
            _ => break,
        }
    }

    let mut polyhedron = Polyhedron::new();
    polyhedron.vertices = unique_vertices
        .iter()
        .map(|v| Vector3::new(v.x, v.y, 0.0))
        .collect();
    let vertex_count = unique_vertices.len();
    polyhedron.edges = (0..vertex_count).map(|i| (i, (i + 1) % vertex_count)).collect();
    polyhedron.measure = calculate_polygon_area(&unique_vertices);

    polyhedron
}

// ======================== 3D VORONOI CELL ========================

/// Voronoi cell of the origin for a 3D lattice.
///
/// Vertices are the points where three relevant bisector planes meet and no
/// other bisector excludes them. Faces are ordered counter-clockwise seen from
/// outside; `measure` is the volume.
pub fn compute_voronoi_cell_3d(basis_vectors: &[Vector3<f64>; 3], max_shell: usize, tolerance: f64) -> Polyhedron {
    let relevant = voronoi_relevant_vectors(basis_vectors, max_shell);
    let scale = relevant.iter().map(|v| v.norm()).fold(0.0, f64::max);
    if relevant.len() < 4 || scale <= 0.0 {
        return Polyhedron::new();
    }
    debug!("3D Voronoi cell: {} relevant neighbors", relevant.len());

    let distance_tolerance = tolerance * scale;
    // Signed distance of x from the bisector plane of neighbor v
    let plane_distance = |v: &Vector3<f64>, x: &Vector3<f64>| (v.dot(x) - 0.5 * v.norm_squared()) / v.norm();

    // Vertex enumeration over plane triplets
    let mut vertices: Vec<Vector3<f64>> = Vec::new();
    for i in 0..relevant.len() {
        for j in (i + 1)..relevant.len() {
            for k in (j + 1)..relevant.len() {
                let (n_i, n_j, n_k) = (relevant[i], relevant[j], relevant[k]);
                let normals = Matrix3::from_rows(&[n_i.transpose(), n_j.transpose(), n_k.transpose()]);
                if normals.determinant().abs() <= NUMERICAL_TOLERANCE * n_i.norm() * n_j.norm() * n_k.norm() {
                    continue;
                }
                let Some(inverse) = normals.try_inverse() else {
                    continue;
                };
                let rhs = 0.5 * Vector3::new(n_i.norm_squared(), n_j.norm_squared(), n_k.norm_squared());
                let candidate = inverse * rhs;

                let inside = relevant
                    .iter()
                    .all(|v| plane_distance(v, &candidate) <= distance_tolerance);
                let known = vertices
                    .iter()
                    .any(|existing| (existing - candidate).norm() <= distance_tolerance);
                if inside && !known {
                    vertices.push(candidate);
                }
            }
        }
    }

    // Faces: vertices on each relevant plane, ordered by angle about the face normal
    let mut faces: Vec<Vec<usize>> = Vec::new();
    let mut volume = 0.0;
    for neighbor in &relevant {
        let mut on_plane: Vec<usize> = (0..vertices.len())
            .filter(|&index| plane_distance(neighbor, &vertices[index]).abs() <= distance_tolerance)
            .collect();
        if on_plane.len() < 3 {
            continue;
        }

        let normal = neighbor.normalize();
        let center = on_plane
            .iter()
            .fold(Vector3::zeros(), |acc, &index| acc + vertices[index])
            / on_plane.len() as f64;
        let u = (vertices[on_plane[0]] - center).normalize();
        let w = normal.cross(&u);
        let angle = |index: &usize| {
            let offset = vertices[*index] - center;
            offset.dot(&w).atan2(offset.dot(&u))
        };
        on_plane.sort_by(|a, b| angle(a).total_cmp(&angle(b)));

        // Pyramid from the origin over this face
        let area: f64 = (1..on_plane.len() - 1)
            .map(|t| {
                let a = vertices[on_plane[0]];
                let b = vertices[on_plane[t]];
                let c = vertices[on_plane[t + 1]];
                0.5 * (b - a).cross(&(c - a)).norm()
            })
            .sum();
        volume += area * 0.5 * neighbor.norm() / 3.0;

        faces.push(on_plane);
    }

    let mut polyhedron = Polyhedron::new();
    polyhedron.edges = extract_edges_from_faces(&faces);
    polyhedron.vertices = vertices;
    polyhedron.faces = faces;
    polyhedron.measure = volume;

    polyhedron
}

// ======================== HELPER FUNCTIONS ========================

// Sutherland-Hodgman polygon clipping against a half-plane
fn clip_polygon_by_halfspace(
    polygon: &[Vector2<f64>],
    normal: &Vector2<f64>,
    distance: f64,
) -> Vec<Vector2<f64>> {
    let Some(&last) = polygon.last() else {
        return Vec::new();
    };

    let mut clipped_polygon = Vec::with_capacity(polygon.len() + 1);
    let mut previous_vertex = last;
    let mut previous_inside = normal.dot(&previous_vertex) - distance <= 0.0;

    for &current_vertex in polygon {
        let current_inside = normal.dot(&current_vertex) - distance <= 0.0;

        // Edge crosses the boundary
        if current_inside != previous_inside {
            let t = (distance - normal.dot(&previous_vertex)) / normal.dot(&(current_vertex - previous_vertex));
            let intersection = previous_vertex + (current_vertex - previous_vertex) * t;
            clipped_polygon.push(intersection);
        }

        if current_inside {
            clipped_polygon.push(current_vertex);
        }

        previous_vertex = current_vertex;
        previous_inside = current_inside;
    }

    clipped_polygon
}

// Calculate polygon area using the shoelace formula
fn calculate_polygon_area(vertices: &[Vector2<f64>]) -> f64 {
    let vertex_count = vertices.len();
    let mut area = 0.0;

    for i in 0..vertex_count {
        let (x_i, y_i) = (vertices[i].x, vertices[i].y);
        let (x_j, y_j) = (vertices[(i + 1) % vertex_count].x, vertices[(i + 1) % vertex_count].y);
        area += x_i * y_j - x_j * y_i;
    }

    0.5 * area.abs()
}

// Extract unique edges from face definitions, sorted for a stable order
fn extract_edges_from_faces(faces: &[Vec<usize>]) -> Vec<(usize, usize)> {
    let mut unique_edges: BTreeSet<(usize, usize)> = BTreeSet::new();

    for face in faces {
        // Add edges between consecutive vertices
        for window in face.windows(2) {
            add_normalized_edge(&mut unique_edges, window[0], window[1]);
        }
        // Close the face by connecting last to first
        if let (Some(&first), Some(&last)) = (face.first(), face.last()) {
            add_normalized_edge(&mut unique_edges, last, first);
        }
    }

    unique_edges.into_iter().collect()
}

// Add edge with normalized ordering (smaller index first)
fn add_normalized_edge(edges: &mut BTreeSet<(usize, usize)>, i: usize, j: usize) {
    if i < j {
        edges.insert((i, j));
    } else if j < i {
        edges.insert((j, i));
    }
}
