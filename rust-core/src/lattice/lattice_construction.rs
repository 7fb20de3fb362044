use crate::errors::Result;
use crate::interfaces::Dimension;
use crate::lattice::LatticeBasis;
use nalgebra::{Matrix3, Vector3};

/// Standard lattice construction utilities for common tight-binding lattices

/// Create a 1D chain along x with lattice parameter a
pub fn chain_lattice(a: f64) -> Result<LatticeBasis> {
    let direct = Matrix3::new(a, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
    LatticeBasis::from_matrix(direct, Dimension::_1D)
}

/// Create a square lattice with given lattice parameter
pub fn square_lattice(a: f64) -> Result<LatticeBasis> {
    let direct = Matrix3::new(a, 0.0, 0.0, 0.0, a, 0.0, 0.0, 0.0, 1.0);
    LatticeBasis::from_matrix(direct, Dimension::_2D)
}

/// Create a rectangular lattice with given lattice parameters
pub fn rectangular_lattice(a: f64, b: f64) -> Result<LatticeBasis> {
    let direct = Matrix3::new(a, 0.0, 0.0, 0.0, b, 0.0, 0.0, 0.0, 1.0);
    LatticeBasis::from_matrix(direct, Dimension::_2D)
}

/// Create a hexagonal (triangular) lattice with given lattice parameter
pub fn hexagonal_lattice(a: f64) -> Result<LatticeBasis> {
    let direct = Matrix3::new(
        a,
        a / 2.0,
        0.0,
        0.0,
        a * 3.0_f64.sqrt() / 2.0,
        0.0,
        0.0,
        0.0,
        1.0,
    );
    LatticeBasis::from_matrix(direct, Dimension::_2D)
}

/// Create an oblique lattice with given parameters and angle (in radians)
pub fn oblique_lattice(a: f64, b: f64, gamma: f64) -> Result<LatticeBasis> {
    let direct = Matrix3::new(
        a,
        b * gamma.cos(),
        0.0,
        0.0,
        b * gamma.sin(),
        0.0,
        0.0,
        0.0,
        1.0,
    );
    LatticeBasis::from_matrix(direct, Dimension::_2D)
}

/// Create a simple cubic lattice
pub fn simple_cubic_lattice(a: f64) -> Result<LatticeBasis> {
    LatticeBasis::from_base_vectors(
        Vector3::new(a, 0.0, 0.0),
        Vector3::new(0.0, a, 0.0),
        Vector3::new(0.0, 0.0, a),
        Dimension::_3D,
    )
}

/// Create a face-centered cubic lattice (primitive vectors)
pub fn face_centered_cubic_lattice(a: f64) -> Result<LatticeBasis> {
    let h = a / 2.0;
    LatticeBasis::from_base_vectors(
        Vector3::new(0.0, h, h),
        Vector3::new(h, 0.0, h),
        Vector3::new(h, h, 0.0),
        Dimension::_3D,
    )
}

/// Create a body-centered cubic lattice (primitive vectors)
pub fn body_centered_cubic_lattice(a: f64) -> Result<LatticeBasis> {
    let h = a / 2.0;
    LatticeBasis::from_base_vectors(
        Vector3::new(-h, h, h),
        Vector3::new(h, -h, h),
        Vector3::new(h, h, -h),
        Dimension::_3D,
    )
}

/// Create a tetragonal lattice
pub fn tetragonal_lattice(a: f64, c: f64) -> Result<LatticeBasis> {
    LatticeBasis::from_base_vectors(
        Vector3::new(a, 0.0, 0.0),
        Vector3::new(0.0, a, 0.0),
        Vector3::new(0.0, 0.0, c),
        Dimension::_3D,
    )
}

/// Utility functions for lattice transformations

/// Scale the periodic vectors of a basis uniformly by a given factor
pub fn scale_lattice(basis: &LatticeBasis, scale_factor: f64) -> Result<LatticeBasis> {
    let mut scaled = *basis.base_matrix();
    for axis in 0..basis.dimension().periodic_count() {
        let column: Vector3<f64> = basis.vector(axis) * scale_factor;
        scaled.set_column(axis, &column);
    }
    LatticeBasis::from_matrix(scaled, basis.dimension())
}
