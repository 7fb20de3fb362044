use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TbError};
use crate::interfaces::{Dimension, MeshKind};

/// Sampling grid over the Brillouin zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshSpec {
    pub kind: MeshKind,
    pub divisions: [usize; 3],
}

impl MeshSpec {
    pub fn new(kind: MeshKind, n1: usize, n2: usize, n3: usize) -> Self {
        Self {
            kind,
            divisions: [n1, n2, n3],
        }
    }

    /// Divisions with non-periodic axes clamped to 1
    pub fn effective_divisions(&self, dimension: Dimension) -> Result<[usize; 3]> {
        let mut divisions = self.divisions;
        for (axis, n) in divisions.iter_mut().enumerate() {
            if !dimension.is_periodic(axis) {
                *n = 1;
            } else if *n == 0 {
                return Err(TbError::InvalidArgument(format!(
                    "grid needs at least one division along periodic axis {}",
                    axis
                )));
            }
        }
        Ok(divisions)
    }

    pub fn point_count(&self, dimension: Dimension) -> Result<usize> {
        Ok(self.effective_divisions(dimension)?.iter().product())
    }
}

/// Fractional coordinates of one grid axis with `n` points
pub fn mesh_fractions(kind: MeshKind, n: usize) -> Vec<f64> {
    let n_f = n as f64;
    match kind {
        MeshKind::GammaCentered => (0..n)
            .map(|j| (j as f64 - (n / 2) as f64) / n_f)
            .collect(),
        MeshKind::MonkhorstPack => (0..n).map(|j| (j as f64 + 0.5) / n_f - 0.5).collect(),
    }
}

/// Cartesian grid points Σ fᵢ bᵢ, first axis outermost. Non-periodic axes contribute f = 0.
pub fn generate_mesh(reciprocal: &Matrix3<f64>, dimension: Dimension, spec: &MeshSpec) -> Result<Vec<Vector3<f64>>> {
    let divisions = spec.effective_divisions(dimension)?;
    let axes: Vec<Vec<f64>> = (0..3)
        .map(|axis| {
            if dimension.is_periodic(axis) {
                mesh_fractions(spec.kind, divisions[axis])
            } else {
                vec![0.0]
            }
        })
        .collect();

    let mut points = Vec::with_capacity(divisions.iter().product());
    for &f1 in &axes[0] {
        for &f2 in &axes[1] {
            for &f3 in &axes[2] {
                points.push(reciprocal * Vector3::new(f1, f2, f3));
            }
        }
    }
    Ok(points)
}
