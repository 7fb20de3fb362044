use log::debug;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::config::{LLL_DELTA, ZONE_NEIGHBOR_SHELL, ZONE_TOLERANCE};
use crate::errors::{Result, TbError};
use crate::interfaces::Dimension;
use crate::lattice::base_matrix::LatticeBasis;
use crate::lattice::lattice_algorithms::lll_reduce;
use crate::lattice::polyhedron::Polyhedron;
use crate::lattice::voronoi_cells::{
    compute_voronoi_cell_2d, compute_voronoi_cell_3d, generate_lattice_points_by_shell,
};
use crate::symmetries::band_path::{build_path, BandPath};
use crate::symmetries::high_symmetry_points::{HighSymmetryCatalog, HighSymmetryPoint};

/// Builds reciprocal-space geometry for a lattice basis
#[derive(Debug, Clone)]
pub struct BrillouinZoneBuilder {
    basis: LatticeBasis,
    tolerance: f64,
}

impl BrillouinZoneBuilder {
    pub fn new(basis: &LatticeBasis) -> Self {
        Self {
            basis: basis.clone(),
            tolerance: ZONE_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Reciprocal basis B = 2π (A⁻¹)ᵀ, columns b_i with a_i · b_j = 2π δ_ij.
    ///
    /// Non-periodic columns of A are already orthogonal completions, so their
    /// reciprocal partners never mix into the periodic block.
    pub fn reciprocal_vectors(&self) -> Result<Matrix3<f64>> {
        self.basis
            .base_matrix()
            .try_inverse()
            .map(|inverse| 2.0 * PI * inverse.transpose())
            .ok_or(TbError::DegenerateLattice {
                volume: self.basis.determinant().abs(),
            })
    }

    /// The first n reciprocal vectors
    pub fn periodic_reciprocal_vectors(&self) -> Result<Vec<Vector3<f64>>> {
        let reciprocal = self.reciprocal_vectors()?;
        Ok((0..self.basis.dimension().periodic_count())
            .map(|axis| reciprocal.column(axis).into())
            .collect())
    }

    /// First Brillouin zone as the Voronoi cell of the reciprocal origin
    pub fn compute_zone(&self) -> Result<Polyhedron> {
        self.basis.ensure_non_degenerate()?;
        let periodic = self.periodic_reciprocal_vectors()?;

        // Shell construction needs a short, near-orthogonal basis
        let reduced = lll_reduce(&periodic, LLL_DELTA).vectors;

        let zone = match (self.basis.dimension(), reduced.as_slice()) {
            (Dimension::_0D, _) => Polyhedron::point(Vector3::zeros()),
            (Dimension::_1D, [b1]) => Polyhedron::segment(-0.5 * b1, 0.5 * b1),
            (Dimension::_2D, [b1, b2]) => {
                compute_voronoi_cell_2d(&[*b1, *b2], ZONE_NEIGHBOR_SHELL, self.tolerance)
            }
            (Dimension::_3D, [b1, b2, b3]) => {
                compute_voronoi_cell_3d(&[*b1, *b2, *b3], ZONE_NEIGHBOR_SHELL, self.tolerance)
            }
            (dimension, vectors) => {
                return Err(TbError::DimensionMismatch(format!(
                    "{:?} basis produced {} periodic reciprocal vectors",
                    dimension,
                    vectors.len()
                )))
            }
        };

        if self.basis.dimension().periodic_count() >= 2 && zone.is_empty() {
            return Err(TbError::DegenerateLattice {
                volume: self.basis.periodic_volume(),
            });
        }
        debug!(
            "zone: {} vertices, {} edges, {} faces, measure {:.6}",
            zone.vertices().len(),
            zone.edges().len(),
            zone.faces().len(),
            zone.measure()
        );
        Ok(zone)
    }

    /// High symmetry catalog of the first zone
    pub fn high_symmetry_points(&self) -> Result<HighSymmetryCatalog> {
        let zone = self.compute_zone()?;
        let reciprocal = self.reciprocal_vectors()?;
        Ok(HighSymmetryCatalog::from_zone(
            self.basis.dimension(),
            &reciprocal,
            &zone,
            self.tolerance,
        ))
    }

    /// Reciprocal basis, zone polytope and catalog in one pass
    pub fn build(&self) -> Result<BrillouinZone> {
        let reciprocal = self.reciprocal_vectors()?;
        let polytope = self.compute_zone()?;
        let catalog = HighSymmetryCatalog::from_zone(
            self.basis.dimension(),
            &reciprocal,
            &polytope,
            self.tolerance,
        );
        Ok(BrillouinZone {
            dimension: self.basis.dimension(),
            reciprocal,
            polytope,
            catalog,
        })
    }
}

/// First Brillouin zone: polytope plus high symmetry catalog.
///
/// Derived from one basis snapshot; stale as soon as that basis changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrillouinZone {
    dimension: Dimension,
    reciprocal: Matrix3<f64>,
    polytope: Polyhedron,
    catalog: HighSymmetryCatalog,
}

impl BrillouinZone {
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn reciprocal_basis(&self) -> &Matrix3<f64> {
        &self.reciprocal
    }

    pub fn polytope(&self) -> &Polyhedron {
        &self.polytope
    }

    pub fn catalog(&self) -> &HighSymmetryCatalog {
        &self.catalog
    }

    pub fn high_symmetry_points(&self) -> &[HighSymmetryPoint] {
        self.catalog.points()
    }

    /// Check if k-point is in the first zone (boundary included)
    pub fn contains(&self, k_point: Vector3<f64>) -> bool {
        self.polytope.contains(k_point)
    }

    /// Fold a k-point back by reciprocal lattice vectors.
    ///
    /// Periodic fractional components are brought to [-½, ½]; the result is
    /// then moved to the shortest equivalent among neighboring translations so
    /// it lies in the zone for non-orthogonal lattices too.
    pub fn reduce_to_zone(&self, k_point: Vector3<f64>) -> Result<Vector3<f64>> {
        let inverse = self.reciprocal.try_inverse().ok_or(TbError::DegenerateLattice {
            volume: self.reciprocal.determinant().abs(),
        })?;
        let n = self.dimension.periodic_count();

        let mut k_frac = inverse * k_point;
        for i in 0..n {
            k_frac[i] -= k_frac[i].round();
        }
        let folded = self.reciprocal * k_frac;

        let periodic: Vec<Vector3<f64>> = (0..n).map(|axis| self.reciprocal.column(axis).into()).collect();
        let best = generate_lattice_points_by_shell(&periodic, 1)
            .into_iter()
            .map(|g| folded - g.position)
            .fold(folded, |best, candidate| {
                if candidate.norm() + ZONE_TOLERANCE < best.norm() {
                    candidate
                } else {
                    best
                }
            });
        Ok(best)
    }

    /// Band path through catalog points given by label
    pub fn path(&self, labels: &[&str], target_count: usize) -> Result<BandPath> {
        let anchors = self.catalog.positions(labels)?;
        build_path(&anchors, target_count)
    }
}
