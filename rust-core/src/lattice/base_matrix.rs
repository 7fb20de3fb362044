use log::{debug, warn};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::{BASE_VECTOR_TOLERANCE, LATTICE_TOLERANCE, LLL_DELTA};
use crate::errors::{Result, TbError};
use crate::interfaces::Dimension;
use crate::lattice::lattice_algorithms::lll_reduce;

/// Three real-space basis vectors (matrix columns) together with the number of
/// periodic directions.
///
/// The first `n` columns are periodic. For `n < 3` the remaining columns follow
/// a fixed convention (see [`LatticeBasis::set_dimensionality`]). The type is a
/// value snapshot: every transforming operation returns a new basis and leaves
/// `self` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeBasis {
    base_matrix: Matrix3<f64>,
    dimension: Dimension,
}

impl LatticeBasis {
    /// Unrestricted 3D basis. No checks are performed; a degenerate basis is
    /// representable and rejected later by [`reduce`](Self::reduce) and zone construction.
    pub fn new(base_1: Vector3<f64>, base_2: Vector3<f64>, base_3: Vector3<f64>) -> Self {
        Self {
            base_matrix: Matrix3::from_columns(&[base_1, base_2, base_3]),
            dimension: Dimension::_3D,
        }
    }

    /// Basis with `dimension` periodic directions. The vectors are brought into
    /// the axis convention of that dimensionality.
    pub fn from_base_vectors(
        base_1: Vector3<f64>,
        base_2: Vector3<f64>,
        base_3: Vector3<f64>,
        dimension: Dimension,
    ) -> Result<Self> {
        Self::new(base_1, base_2, base_3).set_dimensionality(dimension.periodic_count())
    }

    pub fn from_matrix(matrix: Matrix3<f64>, dimension: Dimension) -> Result<Self> {
        Self::from_base_vectors(
            matrix.column(0).into(),
            matrix.column(1).into(),
            matrix.column(2).into(),
            dimension,
        )
    }

    /// Enforce the axis convention for `n` periodic directions.
    ///
    /// - n = 0, 1: orthogonal axes, vector k along cartesian axis k
    /// - n = 2: vectors 1, 2 in the xy-plane, vector 3 along z
    /// - n = 3: unrestricted
    ///
    /// Vectors are projected onto the convention. A non-periodic vector whose
    /// projection vanishes is replaced by the unit axis. A periodic vector whose
    /// projection vanishes cannot be corrected and yields
    /// [`TbError::InvalidDimensionality`].
    pub fn set_dimensionality(&self, n: usize) -> Result<Self> {
        let dimension = Dimension::from_count(n)?;
        let [a1, a2, a3] = self.base_vectors();

        let along_axis = |v: &Vector3<f64>, axis: usize| {
            let mut projected = Vector3::zeros();
            projected[axis] = v[axis];
            projected
        };
        let in_plane = |v: &Vector3<f64>| Vector3::new(v.x, v.y, 0.0);

        let corrected = match dimension {
            Dimension::_0D | Dimension::_1D => [
                along_axis(&a1, 0),
                along_axis(&a2, 1),
                along_axis(&a3, 2),
            ],
            Dimension::_2D => [in_plane(&a1), in_plane(&a2), along_axis(&a3, 2)],
            Dimension::_3D => [a1, a2, a3],
        };

        let mut columns = corrected;
        for (axis, column) in columns.iter_mut().enumerate() {
            if column.norm() > BASE_VECTOR_TOLERANCE {
                continue;
            }
            if dimension.is_periodic(axis) {
                return Err(TbError::InvalidDimensionality {
                    requested: n,
                    reason: format!(
                        "periodic vector {} has no component compatible with the {}D axis convention",
                        axis + 1,
                        n
                    ),
                });
            }
            *column = Vector3::zeros();
            column[axis] = 1.0;
        }

        for axis in rescaled_periodic_axes(&[a1, a2, a3], &columns, dimension) {
            warn!(
                "projection onto the {}D axis convention changes |a{}| from {:.6} to {:.6}",
                n,
                axis + 1,
                [a1, a2, a3][axis].norm(),
                columns[axis].norm()
            );
        }

        Ok(Self {
            base_matrix: Matrix3::from_columns(&columns),
            dimension,
        })
    }

    /// LLL reduction of the periodic sub-block.
    ///
    /// The handedness of the periodic block is preserved. Non-periodic vectors
    /// are untouched.
    pub fn reduce(&self) -> Result<Self> {
        self.reduce_with_transform().map(|(basis, _)| basis)
    }

    /// Like [`reduce`](Self::reduce), also returning the unimodular U with
    /// `reduced = original · U`.
    pub fn reduce_with_transform(&self) -> Result<(Self, Matrix3<i64>)> {
        self.ensure_non_degenerate()?;

        let n = self.dimension.periodic_count();
        let periodic = self.periodic_vectors();
        let mut reduction = lll_reduce(&periodic, LLL_DELTA);

        if n >= 2 && signed_measure(&reduction.vectors) * signed_measure(&periodic) < 0.0 {
            reduction.vectors[n - 1] = -reduction.vectors[n - 1];
            for row in 0..3 {
                reduction.transform[(row, n - 1)] = -reduction.transform[(row, n - 1)];
            }
        }

        let mut base_matrix = self.base_matrix;
        for (i, vector) in reduction.vectors.iter().enumerate() {
            base_matrix.set_column(i, vector);
        }
        let reduced = Self {
            base_matrix,
            dimension: self.dimension,
        };
        reduced.ensure_non_degenerate()?;

        debug!(
            "reduced {}D basis, transform {:?}",
            n,
            reduction.transform.as_slice()
        );
        Ok((reduced, reduction.transform))
    }

    pub fn base_matrix(&self) -> &Matrix3<f64> {
        &self.base_matrix
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn base_vectors(&self) -> [Vector3<f64>; 3] {
        [
            self.base_matrix.column(0).into(),
            self.base_matrix.column(1).into(),
            self.base_matrix.column(2).into(),
        ]
    }

    pub fn vector(&self, axis: usize) -> Vector3<f64> {
        self.base_matrix.column(axis).into()
    }

    pub fn periodic_vectors(&self) -> Vec<Vector3<f64>> {
        (0..self.dimension.periodic_count())
            .map(|axis| self.vector(axis))
            .collect()
    }

    pub fn determinant(&self) -> f64 {
        self.base_matrix.determinant()
    }

    pub fn metric(&self) -> Matrix3<f64> {
        self.base_matrix.transpose() * self.base_matrix
    }

    /// Length (1D), area (2D) or volume (3D) of the periodic cell. 1 for 0D.
    pub fn periodic_volume(&self) -> f64 {
        signed_measure(&self.periodic_vectors()).abs()
    }

    /// Volume check relative to the vector lengths, so the test is scale free.
    pub fn is_degenerate(&self) -> bool {
        let periodic = self.periodic_vectors();
        if periodic.iter().any(|v| v.norm() <= BASE_VECTOR_TOLERANCE) {
            return true;
        }
        let scale: f64 = periodic.iter().map(|v| v.norm()).product();
        self.periodic_volume() <= LATTICE_TOLERANCE * scale
    }

    /// Periodic volume, or [`TbError::DegenerateLattice`] if it is numerically zero.
    pub fn ensure_non_degenerate(&self) -> Result<f64> {
        let volume = self.periodic_volume();
        if self.is_degenerate() {
            return Err(TbError::DegenerateLattice { volume });
        }
        Ok(volume)
    }

    /// Cartesian position of the lattice translation d₁a₁ + d₂a₂ + d₃a₃.
    /// Components along non-periodic axes are ignored.
    pub fn translation(&self, displacement: &[i32; 3]) -> Vector3<f64> {
        (0..self.dimension.periodic_count()).fold(Vector3::zeros(), |acc, axis| {
            acc + self.vector(axis) * displacement[axis] as f64
        })
    }

    /// Convert fractional (u,v,w) coords → cartesian.
    pub fn frac_to_cart(&self, v_frac: Vector3<f64>) -> Vector3<f64> {
        self.base_matrix * v_frac
    }

    /// Convert cartesian coords → fractional (u,v,w).
    pub fn cart_to_frac(&self, v_cart: Vector3<f64>) -> Result<Vector3<f64>> {
        self.base_matrix
            .try_inverse()
            .map(|inverse| inverse * v_cart)
            .ok_or(TbError::DegenerateLattice {
                volume: self.determinant().abs(),
            })
    }
}

/// Signed length / area / volume spanned by up to three vectors.
fn signed_measure(vectors: &[Vector3<f64>]) -> f64 {
    match vectors {
        [] => 1.0,
        [a1] => a1.norm(),
        [a1, a2] => {
            let normal = a1.cross(a2);
            // In-plane convention puts the normal along z; fall back to the norm otherwise
            if normal.z.abs() > BASE_VECTOR_TOLERANCE {
                normal.z.signum() * normal.norm()
            } else {
                normal.norm()
            }
        }
        [a1, a2, a3, ..] => a1.dot(&a2.cross(a3)),
    }
}

// Periodic axes whose vector length differs between `original` and `projected`
pub(crate) fn rescaled_periodic_axes(
    original: &[Vector3<f64>; 3],
    projected: &[Vector3<f64>; 3],
    dimension: Dimension,
) -> Vec<usize> {
    (0..dimension.periodic_count())
        .filter(|&axis| {
            let before = original[axis].norm();
            (projected[axis].norm() - before).abs() > LATTICE_TOLERANCE * before.max(1.0)
        })
        .collect()
}
