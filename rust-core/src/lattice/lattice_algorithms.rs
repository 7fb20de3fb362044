use nalgebra::{Matrix3, Vector3};

const EPS: f64 = 1e-12;

/// Slack on the size-reduction bound |μ| ≤ ½, keeps a second pass from
/// re-reducing coefficients that landed on ½ within rounding noise.
const SIZE_REDUCTION_SLACK: f64 = 1e-9;

/// Upper bound on LLL exchange steps. Never reached for non-degenerate input.
const MAX_LLL_STEPS: usize = 10_000;

/// Result of a lattice reduction.
///
/// `transform` is the unimodular integer matrix U with `reduced = original · U`
/// (columns are basis vectors). Outside the reduced block it is the identity.
#[derive(Debug, Clone)]
pub struct Reduction {
    pub vectors: Vec<Vector3<f64>>,
    pub transform: Matrix3<i64>,
}

/// Gram–Schmidt orthogonalisation without normalisation.
///
/// Returns the orthogonal vectors b*ᵢ and the coefficients μᵢⱼ = ⟨bᵢ, b*ⱼ⟩ / ⟨b*ⱼ, b*ⱼ⟩.
pub fn gram_schmidt(vectors: &[Vector3<f64>]) -> (Vec<Vector3<f64>>, [[f64; 3]; 3]) {
    let mut ortho: Vec<Vector3<f64>> = Vec::with_capacity(vectors.len());
    let mut mu = [[0.0; 3]; 3];

    for (i, b_i) in vectors.iter().enumerate() {
        let mut b_star = *b_i;
        for j in 0..i {
            let norm_sq = ortho[j].norm_squared();
            if norm_sq < EPS * EPS {
                continue;
            }
            mu[i][j] = b_i.dot(&ortho[j]) / norm_sq;
            b_star -= ortho[j] * mu[i][j];
        }
        ortho.push(b_star);
    }

    (ortho, mu)
}

/// Lenstra–Lenstra–Lovász reduction of up to three real basis vectors.
///
/// Works directly on floating point vectors (no integer scaling). Every step
/// is an integer column operation, so the reduced vectors span exactly the
/// lattice of the input. An already reduced basis is returned unchanged.
///
/// # Arguments
/// * `vectors` - Linearly independent basis vectors, at most three
/// * `delta` - Lovász parameter in (¼, 1), usually ¾
pub fn lll_reduce(vectors: &[Vector3<f64>], delta: f64) -> Reduction {
    let n = vectors.len().min(3);
    let mut basis: Vec<Vector3<f64>> = vectors[..n].to_vec();
    let mut transform = Matrix3::<i64>::identity();

    if n < 2 {
        return Reduction {
            vectors: basis,
            transform,
        };
    }

    let mut k = 1;
    let mut steps = 0;
    while k < n && steps < MAX_LLL_STEPS {
        steps += 1;

        // Size reduction of b_k against all earlier vectors
        for j in (0..k).rev() {
            let (_, mu) = gram_schmidt(&basis);
            let coefficient = mu[k][j];
            if coefficient.abs() > 0.5 + SIZE_REDUCTION_SLACK {
                let r = coefficient.round();
                let shift = basis[j] * r;
                basis[k] -= shift;
                let r_int = r as i64;
                for row in 0..3 {
                    transform[(row, k)] -= r_int * transform[(row, j)];
                }
            }
        }

        // Lovász condition
        let (ortho, mu) = gram_schmidt(&basis);
        let lhs = ortho[k].norm_squared();
        let rhs = (delta - mu[k][k - 1].powi(2)) * ortho[k - 1].norm_squared();
        if lhs + EPS * rhs.abs() >= rhs {
            k += 1;
        } else {
            basis.swap(k, k - 1);
            transform.swap_columns(k, k - 1);
            k = (k - 1).max(1);
        }
    }

    if steps >= MAX_LLL_STEPS {
        log::warn!("LLL reduction stopped after {} steps", MAX_LLL_STEPS);
    }

    Reduction {
        vectors: basis,
        transform,
    }
}

/// Determinant of an integer 3×3 matrix.
pub fn integer_determinant(m: &Matrix3<i64>) -> i64 {
    m[(0, 0)] * (m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)])
        - m[(0, 1)] * (m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)])
        + m[(0, 2)] * (m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)])
}

/// Exact inverse of a unimodular integer matrix (determinant ±1) via the adjugate.
///
/// Returns `None` if the matrix is not unimodular.
pub fn unimodular_inverse(m: &Matrix3<i64>) -> Option<Matrix3<i64>> {
    let det = integer_determinant(m);
    if det != 1 && det != -1 {
        return None;
    }

    let cofactor = |r0: usize, r1: usize, c0: usize, c1: usize| {
        m[(r0, c0)] * m[(r1, c1)] - m[(r0, c1)] * m[(r1, c0)]
    };

    // adj(M)[i][j] = cofactor C[j][i]
    let adjugate = Matrix3::new(
        cofactor(1, 2, 1, 2),
        -cofactor(0, 2, 1, 2),
        cofactor(0, 1, 1, 2),
        -cofactor(1, 2, 0, 2),
        cofactor(0, 2, 0, 2),
        -cofactor(0, 1, 0, 2),
        cofactor(1, 2, 0, 1),
        -cofactor(0, 2, 0, 1),
        cofactor(0, 1, 0, 1),
    );

    Some(adjugate * det)
}
