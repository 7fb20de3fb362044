#[cfg(test)]
mod _tests_lattice_algorithms {
    use super::super::lattice_algorithms::*;
    use nalgebra::{Matrix3, Vector3};

    const TOL: f64 = 1e-10;

    // Helper: Σ_j U[j][k] a_j for every column k of U
    fn apply_transform(vectors: &[Vector3<f64>], transform: &Matrix3<i64>) -> Vec<Vector3<f64>> {
        (0..vectors.len())
            .map(|k| {
                (0..vectors.len()).fold(Vector3::zeros(), |acc, j| {
                    acc + vectors[j] * transform[(j, k)] as f64
                })
            })
            .collect()
    }

    #[test]
    fn test_gram_schmidt_orthogonality() {
        let vectors = vec![
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(0.0, 1.0, 1.0),
        ];
        let (ortho, mu) = gram_schmidt(&vectors);

        for i in 0..3 {
            for j in 0..i {
                assert!(
                    ortho[i].dot(&ortho[j]).abs() < TOL,
                    "b*{} and b*{} should be orthogonal",
                    i,
                    j
                );
            }
        }
        assert!((mu[1][0] - 0.5).abs() < TOL);
    }

    #[test]
    fn test_lll_leaves_orthogonal_basis_unchanged() {
        let vectors = vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
            Vector3::new(0.0, 0.0, 3.0),
        ];
        let reduction = lll_reduce(&vectors, 0.75);

        assert_eq!(reduction.vectors, vectors);
        assert_eq!(reduction.transform, Matrix3::identity());
    }

    #[test]
    fn test_lll_reduces_sheared_square_lattice() {
        let vectors = vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(5.0, 1.0, 0.0)];
        let reduction = lll_reduce(&vectors, 0.75);

        assert!((reduction.vectors[0] - Vector3::new(1.0, 0.0, 0.0)).norm() < TOL);
        assert!((reduction.vectors[1] - Vector3::new(0.0, 1.0, 0.0)).norm() < TOL);
        assert_eq!(reduction.transform[(0, 1)], -5);
        assert_eq!(reduction.transform[(1, 1)], 1);
    }

    #[test]
    fn test_lll_transform_reproduces_reduced_vectors() {
        let vectors = vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(7.3, 1.0, 0.0),
            Vector3::new(-4.0, 3.0, 0.5),
        ];
        let reduction = lll_reduce(&vectors, 0.75);
        let rebuilt = apply_transform(&vectors, &reduction.transform);

        for (reduced, expected) in reduction.vectors.iter().zip(&rebuilt) {
            if (reduced - expected).norm() > TOL {
                eprintln!("DEBUG: reduced = {:?}, rebuilt = {:?}", reduced, expected);
            }
            assert!((reduced - expected).norm() < 1e-9);
        }
        assert_eq!(integer_determinant(&reduction.transform).abs(), 1);

        // Reduced vectors should be no longer than the longest input vector
        let longest_input = vectors.iter().map(|v| v.norm()).fold(0.0, f64::max);
        for v in &reduction.vectors {
            assert!(v.norm() <= longest_input + TOL);
        }
    }

    #[test]
    fn test_lll_is_idempotent() {
        let vectors = vec![
            Vector3::new(1.0, 0.2, 0.0),
            Vector3::new(3.1, 1.0, 0.4),
            Vector3::new(2.0, -1.5, 1.2),
        ];
        let once = lll_reduce(&vectors, 0.75);
        let twice = lll_reduce(&once.vectors, 0.75);

        assert_eq!(twice.vectors, once.vectors);
        assert_eq!(twice.transform, Matrix3::identity());
    }

    #[test]
    fn test_lll_single_vector() {
        let vectors = vec![Vector3::new(0.0, 0.0, 4.0)];
        let reduction = lll_reduce(&vectors, 0.75);
        assert_eq!(reduction.vectors, vectors);
        assert_eq!(reduction.transform, Matrix3::identity());
    }

    #[test]
    fn test_integer_determinant() {
        let m = Matrix3::new(2, 0, 1, 1, 3, 0, 0, 1, 1);
        assert_eq!(integer_determinant(&m), 7);
        assert_eq!(integer_determinant(&Matrix3::<i64>::identity()), 1);
    }

    #[test]
    fn test_unimodular_inverse() {
        let m = Matrix3::new(1, -5, 2, 0, 1, 3, 0, 0, -1);
        let inverse = unimodular_inverse(&m).expect("matrix is unimodular");
        assert_eq!(m * inverse, Matrix3::identity());
        assert_eq!(inverse * m, Matrix3::identity());
    }

    #[test]
    fn test_unimodular_inverse_rejects_non_unimodular() {
        let m = Matrix3::new(2, 0, 0, 0, 1, 0, 0, 0, 1);
        assert!(unimodular_inverse(&m).is_none());
    }
}
