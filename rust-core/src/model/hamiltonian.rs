use nalgebra::{DMatrix, Vector3};
use num_complex::Complex64;

use crate::model::unit_cell::UnitCell;

// One stored hopping with its cartesian lattice translation
#[derive(Debug, Clone, Copy)]
struct HoppingTerm {
    state_i: usize,
    state_j: usize,
    translation: Vector3<f64>,
    amplitude: Complex64,
}

/// Bloch Hamiltonian H(k) of a unit cell snapshot.
///
/// H[i][j] = Σ t · exp(i k·R) over the hoppings keyed (i, j, d), with
/// R = d₁a₁ + d₂a₂ + d₃a₃. Translations are computed once at construction.
#[derive(Debug, Clone)]
pub struct BlochHamiltonian {
    size: usize,
    terms: Vec<HoppingTerm>,
}

impl BlochHamiltonian {
    pub fn new(cell: &UnitCell) -> Self {
        let basis = cell.basis();
        let terms = cell
            .hoppings()
            .iter()
            .map(|(key, amplitude)| HoppingTerm {
                state_i: key.state_i,
                state_j: key.state_j,
                translation: basis.translation(&key.displacement),
                amplitude: *amplitude,
            })
            .collect();
        Self {
            size: cell.state_count(),
            terms,
        }
    }

    /// Number of states s; H(k) is s×s
    pub fn size(&self) -> usize {
        self.size
    }

    /// Evaluate H(k) at a cartesian momentum
    pub fn at(&self, k: &Vector3<f64>) -> DMatrix<Complex64> {
        let mut h = DMatrix::<Complex64>::zeros(self.size, self.size);
        for term in &self.terms {
            let phase = Complex64::from_polar(1.0, k.dot(&term.translation));
            h[(term.state_i, term.state_j)] += term.amplitude * phase;
        }
        h
    }
}

/// H(k) for one momentum
pub fn bloch_hamiltonian(cell: &UnitCell, k: &Vector3<f64>) -> DMatrix<Complex64> {
    BlochHamiltonian::new(cell).at(k)
}

/// Frobenius norm of H − H†
pub fn hermiticity_residual(h: &DMatrix<Complex64>) -> f64 {
    (h - h.adjoint()).norm()
}
