// Model module: Contains the tight-binding unit cell, its hopping table and Hamiltonian
// This module provides model assembly and the supercell transformation

// ======================== MODULE DECLARATIONS ========================
pub mod hamiltonian;
pub mod hopping;
pub mod supercell;
pub mod unit_cell;

mod _tests_unit_cell;

// ======================== UNIT CELL ========================
pub use unit_cell::{
    UnitCell, // struct - lattice basis, sites and hopping table (snapshot in, snapshot out)
    Site,     // struct - named site with fractional coordinates and states
    State,    // struct - named state; on-site energies are self-hoppings
    NodeRef,  // enum - Cell, Site(i), State { site, state } selection
    Node,     // enum - resolved node borrowing from the cell
};
// UnitCell impl methods:
//   state_count / state_labels / state_index(site, state)          - flat state registry
//   resolve(&NodeRef) -> Result<Node> / state_indices(&NodeRef)    - node dispatch
//   with_site / with_state / without_site / without_state          - structural edits
//   with_hoppings(records) / with_pair_hoppings(i, j, &[(d, t)])   - hopping commits
//   with_basis / with_dimensionality(n)                            - lattice edits
//   hermiticity_check() / is_hermitian()                           - advisory checks
//   reduce() -> Result<UnitCell>                                   - basis reduction with remapped displacements

// ======================== HOPPINGS ========================
pub use hopping::{
    HoppingKey,          // struct - (state_i, state_j, displacement) key
    HoppingRecord,       // struct - interchange record {state_i, state_j, d1, d2, d3, re, im}
    HoppingTable,        // struct - summed, validated hopping map
    NonHermitianWarning, // struct - missing or mismatched conjugate partner
    WarningKind,         // enum - MissingPartner, ConjugateMismatch
};

// ======================== HAMILTONIAN ========================
pub use hamiltonian::{
    BlochHamiltonian,     // struct - precomputed translations, at(k) -> DMatrix<Complex64>
    bloch_hamiltonian,    // fn(cell: &UnitCell, k: &Vector3<f64>) -> DMatrix<Complex64> - one-shot H(k)
    hermiticity_residual, // fn(h: &DMatrix<Complex64>) -> f64 - ‖H − H†‖
};

// ======================== SUPERCELLS ========================
pub use supercell::{
    SupercellSpec, // struct - multipliers (n1, n2, n3)
    expand,        // fn(cell: &UnitCell, spec: &SupercellSpec) -> Result<UnitCell> - supercell with folded hoppings
};
