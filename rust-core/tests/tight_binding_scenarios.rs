// End-to-end scenarios through the public API: geometry, assembly, solve, DOS

use approx::assert_relative_eq;
use nalgebra::Vector3;
use num_complex::Complex64;
use std::f64::consts::PI;

use tibi_core::lattice::{
    chain_lattice, face_centered_cubic_lattice, hexagonal_lattice, BrillouinZoneBuilder, LatticeBasis,
};
use tibi_core::model::{expand, hermiticity_residual, BlochHamiltonian, HoppingRecord, NodeRef, Site, SupercellSpec, UnitCell};
use tibi_core::spectrum::{histogram, lorentzian, MeshSpec, Session, SolveRequest, SpectralSolver};
use tibi_core::symmetries::{build_path, PathPointKind, PointKind};
use tibi_core::{Dimension, MeshKind, TbError};

fn real(t: f64) -> Complex64 {
    Complex64::new(t, 0.0)
}

// Two-state chain A, B with t from A in cell 0 to B in cell +1, plus the partner
fn ab_chain(t: f64) -> UnitCell {
    let sites = vec![
        Site::new("A", [0.0, 0.0, 0.0]).with_states(["s"]),
        Site::new("B", [0.5, 0.0, 0.0]).with_states(["s"]),
    ];
    let hoppings = vec![
        HoppingRecord::new(0, 1, [1, 0, 0], real(t)),
        HoppingRecord::new(1, 0, [-1, 0, 0], real(t)),
    ];
    UnitCell::from_parts("ab chain", chain_lattice(1.0).unwrap(), sites, hoppings).unwrap()
}

// Graphene-like honeycomb model with staggered on-site energies
fn honeycomb(t: f64, delta: f64) -> UnitCell {
    let sites = vec![
        Site::new("A", [1.0 / 3.0, 1.0 / 3.0, 0.0]).with_states(["pz"]),
        Site::new("B", [2.0 / 3.0, 2.0 / 3.0, 0.0]).with_states(["pz"]),
    ];
    let mut hoppings = vec![
        HoppingRecord::new(0, 0, [0, 0, 0], real(delta)),
        HoppingRecord::new(1, 1, [0, 0, 0], real(-delta)),
    ];
    for d in [[0, 0, 0], [-1, 0, 0], [0, -1, 0]] {
        hoppings.push(HoppingRecord::new(0, 1, d, real(t)));
        hoppings.push(HoppingRecord::new(1, 0, d.map(|c| -c), real(t)));
    }
    UnitCell::from_parts("honeycomb", hexagonal_lattice(1.0).unwrap(), sites, hoppings).unwrap()
}

#[test]
fn scenario_a_two_band_chain() {
    let cell = ab_chain(1.0);
    assert!(cell.is_hermitian());

    let spectrum = SpectralSolver::new(&cell)
        .unwrap()
        .solve_points(&[Vector3::zeros()], &Default::default())
        .unwrap();
    let energies = &spectrum.points()[0].eigenvalues;
    assert_relative_eq!(energies[0], -1.0, epsilon = 1e-10);
    assert_relative_eq!(energies[1], 1.0, epsilon = 1e-10);
}

#[test]
fn scenario_b_parallel_basis_vectors() {
    let basis = LatticeBasis::new(
        Vector3::new(1.0, 1.0, 0.0),
        Vector3::new(2.0, 2.0, 0.0),
        Vector3::new(0.0, 0.0, 1.0),
    );
    assert!(matches!(basis.reduce(), Err(TbError::DegenerateLattice { .. })));
    assert!(matches!(
        BrillouinZoneBuilder::new(&basis).build(),
        Err(TbError::DegenerateLattice { .. })
    ));
}

#[test]
fn scenario_c_path_through_all_catalog_points() {
    let bz = BrillouinZoneBuilder::new(&hexagonal_lattice(1.0).unwrap())
        .build()
        .unwrap();
    let mut labels = vec!["Γ".to_string()];
    for kind in [PointKind::Vertex, PointKind::EdgeMidpoint] {
        labels.extend(bz.catalog().of_kind(kind).map(|p| p.label.clone()));
    }
    let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();

    let path = bz.path(&label_refs, 20).unwrap();

    let anchors: Vec<usize> = path
        .points()
        .iter()
        .filter_map(|p| match p.kind {
            PathPointKind::Anchor(index) => Some(index),
            PathPointKind::Interior => None,
        })
        .collect();
    assert_eq!(anchors, (0..label_refs.len()).collect::<Vec<_>>());
    assert!(path.arc_lengths().windows(2).all(|w| w[1] >= w[0]));
    assert!(path.segment_points().iter().all(|&m| m >= 1));
}

#[test]
fn reduce_is_idempotent_and_preserves_lattice() {
    let basis = LatticeBasis::new(
        Vector3::new(1.0, 0.1, 0.0),
        Vector3::new(4.2, 1.3, 0.2),
        Vector3::new(-3.0, 2.0, 1.1),
    );
    let once = basis.reduce().unwrap();
    let twice = once.reduce().unwrap();
    assert_eq!(twice, once);
    assert_relative_eq!(once.periodic_volume(), basis.periodic_volume(), max_relative = 1e-10);

    for v in once.periodic_vectors() {
        let frac = basis.cart_to_frac(v).unwrap();
        assert!(frac.iter().all(|c| (c - c.round()).abs() < 1e-8));
    }
}

#[test]
fn zone_volume_of_fcc() {
    let basis = face_centered_cubic_lattice(4.05).unwrap();
    let zone = BrillouinZoneBuilder::new(&basis).compute_zone().unwrap();
    let expected = (2.0 * PI).powi(3) / basis.determinant().abs();
    assert_relative_eq!(zone.measure(), expected, max_relative = 1e-6);
}

#[test]
fn documented_path_allocation() {
    let anchors = vec![Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0), Vector3::new(3.0, 0.0, 0.0)];
    let path = build_path(&anchors, 10).unwrap();
    assert_eq!(path.segment_points(), &[2, 5]);
    assert_eq!(path.len(), 10);
}

#[test]
fn hermitian_model_gives_hermitian_hamiltonian() {
    let hamiltonian = BlochHamiltonian::new(&honeycomb(-2.7, 0.3));
    for k in [Vector3::new(0.3, 0.9, 0.0), Vector3::new(-2.1, 1.4, 0.0)] {
        assert!(hermiticity_residual(&hamiltonian.at(&k)) < 1e-12);
    }
}

#[test]
fn honeycomb_gap_at_k_point() {
    let delta = 0.3;
    let cell = honeycomb(-2.7, delta);
    let bz = BrillouinZoneBuilder::new(cell.basis()).build().unwrap();
    let k_point = bz.catalog().get_point("V1").unwrap().position;

    let spectrum = SpectralSolver::new(&cell)
        .unwrap()
        .solve_points(&[k_point], &Default::default())
        .unwrap();
    let energies = &spectrum.points()[0].eigenvalues;
    assert_relative_eq!(energies[0], -delta, epsilon = 1e-9);
    assert_relative_eq!(energies[1], delta, epsilon = 1e-9);
}

#[test]
fn full_projection_sums_to_one() {
    let cell = honeycomb(-1.0, 0.2);
    let spectrum = SpectralSolver::new(&cell)
        .unwrap()
        .solve_grid(&MeshSpec::new(MeshKind::GammaCentered, 6, 6, 1))
        .unwrap();
    let all = cell.state_indices(&NodeRef::Cell).unwrap();
    let weights = spectrum.projection_weights(&all).unwrap();

    assert_eq!(weights.len(), 72);
    for weight in weights {
        assert_relative_eq!(weight, 1.0, epsilon = 1e-10);
    }
}

#[test]
fn supercell_gamma_spectrum_folds_primitive_grid() {
    let primitive = ab_chain(0.7).with_hoppings(vec![HoppingRecord::new(0, 0, [0, 0, 0], real(0.4))]).unwrap();
    let n = 4;
    let supercell = expand(&primitive, &SupercellSpec::new(n, 1, 1)).unwrap();

    let gamma = SpectralSolver::new(&supercell)
        .unwrap()
        .solve_points(&[Vector3::zeros()], &Default::default())
        .unwrap();

    let grid: Vec<Vector3<f64>> = (0..n).map(|m| Vector3::new(2.0 * PI * m as f64 / n as f64, 0.0, 0.0)).collect();
    let mut folded = SpectralSolver::new(&primitive)
        .unwrap()
        .solve_points(&grid, &Default::default())
        .unwrap()
        .all_eigenvalues();
    folded.sort_by(|a, b| a.total_cmp(b));

    let energies = &gamma.points()[0].eigenvalues;
    assert_eq!(energies.len(), folded.len());
    for (a, b) in energies.iter().zip(&folded) {
        assert_relative_eq!(*a, *b, epsilon = 1e-9);
    }
}

#[test]
fn background_grid_solve_feeds_dos() {
    let cell = honeycomb(-1.0, 0.0);
    let mut session = Session::new(cell);
    session
        .submit(SolveRequest::Grid(MeshSpec::new(MeshKind::MonkhorstPack, 12, 12, 1)))
        .unwrap();
    let spectrum = session.wait().unwrap();

    let energies = spectrum.all_eigenvalues();
    assert_eq!(energies.len(), 288);

    let hist = histogram(&energies, 30, None).unwrap();
    assert_relative_eq!(hist.counts.iter().sum::<f64>(), 288.0, epsilon = 1e-9);

    // Particle-hole symmetric bands give a symmetric DOS window
    let curve = lorentzian(&energies, 101, 0.1, None).unwrap();
    assert_relative_eq!(curve.energies[0], -curve.energies[100], epsilon = 1e-9);
}

#[test]
fn lowering_dimensionality_rebuilds_the_model() {
    let cell = honeycomb(-1.0, 0.0);
    let chain = cell.with_dimensionality(1).unwrap();
    assert_eq!(chain.basis().dimension(), Dimension::_1D);
    assert!(chain.hoppings().iter().all(|(key, _)| key.displacement[1] == 0));
    assert!(chain.is_hermitian());
}
