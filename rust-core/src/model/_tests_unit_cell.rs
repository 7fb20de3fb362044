#[cfg(test)]
mod _tests_unit_cell {
    use super::super::hamiltonian::bloch_hamiltonian;
    use super::super::hopping::{HoppingKey, HoppingRecord};
    use super::super::unit_cell::*;
    use crate::errors::TbError;
    use crate::interfaces::Dimension;
    use crate::lattice::{chain_lattice, square_lattice, LatticeBasis};
    use nalgebra::Vector3;
    use num_complex::Complex64;

    const TOL: f64 = 1e-10;

    fn real(t: f64) -> Complex64 {
        Complex64::new(t, 0.0)
    }

    // Helper function to create the two-state chain A–B with t = 1
    fn create_ab_chain() -> UnitCell {
        let sites = vec![
            Site::new("A", [0.0, 0.0, 0.0]).with_states(["s"]),
            Site::new("B", [0.5, 0.0, 0.0]).with_states(["s"]),
        ];
        let hoppings = vec![
            HoppingRecord::new(0, 1, [1, 0, 0], real(1.0)),
            HoppingRecord::new(1, 0, [-1, 0, 0], real(1.0)),
        ];
        UnitCell::from_parts("ab chain", chain_lattice(1.0).unwrap(), sites, hoppings).unwrap()
    }

    #[test]
    fn test_site_coordinates_are_wrapped() {
        let site = Site::new("A", [1.25, -0.25, 0.0]);
        assert!((site.fractional[0] - 0.25).abs() < TOL);
        assert!((site.fractional[1] - 0.75).abs() < TOL);
        assert_eq!(site.fractional[2], 0.0);
    }

    #[test]
    fn test_state_registry() {
        let cell = create_ab_chain()
            .with_site(Site::new("C", [0.0, 0.0, 0.0]).with_states(["px", "py"]));

        assert_eq!(cell.state_count(), 4);
        assert_eq!(cell.state_labels(), vec!["A.s", "B.s", "C.px", "C.py"]);
        assert_eq!(cell.site_state_range(2).unwrap(), 2..4);
        assert_eq!(cell.state_index(2, 1).unwrap(), 3);
        assert!(matches!(cell.state_index(2, 2), Err(TbError::UnknownNode(_))));
        assert!(matches!(cell.site_state_range(3), Err(TbError::UnknownNode(_))));
    }

    #[test]
    fn test_resolve_nodes() {
        let cell = create_ab_chain();

        assert!(matches!(cell.resolve(&NodeRef::Cell), Ok(Node::Cell(_))));
        match cell.resolve(&NodeRef::Site(1)) {
            Ok(Node::Site(site)) => assert_eq!(site.name, "B"),
            other => panic!("expected site B, got {:?}", other),
        }
        match cell.resolve(&NodeRef::State { site: 0, state: 0 }) {
            Ok(Node::State(state)) => assert_eq!(state.name, "s"),
            other => panic!("expected state s, got {:?}", other),
        }
        assert!(cell.resolve(&NodeRef::State { site: 0, state: 1 }).is_err());
    }

    #[test]
    fn test_state_indices_for_selection() {
        let cell = create_ab_chain();
        assert_eq!(cell.state_indices(&NodeRef::Cell).unwrap(), vec![0, 1]);
        assert_eq!(cell.state_indices(&NodeRef::Site(1)).unwrap(), vec![1]);
        assert_eq!(
            cell.state_indices(&NodeRef::State { site: 0, state: 0 }).unwrap(),
            vec![0]
        );
    }

    #[test]
    fn test_with_state_shifts_later_indices() {
        let cell = create_ab_chain();
        let grown = cell.with_state(0, "p").unwrap();

        assert_eq!(grown.state_labels(), vec!["A.s", "A.p", "B.s"]);
        assert_eq!(grown.hoppings().get(&HoppingKey::new(0, 2, [1, 0, 0])), Some(real(1.0)));
        assert_eq!(grown.hoppings().get(&HoppingKey::new(2, 0, [-1, 0, 0])), Some(real(1.0)));
        // The original snapshot is unchanged
        assert_eq!(cell.state_count(), 2);
        assert_eq!(cell.hoppings().get(&HoppingKey::new(0, 1, [1, 0, 0])), Some(real(1.0)));
    }

    #[test]
    fn test_without_site_drops_hoppings() {
        let cell = create_ab_chain()
            .with_hoppings(vec![HoppingRecord::new(1, 1, [0, 0, 0], real(0.5))])
            .unwrap();
        let removed = cell.without_site(0).unwrap();

        assert_eq!(removed.sites().len(), 1);
        assert_eq!(removed.hoppings().len(), 1);
        assert_eq!(removed.hoppings().get(&HoppingKey::new(0, 0, [0, 0, 0])), Some(real(0.5)));
    }

    #[test]
    fn test_without_state() {
        let cell = create_ab_chain().with_state(1, "p").unwrap();
        let removed = cell.without_state(1, 0).unwrap();
        assert_eq!(removed.state_labels(), vec!["A.s", "B.p"]);
        assert!(removed.hoppings().is_empty());
        assert!(cell.without_state(1, 5).is_err());
    }

    #[test]
    fn test_with_hoppings_rejects_unknown_state() {
        let cell = create_ab_chain();
        let result = cell.with_hoppings(vec![
            HoppingRecord::new(0, 0, [0, 0, 0], real(1.0)),
            HoppingRecord::new(0, 2, [0, 0, 0], real(1.0)),
        ]);
        assert!(matches!(result, Err(TbError::UnknownState { index: 2, count: 2 })));
    }

    #[test]
    fn test_with_pair_hoppings() {
        let cell = create_ab_chain()
            .with_pair_hoppings(0, 1, &[([0, 0, 0], real(2.0))])
            .unwrap();
        assert_eq!(cell.hoppings().between(0, 1), vec![([0, 0, 0], real(2.0))]);
        // Replacing one direction only breaks the pairing
        assert!(!cell.is_hermitian());
        assert_eq!(cell.hermiticity_check().len(), 2);
    }

    #[test]
    fn test_with_dimensionality_drops_displacements() {
        let sites = vec![Site::new("A", [0.0, 0.0, 0.0]).with_states(["s"])];
        let hoppings = vec![
            HoppingRecord::new(0, 0, [0, 1, 0], real(1.0)),
            HoppingRecord::new(0, 0, [0, -1, 0], real(1.0)),
            HoppingRecord::new(0, 0, [1, 0, 0], real(0.5)),
        ];
        let cell = UnitCell::from_parts("square", square_lattice(1.0).unwrap(), sites, hoppings).unwrap();
        let chain = cell.with_dimensionality(1).unwrap();

        assert_eq!(chain.basis().dimension(), Dimension::_1D);
        assert_eq!(chain.hoppings().get(&HoppingKey::new(0, 0, [0, 0, 0])), Some(real(2.0)));
        assert_eq!(chain.hoppings().get(&HoppingKey::new(0, 0, [1, 0, 0])), Some(real(0.5)));
    }

    #[test]
    fn test_reduce_keeps_hamiltonian() {
        let basis = LatticeBasis::from_base_vectors(
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(3.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Dimension::_2D,
        )
        .unwrap();
        let sites = vec![
            Site::new("A", [0.0, 0.0, 0.0]).with_states(["s"]),
            Site::new("B", [0.5, 0.5, 0.0]).with_states(["s"]),
        ];
        let hoppings = vec![
            HoppingRecord::new(0, 1, [0, 1, 0], Complex64::new(0.4, 0.3)),
            HoppingRecord::new(1, 0, [0, -1, 0], Complex64::new(0.4, -0.3)),
            HoppingRecord::new(0, 0, [1, 1, 0], real(0.2)),
            HoppingRecord::new(0, 0, [-1, -1, 0], real(0.2)),
        ];
        let cell = UnitCell::from_parts("sheared", basis, sites, hoppings).unwrap();
        let reduced = cell.reduce().unwrap();

        assert!(reduced.basis().vector(1).norm() < cell.basis().vector(1).norm());
        assert_eq!(reduced.hoppings().len(), cell.hoppings().len());
        assert_eq!(reduced.hoppings().get(&HoppingKey::new(0, 1, [3, 1, 0])), Some(Complex64::new(0.4, 0.3)));

        for k in [Vector3::new(0.3, -1.2, 0.0), Vector3::new(2.0, 0.7, 0.0)] {
            let difference = bloch_hamiltonian(&cell, &k) - bloch_hamiltonian(&reduced, &k);
            assert!(difference.norm() < TOL, "H(k) changed at {:?}", k);
        }

        // Site B moves by a lattice vector and is wrapped back into the cell
        let moved = reduced.sites()[1].fractional;
        assert!(moved[0].abs() < TOL);
        assert!((moved[1] - 0.5).abs() < TOL);
    }

    #[test]
    fn test_reduce_degenerate_cell() {
        let basis = LatticeBasis::from_base_vectors(
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Dimension::_2D,
        )
        .unwrap();
        let cell = UnitCell::new("flat", basis);
        assert!(matches!(cell.reduce(), Err(TbError::DegenerateLattice { .. })));
    }

    #[test]
    fn test_site_position() {
        let cell = create_ab_chain();
        assert_eq!(cell.site_position(1).unwrap(), Vector3::new(0.5, 0.0, 0.0));
        assert!(cell.site_position(2).is_err());
    }

    #[test]
    fn test_unit_cell_serde_roundtrip() {
        let cell = create_ab_chain();
        let json = serde_json::to_string(&cell).unwrap();
        let back: UnitCell = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cell);
    }

    #[test]
    fn test_deserialize_validates_hoppings() {
        let chain = UnitCell::from_parts(
            "chain",
            chain_lattice(1.0).unwrap(),
            vec![Site::new("A", [0.0; 3]).with_states(["s"])],
            Vec::new(),
        )
        .unwrap();
        let mut value = serde_json::to_value(&chain).unwrap();

        // Index past the single state is rejected
        value["hoppings"] = serde_json::json!([
            { "state_i": 0, "state_j": 5, "d1": 0, "d2": 7, "d3": 0, "re": 1.0, "im": 0.0 }
        ]);
        let result: Result<UnitCell, _> = serde_json::from_value(value.clone());
        let err = result.expect_err("unknown state must not deserialize");
        assert!(err.to_string().contains("unknown state index 5"), "unexpected error: {}", err);

        // Displacements along non-periodic axes are folded away, duplicates summed
        value["hoppings"] = serde_json::json!([
            { "state_i": 0, "state_j": 0, "d1": 1, "d2": 7, "d3": 0, "re": 0.5, "im": 0.0 },
            { "state_i": 0, "state_j": 0, "d1": 1, "d2": 0, "d3": 2, "re": 0.25, "im": 0.0 }
        ]);
        let cell: UnitCell = serde_json::from_value(value).unwrap();
        assert_eq!(cell.hoppings().len(), 1);
        assert_eq!(
            cell.hoppings().get(&HoppingKey::new(0, 0, [1, 0, 0])),
            Some(real(0.75))
        );
        // The validated cell assembles without touching missing states
        assert_eq!(bloch_hamiltonian(&cell, &Vector3::zeros()).shape(), (1, 1));
    }
}
