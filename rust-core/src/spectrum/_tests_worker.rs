#[cfg(test)]
mod _tests_worker {
    use super::super::mesh::MeshSpec;
    use super::super::worker::*;
    use crate::errors::TbError;
    use crate::interfaces::MeshKind;
    use crate::lattice::{chain_lattice, square_lattice};
    use crate::model::{HoppingRecord, Site, UnitCell};
    use crate::symmetries::build_path;
    use nalgebra::Vector3;
    use num_complex::Complex64;
    use std::thread;
    use std::time::Duration;

    fn real(t: f64) -> Complex64 {
        Complex64::new(t, 0.0)
    }

    fn create_chain() -> UnitCell {
        let sites = vec![Site::new("A", [0.0, 0.0, 0.0]).with_states(["s"])];
        let hoppings = vec![
            HoppingRecord::new(0, 0, [1, 0, 0], real(-1.0)),
            HoppingRecord::new(0, 0, [-1, 0, 0], real(-1.0)),
        ];
        UnitCell::from_parts("chain", chain_lattice(1.0).unwrap(), sites, hoppings).unwrap()
    }

    // Helper: a model whose grid solve takes long enough to be interrupted
    fn create_slow_model() -> UnitCell {
        let sites = vec![Site::new("A", [0.0, 0.0, 0.0]).with_states((0..16).map(|i| format!("o{}", i)))];
        let mut hoppings = Vec::new();
        for i in 0..16 {
            for j in 0..16 {
                hoppings.push(HoppingRecord::new(i, j, [1, 0, 0], real(0.1)));
                hoppings.push(HoppingRecord::new(j, i, [-1, 0, 0], real(0.1)));
                hoppings.push(HoppingRecord::new(i, j, [0, 1, 0], real(0.05)));
                hoppings.push(HoppingRecord::new(j, i, [0, -1, 0], real(0.05)));
            }
        }
        UnitCell::from_parts("slow", square_lattice(1.0).unwrap(), sites, hoppings).unwrap()
    }

    fn large_grid() -> SolveRequest {
        SolveRequest::Grid(MeshSpec::new(MeshKind::GammaCentered, 400, 400, 1))
    }

    fn short_path() -> SolveRequest {
        let anchors = vec![Vector3::zeros(), Vector3::new(std::f64::consts::PI, 0.0, 0.0)];
        SolveRequest::Path(build_path(&anchors, 10).unwrap())
    }

    #[test]
    fn test_spawn_and_wait() {
        let handle = spawn_solve(&create_chain(), short_path()).unwrap();
        let spectrum = handle.wait().unwrap();
        assert_eq!(spectrum.len(), 10);
        assert!(spectrum.failed_points().is_empty());
    }

    #[test]
    fn test_spawn_validates_before_starting() {
        let empty = UnitCell::new("empty", chain_lattice(1.0).unwrap());
        assert!(matches!(
            spawn_solve(&empty, short_path()),
            Err(TbError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_progress_reaches_total() {
        let mut handle = spawn_solve(&create_chain(), short_path()).unwrap();
        while !handle.is_finished() {
            thread::sleep(Duration::from_millis(1));
        }
        let progress = handle.latest_progress().expect("progress was reported");
        assert_eq!(progress.completed, progress.total);
        assert_eq!(progress.total, 10);
        // The last report is kept once the channel is drained
        assert_eq!(handle.latest_progress(), Some(progress));
        assert!(handle.wait().is_ok());
    }

    #[test]
    fn test_cancel_discards_result() {
        let handle = spawn_solve(&create_slow_model(), large_grid()).unwrap();
        handle.cancel();
        assert!(handle.is_cancelled());

        let result = handle.wait();
        assert!(matches!(result, Err(TbError::SolverCancelled)));
        assert!(result.unwrap_err().is_cancellation());
    }

    #[test]
    fn test_cancel_after_completion_still_discards() {
        let handle = spawn_solve(&create_chain(), short_path()).unwrap();
        while !handle.is_finished() {
            thread::sleep(Duration::from_millis(1));
        }
        handle.cancel();
        assert!(matches!(handle.wait(), Err(TbError::SolverCancelled)));
    }

    #[test]
    fn test_session_allows_one_solve_in_flight() {
        let mut session = Session::new(create_slow_model());
        session.submit(large_grid()).unwrap();
        assert!(session.is_busy());
        assert!(matches!(session.submit(short_path()), Err(TbError::SolverBusy)));

        session.cancel();
        assert!(!session.is_busy());
        session.submit(short_path()).unwrap();
        assert_eq!(session.wait().unwrap().len(), 10);
    }

    #[test]
    fn test_session_wait_without_submit() {
        let mut session = Session::new(create_chain());
        assert!(matches!(session.wait(), Err(TbError::InvalidArgument(_))));
    }

    #[test]
    fn test_session_edit_cancels_in_flight_solve() {
        let mut session = Session::new(create_slow_model());
        session.submit(large_grid()).unwrap();

        session.edit(|cell| cell.with_state(0, "extra")).unwrap();
        assert!(!session.is_busy());
        assert_eq!(session.cell().state_count(), 17);
        // The cancelled solve left nothing to collect
        assert!(matches!(session.wait(), Err(TbError::InvalidArgument(_))));
    }

    #[test]
    fn test_session_failed_edit_keeps_snapshot() {
        let mut session = Session::new(create_chain());
        let before = session.cell().clone();

        let result = session.edit(|cell| cell.with_hoppings(vec![HoppingRecord::new(0, 9, [0, 0, 0], real(1.0))]));
        assert!(matches!(result, Err(TbError::UnknownState { index: 9, .. })));
        assert_eq!(session.cell(), &before);
    }

    #[test]
    fn test_session_replace_returns_previous_snapshot() {
        let mut session = Session::new(create_chain());
        let grown = session.cell().with_site(Site::new("B", [0.5, 0.0, 0.0]).with_states(["s"]));

        let previous = session.replace(grown);
        assert_eq!(previous.state_count(), 1);
        assert_eq!(session.cell().state_count(), 2);
    }
}
