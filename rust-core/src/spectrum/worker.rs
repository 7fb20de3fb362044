// Background solves: one worker thread per request, a cancel flag and a progress channel

use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::errors::{Result, TbError};
use crate::model::UnitCell;
use crate::spectrum::mesh::MeshSpec;
use crate::spectrum::solver::{Progress, SolveControl, SpectralSolver, Spectrum};
use crate::symmetries::BandPath;

/// Work item for the solver thread
#[derive(Debug, Clone, PartialEq)]
pub enum SolveRequest {
    Path(BandPath),
    Grid(MeshSpec),
}

/// Handle of an in-flight solve
#[derive(Debug)]
pub struct SolveHandle {
    cancel: Arc<AtomicBool>,
    progress: Receiver<Progress>,
    last_progress: Option<Progress>,
    join: JoinHandle<Result<Spectrum>>,
}

impl SolveHandle {
    /// Ask the worker to stop before its next point
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub fn progress_channel(&self) -> &Receiver<Progress> {
        &self.progress
    }

    /// Most recent progress report without blocking
    pub fn latest_progress(&mut self) -> Option<Progress> {
        if let Some(progress) = self.progress.try_iter().last() {
            self.last_progress = Some(progress);
        }
        self.last_progress
    }

    /// Block until the worker ends. A cancelled solve yields
    /// [`TbError::SolverCancelled`] even if the worker had already finished.
    pub fn wait(self) -> Result<Spectrum> {
        let outcome = self.join.join().map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            TbError::WorkerPanicked(message)
        })?;
        if self.cancel.load(Ordering::Relaxed) {
            return Err(TbError::SolverCancelled);
        }
        outcome
    }
}

/// Start a solve on its own thread.
///
/// The solver is built on the calling thread, so dimension and state errors
/// surface here before any thread starts.
pub fn spawn_solve(cell: &UnitCell, request: SolveRequest) -> Result<SolveHandle> {
    let solver = SpectralSolver::new(cell)?;
    let cancel = Arc::new(AtomicBool::new(false));
    let (sender, progress) = mpsc::channel();
    let control = SolveControl::new(Arc::clone(&cancel), Some(sender));

    let join = thread::Builder::new()
        .name("tibi-solver".to_string())
        .spawn(move || match request {
            SolveRequest::Path(path) => solver.solve_path_with(&path, &control),
            SolveRequest::Grid(spec) => solver.solve_grid_with(&spec, &control),
        })
        .map_err(|e| TbError::WorkerPanicked(format!("failed to start solver thread: {}", e)))?;

    Ok(SolveHandle {
        cancel,
        progress,
        last_progress: None,
        join,
    })
}

/// A unit cell snapshot together with at most one in-flight solve
#[derive(Debug)]
pub struct Session {
    cell: UnitCell,
    in_flight: Option<SolveHandle>,
}

impl Session {
    pub fn new(cell: UnitCell) -> Self {
        Self {
            cell,
            in_flight: None,
        }
    }

    pub fn cell(&self) -> &UnitCell {
        &self.cell
    }

    /// Whether a solve has been submitted and is still running
    pub fn is_busy(&self) -> bool {
        self.in_flight.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Submit a solve of the current snapshot. A finished but uncollected
    /// result is discarded.
    pub fn submit(&mut self, request: SolveRequest) -> Result<()> {
        if self.is_busy() {
            return Err(TbError::SolverBusy);
        }
        self.in_flight = Some(spawn_solve(&self.cell, request)?);
        info!("submitted solve for '{}'", self.cell.name);
        Ok(())
    }

    pub fn latest_progress(&mut self) -> Option<Progress> {
        self.in_flight.as_mut().and_then(|h| h.latest_progress())
    }

    /// Collect the result of the submitted solve
    pub fn wait(&mut self) -> Result<Spectrum> {
        let handle = self
            .in_flight
            .take()
            .ok_or_else(|| TbError::InvalidArgument("no solve has been submitted".to_string()))?;
        handle.wait()
    }

    /// Cancel the in-flight solve and join its thread; its data is dropped
    pub fn cancel(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.cancel();
            match handle.wait() {
                Err(e) if e.is_cancellation() => debug!("in-flight solve cancelled"),
                Err(e) => debug!("in-flight solve ended with {}", e),
                Ok(_) => {}
            }
        }
    }

    /// Apply a structural edit. Any in-flight solve is cancelled first; if the
    /// edit fails the snapshot is left unchanged.
    pub fn edit<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&UnitCell) -> Result<UnitCell>,
    {
        self.cancel();
        self.cell = edit(&self.cell)?;
        Ok(())
    }

    /// Swap in another snapshot (undo / redo), cancelling any in-flight solve
    pub fn replace(&mut self, cell: UnitCell) -> UnitCell {
        self.cancel();
        std::mem::replace(&mut self.cell, cell)
    }
}
