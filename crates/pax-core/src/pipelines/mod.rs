//! End-to-end analysis pipelines composed from the simulation, solver, and
//! persistence layers.

mod convergence;
mod grid;

pub use convergence::{ConvergenceReport, WidthConvergence, assess_convergence};
pub use grid::{GridRunOutcome, run_grid};
