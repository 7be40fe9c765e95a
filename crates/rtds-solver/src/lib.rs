//! Symbolic circuit analysis for rtds.
//!
//! This crate provides:
//! - Parallel capacitor / series inductor reduction and expansion
//! - Loop (minimum cycle basis) and node (incidence matrix) topology
//! - KVL/KCL equation assembly and an exact symbolic linear solver
//! - State equations, node voltages and forward/backward/trapezoidal
//!   discrete update equations

pub mod analysis;
pub mod discrete;
pub mod equations;
pub mod error;
pub mod extract;
pub mod linear;
pub mod reduce;
pub mod topology;

pub use analysis::{analyze, analyze_with_time_step, AnalysisOptions, CircuitAnalysis};
pub use discrete::{discretize, DiscreteSystem, IntegrationMethod, TimeStep};
pub use equations::Equations;
pub use error::{Error, ErrorCategory, Result};
pub use extract::StateEquation;
pub use linear::{solve_linear, LinearSystem};
pub use reduce::{expand, reduce, Reduction};
pub use topology::{Incidence, Loop, Topology};
