//! # rtds
//!
//! Symbolic circuit equations for real-time digital simulation.
//!
//! rtds turns a list of two-terminal components into exact symbolic
//! equations:
//! - Branch currents and voltages, and node voltages relative to ground
//! - Continuous-time state equations for capacitors and inductors
//! - Forward Euler, backward Euler and trapezoidal discrete updates
//!
//! Parallel capacitors and series inductors are merged before solving and
//! split back afterwards.
//!
//! ## Quick Start
//!
//! ```rust
//! use rtds::prelude::*;
//!
//! let components = vec![
//!     Component::voltage_source("Vin", "IN", "0", "Vin"),
//!     Component::resistor("R1", "IN", "OUT", "R1"),
//!     Component::capacitor("C1", "OUT", "0", "C1"),
//! ];
//!
//! let analysis = analyze(components, &AnalysisOptions::default()).unwrap();
//! println!("dVC1/dt = {}", analysis.states()["C1"]);
//! println!("VC1[n] - VC1[n-1] = {}", analysis.backward().unwrap()["C1"]);
//! ```
//!
//! ## Fixed Time Step
//!
//! ```rust
//! use rtds::prelude::*;
//!
//! let options = AnalysisOptions::default().with_time_step("10u").unwrap();
//! # let components = vec![
//! #     Component::voltage_source("Vin", "IN", "0", "Vin"),
//! #     Component::resistor("R1", "IN", "OUT", "R1"),
//! #     Component::capacitor("C1", "OUT", "0", "C1"),
//! # ];
//! let analysis = analyze(components, &options).unwrap();
//! assert!(!analysis.forward().unwrap()["C1"].contains(&Symbol::new("Ts")));
//! ```

// Re-export member crates
pub use rtds_core as core;
pub use rtds_solver as solver;

// ============================================================================
// Convenient re-exports from rtds_core
// ============================================================================

pub use rtds_core::{
    // Circuit representation
    Circuit,
    Component,
    ComponentId,
    ComponentKind,
    // Errors
    Error as CoreError,
    // Algebra
    Expr,
    NodeLabel,
    Origin,
    Symbol,
};

// ============================================================================
// Convenient re-exports from rtds_solver
// ============================================================================

pub use rtds_solver::{
    AnalysisOptions,
    CircuitAnalysis,
    DiscreteSystem,
    // Errors
    Error as SolverError,
    ErrorCategory,
    Incidence,
    IntegrationMethod,
    Loop,
    StateEquation,
    TimeStep,
    // Pipeline
    analyze,
    analyze_with_time_step,
};

// ============================================================================
// Re-export commonly used external types
// ============================================================================

/// Re-export of the ordered map used for every result table.
pub use indexmap::IndexMap;

/// Re-export of nalgebra's dynamic matrix type.
pub use nalgebra::DMatrix;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module containing commonly used types.
///
/// ```rust
/// use rtds::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::{Component, ComponentKind, Expr, NodeLabel, Symbol};

    // Analysis
    pub use crate::{AnalysisOptions, CircuitAnalysis, analyze, analyze_with_time_step};

    // Discretization
    pub use crate::{IntegrationMethod, TimeStep};

    // Errors
    pub use crate::{ErrorCategory, SolverError};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_divider() {
        let components = vec![
            Component::voltage_source("Vin", "IN", "0", "Vin"),
            Component::resistor("R1", "IN", "OUT", "R1"),
            Component::resistor("R2", "OUT", "0", "R2"),
        ];
        let analysis = analyze(components, &AnalysisOptions::default()).unwrap();
        assert_eq!(
            analysis.node_voltages()["OUT"].to_string(),
            "R2*Vin/(R1 + R2)"
        );
    }

    #[test]
    fn test_analyze_with_time_step() {
        let components = vec![
            Component::voltage_source("Vin", "IN", "0", "Vin"),
            Component::resistor("R1", "IN", "OUT", "R1"),
            Component::capacitor("C1", "OUT", "0", "C1"),
        ];
        let analysis = analyze_with_time_step(components, None).unwrap();
        let step = analysis.discrete(IntegrationMethod::Forward).unwrap().time_step();
        assert_eq!(step, &Expr::symbol("Ts"));
    }

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let r = Component::resistor("R1", "1", "0", "R1");
        assert_eq!(r.kind(), ComponentKind::Resistor);
        assert_eq!(IntegrationMethod::ALL.len(), 3);
        assert_eq!(TimeStep::default(), TimeStep::Symbolic);
    }
}
