//! Error types for rtds-solver.

use std::fmt;

use thiserror::Error;

use crate::discrete::IntegrationMethod;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] rtds_core::Error),

    #[error("node {0} is not connected to ground")]
    Disconnected(String),

    #[error("series branch through node {node} cannot be followed")]
    AmbiguousBranch { node: String },

    #[error("found {found} independent loops, expected {expected}")]
    IncompleteCycleBasis { found: usize, expected: usize },

    #[error("component {0} has a value of zero")]
    ZeroValue(String),

    #[error("circuit equations have no solution")]
    NoSolution,

    #[error("circuit equations have no unique solution: {free} unknowns left free")]
    Underdetermined { free: usize },

    #[error("elimination on {0} left a remainder")]
    InexactElimination(String),

    #[error("{method} discretization failed: {reason}")]
    Discretization {
        method: IntegrationMethod,
        reason: String,
    },
}

/// Broad cause of an analysis failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Ground missing or unreachable, or a branch walk that cannot proceed.
    Topology,
    /// The circuit equations have no unique solution.
    Solver,
    /// Netlist data that contradicts itself.
    Consistency,
    /// The discrete update equations could not be made explicit.
    Discretization,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Core(rtds_core::Error::NoGround) => ErrorCategory::Topology,
            Error::Core(rtds_core::Error::NonLinear(_)) => ErrorCategory::Solver,
            Error::Core(_) | Error::ZeroValue(_) => ErrorCategory::Consistency,
            Error::Disconnected(_)
            | Error::AmbiguousBranch { .. }
            | Error::IncompleteCycleBasis { .. } => ErrorCategory::Topology,
            Error::NoSolution | Error::Underdetermined { .. } | Error::InexactElimination(_) => {
                ErrorCategory::Solver
            }
            Error::Discretization { .. } => ErrorCategory::Discretization,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Topology => "topology",
            ErrorCategory::Solver => "solver",
            ErrorCategory::Consistency => "consistency",
            ErrorCategory::Discretization => "discretization",
        };
        f.write_str(name)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
