//! Kirchhoff equation builder.

use rtds_core::{Circuit, Expr, Symbol};

use crate::topology::{Incidence, Loop, Topology};

/// KVL and KCL equations of the active circuit, each implicitly `= 0`,
/// together with the unknowns they are solved for.
#[derive(Debug, Clone)]
pub struct Equations {
    kvl: Vec<Expr>,
    kcl: Vec<Expr>,
    unknowns: Vec<Symbol>,
}

impl Equations {
    pub fn build(circuit: &Circuit, topology: &Topology) -> Self {
        let kvl = loop_equations(circuit, topology.loops());
        let kcl = node_equations(circuit, topology.incidence());
        let unknowns = unknowns(circuit);
        log::debug!(
            "equations: {} KVL, {} KCL, {} unknowns",
            kvl.len(),
            kcl.len(),
            unknowns.len()
        );
        Self { kvl, kcl, unknowns }
    }

    pub fn kvl(&self) -> &[Expr] {
        &self.kvl
    }

    pub fn kcl(&self) -> &[Expr] {
        &self.kcl
    }

    pub fn unknowns(&self) -> &[Symbol] {
        &self.unknowns
    }

    /// KVL equations followed by KCL equations.
    pub fn all(&self) -> impl Iterator<Item = &Expr> {
        self.kvl.iter().chain(&self.kcl)
    }

    pub fn len(&self) -> usize {
        self.kvl.len() + self.kcl.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One equation per loop: `Σ -v_k * polarity_k`.
pub fn loop_equations(circuit: &Circuit, loops: &[Loop]) -> Vec<Expr> {
    loops
        .iter()
        .map(|l| {
            l.iter()
                .map(|(id, polarity)| -circuit[id].loop_voltage() * Expr::integer(polarity.into()))
                .sum()
        })
        .collect()
}

/// One equation per non-ground node: the incidence row times the vector of
/// component currents.
pub fn node_equations(circuit: &Circuit, incidence: &Incidence) -> Vec<Expr> {
    (0..incidence.nodes().len())
        .map(|row| {
            incidence
                .row(row)
                .map(|(id, sign)| circuit[id].current() * Expr::integer(sign.into()))
                .sum()
        })
        .collect()
}

/// Solve-order unknowns: one per active component.
pub fn unknowns(circuit: &Circuit) -> Vec<Symbol> {
    circuit
        .active_components()
        .map(|(_, component)| component.unknown())
        .collect()
}
