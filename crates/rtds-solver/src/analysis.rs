//! End-to-end circuit analysis.

use indexmap::IndexMap;
use rtds_core::{Circuit, Component, Expr};

use crate::discrete::{discretize, DiscreteSystem, IntegrationMethod, TimeStep};
use crate::equations::Equations;
use crate::error::Result;
use crate::extract::{
    assign_solutions, component_voltages, currents, node_voltages, state_equations, StateEquation,
};
use crate::linear::solve_linear;
use crate::reduce::{expand, reduce, Reduction};
use crate::topology::{Incidence, Loop, Topology};

/// Analysis options.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Step used by the discrete update equations.
    pub time_step: TimeStep,
    /// Whether to derive discrete update equations at all.
    pub discretize: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            time_step: TimeStep::Symbolic,
            discretize: true,
        }
    }
}

impl AnalysisOptions {
    /// Use a fixed time step given as a literal such as `1e-6` or `10u`.
    pub fn with_time_step(mut self, text: &str) -> Result<Self> {
        self.time_step = TimeStep::parse(text)?;
        Ok(self)
    }

    /// Skip the discretization stage.
    pub fn without_discretization(mut self) -> Self {
        self.discretize = false;
        self
    }
}

/// A fully solved circuit.
#[derive(Debug, Clone)]
pub struct CircuitAnalysis {
    circuit: Circuit,
    topology: Topology,
    reduction: Reduction,
    states: Vec<StateEquation>,
    state_map: IndexMap<String, Expr>,
    currents: IndexMap<String, Expr>,
    component_voltages: IndexMap<String, Expr>,
    node_voltages: IndexMap<String, Expr>,
    discrete: Vec<DiscreteSystem>,
}

/// Analyze a circuit given as an ordered component list.
///
/// Runs reduction, loop and node equation assembly, the symbolic solve,
/// expansion, state and node voltage extraction, and (unless disabled) the
/// three discretizations. Any failure aborts the whole analysis.
pub fn analyze(components: Vec<Component>, options: &AnalysisOptions) -> Result<CircuitAnalysis> {
    let mut circuit = Circuit::new(components)?;
    let reduction = reduce(&mut circuit)?;

    let topology = Topology::build(&circuit)?;
    let equations = Equations::build(&circuit, &topology);
    let solution = solve_linear(equations.all(), equations.unknowns())?;
    assign_solutions(&mut circuit, &solution)?;

    let states = state_equations(&circuit)?;
    log::debug!("analysis: {} state equations", states.len());
    expand(&mut circuit)?;

    let currents = currents(&circuit);
    let component_voltages = component_voltages(&circuit);
    let node_voltages = node_voltages(&circuit, topology.spanning_tree())?;
    let state_map = states
        .iter()
        .map(|s| (s.component().to_string(), s.derivative().clone()))
        .collect();

    let discrete = if options.discretize {
        let time_step = options.time_step.to_expr();
        IntegrationMethod::ALL
            .iter()
            .map(|&method| discretize(&states, &time_step, method))
            .collect::<Result<Vec<_>>>()?
    } else {
        Vec::new()
    };

    Ok(CircuitAnalysis {
        circuit,
        topology,
        reduction,
        states,
        state_map,
        currents,
        component_voltages,
        node_voltages,
        discrete,
    })
}

/// Analyze with an optional time step literal; `None` keeps the step
/// symbolic.
pub fn analyze_with_time_step(
    components: Vec<Component>,
    time_step: Option<&str>,
) -> Result<CircuitAnalysis> {
    let options = match time_step {
        Some(text) => AnalysisOptions::default().with_time_step(text)?,
        None => AnalysisOptions::default(),
    };
    analyze(components, &options)
}

impl CircuitAnalysis {
    /// The solved circuit, with equivalents expanded back into the
    /// caller's components.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Solved components in input order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.circuit.primitives().map(|(_, c)| c)
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components().find(|c| c.name() == name)
    }

    pub fn currents(&self) -> &IndexMap<String, Expr> {
        &self.currents
    }

    pub fn component_voltages(&self) -> &IndexMap<String, Expr> {
        &self.component_voltages
    }

    /// Node voltages relative to ground; ground itself is not listed.
    pub fn node_voltages(&self) -> &IndexMap<String, Expr> {
        &self.node_voltages
    }

    /// Right-hand side of each storage component's state equation.
    pub fn states(&self) -> &IndexMap<String, Expr> {
        &self.state_map
    }

    pub fn state_equations(&self) -> &[StateEquation] {
        &self.states
    }

    pub fn forward(&self) -> Option<&IndexMap<String, Expr>> {
        self.discrete(IntegrationMethod::Forward).map(|d| d.updates())
    }

    pub fn backward(&self) -> Option<&IndexMap<String, Expr>> {
        self.discrete(IntegrationMethod::Backward).map(|d| d.updates())
    }

    pub fn trapezoidal(&self) -> Option<&IndexMap<String, Expr>> {
        self.discrete(IntegrationMethod::Trapezoidal).map(|d| d.updates())
    }

    /// Discrete system for one method, if discretization ran.
    pub fn discrete(&self, method: IntegrationMethod) -> Option<&DiscreteSystem> {
        self.discrete.iter().find(|d| d.method() == method)
    }

    /// KVL loops of the reduced circuit.
    pub fn loops(&self) -> &[Loop] {
        self.topology.loops()
    }

    /// KCL incidence matrix of the reduced circuit.
    pub fn incidence(&self) -> &Incidence {
        self.topology.incidence()
    }

    pub fn reduction(&self) -> &Reduction {
        &self.reduction
    }

    /// Whether the circuit has no storage components.
    pub fn is_stateless(&self) -> bool {
        self.states.is_empty()
    }
}
