//! Discrete-time update equations for the continuous state equations.
//!
//! Each method turns `dx/dt = f(...)` into the implicit form
//! `x_{n} - x_{n-1} - h * f(...)` with the time-varying symbols of `f`
//! replaced by samples, then solves all of the implicit equations together
//! for the new samples.

use std::fmt;

use indexmap::IndexMap;
use num_rational::BigRational;
use rtds_core::units::parse_value;
use rtds_core::{Expr, Symbol};

use crate::error::{Error, Result};
use crate::extract::StateEquation;
use crate::linear::solve_linear;

/// Numerical integration rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegrationMethod {
    /// Forward Euler: `f` is evaluated at the previous sample.
    Forward,
    /// Backward Euler: `f` is evaluated at the new sample.
    Backward,
    /// Trapezoidal: `f` is evaluated at the mean of both samples.
    Trapezoidal,
}

impl IntegrationMethod {
    pub const ALL: [IntegrationMethod; 3] = [
        IntegrationMethod::Forward,
        IntegrationMethod::Backward,
        IntegrationMethod::Trapezoidal,
    ];

    /// Discrete stand-in for a time-varying symbol.
    pub fn sample(self, symbol: &Symbol) -> Expr {
        let previous = Expr::symbol(symbol.previous_sample());
        let current = Expr::symbol(symbol.current_sample());
        match self {
            IntegrationMethod::Forward => previous,
            IntegrationMethod::Backward => current,
            IntegrationMethod::Trapezoidal => (previous + current) / Expr::integer(2),
        }
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntegrationMethod::Forward => "forward",
            IntegrationMethod::Backward => "backward",
            IntegrationMethod::Trapezoidal => "trapezoidal",
        };
        f.write_str(name)
    }
}

/// Integration time step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimeStep {
    /// Keep the step as the symbol `Ts`.
    #[default]
    Symbolic,
    /// A fixed, exact step.
    Value(BigRational),
}

impl TimeStep {
    /// Name of the symbolic step.
    pub const SYMBOL: &'static str = "Ts";

    /// Decode a literal such as `1e-6` or `10u`.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(TimeStep::Value(parse_value(text)?))
    }

    pub fn to_expr(&self) -> Expr {
        match self {
            TimeStep::Symbolic => Expr::symbol(Self::SYMBOL),
            TimeStep::Value(value) => Expr::rational(value.clone()),
        }
    }
}

impl fmt::Display for TimeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeStep::Symbolic => f.write_str(Self::SYMBOL),
            TimeStep::Value(value) => write!(f, "{}", value),
        }
    }
}

/// Explicit discrete updates of every state under one method.
#[derive(Debug, Clone)]
pub struct DiscreteSystem {
    method: IntegrationMethod,
    time_step: Expr,
    previous: IndexMap<String, Symbol>,
    implicit: IndexMap<String, Expr>,
    updates: IndexMap<String, Expr>,
}

impl DiscreteSystem {
    pub fn method(&self) -> IntegrationMethod {
        self.method
    }

    pub fn time_step(&self) -> &Expr {
        &self.time_step
    }

    /// Increment per component: new sample minus previous sample.
    pub fn updates(&self) -> &IndexMap<String, Expr> {
        &self.updates
    }

    /// The implicit equations (each `= 0`) the updates were solved from.
    pub fn implicit_equations(&self) -> &IndexMap<String, Expr> {
        &self.implicit
    }

    /// Full new sample of one component's state: previous sample plus update.
    pub fn explicit(&self, component: &str) -> Option<Expr> {
        let previous = self.previous.get(component)?;
        let update = self.updates.get(component)?;
        Some(Expr::symbol(previous.clone()) + update)
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Discretize `states` with step `time_step`.
pub fn discretize(
    states: &[StateEquation],
    time_step: &Expr,
    method: IntegrationMethod,
) -> Result<DiscreteSystem> {
    let failed = |reason: String| Error::Discretization { method, reason };

    let mut previous = IndexMap::new();
    let mut implicit = IndexMap::new();
    let mut unknowns = Vec::with_capacity(states.len());
    for state in states {
        let old = state.variable().previous_sample();
        let new = state.variable().current_sample();
        let sampled = state
            .derivative()
            .subs_with(|s| s.is_time_varying().then(|| method.sample(s)))
            .ok_or_else(|| failed(format!("sampling {} divides by zero", state.variable())))?;
        let equation =
            Expr::symbol(new.clone()) - (Expr::symbol(old.clone()) + time_step * sampled);
        log::trace!("{} implicit {}: {} = 0", method, state.component(), equation);

        previous.insert(state.component().to_string(), old);
        implicit.insert(state.component().to_string(), equation);
        unknowns.push(new);
    }

    let solution = solve_linear(implicit.values(), &unknowns).map_err(|e| failed(e.to_string()))?;

    let mut updates = IndexMap::with_capacity(states.len());
    for ((component, old), new) in previous.iter().zip(&unknowns) {
        let value = solution
            .get(new)
            .ok_or_else(|| failed(format!("{} was not solved", new)))?;
        updates.insert(component.clone(), value - Expr::symbol(old.clone()));
    }
    log::debug!("{} discretization: {} updates", method, updates.len());

    Ok(DiscreteSystem {
        method,
        time_step: time_step.clone(),
        previous,
        implicit,
        updates,
    })
}
