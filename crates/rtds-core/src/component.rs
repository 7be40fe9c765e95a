//! Two-terminal circuit components.

use std::fmt;

use crate::circuit::ComponentId;
use crate::error::{Error, Result};
use crate::expr::{Expr, Symbol};
use crate::node::NodeLabel;

/// Type of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    VoltageSource,
    CurrentSource,
    Resistor,
    Capacitor,
    Inductor,
    /// Zero-volt stand-in left behind when series inductors are merged.
    Short,
}

impl ComponentKind {
    /// Every kind that can appear in a netlist.
    pub const NETLIST: [ComponentKind; 5] = [
        ComponentKind::VoltageSource,
        ComponentKind::CurrentSource,
        ComponentKind::Resistor,
        ComponentKind::Capacitor,
        ComponentKind::Inductor,
    ];

    /// Netlist type letter (`V I R C L`); shorts use `S`.
    pub fn letter(self) -> char {
        match self {
            ComponentKind::VoltageSource => 'V',
            ComponentKind::CurrentSource => 'I',
            ComponentKind::Resistor => 'R',
            ComponentKind::Capacitor => 'C',
            ComponentKind::Inductor => 'L',
            ComponentKind::Short => 'S',
        }
    }

    /// Kind for a netlist type letter.
    pub fn from_letter(letter: char) -> Option<Self> {
        Self::NETLIST.into_iter().find(|k| k.letter() == letter)
    }

    /// Independent sources.
    pub fn is_active(self) -> bool {
        matches!(self, ComponentKind::VoltageSource | ComponentKind::CurrentSource)
    }

    /// Energy-storage elements.
    pub fn is_storage(self) -> bool {
        matches!(self, ComponentKind::Capacitor | ComponentKind::Inductor)
    }

    /// Whether the solved-for quantity is the voltage rather than the current.
    pub fn solves_for_voltage(self) -> bool {
        matches!(self, ComponentKind::CurrentSource | ComponentKind::Inductor)
    }

    fn description(self) -> &'static str {
        match self {
            ComponentKind::VoltageSource => "Voltage Source",
            ComponentKind::CurrentSource => "Current Source",
            ComponentKind::Resistor => "Resistor",
            ComponentKind::Capacitor => "Capacitor",
            ComponentKind::Inductor => "Inductor",
            ComponentKind::Short => "Short",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Where a component in the arena came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Supplied by the caller.
    Primitive,
    /// Merged from several primitives; `inverted[k]` is true when
    /// `originals[k]` is connected opposite to the first original.
    Equivalent {
        originals: Vec<ComponentId>,
        inverted: Vec<bool>,
    },
    /// Zero-valued short replacing a merged series inductor.
    StandIn { replaces: ComponentId },
}

/// A two-terminal circuit element.
///
/// `voltage` is measured from `nodes.0` to `nodes.1` and `current` flows
/// into `nodes.0`. Both start out as the naming-convention symbols of the
/// component kind and are overwritten with solved expressions.
#[derive(Debug, Clone)]
pub struct Component {
    name: String,
    kind: ComponentKind,
    nodes: (NodeLabel, NodeLabel),
    value: Expr,
    voltage: Expr,
    current: Expr,
    origin: Origin,
}

impl Component {
    /// Create a component of the given kind.
    pub fn new(
        kind: ComponentKind,
        name: impl Into<String>,
        a: impl Into<NodeLabel>,
        b: impl Into<NodeLabel>,
        value: impl Into<Expr>,
    ) -> Self {
        let name = name.into();
        let value = value.into();
        let (voltage, current) = match kind {
            ComponentKind::VoltageSource => (value.clone(), internal_current(&name)),
            ComponentKind::CurrentSource => (internal_voltage(&name), value.clone()),
            ComponentKind::Resistor => {
                let current = internal_current(&name);
                (&value * &current, current)
            }
            ComponentKind::Capacitor => (Expr::symbol(format!("V{}", name)), internal_current(&name)),
            ComponentKind::Inductor => (internal_voltage(&name), Expr::symbol(format!("I{}", name))),
            ComponentKind::Short => (Expr::zero(), internal_current(&name)),
        };
        Component {
            name,
            kind,
            nodes: (a.into(), b.into()),
            value,
            voltage,
            current,
            origin: Origin::Primitive,
        }
    }

    /// Create a component whose kind is given by the first letter of its name,
    /// as in a netlist line (`R1 IN OUT 10k`).
    pub fn from_netlist(
        name: impl Into<String>,
        a: impl Into<NodeLabel>,
        b: impl Into<NodeLabel>,
        value: impl Into<Expr>,
    ) -> Result<Self> {
        let name = name.into();
        let kind = name
            .chars()
            .next()
            .and_then(ComponentKind::from_letter)
            .ok_or_else(|| Error::UnknownComponentType(name.clone()))?;
        Ok(Component::new(kind, name, a, b, value))
    }

    pub fn voltage_source(
        name: impl Into<String>,
        a: impl Into<NodeLabel>,
        b: impl Into<NodeLabel>,
        value: impl Into<Expr>,
    ) -> Self {
        Component::new(ComponentKind::VoltageSource, name, a, b, value)
    }

    pub fn current_source(
        name: impl Into<String>,
        a: impl Into<NodeLabel>,
        b: impl Into<NodeLabel>,
        value: impl Into<Expr>,
    ) -> Self {
        Component::new(ComponentKind::CurrentSource, name, a, b, value)
    }

    pub fn resistor(
        name: impl Into<String>,
        a: impl Into<NodeLabel>,
        b: impl Into<NodeLabel>,
        value: impl Into<Expr>,
    ) -> Self {
        Component::new(ComponentKind::Resistor, name, a, b, value)
    }

    pub fn capacitor(
        name: impl Into<String>,
        a: impl Into<NodeLabel>,
        b: impl Into<NodeLabel>,
        value: impl Into<Expr>,
    ) -> Self {
        Component::new(ComponentKind::Capacitor, name, a, b, value)
    }

    pub fn inductor(
        name: impl Into<String>,
        a: impl Into<NodeLabel>,
        b: impl Into<NodeLabel>,
        value: impl Into<Expr>,
    ) -> Self {
        Component::new(ComponentKind::Inductor, name, a, b, value)
    }

    /// Merged component built from `originals`, taking the first original's
    /// name and nodes.
    pub fn equivalent(
        first: &Component,
        value: Expr,
        originals: Vec<ComponentId>,
        inverted: Vec<bool>,
    ) -> Self {
        let mut merged = Component::new(
            first.kind,
            first.name.clone(),
            first.nodes.0.clone(),
            first.nodes.1.clone(),
            value,
        );
        merged.origin = Origin::Equivalent { originals, inverted };
        merged
    }

    /// Zero-valued short occupying the place of `replaced`.
    pub fn stand_in(replaced: &Component, id: ComponentId) -> Self {
        let mut short = Component::new(
            ComponentKind::Short,
            replaced.name.clone(),
            replaced.nodes.0.clone(),
            replaced.nodes.1.clone(),
            Expr::zero(),
        );
        short.origin = Origin::StandIn { replaces: id };
        short
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Terminal nodes in netlist order.
    pub fn nodes(&self) -> (&NodeLabel, &NodeLabel) {
        (&self.nodes.0, &self.nodes.1)
    }

    /// Whether the component touches `node`.
    pub fn touches(&self, node: &NodeLabel) -> bool {
        self.nodes.0 == *node || self.nodes.1 == *node
    }

    /// The terminal opposite to `node`, if the component touches it.
    pub fn opposite(&self, node: &NodeLabel) -> Option<&NodeLabel> {
        if self.nodes.0 == *node {
            Some(&self.nodes.1)
        } else if self.nodes.1 == *node {
            Some(&self.nodes.0)
        } else {
            None
        }
    }

    pub fn value(&self) -> &Expr {
        &self.value
    }

    pub fn voltage(&self) -> &Expr {
        &self.voltage
    }

    pub fn current(&self) -> &Expr {
        &self.current
    }

    pub fn set_voltage(&mut self, voltage: Expr) {
        self.voltage = voltage;
    }

    pub fn set_current(&mut self, current: Expr) {
        self.current = current;
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn is_short(&self) -> bool {
        self.kind == ComponentKind::Short
    }

    /// The symbol the linear solver solves for: the voltage of current
    /// sources and inductors, the current of everything else.
    pub fn unknown(&self) -> Symbol {
        if self.kind.solves_for_voltage() {
            Symbol::new(format!("_V{}", self.name))
        } else {
            Symbol::new(format!("_I{}", self.name))
        }
    }

    /// State variable of a storage element: `V<name>` or `I<name>`.
    pub fn state_symbol(&self) -> Option<Symbol> {
        match self.kind {
            ComponentKind::Capacitor => Some(Symbol::new(format!("V{}", self.name))),
            ComponentKind::Inductor => Some(Symbol::new(format!("I{}", self.name))),
            _ => None,
        }
    }

    /// Store the solved value of [`Component::unknown`]. Resistors also derive
    /// their voltage as `value * current`.
    pub fn assign_solution(&mut self, solution: Expr) {
        match self.kind {
            ComponentKind::CurrentSource | ComponentKind::Inductor => self.voltage = solution,
            ComponentKind::Resistor => {
                self.voltage = &self.value * &solution;
                self.current = solution;
            }
            ComponentKind::VoltageSource | ComponentKind::Capacitor | ComponentKind::Short => {
                self.current = solution
            }
        }
    }

    /// Voltage term this component contributes to a loop equation.
    pub fn loop_voltage(&self) -> Expr {
        match self.kind {
            ComponentKind::Resistor => &self.value * &self.current,
            _ => self.voltage.clone(),
        }
    }
}

fn internal_current(name: &str) -> Expr {
    Expr::symbol(format!("_I{}", name))
}

fn internal_voltage(name: &str) -> Expr {
    Expr::symbol(format!("_V{}", name))
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Origin::StandIn { .. } => write!(
                f,
                "Short (originally {}), connecting the nodes {} and {}",
                self.name, self.nodes.0, self.nodes.1
            ),
            Origin::Equivalent { .. } => write!(
                f,
                "Equivalent {} {}, connected to the nodes {} and {}, with value of {}",
                self.kind, self.name, self.nodes.0, self.nodes.1, self.value
            ),
            Origin::Primitive => write!(
                f,
                "{} {}, connected to the nodes {} and {}, with value of {}",
                self.kind, self.name, self.nodes.0, self.nodes.1, self.value
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unknowns() {
        let v = Component::voltage_source("Vin", "IN", "0", "Vin");
        assert_eq!(v.voltage(), &Expr::symbol("Vin"));
        assert_eq!(v.current(), &Expr::symbol("_IVin"));
        assert_eq!(v.unknown(), Symbol::new("_IVin"));

        let i = Component::current_source("I1", "0", "A", "I1");
        assert_eq!(i.current(), &Expr::symbol("I1"));
        assert_eq!(i.voltage(), &Expr::symbol("_VI1"));
        assert_eq!(i.unknown(), Symbol::new("_VI1"));
    }

    #[test]
    fn test_storage_state_symbols() {
        let c = Component::capacitor("C1", "A", "0", "C1");
        assert_eq!(c.voltage(), &Expr::symbol("VC1"));
        assert_eq!(c.unknown(), Symbol::new("_IC1"));
        assert_eq!(c.state_symbol(), Some(Symbol::new("VC1")));

        let l = Component::inductor("L1", "A", "B", "L1");
        assert_eq!(l.current(), &Expr::symbol("IL1"));
        assert_eq!(l.unknown(), Symbol::new("_VL1"));
        assert_eq!(l.state_symbol(), Some(Symbol::new("IL1")));
    }

    #[test]
    fn test_resistor_voltage_is_derived() {
        let mut r = Component::resistor("R1", "A", "B", Expr::integer(100));
        assert_eq!(r.voltage(), &(Expr::integer(100) * Expr::symbol("_IR1")));
        r.assign_solution(Expr::symbol("Vin") / Expr::integer(100));
        assert_eq!(r.current(), &(Expr::symbol("Vin") / Expr::integer(100)));
        assert_eq!(r.voltage(), &Expr::symbol("Vin"));
    }

    #[test]
    fn test_from_netlist() {
        let l = Component::from_netlist("L2", "1", "2", "L2").unwrap();
        assert_eq!(l.kind(), ComponentKind::Inductor);
        assert!(matches!(
            Component::from_netlist("X1", "1", "2", "X1"),
            Err(Error::UnknownComponentType(_))
        ));
    }

    #[test]
    fn test_stand_in_short() {
        let l = Component::inductor("L2", "A", "B", "L2");
        let short = Component::stand_in(&l, ComponentId::new(3));
        assert!(short.is_short());
        assert!(short.voltage().is_zero());
        assert_eq!(short.current(), &Expr::symbol("_IL2"));
        assert_eq!(short.unknown(), Symbol::new("_IL2"));
        assert_eq!(short.origin(), &Origin::StandIn { replaces: ComponentId::new(3) });
    }

    #[test]
    fn test_opposite_node() {
        let r = Component::resistor("R1", "A", "B", "R1");
        assert_eq!(r.opposite(&"A".into()), Some(&NodeLabel::new("B")));
        assert_eq!(r.opposite(&"C".into()), None);
        assert!(r.touches(&"B".into()));
    }

    #[test]
    fn test_kind_letters() {
        for kind in ComponentKind::NETLIST {
            assert_eq!(ComponentKind::from_letter(kind.letter()), Some(kind));
        }
        assert_eq!(ComponentKind::from_letter('S'), None);
        assert!(ComponentKind::VoltageSource.is_active());
        assert!(ComponentKind::Inductor.is_storage());
        assert!(!ComponentKind::Short.is_storage());
    }
}
