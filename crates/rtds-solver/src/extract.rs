//! Post-solve extraction: state equations, branch quantities and node
//! voltages.

use std::collections::HashMap;

use indexmap::IndexMap;
use rtds_core::{Circuit, ComponentKind, Expr, NodeLabel, Symbol};

use crate::error::{Error, Result};

/// Continuous-time state equation `d(variable)/dt = derivative` of one
/// storage component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEquation {
    component: String,
    variable: Symbol,
    derivative: Expr,
}

impl StateEquation {
    pub fn new(component: impl Into<String>, variable: Symbol, derivative: Expr) -> Self {
        Self {
            component: component.into(),
            variable,
            derivative,
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// `V<name>` for a capacitor, `I<name>` for an inductor.
    pub fn variable(&self) -> &Symbol {
        &self.variable
    }

    pub fn derivative(&self) -> &Expr {
        &self.derivative
    }
}

/// Write the solved unknowns back onto the active components.
pub fn assign_solutions(circuit: &mut Circuit, solution: &IndexMap<Symbol, Expr>) -> Result<()> {
    for id in circuit.active().to_vec() {
        let unknown = circuit[id].unknown();
        let value = solution
            .get(&unknown)
            .cloned()
            .ok_or(Error::Underdetermined { free: 1 })?;
        circuit[id].assign_solution(value);
    }
    Ok(())
}

/// State equations of the active storage components: `i / C` for
/// capacitors, `v / L` for inductors.
pub fn state_equations(circuit: &Circuit) -> Result<Vec<StateEquation>> {
    let mut states = Vec::new();
    for (_, component) in circuit.active_components() {
        let Some(variable) = component.state_symbol() else {
            continue;
        };
        let driving = match component.kind() {
            ComponentKind::Capacitor => component.current(),
            _ => component.voltage(),
        };
        let derivative = driving
            .checked_div(component.value())
            .ok_or_else(|| Error::ZeroValue(component.name().to_string()))?;
        log::trace!("d{}/dt = {}", variable, derivative);
        states.push(StateEquation::new(component.name(), variable, derivative));
    }
    Ok(states)
}

/// Currents of the active components, skipping those fixed by the netlist
/// (current sources and inductors) and stand-in shorts.
pub fn currents(circuit: &Circuit) -> IndexMap<String, Expr> {
    circuit
        .active_components()
        .filter(|(_, c)| {
            !matches!(
                c.kind(),
                ComponentKind::CurrentSource | ComponentKind::Inductor | ComponentKind::Short
            )
        })
        .map(|(_, c)| (c.name().to_string(), c.current().clone()))
        .collect()
}

/// Voltages of the active components, skipping those fixed by the netlist
/// (voltage sources and capacitors) and stand-in shorts.
pub fn component_voltages(circuit: &Circuit) -> IndexMap<String, Expr> {
    circuit
        .active_components()
        .filter(|(_, c)| {
            !matches!(
                c.kind(),
                ComponentKind::VoltageSource | ComponentKind::Capacitor | ComponentKind::Short
            )
        })
        .map(|(_, c)| (c.name().to_string(), c.voltage().clone()))
        .collect()
}

/// Node voltages from the solved component voltages, walking `tree`
/// (breadth-first `(parent, child)` pairs from ground).
///
/// A component from `a` to `b` with voltage `v` drops `v` going `a -> b`
/// and `-v` going `b -> a`; each child sits at its parent's voltage minus
/// the drop between them. Ground is left out.
pub fn node_voltages(
    circuit: &Circuit,
    tree: &[(NodeLabel, NodeLabel)],
) -> Result<IndexMap<String, Expr>> {
    let mut drops: HashMap<(&NodeLabel, &NodeLabel), Expr> = HashMap::new();
    for (_, component) in circuit.active_components() {
        let (a, b) = component.nodes();
        drops.insert((a, b), component.voltage().clone());
        drops.insert((b, a), -component.voltage());
    }

    let ground = NodeLabel::ground();
    let mut potentials: HashMap<&NodeLabel, Expr> = HashMap::new();
    potentials.insert(&ground, Expr::zero());
    let mut voltages = IndexMap::new();
    for (parent, child) in tree {
        let drop = drops
            .get(&(parent, child))
            .ok_or_else(|| Error::Disconnected(child.to_string()))?;
        let base = potentials
            .get(parent)
            .ok_or_else(|| Error::Disconnected(parent.to_string()))?;
        let voltage = base - drop;
        voltages.insert(child.to_string(), voltage.clone());
        potentials.insert(child, voltage);
    }
    Ok(voltages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtds_core::Component;

    fn e(name: &str) -> Expr {
        Expr::symbol(name)
    }

    #[test]
    fn test_state_equations() {
        let mut circuit = Circuit::new(vec![
            Component::voltage_source("V1", "A", "0", "V1"),
            Component::inductor("L1", "A", "B", "L1"),
            Component::capacitor("C1", "B", "0", "C1"),
        ])
        .unwrap();
        let l1 = circuit.find("L1").unwrap();
        let c1 = circuit.find("C1").unwrap();
        circuit[l1].assign_solution(e("V1") - e("VC1"));
        circuit[c1].assign_solution(e("IL1"));

        let states = state_equations(&circuit).unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].component(), "L1");
        assert_eq!(states[0].variable().name(), "IL1");
        assert_eq!(states[0].derivative(), &((e("V1") - e("VC1")) / e("L1")));
        assert_eq!(states[1].derivative(), &(e("IL1") / e("C1")));
    }

    #[test]
    fn test_zero_capacitance() {
        let circuit = Circuit::new(vec![
            Component::current_source("I1", "0", "A", "I1"),
            Component::capacitor("C1", "A", "0", Expr::zero()),
        ])
        .unwrap();
        assert!(matches!(
            state_equations(&circuit),
            Err(Error::ZeroValue(name)) if name == "C1"
        ));
    }

    #[test]
    fn test_output_filters() {
        let circuit = Circuit::new(vec![
            Component::voltage_source("V1", "A", "0", "V1"),
            Component::current_source("I1", "0", "A", "I1"),
            Component::resistor("R1", "A", "B", "R1"),
            Component::capacitor("C1", "B", "0", "C1"),
            Component::inductor("L1", "B", "0", "L1"),
        ])
        .unwrap();
        let current_keys: Vec<_> = currents(&circuit).keys().cloned().collect();
        assert_eq!(current_keys, ["V1", "R1", "C1"]);
        let voltage_keys: Vec<_> = component_voltages(&circuit).keys().cloned().collect();
        assert_eq!(voltage_keys, ["I1", "R1", "L1"]);
    }

    #[test]
    fn test_node_voltages_walk_tree() {
        let mut circuit = Circuit::new(vec![
            Component::voltage_source("Vin", "IN", "0", "Vin"),
            Component::resistor("R1", "IN", "OUT", "R1"),
            Component::resistor("R2", "OUT", "0", "R2"),
        ])
        .unwrap();
        let i = e("Vin") / (e("R1") + e("R2"));
        for name in ["Vin", "R1", "R2"] {
            let id = circuit.find(name).unwrap();
            circuit[id].assign_solution(i.clone());
        }
        let tree = vec![
            (NodeLabel::ground(), NodeLabel::new("IN")),
            (NodeLabel::ground(), NodeLabel::new("OUT")),
        ];
        let voltages = node_voltages(&circuit, &tree).unwrap();
        assert_eq!(voltages["IN"], e("Vin"));
        assert_eq!(voltages["OUT"], e("R2") * e("Vin") / (e("R1") + e("R2")));
    }

    #[test]
    fn test_node_voltages_missing_drop() {
        let circuit = Circuit::new(vec![
            Component::voltage_source("V1", "A", "0", "V1"),
            Component::resistor("R1", "A", "0", "R1"),
        ])
        .unwrap();
        let tree = vec![(NodeLabel::ground(), NodeLabel::new("B"))];
        assert!(matches!(
            node_voltages(&circuit, &tree),
            Err(Error::Disconnected(node)) if node == "B"
        ));
    }
}
