//! Component arena.

use std::collections::HashSet;
use std::fmt;
use std::ops::{Index, IndexMut};

use indexmap::IndexSet;

use crate::component::{Component, ComponentKind};
use crate::error::{Error, Result};
use crate::node::NodeLabel;

/// Stable handle of a component inside a [`Circuit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(pub(crate) u32);

impl ComponentId {
    /// Create a new ComponentId from a raw value.
    pub fn new(id: u32) -> Self {
        ComponentId(id)
    }

    /// Get the raw index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A circuit: an arena of components plus the ordered set of components
/// currently taking part in the analysis.
///
/// Components are never removed from the arena. Reduction retires
/// primitives and activates merged components; expansion reverses that.
/// The first [`Circuit::primitive_count`] slots hold the caller's components
/// in input order.
#[derive(Debug, Clone)]
pub struct Circuit {
    components: Vec<Component>,
    active: Vec<ComponentId>,
    primitives: usize,
}

impl Circuit {
    /// Build a circuit from netlist components, checking it for consistency.
    pub fn new(components: Vec<Component>) -> Result<Self> {
        validate(&components)?;
        let primitives = components.len();
        let active = (0..primitives as u32).map(ComponentId).collect();
        log::debug!("circuit: {} components", primitives);
        Ok(Self {
            components,
            active,
            primitives,
        })
    }

    /// Number of caller-supplied components.
    pub fn primitive_count(&self) -> usize {
        self.primitives
    }

    /// Get a component by handle.
    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.index())
    }

    /// Get a mutable component by handle.
    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(id.index())
    }

    /// Add a component to the arena without activating it.
    pub fn insert(&mut self, component: Component) -> ComponentId {
        let id = ComponentId(self.components.len() as u32);
        self.components.push(component);
        id
    }

    /// Active handles in solve order.
    pub fn active(&self) -> &[ComponentId] {
        &self.active
    }

    /// Active components in solve order.
    pub fn active_components(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.active.iter().map(|&id| (id, &self.components[id.index()]))
    }

    /// Caller-supplied components in input order.
    pub fn primitives(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components[..self.primitives]
            .iter()
            .enumerate()
            .map(|(i, c)| (ComponentId(i as u32), c))
    }

    /// Whether `id` is currently active.
    pub fn is_active(&self, id: ComponentId) -> bool {
        self.active.contains(&id)
    }

    /// Remove `id` from the active set. Returns false if it was not active.
    pub fn retire(&mut self, id: ComponentId) -> bool {
        match self.active.iter().position(|&a| a == id) {
            Some(pos) => {
                self.active.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Append `id` to the end of the solve order.
    pub fn activate(&mut self, id: ComponentId) {
        if !self.active.contains(&id) {
            self.active.push(id);
        }
    }

    /// Replace the active set wholesale.
    pub fn set_active(&mut self, active: Vec<ComponentId>) {
        self.active = active;
    }

    /// Number of active components.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Nodes of the active components in first-seen order.
    pub fn nodes(&self) -> IndexSet<NodeLabel> {
        let mut nodes = IndexSet::new();
        for (_, component) in self.active_components() {
            let (a, b) = component.nodes();
            nodes.insert(a.clone());
            nodes.insert(b.clone());
        }
        nodes
    }

    /// Find an active component by name.
    pub fn find(&self, name: &str) -> Option<ComponentId> {
        self.active_components()
            .find(|(_, c)| c.name() == name)
            .map(|(id, _)| id)
    }
}

impl Index<ComponentId> for Circuit {
    type Output = Component;

    fn index(&self, id: ComponentId) -> &Component {
        &self.components[id.index()]
    }
}

impl IndexMut<ComponentId> for Circuit {
    fn index_mut(&mut self, id: ComponentId) -> &mut Component {
        &mut self.components[id.index()]
    }
}

fn validate(components: &[Component]) -> Result<()> {
    if components.is_empty() {
        return Err(Error::EmptyCircuit);
    }
    for component in components {
        check_symbol_letters(component)?;
    }

    let mut names = HashSet::new();
    for component in components {
        if !names.insert(component.name()) {
            return Err(Error::DuplicateComponent(component.name().to_string()));
        }
    }

    // A source value named like a storage state would alias the two.
    let states: HashSet<_> = components.iter().filter_map(Component::state_symbol).collect();
    for component in components {
        if let Some(symbol) = component
            .value()
            .free_symbols()
            .into_iter()
            .find(|s| states.contains(s))
        {
            return Err(Error::DuplicateSymbol {
                component: component.name().to_string(),
                symbol: symbol.name().to_string(),
            });
        }
    }

    for component in components {
        let (a, b) = component.nodes();
        if a == b {
            return Err(Error::SelfLoop {
                component: component.name().to_string(),
                node: a.to_string(),
            });
        }
    }

    let grounded = components.iter().any(|c| {
        let (a, b) = c.nodes();
        a.is_ground() || b.is_ground()
    });
    if !grounded {
        return Err(Error::NoGround);
    }
    Ok(())
}

/// Symbolic values must use symbols named after the component type, so a
/// resistor's value reads `R...`, a capacitor's `C...` and so on.
fn check_symbol_letters(component: &Component) -> Result<()> {
    if component.kind() == ComponentKind::Short {
        return Ok(());
    }
    let letter = component.kind().letter();
    for symbol in component.value().free_symbols() {
        if symbol.leading_char() != Some(letter) {
            return Err(Error::SymbolMismatch {
                component: component.name().to_string(),
                symbol: symbol.name().to_string(),
                letter,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    fn divider() -> Vec<Component> {
        vec![
            Component::voltage_source("Vin", "IN", "0", "Vin"),
            Component::resistor("R1", "IN", "OUT", "R1"),
            Component::resistor("R2", "OUT", "0", "R2"),
        ]
    }

    #[test]
    fn test_new_circuit_is_fully_active() {
        let circuit = Circuit::new(divider()).unwrap();
        assert_eq!(circuit.len(), 3);
        assert_eq!(circuit.primitive_count(), 3);
        let names: Vec<_> = circuit.active_components().map(|(_, c)| c.name()).collect();
        assert_eq!(names, ["Vin", "R1", "R2"]);
        let nodes: Vec<_> = circuit.nodes().iter().map(|n| n.to_string()).collect();
        assert_eq!(nodes, ["IN", "0", "OUT"]);
    }

    #[test]
    fn test_retire_and_activate() {
        let mut circuit = Circuit::new(divider()).unwrap();
        let r1 = circuit.find("R1").unwrap();
        assert!(circuit.retire(r1));
        assert!(!circuit.retire(r1));
        assert!(!circuit.is_active(r1));

        let extra = circuit.insert(Component::resistor("R3", "OUT", "0", "R3"));
        circuit.activate(extra);
        circuit.activate(r1);
        assert_eq!(circuit.active().last(), Some(&r1));
        assert_eq!(circuit.len(), 4);
        assert_eq!(circuit.primitives().count(), 3);
        assert_eq!(circuit[extra].name(), "R3");
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(Circuit::new(vec![]), Err(Error::EmptyCircuit)));
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut components = divider();
        components.push(Component::resistor("R1", "OUT", "0", "R1"));
        assert!(matches!(
            Circuit::new(components),
            Err(Error::DuplicateComponent(name)) if name == "R1"
        ));
    }

    #[test]
    fn test_rejects_symbol_mismatch() {
        let components = vec![
            Component::voltage_source("Vin", "IN", "0", "Vin"),
            Component::resistor("R1", "IN", "0", "X1"),
        ];
        match Circuit::new(components) {
            Err(Error::SymbolMismatch { component, symbol, letter }) => {
                assert_eq!(component, "R1");
                assert_eq!(symbol, "X1");
                assert_eq!(letter, 'R');
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_numeric_values_skip_letter_check() {
        let components = vec![
            Component::voltage_source("Vin", "IN", "0", Expr::integer(5)),
            Component::resistor("R1", "IN", "0", Expr::integer(2) * Expr::symbol("R1")),
        ];
        assert!(Circuit::new(components).is_ok());
    }

    #[test]
    fn test_rejects_source_named_like_state() {
        let components = vec![
            Component::voltage_source("V1", "IN", "0", "VC1"),
            Component::resistor("R1", "IN", "OUT", "R1"),
            Component::capacitor("C1", "OUT", "0", "C1"),
        ];
        match Circuit::new(components) {
            Err(Error::DuplicateSymbol { component, symbol }) => {
                assert_eq!(component, "V1");
                assert_eq!(symbol, "VC1");
            }
            other => panic!("unexpected {:?}", other),
        }

        let components = vec![
            Component::current_source("I1", "A", "0", "IL2"),
            Component::inductor("L2", "A", "0", "L2"),
        ];
        assert!(matches!(Circuit::new(components), Err(Error::DuplicateSymbol { .. })));

        // A different capacitor name is fine.
        let components = vec![
            Component::voltage_source("V1", "IN", "0", "VC1"),
            Component::resistor("R1", "IN", "OUT", "R1"),
            Component::capacitor("C2", "OUT", "0", "C2"),
        ];
        assert!(Circuit::new(components).is_ok());
    }

    #[test]
    fn test_rejects_self_loop() {
        let mut components = divider();
        components.push(Component::resistor("R3", "OUT", "OUT", "R3"));
        assert!(matches!(Circuit::new(components), Err(Error::SelfLoop { .. })));
    }

    #[test]
    fn test_rejects_missing_ground() {
        let components = vec![
            Component::voltage_source("Vin", "IN", "GND", "Vin"),
            Component::resistor("R1", "IN", "GND", "R1"),
        ];
        assert!(matches!(Circuit::new(components), Err(Error::NoGround)));
    }
}
