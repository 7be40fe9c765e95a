//! Equivalence reduction of parallel capacitors and series inductors.
//!
//! Reduction works on the circuit's active set: merged primitives are
//! retired and a single equivalent is activated in their place. After the
//! reduced circuit has been solved, [`expand`] hands each original its
//! share of the equivalent's voltage and current and restores the
//! primitives as the active set.

use indexmap::IndexMap;
use rtds_core::{Circuit, Component, ComponentId, ComponentKind, Expr, NodeLabel, Origin};

use crate::error::{Error, Result};

/// What a reduction pass merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reduction {
    /// Equivalent capacitors created, with the originals each one replaces.
    pub capacitors: Vec<(ComponentId, Vec<ComponentId>)>,
    /// Equivalent inductors created, with the originals each one replaces.
    pub inductors: Vec<(ComponentId, Vec<ComponentId>)>,
}

impl Reduction {
    /// Whether nothing was merged.
    pub fn is_empty(&self) -> bool {
        self.capacitors.is_empty() && self.inductors.is_empty()
    }
}

/// Merge parallel capacitors, then series inductors.
pub fn reduce(circuit: &mut Circuit) -> Result<Reduction> {
    let capacitors = merge_parallel_capacitors(circuit);
    let inductors = merge_series_inductors(circuit)?;
    log::debug!(
        "reduce: {} capacitor group(s), {} inductor group(s), {} active components",
        capacitors.len(),
        inductors.len(),
        circuit.len()
    );
    Ok(Reduction {
        capacitors,
        inductors,
    })
}

/// Replace every group of capacitors sharing the same (unordered) node pair
/// with one equivalent capacitor.
///
/// Members are ordered by name; the first member names the equivalent and
/// fixes the reference orientation.
pub fn merge_parallel_capacitors(circuit: &mut Circuit) -> Vec<(ComponentId, Vec<ComponentId>)> {
    let mut groups: IndexMap<(NodeLabel, NodeLabel), Vec<ComponentId>> = IndexMap::new();
    for (id, component) in circuit.active_components() {
        if component.kind() != ComponentKind::Capacitor {
            continue;
        }
        let (a, b) = component.nodes();
        let key = if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        groups.entry(key).or_default().push(id);
    }

    let mut merged = Vec::new();
    for (_, mut members) in groups {
        if members.len() < 2 {
            continue;
        }
        members.sort_by(|x, y| circuit[*x].name().cmp(circuit[*y].name()));

        let first = &circuit[members[0]];
        let inverted: Vec<bool> = members
            .iter()
            .map(|id| circuit[*id].nodes() != first.nodes())
            .collect();
        let value: Expr = members.iter().map(|id| circuit[*id].value()).sum();
        let equivalent = Component::equivalent(first, value, members.clone(), inverted);

        log::trace!(
            "parallel capacitors {:?} -> {}",
            members.iter().map(|id| circuit[*id].name()).collect::<Vec<_>>(),
            equivalent.name()
        );
        for id in &members {
            circuit.retire(*id);
        }
        let id = circuit.insert(equivalent);
        circuit.activate(id);
        merged.push((id, members));
    }
    merged
}

/// Replace every branch holding two or more inductors in series with one
/// equivalent inductor plus zero-valued shorts for the others.
///
/// A branch is a path between external nodes (nodes with degree other
/// than 2). The shorts keep the branch's internal nodes connected.
pub fn merge_series_inductors(
    circuit: &mut Circuit,
) -> Result<Vec<(ComponentId, Vec<ComponentId>)>> {
    let groups = find_series_inductors(circuit)?;

    let mut merged = Vec::new();
    for (members, inverted) in groups {
        let first = members[0];
        circuit.retire(first);
        for &id in &members[1..] {
            circuit.retire(id);
            let short = Component::stand_in(&circuit[id], id);
            let short = circuit.insert(short);
            circuit.activate(short);
        }

        let value: Expr = members.iter().map(|id| circuit[*id].value()).sum();
        let equivalent = Component::equivalent(&circuit[first], value, members.clone(), inverted);
        log::trace!(
            "series inductors {:?} -> {}",
            members.iter().map(|id| circuit[*id].name()).collect::<Vec<_>>(),
            equivalent.name()
        );
        let id = circuit.insert(equivalent);
        circuit.activate(id);
        merged.push((id, members));
    }
    Ok(merged)
}

type InductorGroup = (Vec<ComponentId>, Vec<bool>);

fn find_series_inductors(circuit: &Circuit) -> Result<Vec<InductorGroup>> {
    let ids: Vec<ComponentId> = circuit.active().to_vec();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut degree: IndexMap<&NodeLabel, usize> = IndexMap::new();
    for id in &ids {
        let (a, b) = circuit[*id].nodes();
        *degree.entry(a).or_default() += 1;
        *degree.entry(b).or_default() += 1;
    }
    let mut external: Vec<NodeLabel> = degree
        .iter()
        .filter(|(_, d)| **d != 2)
        .map(|(n, _)| (*n).clone())
        .collect();
    if external.is_empty() {
        // A plain ring: anchor the walk at the first node.
        external.push(circuit[ids[0]].nodes().0.clone());
    }

    let mut used = vec![false; ids.len()];
    let mut groups = Vec::new();
    for start in &external {
        while ids
            .iter()
            .zip(&used)
            .any(|(id, u)| !u && circuit[*id].touches(start))
        {
            let (inductors, directions) = walk_branch(circuit, &ids, &mut used, start, &external)?;
            if inductors.len() > 1 {
                groups.push((inductors, directions));
            }
        }
    }
    Ok(groups)
}

/// Follow one branch from `start` until an external node is reached,
/// collecting its inductors and whether each one is traversed against the
/// first inductor's orientation.
fn walk_branch(
    circuit: &Circuit,
    ids: &[ComponentId],
    used: &mut [bool],
    start: &NodeLabel,
    external: &[NodeLabel],
) -> Result<InductorGroup> {
    let mut node = start.clone();
    let mut inductors = Vec::new();
    let mut directions = Vec::new();
    loop {
        let next = ids
            .iter()
            .zip(used.iter())
            .position(|(id, u)| !u && circuit[*id].touches(&node));
        let Some(pos) = next else {
            return Err(Error::AmbiguousBranch {
                node: node.to_string(),
            });
        };
        used[pos] = true;

        let component = &circuit[ids[pos]];
        let Some(far) = component.opposite(&node).cloned() else {
            return Err(Error::AmbiguousBranch {
                node: node.to_string(),
            });
        };
        if component.kind() == ComponentKind::Inductor {
            inductors.push(ids[pos]);
            directions.push(far == *component.nodes().1);
        }
        if external.contains(&far) {
            break;
        }
        node = far;
    }

    // Orientation is relative to the first inductor.
    if directions.first() == Some(&true) {
        for d in &mut directions {
            *d = !*d;
        }
    }
    Ok((inductors, directions))
}

/// Undo the reduction on a solved circuit.
///
/// Series inductors share the equivalent's current and split its voltage
/// by inductance; parallel capacitors share its voltage and split its
/// current by capacitance. Inverted originals get both negated. Shorts are
/// dropped and the primitives become the active set again, in input order.
pub fn expand(circuit: &mut Circuit) -> Result<()> {
    let equivalents: Vec<ComponentId> = circuit
        .active_components()
        .filter(|(_, c)| matches!(c.origin(), Origin::Equivalent { .. }))
        .map(|(id, _)| id)
        .collect();

    for eq_id in equivalents {
        let equivalent = circuit[eq_id].clone();
        let Origin::Equivalent {
            originals,
            inverted,
        } = equivalent.origin()
        else {
            continue;
        };
        for (&id, &flip) in originals.iter().zip(inverted) {
            let original = &mut circuit[id];
            let share = original
                .value()
                .checked_div(equivalent.value())
                .ok_or_else(|| Error::ZeroValue(equivalent.name().to_string()))?;
            let (voltage, current) = match equivalent.kind() {
                ComponentKind::Inductor => {
                    (equivalent.voltage() * &share, equivalent.current().clone())
                }
                _ => (equivalent.voltage().clone(), equivalent.current() * &share),
            };
            if flip {
                original.set_voltage(-voltage);
                original.set_current(-current);
            } else {
                original.set_voltage(voltage);
                original.set_current(current);
            }
        }
    }

    let primitives = (0..circuit.primitive_count() as u32)
        .map(ComponentId::new)
        .collect();
    circuit.set_active(primitives);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(circuit: &Circuit) -> Vec<String> {
        circuit
            .active_components()
            .map(|(_, c)| format!("{}:{}", c.kind().letter(), c.name()))
            .collect()
    }

    #[test]
    fn test_parallel_capacitors_merge() {
        let mut circuit = Circuit::new(vec![
            Component::current_source("I1", "0", "A", "I1"),
            Component::capacitor("C2", "0", "A", "C2"),
            Component::capacitor("C1", "A", "0", "C1"),
            Component::capacitor("C3", "A", "0", "C3"),
        ])
        .unwrap();
        let merged = merge_parallel_capacitors(&mut circuit);
        assert_eq!(merged.len(), 1);
        assert_eq!(names(&circuit), ["I:I1", "C:C1"]);

        let (id, _) = &merged[0];
        let equivalent = &circuit[*id];
        assert_eq!(
            equivalent.value(),
            &(Expr::symbol("C1") + Expr::symbol("C2") + Expr::symbol("C3"))
        );
        match equivalent.origin() {
            Origin::Equivalent { originals, inverted } => {
                let names: Vec<_> = originals.iter().map(|o| circuit[*o].name()).collect();
                assert_eq!(names, ["C1", "C2", "C3"]);
                assert_eq!(inverted, &[false, true, false]);
            }
            other => panic!("unexpected origin {:?}", other),
        }
    }

    #[test]
    fn test_single_capacitor_untouched() {
        let mut circuit = Circuit::new(vec![
            Component::voltage_source("V1", "A", "0", "V1"),
            Component::resistor("R1", "A", "B", "R1"),
            Component::capacitor("C1", "B", "0", "C1"),
        ])
        .unwrap();
        let reduction = reduce(&mut circuit).unwrap();
        assert!(reduction.is_empty());
        assert_eq!(names(&circuit), ["V:V1", "R:R1", "C:C1"]);
    }

    #[test]
    fn test_series_inductors_merge() {
        let mut circuit = Circuit::new(vec![
            Component::voltage_source("V1", "A", "0", "V1"),
            Component::inductor("L1", "A", "B", "L1"),
            Component::inductor("L2", "C", "B", "L2"),
            Component::resistor("R1", "C", "0", "R1"),
        ])
        .unwrap();
        let merged = merge_series_inductors(&mut circuit).unwrap();
        assert_eq!(merged.len(), 1);
        // The walk is anchored at A and reaches L2 first.
        assert_eq!(names(&circuit), ["V:V1", "R:R1", "S:L1", "L:L2"]);

        let (id, _) = &merged[0];
        let equivalent = &circuit[*id];
        assert_eq!(equivalent.value(), &(Expr::symbol("L1") + Expr::symbol("L2")));
        match equivalent.origin() {
            Origin::Equivalent { inverted, .. } => assert_eq!(inverted, &[false, true]),
            other => panic!("unexpected origin {:?}", other),
        }
    }

    #[test]
    fn test_inductors_split_by_branch_point() {
        // L1 and L2 meet at B, which also feeds R2: not in series.
        let mut circuit = Circuit::new(vec![
            Component::voltage_source("V1", "A", "0", "V1"),
            Component::inductor("L1", "A", "B", "L1"),
            Component::inductor("L2", "B", "C", "L2"),
            Component::resistor("R1", "C", "0", "R1"),
            Component::resistor("R2", "B", "0", "R2"),
        ])
        .unwrap();
        let reduction = reduce(&mut circuit).unwrap();
        assert!(reduction.inductors.is_empty());
        assert_eq!(circuit.len(), 5);
    }

    #[test]
    fn test_ring_without_branch_points() {
        let mut circuit = Circuit::new(vec![
            Component::inductor("L1", "0", "A", "L1"),
            Component::inductor("L2", "A", "B", "L2"),
            Component::capacitor("C1", "B", "0", "C1"),
        ])
        .unwrap();
        let merged = merge_series_inductors(&mut circuit).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(names(&circuit), ["C:C1", "S:L2", "L:L1"]);
    }

    #[test]
    fn test_expand_restores_primitives() {
        let mut circuit = Circuit::new(vec![
            Component::current_source("I1", "0", "A", "I1"),
            Component::capacitor("C1", "A", "0", "C1"),
            Component::capacitor("C2", "0", "A", "C2"),
        ])
        .unwrap();
        let merged = merge_parallel_capacitors(&mut circuit);
        let (id, _) = merged[0].clone();
        circuit[id].set_current(Expr::symbol("I1"));

        expand(&mut circuit).unwrap();
        assert_eq!(names(&circuit), ["I:I1", "C:C1", "C:C2"]);

        let total = Expr::symbol("C1") + Expr::symbol("C2");
        let c1 = &circuit[circuit.find("C1").unwrap()];
        let c2 = &circuit[circuit.find("C2").unwrap()];
        assert_eq!(c1.current(), &(Expr::symbol("I1") * Expr::symbol("C1") / &total));
        assert_eq!(c2.current(), &(-(Expr::symbol("I1") * Expr::symbol("C2") / &total)));
        assert_eq!(c1.voltage(), &Expr::symbol("VC1"));
        assert_eq!(c2.voltage(), &(-Expr::symbol("VC1")));
    }

    #[test]
    fn test_expand_rejects_zero_equivalent() {
        let mut circuit = Circuit::new(vec![
            Component::current_source("I1", "0", "A", "I1"),
            Component::capacitor("C1", "A", "0", "C1"),
            Component::capacitor("C2", "A", "0", -Expr::symbol("C1")),
        ])
        .unwrap();
        merge_parallel_capacitors(&mut circuit);
        assert!(matches!(expand(&mut circuit), Err(Error::ZeroValue(_))));
    }

    #[test]
    fn test_walk_without_exit_is_ambiguous() {
        // No external node to stop at: the walk runs off the end at C.
        let circuit = Circuit::new(vec![
            Component::voltage_source("V1", "A", "0", "V1"),
            Component::resistor("R1", "A", "B", "R1"),
            Component::inductor("L1", "B", "C", "L1"),
        ])
        .unwrap();
        let ids = circuit.active().to_vec();
        let mut used = vec![false; ids.len()];
        let err = walk_branch(&circuit, &ids, &mut used, &NodeLabel::ground(), &[]).unwrap_err();
        assert!(matches!(&err, Error::AmbiguousBranch { node } if node == "C"));
        assert_eq!(err.category(), crate::error::ErrorCategory::Topology);
        assert!(used.iter().all(|u| *u));
    }
}
