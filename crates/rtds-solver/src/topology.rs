//! Graph views of a circuit.
//!
//! Two graphs are built from the active components:
//!
//! - an undirected bipartite graph (nets and devices as vertices, one edge
//!   per device terminal) whose minimum cycle basis gives the KVL loops;
//! - a directed node graph (one edge per device, tail to head, reversed for
//!   sources) whose incidence matrix gives the KCL rows.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use nalgebra::DMatrix;
use petgraph::algo::connected_components;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rtds_core::{Circuit, Component, ComponentId, NodeLabel};

use crate::error::{Error, Result};

/// Vertex of the loop-finding graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitElement {
    Net(NodeLabel),
    Device(ComponentId),
}

/// One independent loop: its components in traversal order and the sign
/// of each component's voltage relative to the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop {
    components: Vec<ComponentId>,
    polarity: Vec<i32>,
}

impl Loop {
    pub fn components(&self) -> &[ComponentId] {
        &self.components
    }

    pub fn polarity(&self) -> &[i32] {
        &self.polarity
    }

    /// `(component, polarity)` pairs in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, i32)> + '_ {
        self.components
            .iter()
            .copied()
            .zip(self.polarity.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Signed node-by-component incidence matrix, ground row removed.
///
/// Entry `(n, c)` is `-1` when component `c`'s directed edge leaves node
/// `n`, `+1` when it enters it and `0` otherwise.
#[derive(Debug, Clone)]
pub struct Incidence {
    nodes: Vec<NodeLabel>,
    columns: Vec<ComponentId>,
    matrix: DMatrix<i32>,
}

impl Incidence {
    /// Row labels.
    pub fn nodes(&self) -> &[NodeLabel] {
        &self.nodes
    }

    /// Column components, in solve order.
    pub fn columns(&self) -> &[ComponentId] {
        &self.columns
    }

    pub fn matrix(&self) -> &DMatrix<i32> {
        &self.matrix
    }

    /// Nonzero entries of one row.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (ComponentId, i32)> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter_map(move |(col, &id)| {
                let sign = self.matrix[(row, col)];
                (sign != 0).then_some((id, sign))
            })
    }
}

/// Everything the equation builder needs to know about the circuit's shape.
#[derive(Debug, Clone)]
pub struct Topology {
    loops: Vec<Loop>,
    incidence: Incidence,
    spanning_tree: Vec<(NodeLabel, NodeLabel)>,
}

impl Topology {
    /// Build the graph views of the circuit's active components.
    pub fn build(circuit: &Circuit) -> Result<Self> {
        let (graph, lookup) = node_graph(circuit);
        let ground = lookup
            .get(&NodeLabel::ground())
            .copied()
            .ok_or(Error::Core(rtds_core::Error::NoGround))?;
        let spanning_tree = spanning_tree(&graph, ground)?;
        let loops = find_loops(circuit)?;
        let incidence = incidence_matrix(&graph);
        log::debug!(
            "topology: {} nodes, {} components, {} loops",
            graph.node_count(),
            graph.edge_count(),
            loops.len()
        );
        Ok(Self {
            loops,
            incidence,
            spanning_tree,
        })
    }

    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    pub fn incidence(&self) -> &Incidence {
        &self.incidence
    }

    /// Breadth-first `(parent, child)` node pairs starting at ground.
    pub fn spanning_tree(&self) -> &[(NodeLabel, NodeLabel)] {
        &self.spanning_tree
    }
}

/// Directed node graph: one edge per active component, keyed by component.
///
/// Edges run from the first terminal to the second, except for sources,
/// whose current reference points the other way.
pub fn node_graph(
    circuit: &Circuit,
) -> (DiGraph<NodeLabel, ComponentId>, HashMap<NodeLabel, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut lookup: HashMap<NodeLabel, NodeIndex> = HashMap::new();
    for (id, component) in circuit.active_components() {
        let (a, b) = component.nodes();
        let (from, to) = if component.kind().is_active() {
            (b, a)
        } else {
            (a, b)
        };
        let from = *lookup
            .entry(from.clone())
            .or_insert_with(|| graph.add_node(from.clone()));
        let to = *lookup
            .entry(to.clone())
            .or_insert_with(|| graph.add_node(to.clone()));
        graph.add_edge(from, to, id);
    }
    (graph, lookup)
}

/// Oriented incidence matrix of the node graph with the ground row dropped.
pub fn incidence_matrix(graph: &DiGraph<NodeLabel, ComponentId>) -> Incidence {
    let rows: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|&n| !graph[n].is_ground())
        .collect();
    let row_of: HashMap<NodeIndex, usize> = rows.iter().enumerate().map(|(r, &n)| (n, r)).collect();

    let mut matrix = DMatrix::zeros(rows.len(), graph.edge_count());
    let mut columns = Vec::with_capacity(graph.edge_count());
    for edge in graph.edge_references() {
        let col = edge.id().index();
        if let Some(&r) = row_of.get(&edge.source()) {
            matrix[(r, col)] -= 1;
        }
        if let Some(&r) = row_of.get(&edge.target()) {
            matrix[(r, col)] += 1;
        }
        columns.push(*edge.weight());
    }

    Incidence {
        nodes: rows.iter().map(|&n| graph[n].clone()).collect(),
        columns,
        matrix,
    }
}

/// Breadth-first tree over the undirected node graph, rooted at `ground`.
fn spanning_tree(
    graph: &DiGraph<NodeLabel, ComponentId>,
    ground: NodeIndex,
) -> Result<Vec<(NodeLabel, NodeLabel)>> {
    let mut seen = vec![false; graph.node_count()];
    let mut queue = VecDeque::from([ground]);
    let mut tree = Vec::with_capacity(graph.node_count().saturating_sub(1));
    seen[ground.index()] = true;

    while let Some(node) = queue.pop_front() {
        let mut neighbors: Vec<(EdgeIndex, NodeIndex)> = graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .chain(
                graph
                    .edges_directed(node, Direction::Incoming)
                    .map(|e| (e.id(), e.source())),
            )
            .collect();
        neighbors.sort();
        for (_, next) in neighbors {
            if !seen[next.index()] {
                seen[next.index()] = true;
                tree.push((graph[node].clone(), graph[next].clone()));
                queue.push_back(next);
            }
        }
    }

    match seen.iter().position(|s| !s) {
        Some(idx) => Err(Error::Disconnected(graph[NodeIndex::new(idx)].to_string())),
        None => Ok(tree),
    }
}

/// Bipartite net/device graph. Device vertices come first, in solve order,
/// so a device's vertex index equals its position in the active set.
pub fn component_graph(circuit: &Circuit) -> UnGraph<CircuitElement, ()> {
    let mut graph = UnGraph::new_undirected();
    let devices: Vec<NodeIndex> = circuit
        .active()
        .iter()
        .map(|&id| graph.add_node(CircuitElement::Device(id)))
        .collect();

    let mut nets: HashMap<NodeLabel, NodeIndex> = HashMap::new();
    for (&device, (_, component)) in devices.iter().zip(circuit.active_components()) {
        let (a, b) = component.nodes();
        for net in [a, b] {
            let vertex = *nets
                .entry(net.clone())
                .or_insert_with(|| graph.add_node(CircuitElement::Net(net.clone())));
            graph.add_edge(device, vertex, ());
        }
    }
    graph
}

/// KVL loops of the active circuit: a minimum cycle basis of the component
/// graph, each cycle listed in traversal order with its polarity sequence.
pub fn find_loops(circuit: &Circuit) -> Result<Vec<Loop>> {
    let graph = component_graph(circuit);
    let nets = graph.node_count() - circuit.len();
    let expected = (circuit.len() + 1).saturating_sub(nets);

    let cycles = minimum_cycle_basis(&graph);
    if cycles.len() != expected {
        return Err(Error::IncompleteCycleBasis {
            found: cycles.len(),
            expected,
        });
    }

    let loops: Vec<Loop> = cycles
        .iter()
        .map(|cycle| {
            let components = cycle_devices(&graph, cycle);
            let polarity = polarity_sequence(circuit, &components);
            Loop {
                components,
                polarity,
            }
        })
        .collect();
    for (k, l) in loops.iter().enumerate() {
        log::trace!(
            "loop {}: {:?} polarity {:?}",
            k,
            l.components.iter().map(|id| circuit[*id].name()).collect::<Vec<_>>(),
            l.polarity
        );
    }
    Ok(loops)
}

/// Voltage polarity of each loop component relative to the first: the sign
/// flips whenever two consecutive components are not joined head to tail.
pub fn polarity_sequence(circuit: &Circuit, components: &[ComponentId]) -> Vec<i32> {
    let mut direction = 1;
    let mut sequence = Vec::with_capacity(components.len());
    let mut previous: Option<&Component> = None;
    for &id in components {
        let component = &circuit[id];
        if let Some(previous) = previous {
            if !same_direction(previous, component) {
                direction = -direction;
            }
        }
        sequence.push(direction);
        previous = Some(component);
    }
    sequence
}

fn same_direction(previous: &Component, component: &Component) -> bool {
    let (pa, pb) = previous.nodes();
    let (ca, cb) = component.nodes();
    !(pa == ca || pb == cb)
}

/// Shortest-path tree from one root: parent link of every reached vertex.
struct PathTree {
    root: NodeIndex,
    parent: Vec<Option<(NodeIndex, EdgeIndex)>>,
    reached: Vec<bool>,
}

impl PathTree {
    fn new<N, E>(graph: &UnGraph<N, E>, root: NodeIndex) -> Self {
        let mut parent = vec![None; graph.node_count()];
        let mut reached = vec![false; graph.node_count()];
        let mut queue = VecDeque::from([root]);
        reached[root.index()] = true;
        while let Some(v) = queue.pop_front() {
            let mut edges: Vec<(EdgeIndex, NodeIndex)> = graph
                .edges(v)
                .map(|e| {
                    let other = if e.source() == v { e.target() } else { e.source() };
                    (e.id(), other)
                })
                .collect();
            edges.sort();
            for (edge, w) in edges {
                if !reached[w.index()] {
                    reached[w.index()] = true;
                    parent[w.index()] = Some((v, edge));
                    queue.push_back(w);
                }
            }
        }
        Self {
            root,
            parent,
            reached,
        }
    }

    fn is_tree_edge(&self, edge: EdgeIndex, a: NodeIndex, b: NodeIndex) -> bool {
        [a, b]
            .iter()
            .any(|v| matches!(self.parent[v.index()], Some((_, e)) if e == edge))
    }

    /// Vertices (root excluded) and edges on the path from `v` up to the root.
    fn path(&self, mut v: NodeIndex) -> (Vec<NodeIndex>, Vec<EdgeIndex>) {
        let mut vertices = Vec::new();
        let mut edges = Vec::new();
        while v != self.root {
            let Some((p, e)) = self.parent[v.index()] else {
                break;
            };
            vertices.push(v);
            edges.push(e);
            v = p;
        }
        (vertices, edges)
    }
}

type EdgeSet = BTreeSet<usize>;

/// Minimum cycle basis by Horton's method: collect the candidate cycle
/// `P(r, x) + (x, y) + P(y, r)` for every root `r` and non-tree edge
/// `(x, y)` whose two tree paths meet only at `r`, then keep the shortest
/// candidates that are independent over GF(2).
pub fn minimum_cycle_basis<N, E>(graph: &UnGraph<N, E>) -> Vec<EdgeSet> {
    let dimension =
        (graph.edge_count() + connected_components(graph)).saturating_sub(graph.node_count());
    if dimension == 0 {
        return Vec::new();
    }

    let mut seen: HashSet<EdgeSet> = HashSet::new();
    let mut candidates: Vec<EdgeSet> = Vec::new();
    for root in graph.node_indices() {
        let tree = PathTree::new(graph, root);
        for edge in graph.edge_references() {
            let (x, y) = (edge.source(), edge.target());
            if !tree.reached[x.index()] || !tree.reached[y.index()] {
                continue;
            }
            if tree.is_tree_edge(edge.id(), x, y) {
                continue;
            }
            let (vx, ex) = tree.path(x);
            let (vy, ey) = tree.path(y);
            if vx.iter().any(|v| vy.contains(v)) {
                continue;
            }
            let cycle: EdgeSet = ex
                .iter()
                .chain(&ey)
                .map(|e| e.index())
                .chain([edge.id().index()])
                .collect();
            if seen.insert(cycle.clone()) {
                candidates.push(cycle);
            }
        }
    }
    candidates.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    // Row-reduced basis keyed by pivot (highest edge index).
    let mut reduced: BTreeMap<usize, EdgeSet> = BTreeMap::new();
    let mut basis = Vec::with_capacity(dimension);
    for cycle in candidates {
        let mut residue = cycle.clone();
        loop {
            let Some(&pivot) = residue.last() else {
                break;
            };
            match reduced.get(&pivot) {
                Some(row) => residue = residue.symmetric_difference(row).copied().collect(),
                None => {
                    reduced.insert(pivot, residue);
                    basis.push(cycle);
                    break;
                }
            }
        }
        if basis.len() == dimension {
            break;
        }
    }
    basis
}

/// Devices of a cycle in traversal order, starting from the earliest device
/// and leaving through its first terminal.
fn cycle_devices(graph: &UnGraph<CircuitElement, ()>, cycle: &EdgeSet) -> Vec<ComponentId> {
    let mut incident: HashMap<NodeIndex, Vec<usize>> = HashMap::new();
    for &e in cycle {
        if let Some((a, b)) = graph.edge_endpoints(EdgeIndex::new(e)) {
            incident.entry(a).or_default().push(e);
            incident.entry(b).or_default().push(e);
        }
    }
    let Some(start) = incident
        .keys()
        .filter(|v| matches!(graph[**v], CircuitElement::Device(_)))
        .min()
        .copied()
    else {
        return Vec::new();
    };

    let mut devices = Vec::new();
    let mut vertex = start;
    let mut via: Option<usize> = None;
    loop {
        if let CircuitElement::Device(id) = graph[vertex] {
            devices.push(id);
        }
        let Some(&edge) = incident[&vertex]
            .iter()
            .filter(|&&e| Some(e) != via)
            .min()
        else {
            break;
        };
        let Some((a, b)) = graph.edge_endpoints(EdgeIndex::new(edge)) else {
            break;
        };
        vertex = if a == vertex { b } else { a };
        via = Some(edge);
        if vertex == start {
            break;
        }
    }
    devices
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtds_core::Component;

    fn divider() -> Circuit {
        Circuit::new(vec![
            Component::voltage_source("Vin", "IN", "0", "Vin"),
            Component::resistor("R1", "IN", "OUT", "R1"),
            Component::resistor("R2", "OUT", "0", "R2"),
        ])
        .unwrap()
    }

    #[test]
    fn test_polarity_sequence() {
        let circuit = Circuit::new(vec![
            Component::resistor("R1", "1", "2", "R1"),
            Component::resistor("R2", "2", "3", "R2"),
            Component::resistor("R3", "0", "3", "R3"),
            Component::voltage_source("V1", "1", "0", "V1"),
        ])
        .unwrap();
        let ids: Vec<_> = circuit.active().to_vec();
        // The loop runs 1 -> 2 -> 3 -> 0 -> 1, against R3 and V1.
        assert_eq!(polarity_sequence(&circuit, &ids), [1, 1, -1, -1]);
    }

    #[test]
    fn test_single_loop() {
        let circuit = divider();
        let loops = find_loops(&circuit).unwrap();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 3);
        assert_eq!(loops[0].components()[0], circuit.find("Vin").unwrap());
    }

    #[test]
    fn test_loop_count_matches_cycle_space() {
        // Two meshes sharing R2.
        let circuit = Circuit::new(vec![
            Component::voltage_source("V1", "A", "0", "V1"),
            Component::resistor("R1", "A", "B", "R1"),
            Component::resistor("R2", "B", "0", "R2"),
            Component::resistor("R3", "B", "C", "R3"),
            Component::resistor("R4", "C", "0", "R4"),
        ])
        .unwrap();
        let loops = find_loops(&circuit).unwrap();
        assert_eq!(loops.len(), 2);
        // Minimum basis: both meshes of three components, never the outer loop.
        assert!(loops.iter().all(|l| l.len() == 3));
    }

    #[test]
    fn test_parallel_pair_is_a_loop() {
        let circuit = Circuit::new(vec![
            Component::current_source("I1", "0", "A", "I1"),
            Component::resistor("R1", "A", "0", "R1"),
        ])
        .unwrap();
        let loops = find_loops(&circuit).unwrap();
        assert_eq!(loops.len(), 1);
        // I1 drives 0 -> A and R1 returns A -> 0: one direction.
        assert_eq!(loops[0].polarity(), &[1, 1]);
    }

    #[test]
    fn test_incidence_orientation() {
        let circuit = divider();
        let topology = Topology::build(&circuit).unwrap();
        let incidence = topology.incidence();
        let nodes: Vec<_> = incidence.nodes().iter().map(|n| n.to_string()).collect();
        // Vin is reversed, so the graph starts 0 -> IN.
        assert_eq!(nodes, ["IN", "OUT"]);
        let m = incidence.matrix();
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.ncols(), 3);
        // Vin enters IN, R1 leaves IN and enters OUT, R2 leaves OUT.
        assert_eq!(m.row(0).iter().copied().collect::<Vec<_>>(), [1, -1, 0]);
        assert_eq!(m.row(1).iter().copied().collect::<Vec<_>>(), [0, 1, -1]);
        let row: Vec<_> = incidence.row(0).collect();
        assert_eq!(row, [(circuit.find("Vin").unwrap(), 1), (circuit.find("R1").unwrap(), -1)]);
    }

    #[test]
    fn test_spanning_tree_from_ground() {
        let topology = Topology::build(&divider()).unwrap();
        let tree: Vec<_> = topology
            .spanning_tree()
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        assert_eq!(
            tree,
            [
                ("0".to_string(), "IN".to_string()),
                ("0".to_string(), "OUT".to_string())
            ]
        );
    }

    #[test]
    fn test_disconnected_node() {
        let circuit = Circuit::new(vec![
            Component::voltage_source("V1", "A", "0", "V1"),
            Component::resistor("R1", "A", "0", "R1"),
            Component::voltage_source("V2", "B", "C", "V2"),
            Component::resistor("R2", "B", "C", "R2"),
        ])
        .unwrap();
        assert!(matches!(
            Topology::build(&circuit),
            Err(Error::Disconnected(node)) if node == "C"
        ));
    }

    #[test]
    fn test_minimum_cycle_basis_of_complete_graph() {
        // K4 has cycle space dimension 3, spanned by three triangles.
        let mut graph: UnGraph<(), ()> = UnGraph::new_undirected();
        let v: Vec<_> = (0..4).map(|_| graph.add_node(())).collect();
        for i in 0..4 {
            for j in i + 1..4 {
                graph.add_edge(v[i], v[j], ());
            }
        }
        let basis = minimum_cycle_basis(&graph);
        assert_eq!(basis.len(), 3);
        assert!(basis.iter().all(|c| c.len() == 3));
    }
}
