use crate::Network;
use anyhow::{anyhow, Result};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{HashMap, HashSet, VecDeque};

/// Branch kind connecting two buses in the topology view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Line,
    Link,
}

/// Island summary: buses that can exchange power with each other.
#[derive(Debug)]
pub struct IslandSummary {
    pub island_id: usize,
    pub bus_count: usize,
}

/// Island membership of a single bus.
#[derive(Debug)]
pub struct BusAssignment {
    pub bus_index: usize,
    pub bus: String,
    pub island_id: usize,
}

#[derive(Debug)]
pub struct IslandAnalysis {
    pub islands: Vec<IslandSummary>,
    pub assignments: Vec<BusAssignment>,
}

impl IslandAnalysis {
    pub fn island_of(&self, bus: &str) -> Option<usize> {
        self.assignments
            .iter()
            .find(|a| a.bus == bus)
            .map(|a| a.island_id)
    }
}

/// Undirected bus graph; node weights are bus names, edge weights the
/// branch name and kind. Inactive lines are left out.
pub fn bus_graph(network: &Network) -> Result<UnGraph<String, (String, BranchKind)>> {
    let mut graph = UnGraph::new_undirected();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();
    for bus in network.buses() {
        index.insert(bus.name.as_str(), graph.add_node(bus.name.clone()));
    }
    let lookup = |bus: &str| {
        index
            .get(bus)
            .copied()
            .ok_or_else(|| anyhow!("branch references unknown bus '{}'", bus))
    };
    for line in network.lines().iter().filter(|l| l.active) {
        graph.add_edge(
            lookup(&line.bus0)?,
            lookup(&line.bus1)?,
            (line.name.clone(), BranchKind::Line),
        );
    }
    for link in network.links() {
        graph.add_edge(
            lookup(&link.bus0)?,
            lookup(&link.bus1)?,
            (link.name.clone(), BranchKind::Link),
        );
    }
    Ok(graph)
}

/// Number of connected components in the bus graph.
pub fn island_count(network: &Network) -> Result<usize> {
    Ok(connected_components(&bus_graph(network)?))
}

/// Labels connected components (breadth-first search) and reports the bus
/// membership of each island.
pub fn find_islands(network: &Network) -> Result<IslandAnalysis> {
    let graph = bus_graph(network)?;
    let mut visited = HashSet::new();
    let mut islands = Vec::new();
    let mut assignments = Vec::new();
    let mut island_id = 0;
    for start in graph.node_indices() {
        if visited.contains(&start) {
            continue;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            members.push(node);
            for neighbor in graph.neighbors(node) {
                if !visited.contains(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        islands.push(IslandSummary {
            island_id,
            bus_count: members.len(),
        });
        for node in members {
            assignments.push(BusAssignment {
                bus_index: node.index(),
                bus: graph[node].clone(),
                island_id,
            });
        }
        island_id += 1;
    }
    assignments.sort_by_key(|a| a.bus_index);
    Ok(IslandAnalysis {
        islands,
        assignments,
    })
}
