//! Line-aware adjacency structure for route search.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{LineId, Station, StationId};

/// Kind of move along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeKind {
    /// Adjacent stations on the same line.
    Hop,
    /// Walking between same-name stations on different lines.
    Interchange,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Edge {
    pub to: usize,
    pub kind: EdgeKind,
}

/// Directed graph whose nodes are `(station, line)` pairs.
///
/// Node `i` corresponds to `stations[i]`. Costs are not stored; the search
/// assigns them from [`EdgeKind`] and the active policy, so one graph serves
/// every preference.
#[derive(Debug, Clone, Default)]
pub(crate) struct RouteGraph {
    stations: Vec<Station>,
    /// Nodes per station id, one per line the id appears on.
    nodes: HashMap<StationId, Vec<usize>>,
    edges: Vec<Vec<Edge>>,
}

impl RouteGraph {
    pub fn build(stations: &[Station]) -> Self {
        let stations = stations.to_vec();
        let mut nodes: HashMap<StationId, Vec<usize>> = HashMap::with_capacity(stations.len());
        let mut edges: Vec<Vec<Edge>> = vec![Vec::new(); stations.len()];
        let mut lines: BTreeMap<&LineId, Vec<usize>> = BTreeMap::new();
        let mut names: HashMap<&str, Vec<usize>> = HashMap::new();

        for (idx, station) in stations.iter().enumerate() {
            nodes.entry(station.id).or_default().push(idx);
            lines.entry(&station.line).or_default().push(idx);
            names.entry(station.name.as_str()).or_default().push(idx);
        }

        for members in lines.values_mut() {
            members.sort_by_key(|&idx| stations[idx].sequence);
            for pair in members.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if stations[b].sequence == stations[a].sequence + 1 {
                    edges[a].push(Edge {
                        to: b,
                        kind: EdgeKind::Hop,
                    });
                    edges[b].push(Edge {
                        to: a,
                        kind: EdgeKind::Hop,
                    });
                }
            }
        }

        for members in names.values() {
            for &from in members {
                for &to in members {
                    if stations[from].line != stations[to].line {
                        edges[from].push(Edge {
                            to,
                            kind: EdgeKind::Interchange,
                        });
                    }
                }
            }
        }

        Self {
            stations,
            nodes,
            edges,
        }
    }

    pub fn node_count(&self) -> usize {
        self.stations.len()
    }

    pub fn station(&self, node: usize) -> &Station {
        &self.stations[node]
    }

    pub fn edges(&self, node: usize) -> &[Edge] {
        &self.edges[node]
    }

    /// All nodes carrying the given station id, one per line it serves.
    pub fn nodes_for(&self, station: StationId) -> &[usize] {
        self.nodes.get(&station).map_or(&[][..], Vec::as_slice)
    }

    /// The first station record with this id.
    pub fn find(&self, station: StationId) -> Option<&Station> {
        self.nodes_for(station).first().map(|&idx| &self.stations[idx])
    }
}
