use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::FlowNetwork;

/// Identity of one column in the variable layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableId {
    Input(usize),
    Export(usize),
    Respiration(usize),
    Flow { from: usize, to: usize },
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableId::Input(i) => write!(f, "input {}", i),
            VariableId::Export(i) => write!(f, "export {}", i),
            VariableId::Respiration(i) => write!(f, "respiration {}", i),
            VariableId::Flow { from, to } => write!(f, "flow {}->{}", from, to),
        }
    }
}

/// Ordered (from, to) pairs of every non-zero entry of the flow matrix
///
/// Row-major order. Built once per analysis; every bound and sample vector
/// indexes fluxes in this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FluxIndex {
    pairs: Vec<(usize, usize)>,
    positions: HashMap<(usize, usize), usize>,
}

impl FluxIndex {
    pub fn from_network(network: &FlowNetwork) -> Self {
        let pairs: Vec<(usize, usize)> = network
            .flows
            .iter()
            .enumerate()
            .flat_map(|(a, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, value)| **value != 0.0)
                    .map(move |(b, _)| (a, b))
            })
            .collect();
        let positions = pairs.iter().enumerate().map(|(k, pair)| (*pair, k)).collect();
        Self { pairs, positions }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Position of the flux from -> to, if it is non-zero in the baseline
    pub fn position(&self, from: usize, to: usize) -> Option<usize> {
        self.positions.get(&(from, to)).copied()
    }
}

/// Column bookkeeping for the coefficient vector
///
/// `[inputs (n) | exports (n) | respirations (n) | fluxes (|F|)]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableLayout {
    node_count: usize,
    fluxes: FluxIndex,
}

impl VariableLayout {
    pub fn new(network: &FlowNetwork) -> Self {
        Self {
            node_count: network.node_count(),
            fluxes: FluxIndex::from_network(network),
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn fluxes(&self) -> &FluxIndex {
        &self.fluxes
    }

    /// Total number of variables m = 3n + |F|
    pub fn len(&self) -> usize {
        3 * self.node_count + self.fluxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn input(&self, node: usize) -> usize {
        node
    }

    pub fn export(&self, node: usize) -> usize {
        self.node_count + node
    }

    pub fn respiration(&self, node: usize) -> usize {
        2 * self.node_count + node
    }

    pub fn flux(&self, k: usize) -> usize {
        3 * self.node_count + k
    }

    /// Identify column j
    pub fn variable(&self, j: usize) -> VariableId {
        let n = self.node_count;
        match j {
            j if j < n => VariableId::Input(j),
            j if j < 2 * n => VariableId::Export(j - n),
            j if j < 3 * n => VariableId::Respiration(j - 2 * n),
            j => {
                let (from, to) = self.fluxes.pairs[j - 3 * n];
                VariableId::Flow { from, to }
            }
        }
    }

    /// Baseline magnitude carried by each column
    pub fn baseline(&self, network: &FlowNetwork) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.len());
        values.extend_from_slice(&network.inputs);
        values.extend_from_slice(network.export_baseline());
        values.extend(network.respiration_baseline());
        values.extend(self.fluxes.pairs.iter().map(|&(a, b)| network.flows[a][b]));
        values
    }
}
