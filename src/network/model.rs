use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, UncertaintyError};

/// How a network reports the flow leaving each node to the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossForm {
    /// Separate export and respiration vectors
    Split,
    /// Only the combined output vector
    Output,
}

impl fmt::Display for LossForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossForm::Split => write!(f, "export/respiration"),
            LossForm::Output => write!(f, "combined output"),
        }
    }
}

/// A conserved-flow network
///
/// Flow balance at node i: inputs[i] + sum_a flows[a][i] = outputs[i] + sum_b flows[i][b]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNetwork {
    /// Square flow matrix, `flows[a][b]` is the flow from node a to node b
    pub flows: Vec<Vec<f64>>,

    /// External inputs per node
    pub inputs: Vec<f64>,

    /// Exports per node (absent for output-only networks)
    pub exports: Option<Vec<f64>>,

    /// Respiration per node (absent for output-only networks)
    pub respirations: Option<Vec<f64>>,

    /// Combined output per node (exports + respirations)
    pub outputs: Vec<f64>,

    /// Storage per node
    pub storage: Vec<f64>,

    /// Living flag per node
    pub living: Vec<bool>,

    /// Vertex names
    pub names: Vec<String>,
}

impl FlowNetwork {
    /// Create a network with split export/respiration losses
    ///
    /// Outputs are derived as exports + respirations.
    pub fn new(
        names: Vec<String>,
        flows: Vec<Vec<f64>>,
        inputs: Vec<f64>,
        exports: Vec<f64>,
        respirations: Vec<f64>,
        storage: Vec<f64>,
        living: Vec<bool>,
    ) -> Result<Self> {
        let outputs = exports
            .iter()
            .zip(respirations.iter())
            .map(|(e, r)| e + r)
            .collect();
        let network = Self {
            flows,
            inputs,
            exports: Some(exports),
            respirations: Some(respirations),
            outputs,
            storage,
            living,
            names,
        };
        network.validate()?;
        Ok(network)
    }

    /// Create a network that only reports combined output
    pub fn with_outputs(
        names: Vec<String>,
        flows: Vec<Vec<f64>>,
        inputs: Vec<f64>,
        outputs: Vec<f64>,
        storage: Vec<f64>,
        living: Vec<bool>,
    ) -> Result<Self> {
        let network = Self {
            flows,
            inputs,
            exports: None,
            respirations: None,
            outputs,
            storage,
            living,
            names,
        };
        network.validate()?;
        Ok(network)
    }

    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    pub fn loss_form(&self) -> LossForm {
        if self.exports.is_some() && self.respirations.is_some() {
            LossForm::Split
        } else {
            LossForm::Output
        }
    }

    /// Baseline used for the export slots of the variable layout
    ///
    /// Output-only networks carry their combined output in the export slots.
    pub fn export_baseline(&self) -> &[f64] {
        match &self.exports {
            Some(exports) if self.respirations.is_some() => exports,
            _ => &self.outputs,
        }
    }

    /// Baseline used for the respiration slots (zero for output-only networks)
    pub fn respiration_baseline(&self) -> Vec<f64> {
        match (&self.exports, &self.respirations) {
            (Some(_), Some(respirations)) => respirations.clone(),
            _ => vec![0.0; self.node_count()],
        }
    }

    /// Net balance at each node: inflow - outflow
    pub fn node_imbalance(&self) -> Vec<f64> {
        let n = self.node_count();
        (0..n)
            .map(|i| {
                let inflow: f64 = self.inputs[i] + (0..n).map(|a| self.flows[a][i]).sum::<f64>();
                let outflow: f64 = self.outputs[i] + self.flows[i].iter().sum::<f64>();
                inflow - outflow
            })
            .collect()
    }

    /// Check dimensions agree and all magnitudes are finite and non-negative
    pub fn validate(&self) -> Result<()> {
        let n = self.node_count();
        if n == 0 {
            return Err(UncertaintyError::InvalidNetwork(
                "network has no nodes".to_string(),
            ));
        }

        if self.flows.len() != n || self.flows.iter().any(|row| row.len() != n) {
            return Err(UncertaintyError::InvalidNetwork(format!(
                "flow matrix must be {}x{}",
                n, n
            )));
        }

        check_vector("inputs", &self.inputs, n)?;
        check_vector("outputs", &self.outputs, n)?;
        check_vector("storage", &self.storage, n)?;
        match (&self.exports, &self.respirations) {
            (Some(exports), Some(respirations)) => {
                check_vector("exports", exports, n)?;
                check_vector("respirations", respirations, n)?;
            }
            (None, None) => {}
            (Some(_), None) => {
                return Err(UncertaintyError::InvalidNetwork(
                    "exports given without respirations".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(UncertaintyError::InvalidNetwork(
                    "respirations given without exports".to_string(),
                ))
            }
        }

        if self.living.len() != n {
            return Err(UncertaintyError::InvalidNetwork(format!(
                "living has length {}, expected {}",
                self.living.len(),
                n
            )));
        }

        for (a, row) in self.flows.iter().enumerate() {
            for (b, value) in row.iter().enumerate() {
                if !value.is_finite() || *value < 0.0 {
                    return Err(UncertaintyError::InvalidNetwork(format!(
                        "flow {}->{} must be a finite non-negative value, got {}",
                        a, b, value
                    )));
                }
            }
        }

        Ok(())
    }
}

fn check_vector(name: &str, values: &[f64], n: usize) -> Result<()> {
    if values.len() != n {
        return Err(UncertaintyError::InvalidNetwork(format!(
            "{} has length {}, expected {}",
            name,
            values.len(),
            n
        )));
    }
    if let Some((i, v)) = values
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(UncertaintyError::InvalidNetwork(format!(
            "{}[{}] must be a finite non-negative value, got {}",
            name, i, v
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Three-compartment chain: 0 -> 1 -> 2 with a feedback 2 -> 0, balanced
    pub fn chain() -> FlowNetwork {
        FlowNetwork::new(
            vec!["plants".into(), "grazers".into(), "detritus".into()],
            vec![
                vec![0.0, 60.0, 20.0],
                vec![0.0, 0.0, 25.0],
                vec![10.0, 0.0, 0.0],
            ],
            vec![100.0, 0.0, 0.0],
            vec![5.0, 5.0, 10.0],
            vec![25.0, 30.0, 25.0],
            vec![500.0, 120.0, 900.0],
            vec![true, true, false],
        )
        .expect("chain fixture is valid")
    }

    /// Same chain, losses expressed only as combined output
    pub fn chain_output_only() -> FlowNetwork {
        let split = chain();
        FlowNetwork::with_outputs(
            split.names.clone(),
            split.flows.clone(),
            split.inputs.clone(),
            split.outputs.clone(),
            split.storage.clone(),
            split.living.clone(),
        )
        .expect("output-only fixture is valid")
    }
}
