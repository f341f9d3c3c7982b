use std::collections::BTreeMap;

use crate::advisory::Advisory;
use crate::error::{Result, UncertaintyError};
use crate::network::{FlowNetwork, LossForm, VariableLayout};

/// Sparse per-node values keyed by node index
pub type NodeTable = BTreeMap<usize, f64>;

/// Sparse per-flux values keyed by (from, to)
pub type FlowTable = BTreeMap<(usize, usize), f64>;

/// Per-category sparse deviation data
///
/// Units follow the flows themselves: half-ranges for symmetric uncertainty,
/// absolute bounds for asymmetric uncertainty. Losses are given either as
/// `exports` + `respirations` or as `outputs`, matching the network's
/// [`LossForm`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviationTables {
    pub flows: Option<FlowTable>,
    pub inputs: Option<NodeTable>,
    pub exports: Option<NodeTable>,
    pub respirations: Option<NodeTable>,
    pub outputs: Option<NodeTable>,
}

impl DeviationTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flow(mut self, from: usize, to: usize, value: f64) -> Self {
        self.flows.get_or_insert_with(BTreeMap::new).insert((from, to), value);
        self
    }

    pub fn with_input(mut self, node: usize, value: f64) -> Self {
        self.inputs.get_or_insert_with(BTreeMap::new).insert(node, value);
        self
    }

    pub fn with_export(mut self, node: usize, value: f64) -> Self {
        self.exports.get_or_insert_with(BTreeMap::new).insert(node, value);
        self
    }

    pub fn with_respiration(mut self, node: usize, value: f64) -> Self {
        self.respirations.get_or_insert_with(BTreeMap::new).insert(node, value);
        self
    }

    pub fn with_output(mut self, node: usize, value: f64) -> Self {
        self.outputs.get_or_insert_with(BTreeMap::new).insert(node, value);
        self
    }

    /// Check the tables required for `network` are present and well-formed
    ///
    /// `mode` and `prefix` only shape error messages ("asym", "lower ").
    pub fn validate(&self, network: &FlowNetwork, mode: &str, prefix: &str) -> Result<()> {
        let name = |table: &str| format!("{}{}", prefix, table);

        let flows = self
            .flows
            .as_ref()
            .ok_or_else(|| UncertaintyError::missing(mode, &name("flows")))?;
        let inputs = self
            .inputs
            .as_ref()
            .ok_or_else(|| UncertaintyError::missing(mode, &name("inputs")))?;

        match network.loss_form() {
            LossForm::Split => {
                if self.outputs.is_some() {
                    return Err(UncertaintyError::CategoryMismatch {
                        expected: LossForm::Split.to_string(),
                        supplied: LossForm::Output.to_string(),
                    });
                }
                if self.exports.is_none() {
                    return Err(UncertaintyError::missing(mode, &name("exports")));
                }
                if self.respirations.is_none() {
                    return Err(UncertaintyError::missing(mode, &name("respirations")));
                }
            }
            LossForm::Output => {
                if self.exports.is_some() || self.respirations.is_some() {
                    return Err(UncertaintyError::CategoryMismatch {
                        expected: LossForm::Output.to_string(),
                        supplied: LossForm::Split.to_string(),
                    });
                }
                if self.outputs.is_none() {
                    return Err(UncertaintyError::missing(mode, &name("outputs")));
                }
            }
        }

        let n = network.node_count();
        for (&(from, to), value) in flows {
            if from >= n || to >= n {
                return Err(UncertaintyError::InvalidParameter(format!(
                    "{} entry {}->{} is outside a {}-node network",
                    name("flows"),
                    from,
                    to,
                    n
                )));
            }
            check_value(&name("flows"), value)?;
        }

        let node_tables = [
            ("inputs", Some(inputs)),
            ("exports", self.exports.as_ref()),
            ("respirations", self.respirations.as_ref()),
            ("outputs", self.outputs.as_ref()),
        ];
        for (label, table) in node_tables {
            let Some(table) = table else { continue };
            for (&node, value) in table {
                if node >= n {
                    return Err(UncertaintyError::InvalidParameter(format!(
                        "{} entry for node {} is outside a {}-node network",
                        name(label),
                        node,
                        n
                    )));
                }
                check_value(&name(label), value)?;
            }
        }

        Ok(())
    }

    /// Spread the sparse tables over the variable layout
    ///
    /// Columns with no entry stay `None`. Flow entries naming a flux that is
    /// zero in the baseline have no column and are reported as advisories.
    /// Tables must have passed [`DeviationTables::validate`].
    pub fn densify(&self, layout: &VariableLayout) -> (Vec<Option<f64>>, Vec<Advisory>) {
        let mut dense = vec![None; layout.len()];
        let mut advisories = Vec::new();

        let mut place = |table: Option<&NodeTable>, column: &dyn Fn(usize) -> usize| {
            for (&node, &value) in table.into_iter().flatten() {
                dense[column(node)] = Some(value);
            }
        };
        place(self.inputs.as_ref(), &|i| layout.input(i));
        // Output-only networks carry their combined output in the export slots
        place(
            self.exports.as_ref().or(self.outputs.as_ref()),
            &|i| layout.export(i),
        );
        place(self.respirations.as_ref(), &|i| layout.respiration(i));

        for (&(from, to), &value) in self.flows.iter().flatten() {
            match layout.fluxes().position(from, to) {
                Some(k) => dense[layout.flux(k)] = Some(value),
                None => advisories.push(Advisory::UnmappedFlow { from, to }),
            }
        }

        (dense, advisories)
    }
}

fn check_value(table: &str, value: &f64) -> Result<()> {
    if !value.is_finite() {
        return Err(UncertaintyError::InvalidParameter(format!(
            "{} contains a non-finite value {}",
            table, value
        )));
    }
    Ok(())
}
