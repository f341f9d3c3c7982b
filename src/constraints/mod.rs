//! Linear constraint system over the coefficient vector
//!
//! Equality rows keep every node balanced after rescaling (E·x = F0, F0 = 0).
//! Inequality rows bound each coefficient between its ratios (G·x >= H).

use nalgebra::{DMatrix, DVector};

use crate::error::{Result, UncertaintyError};
use crate::network::{FlowNetwork, VariableLayout};
use crate::uncertainty::BoundRatios;

/// Equality and inequality system handed to the sampler
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSystem {
    /// Conservation matrix E (n x m)
    pub equality: DMatrix<f64>,
    /// Right-hand side F0 (n), all zero
    pub equality_rhs: DVector<f64>,
    /// Stacked [I; -I] (2m x m)
    pub inequality: DMatrix<f64>,
    /// Stacked [lower; -upper] (2m)
    pub inequality_rhs: DVector<f64>,
}

impl ConstraintSystem {
    /// Number of coefficient variables m
    pub fn variable_count(&self) -> usize {
        self.equality.ncols()
    }

    /// Per-variable lower bounds, the top half of H
    pub fn lower(&self) -> Vec<f64> {
        let m = self.variable_count();
        self.inequality_rhs.rows(0, m).iter().copied().collect()
    }

    /// Per-variable upper bounds, the negated bottom half of H
    pub fn upper(&self) -> Vec<f64> {
        let m = self.variable_count();
        self.inequality_rhs.rows(m, m).iter().map(|h| -h).collect()
    }

    /// E·x - F0 for a candidate vector
    pub fn equality_residual(&self, x: &[f64]) -> DVector<f64> {
        &self.equality * DVector::from_column_slice(x) - &self.equality_rhs
    }

    /// Whether x satisfies both systems within `tolerance`
    pub fn is_feasible(&self, x: &[f64], tolerance: f64) -> bool {
        if x.len() != self.variable_count() {
            return false;
        }
        let balanced = self.equality_residual(x).iter().all(|r| r.abs() <= tolerance);
        let slack = &self.inequality * DVector::from_column_slice(x) - &self.inequality_rhs;
        balanced && slack.iter().all(|s| *s >= -tolerance)
    }
}

/// Builds the constraint system for one baseline network
pub struct ConstraintBuilder<'a> {
    network: &'a FlowNetwork,
    layout: &'a VariableLayout,
}

impl<'a> ConstraintBuilder<'a> {
    pub fn new(network: &'a FlowNetwork, layout: &'a VariableLayout) -> Self {
        Self { network, layout }
    }

    /// Conservation rows E and zero right-hand side F0
    ///
    /// Row i: z_i·x_z - e_i·x_e - r_i·x_r + sum(inflow·x_f) - sum(outflow·x_f).
    /// Self-loops contribute nothing to any row.
    pub fn equality(&self) -> (DMatrix<f64>, DVector<f64>) {
        let n = self.layout.node_count();
        let m = self.layout.len();
        let mut e = DMatrix::zeros(n, m);

        let exports = self.network.export_baseline();
        let respirations = self.network.respiration_baseline();
        for i in 0..n {
            e[(i, self.layout.input(i))] = self.network.inputs[i];
            e[(i, self.layout.export(i))] = -exports[i];
            e[(i, self.layout.respiration(i))] = -respirations[i];
        }

        for (k, &(from, to)) in self.layout.fluxes().pairs().iter().enumerate() {
            if from == to {
                continue;
            }
            let flow = self.network.flows[from][to];
            let column = self.layout.flux(k);
            e[(to, column)] = flow;
            e[(from, column)] = -flow;
        }

        (e, DVector::zeros(n))
    }

    /// Box rows G = [I; -I] and H = [lower; -upper]
    pub fn inequality(&self, ratios: &BoundRatios) -> Result<(DMatrix<f64>, DVector<f64>)> {
        let m = self.layout.len();
        if ratios.lower.len() != m || ratios.upper.len() != m {
            return Err(UncertaintyError::InvalidParameter(format!(
                "bound ratios have lengths {}/{}, layout has {} variables",
                ratios.lower.len(),
                ratios.upper.len(),
                m
            )));
        }

        let mut g = DMatrix::zeros(2 * m, m);
        let mut h = DVector::zeros(2 * m);
        for j in 0..m {
            g[(j, j)] = 1.0;
            g[(m + j, j)] = -1.0;
            h[j] = ratios.lower[j];
            h[m + j] = -ratios.upper[j];
        }

        Ok((g, h))
    }

    pub fn build(&self, ratios: &BoundRatios) -> Result<ConstraintSystem> {
        let (equality, equality_rhs) = self.equality();
        let (inequality, inequality_rhs) = self.inequality(ratios)?;

        tracing::debug!(
            nodes = equality.nrows(),
            variables = equality.ncols(),
            "built constraint system"
        );

        Ok(ConstraintSystem {
            equality,
            equality_rhs,
            inequality,
            inequality_rhs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::model::fixtures::{chain, chain_output_only};

    fn system_for(network: &FlowNetwork, ratios: Option<BoundRatios>) -> ConstraintSystem {
        let layout = VariableLayout::new(network);
        let ratios = ratios.unwrap_or_else(|| BoundRatios::uniform(layout.len(), 0.5, 1.5));
        ConstraintBuilder::new(network, &layout).build(&ratios).unwrap()
    }

    #[test]
    fn test_equality_shape_and_rhs() {
        let system = system_for(&chain(), None);
        assert_eq!(system.equality.shape(), (3, 13));
        assert_eq!(system.equality_rhs, DVector::zeros(3));
        assert_eq!(system.inequality.shape(), (26, 13));
        assert_eq!(system.inequality_rhs.len(), 26);
    }

    #[test]
    fn test_equality_entries() {
        let network = chain();
        let layout = VariableLayout::new(&network);
        let (e, _) = ConstraintBuilder::new(&network, &layout).equality();

        assert_eq!(e[(0, layout.input(0))], 100.0);
        assert_eq!(e[(2, layout.export(2))], -10.0);
        assert_eq!(e[(1, layout.respiration(1))], -30.0);
        // flux 0 is 0->1 (60)
        assert_eq!(e[(0, layout.flux(0))], -60.0);
        assert_eq!(e[(1, layout.flux(0))], 60.0);
        assert_eq!(e[(2, layout.flux(0))], 0.0);
    }

    #[test]
    fn test_unit_vector_satisfies_balanced_baseline() {
        let system = system_for(&chain(), None);
        let ones = vec![1.0; system.variable_count()];
        assert!(system.equality_residual(&ones).iter().all(|r| r.abs() < 1e-9));
        assert!(system.is_feasible(&ones, 1e-9));
    }

    #[test]
    fn test_self_loop_contributes_nothing() {
        let mut network = chain();
        network.flows[1][1] = 40.0;
        let layout = VariableLayout::new(&network);
        let (e, _) = ConstraintBuilder::new(&network, &layout).equality();

        let k = layout.fluxes().position(1, 1).unwrap();
        let column = layout.flux(k);
        assert!(e.column(column).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_inequality_encodes_box() {
        let network = chain();
        let layout = VariableLayout::new(&network);
        let ratios = BoundRatios::uniform(layout.len(), 0.75, 1.25);
        let system = ConstraintBuilder::new(&network, &layout).build(&ratios).unwrap();

        assert_eq!(system.inequality[(0, 0)], 1.0);
        assert_eq!(system.inequality[(13, 0)], -1.0);
        assert_eq!(system.lower(), ratios.lower);
        assert_eq!(system.upper(), ratios.upper);

        let mut x = vec![1.0; 13];
        assert!(system.is_feasible(&x, 1e-9));
        x[3] = 1.3;
        assert!(!system.is_feasible(&x, 1e-9));
    }

    #[test]
    fn test_output_only_uses_outputs_in_export_columns() {
        let network = chain_output_only();
        let system = system_for(&network, None);
        let layout = VariableLayout::new(&network);
        assert_eq!(system.equality[(1, layout.export(1))], -35.0);
        assert_eq!(system.equality[(1, layout.respiration(1))], 0.0);
    }

    #[test]
    fn test_ratio_length_mismatch() {
        let network = chain();
        let layout = VariableLayout::new(&network);
        let ratios = BoundRatios::uniform(4, 0.5, 1.5);
        assert!(matches!(
            ConstraintBuilder::new(&network, &layout).build(&ratios),
            Err(UncertaintyError::InvalidParameter(_))
        ));
    }
}
