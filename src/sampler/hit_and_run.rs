//! Hit-and-Run Sampler
//!
//! Random walk over the polytope formed by the conservation equalities and the
//! per-variable box. Each step picks a uniformly random direction inside the
//! null space of the equality rows and jumps to a uniform point on the chord
//! through the current point.
//!
//! The walk starts from an LP solution (minilp) that maximises the distance to
//! the box faces, scaled by each variable's width. An infeasible LP is the
//! signal that the region is empty.

use minilp::{ComparisonOp, OptimizationDirection, Problem};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::config::SamplerConfig;
use crate::constraints::ConstraintSystem;
use crate::error::{Result, UncertaintyError};

use super::{PolytopeSampler, SampleSet};

// Box widths below this (relative to the bound) pin the variable
const FIXED_WIDTH_TOLERANCE: f64 = 1e-12;

// Singular values below this (relative to the largest) count as zero
const RANK_TOLERANCE: f64 = 1e-10;

// Direction components below this do not limit the chord
const DIRECTION_EPSILON: f64 = 1e-12;

// Unset burn-in and thinning scale with the number of free directions
const BURN_IN_PER_DIMENSION: usize = 10;
const MIN_BURN_IN: usize = 100;
const THINNING_PER_DIMENSION: usize = 3;
const MIN_THINNING: usize = 10;

/// Default sampler used by the analysis
#[derive(Debug, Clone, Default)]
pub struct HitAndRunSampler {
    config: SamplerConfig,
}

impl HitAndRunSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Sampler with a fixed seed and otherwise default settings
    pub fn seeded(seed: u64) -> Self {
        Self::new(SamplerConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Burn-in and thinning for a walk with `dimension` free directions
    fn schedule(&self, dimension: usize) -> (usize, usize) {
        let burn_in = self
            .config
            .burn_in
            .unwrap_or_else(|| (BURN_IN_PER_DIMENSION * dimension).max(MIN_BURN_IN));
        let thinning = self
            .config
            .thinning
            .unwrap_or_else(|| (THINNING_PER_DIMENSION * dimension).max(MIN_THINNING));
        (burn_in, thinning)
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl PolytopeSampler for HitAndRunSampler {
    fn sample(&self, system: &ConstraintSystem, iterations: usize) -> Result<SampleSet> {
        if iterations == 0 {
            return Err(UncertaintyError::InvalidParameter(
                "iteration count must be at least 1".to_string(),
            ));
        }
        if self.config.thinning == Some(0) {
            return Err(UncertaintyError::InvalidParameter(
                "thinning must be at least 1".to_string(),
            ));
        }

        let (lower, upper) = checked_box(system)?;
        let start = starting_point(system, &lower, &upper)?;
        let projector = null_space_projector(system, &lower, &upper);
        let dimension = projector.trace().round().max(0.0) as usize;
        let (burn_in, thinning) = self.schedule(dimension);

        let m = lower.len();
        let mut walk = Walk {
            x: start,
            lower: &lower,
            upper: &upper,
            projector: &projector,
            rng: self.rng(),
        };

        tracing::debug!(
            variables = m,
            dimension,
            burn_in,
            thinning,
            "starting hit-and-run walk"
        );

        for _ in 0..burn_in {
            walk.step();
        }

        let mut samples = Vec::with_capacity(iterations);
        for _ in 0..iterations {
            for _ in 0..thinning {
                walk.step();
            }
            samples.push(walk.x.as_slice().to_vec());
        }

        verify_samples(system, &samples, self.config.equality_tolerance)?;
        Ok(samples)
    }
}

/// Lower/upper bounds from H, rejecting any crossed pair
fn checked_box(system: &ConstraintSystem) -> Result<(Vec<f64>, Vec<f64>)> {
    let lower = system.lower();
    let mut upper = system.upper();

    for j in 0..lower.len() {
        if !lower[j].is_finite() || !upper[j].is_finite() {
            return Err(UncertaintyError::Sampler(format!(
                "variable {} has a non-finite bound",
                j
            )));
        }
        let slack = FIXED_WIDTH_TOLERANCE * upper[j].abs().max(1.0);
        if lower[j] > upper[j] + slack {
            return Err(UncertaintyError::Infeasible(format!(
                "variable {} has lower bound {} above upper bound {}",
                j, lower[j], upper[j]
            )));
        }
        upper[j] = upper[j].max(lower[j]);
    }

    Ok((lower, upper))
}

fn is_pinned(lower: f64, upper: f64) -> bool {
    upper - lower <= FIXED_WIDTH_TOLERANCE * upper.abs().max(1.0)
}

/// Feasible point maximising the relative distance to the box faces
///
/// max s  s.t.  E·x = F0,  lower + s·w <= x <= upper - s·w,  0 <= s <= 1/2
fn starting_point(
    system: &ConstraintSystem,
    lower: &[f64],
    upper: &[f64],
) -> Result<DVector<f64>> {
    let m = lower.len();
    let mut problem = Problem::new(OptimizationDirection::Maximize);

    let vars: Vec<_> = (0..m).map(|j| problem.add_var(0.0, (lower[j], upper[j]))).collect();
    let slack = problem.add_var(1.0, (0.0, 0.5));

    for j in 0..m {
        let width = upper[j] - lower[j];
        if is_pinned(lower[j], upper[j]) {
            continue;
        }
        problem.add_constraint(&[(vars[j], 1.0), (slack, -width)], ComparisonOp::Ge, lower[j]);
        problem.add_constraint(&[(vars[j], 1.0), (slack, width)], ComparisonOp::Le, upper[j]);
    }

    for (i, row) in system.equality.row_iter().enumerate() {
        let scale = row.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if scale == 0.0 {
            continue;
        }
        let terms: Vec<_> = row
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(j, v)| (vars[j], v / scale))
            .collect();
        problem.add_constraint(
            terms.as_slice(),
            ComparisonOp::Eq,
            system.equality_rhs[i] / scale,
        );
    }

    let solution = problem.solve().map_err(|err| match err {
        minilp::Error::Infeasible => UncertaintyError::Infeasible(
            "no coefficient vector satisfies both conservation and the bounds".to_string(),
        ),
        other => UncertaintyError::Sampler(format!("starting point LP failed: {}", other)),
    })?;

    tracing::debug!(slack = solution[slack], "found starting point");

    Ok(DVector::from_iterator(
        m,
        (0..m).map(|j| solution[vars[j]].clamp(lower[j], upper[j])),
    ))
}

/// Orthogonal projector onto the directions that keep E·x and pinned variables fixed
fn null_space_projector(system: &ConstraintSystem, lower: &[f64], upper: &[f64]) -> DMatrix<f64> {
    let m = lower.len();

    let mut rows: Vec<DVector<f64>> = system
        .equality
        .row_iter()
        .filter_map(|row| {
            let norm = row.norm();
            (norm > 0.0).then(|| row.transpose() / norm)
        })
        .collect();
    for j in (0..m).filter(|&j| is_pinned(lower[j], upper[j])) {
        let mut unit = DVector::<f64>::zeros(m);
        unit[j] = 1.0;
        rows.push(unit);
    }

    let mut projector = DMatrix::identity(m, m);
    if rows.is_empty() {
        return projector;
    }

    let mut a = DMatrix::<f64>::zeros(rows.len(), m);
    for (i, row) in rows.iter().enumerate() {
        a.set_row(i, &row.transpose());
    }

    let svd = a.svd(false, true);
    let Some(v_t) = svd.v_t else {
        return projector;
    };
    let largest = svd.singular_values.max();
    for (i, sigma) in svd.singular_values.iter().enumerate() {
        if *sigma > RANK_TOLERANCE * largest.max(1.0) {
            let v = v_t.row(i).transpose();
            projector -= &v * v.transpose();
        }
    }

    projector
}

struct Walk<'a> {
    x: DVector<f64>,
    lower: &'a [f64],
    upper: &'a [f64],
    projector: &'a DMatrix<f64>,
    rng: StdRng,
}

impl Walk<'_> {
    fn step(&mut self) {
        let m = self.x.len();
        let gaussian = DVector::from_iterator(
            m,
            (0..m).map(|_| self.rng.sample::<f64, _>(StandardNormal)),
        );
        let direction = self.projector * gaussian;
        let norm = direction.norm();
        if norm < DIRECTION_EPSILON {
            return;
        }
        let direction = direction / norm;

        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;
        for j in 0..m {
            let d = direction[j];
            if d.abs() < DIRECTION_EPSILON {
                continue;
            }
            let a = (self.lower[j] - self.x[j]) / d;
            let b = (self.upper[j] - self.x[j]) / d;
            t_min = t_min.max(a.min(b));
            t_max = t_max.min(a.max(b));
        }

        if !(t_min.is_finite() && t_max.is_finite()) || t_max <= t_min {
            return;
        }

        let t = self.rng.gen_range(t_min..t_max);
        for j in 0..m {
            self.x[j] = (self.x[j] + t * direction[j]).clamp(self.lower[j], self.upper[j]);
        }
    }
}

/// Reject the whole set if any row drifted off the conservation rows
fn verify_samples(system: &ConstraintSystem, samples: &SampleSet, tolerance: f64) -> Result<()> {
    for (s, x) in samples.iter().enumerate() {
        let residual = system.equality_residual(x);
        for (i, row) in system.equality.row_iter().enumerate() {
            let throughflow: f64 = row.iter().zip(x.iter()).map(|(e, v)| (e * v).abs()).sum();
            if residual[i].abs() > tolerance * throughflow.max(1.0) {
                return Err(UncertaintyError::Sampler(format!(
                    "sample {} violates conservation at node {} by {:e}",
                    s, i, residual[i]
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintBuilder;
    use crate::network::model::fixtures::chain;
    use crate::network::VariableLayout;
    use crate::uncertainty::BoundRatios;

    fn system(ratios: impl Fn(usize) -> BoundRatios) -> ConstraintSystem {
        let network = chain();
        let layout = VariableLayout::new(&network);
        ConstraintBuilder::new(&network, &layout)
            .build(&ratios(layout.len()))
            .unwrap()
    }

    #[test]
    fn test_returns_exact_count_of_feasible_rows() {
        let system = system(|m| BoundRatios::uniform(m, 0.75, 1.25));
        let samples = HitAndRunSampler::seeded(42).sample(&system, 50).unwrap();

        assert_eq!(samples.len(), 50);
        for x in &samples {
            assert_eq!(x.len(), system.variable_count());
            assert!(system.is_feasible(x, 1e-7));
        }
    }

    #[test]
    fn test_walk_moves() {
        let system = system(|m| BoundRatios::uniform(m, 0.5, 1.5));
        let samples = HitAndRunSampler::seeded(1).sample(&system, 20).unwrap();
        assert!(samples.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_same_seed_same_samples() {
        let system = system(|m| BoundRatios::uniform(m, 0.8, 1.2));
        let a = HitAndRunSampler::seeded(9).sample(&system, 10).unwrap();
        let b = HitAndRunSampler::seeded(9).sample(&system, 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_crossed_bounds_are_infeasible() {
        let system = system(|m| {
            let mut ratios = BoundRatios::uniform(m, 0.8, 1.2);
            ratios.lower[10] = 1.3;
            ratios
        });
        let result = HitAndRunSampler::seeded(3).sample(&system, 5);
        assert!(matches!(result, Err(UncertaintyError::Infeasible(_))));
    }

    #[test]
    fn test_bounds_inconsistent_with_conservation_are_infeasible() {
        // Input to node 0 forced to at least 1.5x while every outflow is capped at 1.0x
        let system = system(|m| {
            let mut ratios = BoundRatios::uniform(m, 0.5, 1.0);
            ratios.lower[0] = 1.5;
            ratios.upper[0] = 2.0;
            ratios
        });
        let result = HitAndRunSampler::seeded(3).sample(&system, 5);
        assert!(matches!(result, Err(UncertaintyError::Infeasible(_))));
    }

    #[test]
    fn test_fully_pinned_region_repeats_point() {
        let system = system(|m| BoundRatios::uniform(m, 1.0, 1.0));
        let samples = HitAndRunSampler::seeded(5).sample(&system, 3).unwrap();
        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|x| x.iter().all(|v| (*v - 1.0).abs() < 1e-12)));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let system = system(|m| BoundRatios::uniform(m, 0.5, 1.5));
        assert!(matches!(
            HitAndRunSampler::default().sample(&system, 0),
            Err(UncertaintyError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_unset_schedule_scales_with_dimension() {
        let sampler = HitAndRunSampler::seeded(1);
        assert_eq!(sampler.schedule(11), (110, 33));
        assert_eq!(sampler.schedule(0), (MIN_BURN_IN, MIN_THINNING));

        let explicit = HitAndRunSampler::new(SamplerConfig {
            burn_in: Some(7),
            thinning: Some(2),
            ..Default::default()
        });
        assert_eq!(explicit.schedule(11), (7, 2));
    }

    #[test]
    fn test_free_coordinate_is_uniform() {
        // A self-loop never enters a conservation row, so its marginal is the whole box
        let mut network = chain();
        network.flows[2][2] = 15.0;
        let layout = VariableLayout::new(&network);
        let column = layout.flux(layout.fluxes().position(2, 2).unwrap());
        let system = ConstraintBuilder::new(&network, &layout)
            .build(&BoundRatios::uniform(layout.len(), 0.8, 1.2))
            .unwrap();

        let samples = HitAndRunSampler::seeded(3).sample(&system, 4000).unwrap();
        let values: Vec<f64> = samples.iter().map(|x| x[column]).collect();
        let n = values.len() as f64;

        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!((mean - 1.0).abs() < 0.02, "mean {}", mean);
        assert!(
            (variance - 0.4_f64.powi(2) / 12.0).abs() < 0.002,
            "variance {}",
            variance
        );

        let mut bins = [0usize; 4];
        for v in &values {
            bins[(((v - 0.8) / 0.1) as usize).min(3)] += 1;
        }
        for count in bins {
            assert!((850..=1150).contains(&count), "quartile bins {:?}", bins);
        }

        let lagged: f64 = values
            .windows(2)
            .map(|w| (w[0] - mean) * (w[1] - mean))
            .sum::<f64>();
        let autocorrelation = lagged / (variance * n);
        assert!(autocorrelation < 0.7, "lag-1 autocorrelation {}", autocorrelation);
    }
}
