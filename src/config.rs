use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub bounds: BoundsConfig,
}

/// Random walk settings for the default sampler
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Steps discarded before the first recorded sample; scaled with the
    /// walk dimension when absent
    pub burn_in: Option<usize>,
    /// Steps taken between recorded samples; scaled with the walk dimension
    /// when absent
    pub thinning: Option<usize>,
    /// Fixed seed for reproducible runs; entropy when absent
    pub seed: Option<u64>,
    /// Maximum allowed |E·x| per node, relative to the node's throughflow
    pub equality_tolerance: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            burn_in: None,
            thinning: None,
            seed: None,
            equality_tolerance: 1e-9,
        }
    }
}

/// Constants used when deriving bound ratios
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    /// Half-width substituted when the percent error is zero
    pub zero_percent_window: f64,
    /// Smallest ratio allowed when a lower ratio would drop to or below zero
    pub ratio_floor: f64,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            zero_percent_window: 1e-4,
            ratio_floor: 1e-4,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("FLOWUNC__").split("__"));
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sampler.thinning == Some(0) {
            anyhow::bail!("sampler.thinning must be at least 1");
        }
        if !(self.sampler.equality_tolerance > 0.0) {
            anyhow::bail!("sampler.equality_tolerance must be positive");
        }
        if !(self.bounds.zero_percent_window > 0.0 && self.bounds.zero_percent_window < 1.0) {
            anyhow::bail!("bounds.zero_percent_window must lie in (0, 1)");
        }
        if !(self.bounds.ratio_floor > 0.0) {
            anyhow::bail!("bounds.ratio_floor must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.bounds.ratio_floor, 0.0001);
        assert!(cfg.sampler.thinning.is_none());
        assert!(cfg.sampler.burn_in.is_none());
        assert!(cfg.sampler.seed.is_none());
    }

    #[test]
    fn test_rejects_zero_thinning() {
        let mut cfg = Config::default();
        cfg.sampler.thinning = Some(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_window_outside_unit_interval() {
        let mut cfg = Config::default();
        cfg.bounds.zero_percent_window = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg: Config = Figment::new()
            .merge(Toml::string("[sampler]\nseed = 7\nburn_in = 10\n"))
            .extract()
            .unwrap();
        assert_eq!(cfg.sampler.seed, Some(7));
        assert_eq!(cfg.sampler.burn_in, Some(10));
        assert!(cfg.sampler.thinning.is_none());
        assert_eq!(cfg.bounds.zero_percent_window, 0.0001);
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FLOWUNC__SAMPLER__THINNING", "40");
            jail.set_env("FLOWUNC__BOUNDS__RATIO_FLOOR", "0.001");
            let cfg: Config = Figment::new()
                .merge(Toml::string("[sampler]\nthinning = 5\n"))
                .merge(Env::prefixed("FLOWUNC__").split("__"))
                .extract()?;
            assert_eq!(cfg.sampler.thinning, Some(40));
            assert_eq!(cfg.bounds.ratio_floor, 0.001);
            assert!(cfg.sampler.burn_in.is_none());
            Ok(())
        });
    }
}
