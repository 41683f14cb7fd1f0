//! Configuration for diagnostic computation.

use grid_store::StoreConfig;
use serde::{Deserialize, Serialize};

/// Configuration for computing and caching diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Fraction of CPU cores given to the vorticity worker pool.
    pub worker_fraction: f64,

    /// Negate vorticity at southern latitudes so cyclones are positive in
    /// both hemispheres.
    pub invert_vorticity_sh: bool,

    /// Layout of the cached diagnostic arrays.
    pub store: StoreConfig,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            worker_fraction: 0.25,
            invert_vorticity_sh: true,
            store: StoreConfig::default(),
        }
    }
}

impl DiagnosticsConfig {
    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `TC_WORKER_FRACTION`, `TC_INVERT_VORTICITY_SH` and the
    /// `TC_ZARR_*` overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("TC_WORKER_FRACTION") {
            if let Ok(fraction) = val.parse() {
                self.worker_fraction = fraction;
            }
        }

        if let Ok(val) = std::env::var("TC_INVERT_VORTICITY_SH") {
            self.invert_vorticity_sh = val.to_lowercase() == "true" || val == "1";
        }

        self.store = self.store.with_env_overrides();
        self
    }

    /// Number of vorticity workers on a machine with `cores` cores.
    pub fn workers_for(&self, cores: usize) -> usize {
        ((cores as f64 * self.worker_fraction).ceil() as usize).max(1)
    }

    /// Number of vorticity workers on this machine.
    pub fn worker_count(&self) -> usize {
        self.workers_for(num_cpus::get())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.worker_fraction > 0.0 && self.worker_fraction <= 1.0) {
            return Err("worker_fraction must be in (0, 1]".to_string());
        }
        self.store.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DiagnosticsConfig::default();
        assert_eq!(config.worker_fraction, 0.25);
        assert!(config.invert_vorticity_sh);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_worker_count_rounds_up() {
        let config = DiagnosticsConfig::default();
        assert_eq!(config.workers_for(16), 4);
        assert_eq!(config.workers_for(6), 2);
        assert_eq!(config.workers_for(1), 1);
        assert_eq!(config.workers_for(0), 1);
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_config_validation() {
        let mut config = DiagnosticsConfig::default();
        config.worker_fraction = 0.0;
        assert!(config.validate().is_err());

        config.worker_fraction = 1.5;
        assert!(config.validate().is_err());

        config = DiagnosticsConfig::default();
        config.store.time_chunk = 0;
        assert!(config.validate().is_err());
    }
}
