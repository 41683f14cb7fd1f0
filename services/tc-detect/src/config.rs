//! Run configuration for tc-detect.
//!
//! Loaded from a YAML file with `${VAR}` and `${VAR:-default}` substitution
//! before parsing. Paths may start with `~`.
//!
//! ```yaml
//! cases: [f09.F2000.001]
//! case_path: ${TC_CASE_PATH:-/data/cases}
//! output_path: ~/tc-output
//! invert_vorticity_sh: true
//! level_floor_hpa: 200
//! diagnostics:
//!   worker_fraction: 0.25
//!   store:
//!     compression: blosc_zstd
//! tracker:
//!   parameter_file: tracking/tracking2/irt_parameters.f90
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use derived_fields::DiagnosticsConfig;
use serde::{Deserialize, Serialize};

fn default_history_subdir() -> String {
    "atm/hist".to_string()
}

fn default_level_floor() -> f64 {
    200.0
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcDetectConfig {
    /// Case names, processed in order.
    pub cases: Vec<String>,
    /// Root of the model history; a case lives in `{case_path}/{case}`.
    pub case_path: String,
    /// Root of the outputs; a case writes to `{output_path}/{case}`.
    pub output_path: String,
    /// History directory inside a case.
    #[serde(default = "default_history_subdir")]
    pub history_subdir: String,
    /// Overrides `diagnostics.invert_vorticity_sh` when set.
    /// `TC_INVERT_VORTICITY_SH` still wins, like every `TC_*` variable.
    #[serde(default, alias = "invert_vorticity_SH")]
    pub invert_vorticity_sh: Option<bool>,
    /// Model levels above this pressure (hPa) are ignored.
    #[serde(default = "default_level_floor")]
    pub level_floor_hpa: f64,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Fortran parameter module refreshed by `prepare`; skipped when unset.
    pub parameter_file: Option<String>,
}

impl TcDetectConfig {
    /// Read, expand and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid config in {:?}", path.as_ref()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let mut config: Self =
            serde_yaml::from_str(&expanded).context("Failed to parse config YAML")?;
        if let Some(invert) = config.invert_vorticity_sh {
            config.diagnostics.invert_vorticity_sh = invert;
        }
        config.diagnostics = config.diagnostics.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.case_path.trim().is_empty() {
            anyhow::bail!("case_path must not be empty");
        }
        if self.output_path.trim().is_empty() {
            anyhow::bail!("output_path must not be empty");
        }
        if !(self.level_floor_hpa >= 0.0) {
            anyhow::bail!("level_floor_hpa must be non-negative");
        }
        self.diagnostics
            .validate()
            .map_err(|e| anyhow::anyhow!("diagnostics: {}", e))
    }

    /// Model history directory of `case`.
    pub fn history_dir(&self, case: &str) -> PathBuf {
        expand_path(&self.case_path)
            .join(case)
            .join(&self.history_subdir)
    }

    /// Output directory of `case`.
    pub fn output_dir(&self, case: &str) -> PathBuf {
        expand_path(&self.output_path).join(case)
    }

    pub fn parameter_file(&self) -> Option<PathBuf> {
        self.tracker.parameter_file.as_deref().map(expand_path)
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Substitute `${VAR}` and `${VAR:-default}` in `content`.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .with_context(|| format!("Unclosed variable substitution: ${{{}", after))?;
        result.push_str(&resolve_var_expr(&after[..end])?);
        rest = &after[end + 1..];
    }
    result.push_str(rest);

    Ok(result)
}

/// Resolve `VAR` or `VAR:-default`. An empty variable takes the default.
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim())
            .with_context(|| format!("Environment variable {} not set", expr))
    }
}
