//! Solver configuration loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::raceline::{
    RaceLineParams, DEFAULT_MAX_ITERATIONS, DEFAULT_NUM_SAMPLES, DEFAULT_SMOOTHNESS_WEIGHT,
};

/// User-facing solver settings. Missing keys take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub samples: usize,
    pub smoothness: f64,
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_NUM_SAMPLES,
            smoothness: DEFAULT_SMOOTHNESS_WEIGHT,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Applies explicit overrides on top of this configuration.
    pub fn with_overrides(
        mut self,
        samples: Option<usize>,
        smoothness: Option<f64>,
        max_iterations: Option<usize>,
    ) -> Self {
        if let Some(v) = samples {
            self.samples = v;
        }
        if let Some(v) = smoothness {
            self.smoothness = v;
        }
        if let Some(v) = max_iterations {
            self.max_iterations = v;
        }
        self
    }

    pub fn params(&self) -> RaceLineParams {
        RaceLineParams {
            num_samples: self.samples,
            smoothness_weight: self.smoothness,
            max_iterations: self.max_iterations,
        }
    }
}

impl From<SolverConfig> for RaceLineParams {
    fn from(config: SolverConfig) -> Self {
        config.params()
    }
}

pub fn read_solver_config<P: AsRef<Path>>(path: P) -> Result<SolverConfig> {
    let contents = crate::io::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let cfg: SolverConfig = serde_json::from_str(r#"{ "samples": 100 }"#).unwrap();
        assert_eq!(cfg.samples, 100);
        assert_eq!(cfg.smoothness, 2.0);
        assert_eq!(cfg.max_iterations, 500);
    }

    #[test]
    fn overrides_win() {
        let cfg = SolverConfig::default().with_overrides(None, Some(0.5), Some(50));
        let params: RaceLineParams = cfg.into();
        assert_eq!(params.num_samples, 400);
        assert_eq!(params.smoothness_weight, 0.5);
        assert_eq!(params.max_iterations, 50);
    }

    #[test]
    fn reads_from_file() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = dir.path().join("solver.json");
        let cfg = SolverConfig {
            samples: 120,
            smoothness: 0.75,
            max_iterations: 80,
        };
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        crate::io::write_string(&path, &json).unwrap();
        assert_eq!(read_solver_config(&path).unwrap(), cfg);
        assert_eq!(read_solver_config(path.to_str().unwrap()).unwrap(), cfg);
        assert!(read_solver_config(dir.path().join("missing.json")).is_err());
    }
}
