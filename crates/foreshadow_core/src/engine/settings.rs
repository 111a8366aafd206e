use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PredictionError, Result};

pub const DEFAULT_TRIAL_COUNT: usize = 1000;

pub const ENV_TRIALS: &str = "FORESHADOW_TRIALS";
pub const ENV_SEED: &str = "FORESHADOW_SEED";
pub const ENV_EXECUTION: &str = "FORESHADOW_EXECUTION";

/// How trials are scheduled. Both modes produce identical predictions for the
/// same seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    Sequential,
    #[default]
    Parallel,
}

impl fmt::Display for Execution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Execution::Sequential => write!(f, "sequential"),
            Execution::Parallel => write!(f, "parallel"),
        }
    }
}

impl FromStr for Execution {
    type Err = PredictionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "serial" => Ok(Execution::Sequential),
            "parallel" => Ok(Execution::Parallel),
            _ => Err(PredictionError::InvalidSetting {
                name: "execution",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSettings {
    pub trial_count: usize,
    /// `None` draws a fresh seed per run from OS entropy.
    pub seed: Option<u64>,
    pub execution: Execution,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            trial_count: DEFAULT_TRIAL_COUNT,
            seed: None,
            execution: Execution::default(),
        }
    }
}

impl SimulationSettings {
    /// Defaults overridden by `FORESHADOW_TRIALS`, `FORESHADOW_SEED` and
    /// `FORESHADOW_EXECUTION`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let present = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(raw) = present(ENV_TRIALS) {
            settings.trial_count = match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(PredictionError::InvalidSetting {
                        name: ENV_TRIALS,
                        value: raw,
                    })
                }
            };
        }
        if let Some(raw) = present(ENV_SEED) {
            let seed = raw.trim().parse::<u64>().map_err(|_| PredictionError::InvalidSetting {
                name: ENV_SEED,
                value: raw.clone(),
            })?;
            settings.seed = Some(seed);
        }
        if let Some(raw) = present(ENV_EXECUTION) {
            settings.execution = raw.parse::<Execution>().map_err(|_| PredictionError::InvalidSetting {
                name: ENV_EXECUTION,
                value: raw.clone(),
            })?;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = SimulationSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, SimulationSettings::default());
        assert_eq!(settings.trial_count, 1000);
        assert_eq!(settings.execution, Execution::Parallel);
        assert!(settings.seed.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = SimulationSettings::from_lookup(lookup(&[
            (ENV_TRIALS, "5000"),
            (ENV_SEED, " 42 "),
            (ENV_EXECUTION, "Sequential"),
        ]))
        .unwrap();
        assert_eq!(settings.trial_count, 5000);
        assert_eq!(settings.seed, Some(42));
        assert_eq!(settings.execution, Execution::Sequential);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let settings = SimulationSettings::from_lookup(lookup(&[(ENV_SEED, "  ")])).unwrap();
        assert!(settings.seed.is_none());
    }

    #[test]
    fn test_execution_from_str() {
        assert_eq!("serial".parse::<Execution>().unwrap(), Execution::Sequential);
        assert_eq!(Execution::Parallel.to_string().parse::<Execution>().unwrap(), Execution::Parallel);
        let err = "gpu".parse::<Execution>().unwrap_err();
        assert!(matches!(err, PredictionError::InvalidSetting { name: "execution", .. }));
    }

    #[test]
    fn test_malformed_values_rejected() {
        for (name, value) in [(ENV_TRIALS, "0"), (ENV_TRIALS, "many"), (ENV_SEED, "-1"), (ENV_EXECUTION, "gpu")] {
            let err = SimulationSettings::from_lookup(lookup(&[(name, value)])).unwrap_err();
            assert!(
                matches!(err, PredictionError::InvalidSetting { name: n, .. } if n == name),
                "{name}={value}"
            );
        }
    }
}
