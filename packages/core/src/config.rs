//! Simulation configuration.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Priority, SimError, Ticks};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "JOBSIM_CONFIG";

/// Configuration fixed at simulator construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Ticks between priority promotions.
    pub aging_interval: Ticks,
    /// Waiting time at which a job is forcibly removed.
    pub expiry_time: Ticks,
    /// Most urgent priority a job can be promoted to.
    pub priority_floor: u32,
    /// Wall-clock pause between ticks when running paced (0 = unpaced).
    pub tick_interval_ms: u64,
    /// Timeout for every request made against the queue actor.
    pub rpc_timeout_ms: u64,
    /// Cap on concurrently running submission tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_in_flight: Option<usize>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            aging_interval: 3,
            expiry_time: 10,
            priority_floor: 1,
            tick_interval_ms: 0,
            rpc_timeout_ms: 5_000,
            max_in_flight: None,
        }
    }
}

impl SimulationConfig {
    pub fn new(aging_interval: Ticks, expiry_time: Ticks) -> Self {
        Self {
            aging_interval,
            expiry_time,
            ..Self::default()
        }
    }

    pub fn floor(&self) -> Priority {
        Priority(self.priority_floor)
    }

    /// Reject configurations under which the simulation is meaningless.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.aging_interval == 0 {
            return Err(SimError::InvalidConfig(
                "aging_interval must be positive".into(),
            ));
        }
        if self.expiry_time == 0 {
            return Err(SimError::InvalidConfig("expiry_time must be positive".into()));
        }
        if self.expiry_time <= self.aging_interval {
            return Err(SimError::InvalidConfig(format!(
                "expiry_time ({}) must exceed aging_interval ({})",
                self.expiry_time, self.aging_interval
            )));
        }
        if self.priority_floor == 0 {
            return Err(SimError::InvalidConfig(
                "priority_floor must be at least 1".into(),
            ));
        }
        if self.rpc_timeout_ms == 0 {
            return Err(SimError::InvalidConfig(
                "rpc_timeout_ms must be positive".into(),
            ));
        }
        if self.max_in_flight == Some(0) {
            return Err(SimError::InvalidConfig(
                "max_in_flight must be positive when set".into(),
            ));
        }
        Ok(())
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        serde_json::from_str(json).map_err(|e| SimError::InvalidConfig(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SimError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Apply `JOBSIM_*` overrides taken from `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, SimError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "JOBSIM_AGING_INTERVAL")? {
            self.aging_interval = v;
        }
        if let Some(v) = parse_var(&lookup, "JOBSIM_EXPIRY_TIME")? {
            self.expiry_time = v;
        }
        if let Some(v) = parse_var(&lookup, "JOBSIM_PRIORITY_FLOOR")? {
            self.priority_floor = v;
        }
        if let Some(v) = parse_var(&lookup, "JOBSIM_TICK_INTERVAL_MS")? {
            self.tick_interval_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "JOBSIM_RPC_TIMEOUT_MS")? {
            self.rpc_timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "JOBSIM_MAX_IN_FLIGHT")? {
            self.max_in_flight = Some(v);
        }
        Ok(self)
    }

    /// Load defaults, then the optional `JOBSIM_CONFIG` file, then env overrides.
    pub fn from_env() -> Result<Self, SimError> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_json_file(path)?,
            Err(_) => Self::default(),
        };
        let config = base.with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, SimError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| SimError::InvalidConfig(format!("{key}={raw:?}: {e}"))),
        None => Ok(None),
    }
}
