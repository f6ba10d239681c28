//! Operator configuration that callers can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    /// Memory bound of the run generator, in elements (heap plus staging area).
    pub run_memory_rows: usize,

    /// Capacity of the memory budget handed to bounded operators (bytes).
    pub mem_cap_bytes: usize,

    /// Maximum number of runs the external sort merges in one pass.
    pub merge_fan_in: usize,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            run_memory_rows: 1024,
            mem_cap_bytes: 64 * 1024 * 1024, // 64 MiB default
            merge_fan_in: 64,
        }
    }
}

impl OperatorConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SEQOPS_RUN_MEMORY_ROWS`: run generator memory bound (elements)
    /// - `SEQOPS_MEM_CAP_BYTES`: memory budget capacity in bytes
    /// - `SEQOPS_MERGE_FAN_IN`: external sort merge fan-in
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("SEQOPS_RUN_MEMORY_ROWS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.run_memory_rows = v;
            }
        }

        if let Ok(s) = std::env::var("SEQOPS_MEM_CAP_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.mem_cap_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("SEQOPS_MERGE_FAN_IN") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.merge_fan_in = v;
            }
        }

        cfg
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.run_memory_rows == 0 {
            return Err(Error::Config("run_memory_rows must be positive".into()));
        }
        if self.merge_fan_in < 2 {
            return Err(Error::Config("merge_fan_in must be at least 2".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_fills_defaults() {
        let cfg = OperatorConfig::from_json(r#"{"run_memory_rows": 8}"#).unwrap();
        assert_eq!(cfg.run_memory_rows, 8);
        assert_eq!(cfg.merge_fan_in, OperatorConfig::default().merge_fan_in);
    }

    #[test]
    fn test_validate_rejects_zero_memory() {
        let err = OperatorConfig::from_json(r#"{"run_memory_rows": 0}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = OperatorConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
