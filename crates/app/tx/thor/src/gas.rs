//! Intrinsic gas model.
//!
//! Transactions do not price themselves; they hand their clauses to an
//! [`IntrinsicGas`] implementation. [`GasSchedule`] is the Thor schedule and
//! can be loaded from YAML so alternative networks can tune it.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::body::Clause;

/// Gas charged before execution for a list of clauses.
pub trait IntrinsicGas {
    fn intrinsic_gas(&self, clauses: &[Clause]) -> u64;
}

/// Constant costs making up the intrinsic gas of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GasSchedule {
    /// Flat cost of every transaction.
    #[serde(default = "default_tx_gas")]
    pub tx_gas: u64,
    /// Cost of a clause with a recipient.
    #[serde(default = "default_clause_gas")]
    pub clause_gas: u64,
    /// Cost of a contract creation clause.
    #[serde(default = "default_clause_gas_contract_creation")]
    pub clause_gas_contract_creation: u64,
    /// Cost per zero byte of clause data.
    #[serde(default = "default_zero_byte_gas")]
    pub zero_byte_gas: u64,
    /// Cost per non-zero byte of clause data.
    #[serde(default = "default_non_zero_byte_gas")]
    pub non_zero_byte_gas: u64,
}

fn default_tx_gas() -> u64 {
    5_000
}

fn default_clause_gas() -> u64 {
    16_000
}

fn default_clause_gas_contract_creation() -> u64 {
    48_000
}

fn default_zero_byte_gas() -> u64 {
    4
}

fn default_non_zero_byte_gas() -> u64 {
    68
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            tx_gas: default_tx_gas(),
            clause_gas: default_clause_gas(),
            clause_gas_contract_creation: default_clause_gas_contract_creation(),
            zero_byte_gas: default_zero_byte_gas(),
            non_zero_byte_gas: default_non_zero_byte_gas(),
        }
    }
}

impl GasSchedule {
    /// Gas charged for clause data.
    pub fn data_gas(&self, data: &[u8]) -> u64 {
        data.iter().fold(0u64, |sum, byte| {
            let cost = if *byte == 0 {
                self.zero_byte_gas
            } else {
                self.non_zero_byte_gas
            };
            sum.saturating_add(cost)
        })
    }
}

impl IntrinsicGas for GasSchedule {
    fn intrinsic_gas(&self, clauses: &[Clause]) -> u64 {
        // a transaction without clauses still pays for one
        if clauses.is_empty() {
            return self.tx_gas.saturating_add(self.clause_gas);
        }

        clauses.iter().fold(self.tx_gas, |sum, clause| {
            let clause_gas = if clause.is_contract_creation() {
                self.clause_gas_contract_creation
            } else {
                self.clause_gas
            };
            sum.saturating_add(clause_gas)
                .saturating_add(self.data_gas(&clause.data))
        })
    }
}

/// Errors raised while loading a [`GasSchedule`].
#[derive(Debug, Error)]
pub enum GasConfigError {
    /// File I/O error when loading the schedule.
    #[error("failed to read gas schedule '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    /// YAML parsing error.
    #[error("failed to parse gas schedule '{path}': {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    /// Validation failed with one or more errors.
    #[error("gas schedule validation failed:\n{}", .0.join("\n"))]
    ValidationFailed(Vec<String>),
}

/// Load and validate a gas schedule from a YAML file.
pub fn load_gas_schedule<P: AsRef<Path>>(path: P) -> Result<GasSchedule, GasConfigError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    let content = std::fs::read_to_string(path).map_err(|e| GasConfigError::FileRead {
        path: path_str.clone(),
        source: e,
    })?;

    load_gas_schedule_from_str(&content, &path_str)
}

/// Load and validate a gas schedule from a YAML string.
pub fn load_gas_schedule_from_str(
    content: &str,
    source_name: &str,
) -> Result<GasSchedule, GasConfigError> {
    let schedule: GasSchedule =
        serde_yaml::from_str(content).map_err(|e| GasConfigError::Parse {
            path: source_name.to_string(),
            source: e,
        })?;

    validate_gas_schedule(&schedule)?;
    tracing::debug!(target: "thor_tx", source = source_name, ?schedule, "loaded gas schedule");

    Ok(schedule)
}

/// Validate a schedule, collecting every problem before returning.
pub fn validate_gas_schedule(schedule: &GasSchedule) -> Result<(), GasConfigError> {
    let mut errors = Vec::new();

    if schedule.tx_gas == 0 {
        errors.push("tx_gas must be greater than 0".to_string());
    }
    if schedule.clause_gas == 0 {
        errors.push("clause_gas must be greater than 0".to_string());
    }
    if schedule.clause_gas_contract_creation < schedule.clause_gas {
        errors.push(format!(
            "clause_gas_contract_creation ({}) must be at least clause_gas ({})",
            schedule.clause_gas_contract_creation, schedule.clause_gas
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(GasConfigError::ValidationFailed(errors))
    }
}
