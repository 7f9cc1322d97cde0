//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the timeout budget: the overall deadline covers connect + headers
//! - Validate value ranges (non-zero capacity and overall timeout)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Meant for resolved configs; run `with_defaults` first

use std::time::Duration;

use thiserror::Error;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("max_conns must be greater than zero")]
    ZeroMaxConns,

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error(
        "timeout {timeout:?} is shorter than conn_timeout {conn_timeout:?} + response_timeout {response_timeout:?}"
    )]
    TimeoutBudget {
        timeout: Duration,
        conn_timeout: Duration,
        response_timeout: Duration,
    },
}

/// Check a config, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.max_conns == 0 {
        errors.push(ValidationError::ZeroMaxConns);
    }
    if config.timeout.is_zero() {
        errors.push(ValidationError::ZeroTimeout);
    }
    if !config.conn_timeout.is_zero()
        && !config.response_timeout.is_zero()
        && !config.timeout.is_zero()
        && config.timeout < config.conn_timeout.saturating_add(config.response_timeout)
    {
        errors.push(ValidationError::TimeoutBudget {
            timeout: config.timeout,
            conn_timeout: config.conn_timeout,
            response_timeout: config.response_timeout,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaulted_config_is_valid() {
        assert_eq!(validate_config(&ClientConfig::default().with_defaults()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let errors = validate_config(&ClientConfig::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::ZeroMaxConns, ValidationError::ZeroTimeout]);
    }

    #[test]
    fn budget_overrun_is_rejected() {
        let config = ClientConfig::new()
            .timeout(Duration::from_secs(3))
            .conn_timeout(Duration::from_secs(2))
            .response_timeout(Duration::from_secs(2))
            .with_defaults();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::TimeoutBudget { .. }));
    }
}
