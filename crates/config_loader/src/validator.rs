//! Configuration validation
//!
//! Rules:
//! - every queue capacity in `1..=QueueCapacities::MAX`

use contracts::{ContractError, DataServerConfig};

/// Validate a DataServerConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &DataServerConfig) -> Result<(), ContractError> {
    validate_queue_capacities(config)?;
    Ok(())
}

/// Bounded queues need room for at least one measurement and are
/// allocated up front
fn validate_queue_capacities(config: &DataServerConfig) -> Result<(), ContractError> {
    config.queues.check()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::QueueCapacities;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&DataServerConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = DataServerConfig {
            queues: QueueCapacities {
                imu: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("queues.imu"));
    }

    #[test]
    fn test_oversized_capacity_rejected() {
        let config = DataServerConfig {
            queues: QueueCapacities {
                image: 1 << 40,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            validate(&config),
            Err(ContractError::ConfigValidation { field, .. }) if field == "queues.image"
        ));
    }
}
