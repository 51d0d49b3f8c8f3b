//! Dashboard push-channel configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Dashboard fan-out configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Messages buffered per connection before new ones are dropped
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.outbound_capacity == 0 {
            return Err(ValidationError::InvalidChannelCapacity);
        }
        Ok(())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: default_outbound_capacity(),
        }
    }
}

fn default_outbound_capacity() -> usize {
    128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.outbound_capacity, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = DashboardConfig {
            outbound_capacity: 0,
        };
        assert!(config.validate().is_err());
    }
}
