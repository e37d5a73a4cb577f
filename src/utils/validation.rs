use crate::utils::error::{Result, ScanError};
use std::collections::HashSet;
use std::time::Duration;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ScanError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ScanError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(ScanError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_timeout(field_name: &str, value: Duration) -> Result<()> {
    if value.is_zero() {
        return Err(ScanError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: format!("{:?}", value),
            reason: "Timeout must be greater than zero".to_string(),
        });
    }
    Ok(())
}

pub fn validate_ports(field_name: &str, ports: &[u16]) -> Result<()> {
    if ports.is_empty() {
        return Err(ScanError::ConfigValidationError {
            field: field_name.to_string(),
            message: "At least one port is required".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for &port in ports {
        if port == 0 {
            return Err(ScanError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: port.to_string(),
                reason: "Port 0 cannot be probed".to_string(),
            });
        }
        if !seen.insert(port) {
            return Err(ScanError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: port.to_string(),
                reason: "Duplicate port".to_string(),
            });
        }
    }

    Ok(())
}

pub fn validate_non_empty(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ScanError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty".to_string(),
        });
    }
    Ok(())
}
