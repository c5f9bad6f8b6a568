use crate::error::{Result, SpinMapError};

pub fn check_equal_length(
    left_len: usize,
    right_len: usize,
    left_name: &str,
    right_name: &str,
) -> Result<()> {
    if left_len != right_len {
        return Err(SpinMapError::Configuration(format!(
            "Length of {left_name} ({left_len}) and {right_name} ({right_len}) should be equal"
        )));
    }
    Ok(())
}

pub fn check_finite(values: &[f64], name: &str) -> Result<()> {
    if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
        return Err(SpinMapError::Numerical(format!(
            "{name} has a non-finite value at region {idx}"
        )));
    }
    Ok(())
}

pub fn check_open_unit(value: f64, name: &str) -> Result<()> {
    if !value.is_finite() {
        return Err(SpinMapError::Configuration(format!(
            "Value of {name} should be finite"
        )));
    }
    if value <= 0.0 || value >= 1.0 {
        return Err(SpinMapError::Configuration(format!(
            "Value of {name} should lie strictly between 0 and 1"
        )));
    }
    Ok(())
}

pub fn check_unique_labels(labels: &[String], name: &str) -> Result<()> {
    let mut seen = std::collections::HashSet::with_capacity(labels.len());
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(SpinMapError::Configuration(format!(
                "{name} has duplicate label {label}"
            )));
        }
    }
    Ok(())
}
