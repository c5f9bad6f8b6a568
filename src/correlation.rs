use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{Result, SpinMapError};
use crate::qc::{check_equal_length, check_finite};

/// Pearson correlation of two maps over the same regions.
///
/// Non-finite values and constant maps are errors rather than NaN results.
pub fn pearson(x: &[f64], y: &[f64], x_name: &str, y_name: &str) -> Result<f64> {
    check_equal_length(x.len(), y.len(), x_name, y_name)?;
    if x.len() < 2 {
        return Err(SpinMapError::Configuration(format!(
            "{x_name} and {y_name} need at least 2 regions, found {}",
            x.len()
        )));
    }
    check_finite(x, x_name)?;
    check_finite(y, y_name)?;
    check_variable(x, x_name)?;
    check_variable(y, y_name)?;

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return Err(SpinMapError::Numerical(format!(
            "correlation of {x_name} and {y_name} is undefined (degenerate variance)"
        )));
    }
    Ok((sxy / denom).clamp(-1.0, 1.0))
}

fn check_variable(values: &[f64], name: &str) -> Result<()> {
    let first = values[0];
    if values.iter().all(|v| *v == first) {
        return Err(SpinMapError::Numerical(format!(
            "{name} has zero variance; Pearson correlation is undefined"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PearsonTest {
    pub r: f64,
    pub r2: f64,
    pub t: f64,
    pub p: f64,
}

/// Parametric Pearson test with a two-sided Student's t p-value on n - 2 df.
pub fn pearson_test(x: &[f64], y: &[f64], x_name: &str, y_name: &str) -> Result<PearsonTest> {
    let r = pearson(x, y, x_name, y_name)?;
    let df = x.len() as f64 - 2.0;
    if df < 1.0 {
        return Err(SpinMapError::Configuration(format!(
            "parametric test of {x_name} and {y_name} needs at least 3 regions"
        )));
    }
    let one_minus = 1.0 - r * r;
    if one_minus <= 0.0 {
        return Ok(PearsonTest {
            r,
            r2: r * r,
            t: f64::INFINITY.copysign(r),
            p: 0.0,
        });
    }
    let t = r * (df / one_minus).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| SpinMapError::Numerical(format!("Student's t with {df} df: {e}")))?;
    let p = (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0);
    Ok(PearsonTest { r, r2: r * r, t, p })
}
