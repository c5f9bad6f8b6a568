use crate::error::{Result, SpinMapError};
use crate::types::Matrix;

/// Row and column counts of a non-empty rectangular matrix.
pub fn ensure_rectangular(matrix: &Matrix, name: &str) -> Result<(usize, usize)> {
    let n = matrix.len();
    if n == 0 {
        return Err(SpinMapError::Configuration(format!("{name} must not be empty")));
    }
    let m = matrix[0].len();
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != m {
            return Err(SpinMapError::Configuration(format!(
                "{name} row {i} length {} does not match {m}",
                row.len()
            )));
        }
    }
    Ok((n, m))
}
