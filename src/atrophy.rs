use ndarray::{Array2, Axis, s};

use crate::error::{Result, SpinMapError};
use crate::qc::check_equal_length;

/// Z-scores `data` (subjects x regions) against the control group and sorts
/// regions into ipsilateral/contralateral order.
///
/// Regions are laid out as the left hemisphere followed by the right. Subjects
/// in group `flip` have the two halves swapped so that the first half is always
/// ipsilateral to the focus.
pub fn zscore_flip(
    data: &Array2<f64>,
    groups: &[String],
    control: &str,
    flip: &str,
) -> Result<Array2<f64>> {
    let (n_subjects, n_regions) = data.dim();
    check_equal_length(groups.len(), n_subjects, "groups", "data rows")?;
    if n_regions == 0 || n_regions % 2 != 0 {
        return Err(SpinMapError::Configuration(format!(
            "zscore_flip needs an even, non-zero number of regions, found {n_regions}"
        )));
    }
    let controls: Vec<usize> = groups
        .iter()
        .enumerate()
        .filter(|(_, g)| g.as_str() == control)
        .map(|(i, _)| i)
        .collect();
    if controls.len() < 2 {
        return Err(SpinMapError::Configuration(format!(
            "zscore_flip needs at least 2 subjects in control group {control}, found {}",
            controls.len()
        )));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(SpinMapError::Numerical(
            "zscore_flip input contains non-finite values".to_string(),
        ));
    }

    let hc = data.select(Axis(0), &controls);
    let n_hc = controls.len() as f64;
    let mut z = data.clone();
    for region in 0..n_regions {
        let column = hc.column(region);
        let mean = column.sum() / n_hc;
        let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n_hc - 1.0);
        let sd = var.sqrt();
        if sd == 0.0 {
            return Err(SpinMapError::Numerical(format!(
                "control group {control} has zero variance at region {region}"
            )));
        }
        z.column_mut(region).mapv_inplace(|v| (v - mean) / sd);
    }

    let half = n_regions / 2;
    for (subject, group) in groups.iter().enumerate() {
        if group.as_str() == flip {
            let row = z.row(subject).to_owned();
            z.slice_mut(s![subject, ..half]).assign(&row.slice(s![half..]));
            z.slice_mut(s![subject, half..]).assign(&row.slice(s![..half]));
        }
    }
    Ok(z)
}
