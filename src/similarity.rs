//! Spin-tested similarity between collections of maps, and consistency of
//! epicentre significance across maps.

use ndarray::Array2;
use sphererot::{HaarSampler, RotationSampler};
use tracing::info;

use crate::cancel::{CancelToken, check_cancelled};
use crate::config::SpinConfig;
use crate::error::{Result, SpinMapError};
use crate::matrix::ensure_rectangular;
use crate::qc::check_open_unit;
use crate::spin::spatial_correlation_with;
use crate::surface::SurfaceDescriptor;
use crate::types::{BrainMap, Matrix, SimilarityMatrix};

pub type NamedMap = (String, BrainMap);

/// Symmetric matrix of spin tests between every pair of `maps`.
pub fn pairwise_similarity(
    maps: &[NamedMap],
    surface: &SurfaceDescriptor,
    config: &SpinConfig,
    cancel: Option<&CancelToken>,
) -> Result<SimilarityMatrix> {
    config.validate()?;
    let sampler = HaarSampler::new(config.resolve_seed());
    pairwise_similarity_with(maps, surface, config, &sampler, cancel)
}

pub fn pairwise_similarity_with<S: RotationSampler>(
    maps: &[NamedMap],
    surface: &SurfaceDescriptor,
    config: &SpinConfig,
    sampler: &S,
    cancel: Option<&CancelToken>,
) -> Result<SimilarityMatrix> {
    if maps.is_empty() {
        return Err(SpinMapError::Configuration(
            "similarity requires at least one map".to_string(),
        ));
    }
    let k = maps.len();
    let pair_config = SpinConfig {
        keep_null: false,
        ..config.clone()
    };
    let mut r = Array2::<f64>::zeros((k, k));
    let mut p = Array2::<f64>::zeros((k, k));
    for i in 0..k {
        for j in i..k {
            check_cancelled(cancel)?;
            let result = spatial_correlation_with(
                &maps[i].1.values,
                &maps[j].1.values,
                surface,
                &pair_config,
                sampler,
                cancel,
            )?;
            r[(i, j)] = result.r;
            r[(j, i)] = result.r;
            p[(i, j)] = result.p;
            p[(j, i)] = result.p;
            info!("{} x {} done", maps[i].0, maps[j].0);
        }
    }
    let labels: Vec<String> = maps.iter().map(|(name, _)| name.clone()).collect();
    Ok(SimilarityMatrix {
        row_labels: labels.clone(),
        column_labels: labels,
        r,
        p,
    })
}

/// Spin tests of every row map against every column map.
pub fn cross_similarity(
    rows: &[NamedMap],
    columns: &[NamedMap],
    surface: &SurfaceDescriptor,
    config: &SpinConfig,
    cancel: Option<&CancelToken>,
) -> Result<SimilarityMatrix> {
    config.validate()?;
    if rows.is_empty() || columns.is_empty() {
        return Err(SpinMapError::Configuration(
            "cross similarity requires at least one row map and one column map".to_string(),
        ));
    }
    let sampler = HaarSampler::new(config.resolve_seed());
    let pair_config = SpinConfig {
        keep_null: false,
        ..config.clone()
    };
    let mut r = Array2::<f64>::zeros((rows.len(), columns.len()));
    let mut p = Array2::<f64>::zeros((rows.len(), columns.len()));
    for (i, (row_name, row_map)) in rows.iter().enumerate() {
        for (j, (col_name, col_map)) in columns.iter().enumerate() {
            check_cancelled(cancel)?;
            let result = spatial_correlation_with(
                &row_map.values,
                &col_map.values,
                surface,
                &pair_config,
                &sampler,
                cancel,
            )?;
            r[(i, j)] = result.r;
            p[(i, j)] = result.p;
            info!("{row_name} x {col_name} done");
        }
    }
    Ok(SimilarityMatrix {
        row_labels: rows.iter().map(|(name, _)| name.clone()).collect(),
        column_labels: columns.iter().map(|(name, _)| name.clone()).collect(),
        r,
        p,
    })
}

/// Per region, the fraction of p-value maps in which the region has `p < alpha`.
pub fn significance_fraction(p_maps: &Matrix, alpha: f64) -> Result<Vec<f64>> {
    check_open_unit(alpha, "alpha")?;
    let (n_maps, n_regions) = ensure_rectangular(p_maps, "p-value maps")?;
    let mut counts = vec![0usize; n_regions];
    for (idx, map) in p_maps.iter().enumerate() {
        for (region, &p) in map.iter().enumerate() {
            if !(0.0..=1.0).contains(&p) {
                return Err(SpinMapError::Numerical(format!(
                    "p-value map {idx} has an invalid p-value at region {region}"
                )));
            }
            if p < alpha {
                counts[region] += 1;
            }
        }
    }
    Ok(counts
        .into_iter()
        .map(|c| c as f64 / n_maps as f64)
        .collect())
}
