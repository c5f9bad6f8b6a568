//! Connectome epicentre mapping.
//!
//! Every connectome row is a seed region's connectivity profile. A seed is an
//! epicentre when its profile is spatially correlated with the reference map
//! beyond what rotated profiles achieve.

use std::collections::HashMap;

use ndarray::Array2;
use rayon::prelude::*;
use sphererot::{HaarSampler, RotationSampler};
use tracing::{info, warn};

use crate::cancel::{CancelToken, check_cancelled};
use crate::config::SpinConfig;
use crate::error::{Result, SpinMapError};
use crate::parallel::{collect_results, resolve_threads, run_in_pool};
use crate::qc::{check_equal_length, check_unique_labels};
use crate::spin::spatial_correlation_with;
use crate::surface::SurfaceDescriptor;
use crate::types::{BrainMap, EpicentreResult};

/// Connection strengths, seeds by rows and targets by columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Connectome {
    values: Array2<f64>,
    row_labels: Option<Vec<String>>,
    column_labels: Option<Vec<String>>,
}

impl Connectome {
    pub fn new(values: Array2<f64>) -> Result<Self> {
        Self::with_labels(values, None, None)
    }

    pub fn with_labels(
        values: Array2<f64>,
        row_labels: Option<Vec<String>>,
        column_labels: Option<Vec<String>>,
    ) -> Result<Self> {
        let (rows, cols) = values.dim();
        if rows == 0 || cols == 0 {
            return Err(SpinMapError::Configuration(format!(
                "connectome must not be empty (found {rows} x {cols})"
            )));
        }
        if let Some(labels) = &row_labels {
            check_equal_length(labels.len(), rows, "connectome row labels", "connectome rows")?;
            check_unique_labels(labels, "connectome rows")?;
        }
        if let Some(labels) = &column_labels {
            check_equal_length(
                labels.len(),
                cols,
                "connectome column labels",
                "connectome columns",
            )?;
            check_unique_labels(labels, "connectome columns")?;
        }
        Ok(Self {
            values,
            row_labels,
            column_labels,
        })
    }

    pub fn n_seeds(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_targets(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn row_labels(&self) -> Option<&[String]> {
        self.row_labels.as_deref()
    }

    pub fn column_labels(&self) -> Option<&[String]> {
        self.column_labels.as_deref()
    }

    pub fn seed_label(&self, seed: usize) -> String {
        match &self.row_labels {
            Some(labels) => labels[seed].clone(),
            None => format!("seed_{seed}"),
        }
    }

    pub fn row(&self, seed: usize) -> Vec<f64> {
        self.values.row(seed).to_vec()
    }

    /// Column index feeding each region of `reference`, in reference order.
    ///
    /// Labels are matched when both sides carry them; otherwise the column
    /// count must equal the reference length and columns are taken as-is.
    pub fn align_columns(&self, reference: &BrainMap) -> Result<Vec<usize>> {
        match (&self.column_labels, &reference.labels) {
            (Some(columns), Some(regions)) => {
                check_equal_length(
                    regions.len(),
                    reference.len(),
                    "reference labels",
                    "reference map",
                )?;
                check_unique_labels(regions, "reference map")?;
                let lookup: HashMap<&str, usize> = columns
                    .iter()
                    .enumerate()
                    .map(|(idx, label)| (label.as_str(), idx))
                    .collect();
                regions
                    .iter()
                    .map(|label| {
                        lookup.get(label.as_str()).copied().ok_or_else(|| {
                            SpinMapError::Configuration(format!(
                                "reference region {label} has no connectome column"
                            ))
                        })
                    })
                    .collect()
            }
            _ => {
                check_equal_length(
                    self.n_targets(),
                    reference.len(),
                    "connectome columns",
                    "reference map",
                )?;
                Ok((0..self.n_targets()).collect())
            }
        }
    }

    /// Row `seed` reordered by `columns`.
    pub fn seed_profile(&self, seed: usize, columns: &[usize]) -> Vec<f64> {
        columns.iter().map(|&c| self.values[(seed, c)]).collect()
    }
}

pub fn epicentre_mapping(
    reference: &BrainMap,
    connectome: &Connectome,
    surface: &SurfaceDescriptor,
    config: &SpinConfig,
) -> Result<EpicentreResult> {
    config.validate()?;
    let seed = config.resolve_seed();
    epicentre_mapping_with(
        reference,
        connectome,
        surface,
        config,
        &HaarSampler::new(seed),
        None,
    )
}

/// Epicentre mapping with an explicit rotation source and optional cancellation.
///
/// All seeds share the same rotations, so entry `i` equals a direct spin test
/// of seed profile `i` against `reference`.
pub fn epicentre_mapping_with<S: RotationSampler>(
    reference: &BrainMap,
    connectome: &Connectome,
    surface: &SurfaceDescriptor,
    config: &SpinConfig,
    sampler: &S,
    cancel: Option<&CancelToken>,
) -> Result<EpicentreResult> {
    config.validate()?;
    let columns = connectome.align_columns(reference)?;
    let n_seeds = connectome.n_seeds();
    info!(
        "Epicentre mapping: {n_seeds} seeds x {} regions, {} rotations",
        reference.len(),
        config.rotation_count
    );

    let seed_config = SpinConfig {
        keep_null: false,
        parallel: false,
        ..config.clone()
    };
    let map_seed = |seed: usize| -> Result<(f64, f64)> {
        check_cancelled(cancel)?;
        let profile = connectome.seed_profile(seed, &columns);
        let result = spatial_correlation_with(
            &profile,
            &reference.values,
            surface,
            &seed_config,
            sampler,
            cancel,
        )
        .inspect_err(|e| warn!("Epicentre seed {} failed: {e}", connectome.seed_label(seed)))?;
        Ok((result.r, result.p))
    };

    let pairs = if config.parallel {
        let threads = resolve_threads(config.cores, n_seeds);
        let run = || {
            (0..n_seeds)
                .into_par_iter()
                .map(&map_seed)
                .collect::<Vec<Result<(f64, f64)>>>()
        };
        collect_results(run_in_pool(threads, "build epicentre thread pool", run)?)?
    } else {
        let mut out = Vec::with_capacity(n_seeds);
        for seed in 0..n_seeds {
            out.push(map_seed(seed)?);
        }
        out
    };

    let (r, p) = pairs.into_iter().unzip();
    Ok(EpicentreResult {
        seeds: (0..n_seeds).map(|i| connectome.seed_label(i)).collect(),
        r,
        p,
    })
}

/// Cortical-seed results followed by subcortical-seed results.
pub fn combined_epicentre(
    reference: &BrainMap,
    cortical: &Connectome,
    subcortical: &Connectome,
    surface: &SurfaceDescriptor,
    config: &SpinConfig,
) -> Result<EpicentreResult> {
    config.validate()?;
    let sampler = HaarSampler::new(config.resolve_seed());
    let mut ctx = epicentre_mapping_with(reference, cortical, surface, config, &sampler, None)?;
    let sctx = epicentre_mapping_with(reference, subcortical, surface, config, &sampler, None)?;
    ctx.seeds.extend(sctx.seeds);
    ctx.r.extend(sctx.r);
    ctx.p.extend(sctx.p);
    Ok(ctx)
}
