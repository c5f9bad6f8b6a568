//! Spin permutation test for the spatial correlation of two brain maps.
//!
//! The null distribution is built by rotating the sphere coordinates of the
//! first map, reassigning each region the value of the region that lands
//! nearest to it, and correlating the permuted map with the fixed second map.

use rayon::prelude::*;
use sphererot::{
    HaarSampler, RotationSampler, SphereLayout, apply_permutation, is_identity_permutation,
};
use tracing::{debug, warn};

use crate::cancel::{CancelToken, check_cancelled};
use crate::config::SpinConfig;
use crate::correlation::pearson;
use crate::error::{Result, SpinMapError};
use crate::parallel::{collect_results, resolve_threads, run_in_pool};
use crate::qc::check_equal_length;
use crate::surface::SurfaceDescriptor;
use crate::types::{Sidedness, SpinResult};

/// Null values within this distance of the observed statistic count as equally extreme.
pub const TIE_TOLERANCE: f64 = 1e-12;

/// Spin test with Haar-uniform rotations seeded from `config`.
pub fn spatial_correlation(
    map1: &[f64],
    map2: &[f64],
    surface: &SurfaceDescriptor,
    config: &SpinConfig,
) -> Result<SpinResult> {
    config.validate()?;
    let seed = config.resolve_seed();
    let mut result =
        spatial_correlation_with(map1, map2, surface, config, &HaarSampler::new(seed), None)?;
    result.seed = Some(seed);
    Ok(result)
}

/// Spin test with an explicit rotation source and optional cancellation.
pub fn spatial_correlation_with<S: RotationSampler>(
    map1: &[f64],
    map2: &[f64],
    surface: &SurfaceDescriptor,
    config: &SpinConfig,
    sampler: &S,
    cancel: Option<&CancelToken>,
) -> Result<SpinResult> {
    config.validate()?;
    check_equal_length(map1.len(), map2.len(), "map1", "map2")?;
    surface.check_matches(config)?;
    surface.check_covers(map1.len(), "map1")?;
    surface.check_covers(map2.len(), "map2")?;
    let layout = surface.layout()?;

    let r = pearson(map1, map2, "map1", "map2")?;
    let draws = spin_null(map1, map2, &layout, config, sampler, cancel)?;

    let identity_rotations = draws.iter().filter(|(_, identity)| *identity).count();
    if identity_rotations > 0 {
        warn!(
            "{identity_rotations} of {} rotations left every region in place; they remain in the null",
            config.rotation_count
        );
    }
    let null: Vec<f64> = draws.into_iter().map(|(value, _)| value).collect();
    let p = spin_p_value(r, &null, config.sidedness);
    debug!(
        "spin test: r={r}, p={p}, rotations={}, regions={}",
        config.rotation_count,
        map1.len()
    );

    Ok(SpinResult {
        r,
        p,
        null: config.keep_null.then_some(null),
        rotation_count: config.rotation_count,
        identity_rotations,
        seed: None,
    })
}

fn spin_null<S: RotationSampler>(
    map1: &[f64],
    map2: &[f64],
    layout: &SphereLayout,
    config: &SpinConfig,
    sampler: &S,
    cancel: Option<&CancelToken>,
) -> Result<Vec<(f64, bool)>> {
    let n_rot = config.rotation_count;
    let draw = |k: usize| -> Result<(f64, bool)> {
        check_cancelled(cancel)?;
        let perm = layout.permutation(&sampler.draw(k));
        let permuted = apply_permutation(map1, &perm);
        let value = pearson(&permuted, map2, "rotated map1", "map2").map_err(|e| match e {
            SpinMapError::Numerical(msg) => SpinMapError::Numerical(format!("rotation {k}: {msg}")),
            other => other,
        })?;
        Ok((value, is_identity_permutation(&perm)))
    };

    if config.parallel {
        let threads = resolve_threads(config.cores, n_rot);
        let run = || {
            (0..n_rot)
                .into_par_iter()
                .map(&draw)
                .collect::<Vec<Result<(f64, bool)>>>()
        };
        let results = run_in_pool(threads, "build spin thread pool", run)?;
        collect_results(results)
    } else {
        let mut out = Vec::with_capacity(n_rot);
        for k in 0..n_rot {
            out.push(draw(k)?);
        }
        Ok(out)
    }
}

/// Permutation p-value `(count + 1) / (n + 1)`.
///
/// `count` is the number of null values at least as extreme as `observed`: by
/// magnitude when two-sided, in the direction of the sign of `observed` when
/// one-sided. The observed statistic itself is counted once.
pub fn spin_p_value(observed: f64, null: &[f64], sidedness: Sidedness) -> f64 {
    let count = match sidedness {
        Sidedness::TwoSided => {
            let target = observed.abs() - TIE_TOLERANCE;
            null.iter().filter(|v| v.abs() >= target).count()
        }
        Sidedness::OneSided if observed >= 0.0 => {
            let target = observed - TIE_TOLERANCE;
            null.iter().filter(|v| **v >= target).count()
        }
        Sidedness::OneSided => {
            let target = observed + TIE_TOLERANCE;
            null.iter().filter(|v| **v <= target).count()
        }
    };
    (count as f64 + 1.0) / (null.len() as f64 + 1.0)
}
