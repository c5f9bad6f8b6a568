use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use sphererot::{HaarSampler, Hemisphere};
use tracing::info;

use crate::cancel::CancelToken;
use crate::config::SpinConfig;
use crate::error::{Result, SpinMapError};
use crate::spin::spatial_correlation_with;
use crate::surface::SurfaceDescriptor;
use crate::types::SpinResult;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResultKey {
    pub cohort: String,
    pub hemisphere: Hemisphere,
}

impl ResultKey {
    pub fn new(cohort: impl Into<String>, hemisphere: Hemisphere) -> Self {
        Self {
            cohort: cohort.into(),
            hemisphere,
        }
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cohort, self.hemisphere)
    }
}

/// Parses `cohort:hemisphere`, e.g. `tle:L`.
impl FromStr for ResultKey {
    type Err = SpinMapError;

    fn from_str(s: &str) -> Result<Self> {
        let (cohort, hemisphere) = s.trim().rsplit_once(':').ok_or_else(|| {
            SpinMapError::Configuration(format!(
                "result key {s} should look like cohort:hemisphere"
            ))
        })?;
        if cohort.is_empty() {
            return Err(SpinMapError::Configuration(format!(
                "result key {s} has an empty cohort"
            )));
        }
        let hemisphere = hemisphere
            .parse()
            .map_err(|e| SpinMapError::Configuration(format!("result key {s}: {e}")))?;
        Ok(Self::new(cohort, hemisphere))
    }
}

/// Results keyed by cohort and hemisphere, in key order.
#[derive(Debug, Clone)]
pub struct ResultStore<T> {
    entries: BTreeMap<ResultKey, T>,
}

impl<T> Default for ResultStore<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> ResultStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a result; a key can only be recorded once.
    pub fn insert(&mut self, key: ResultKey, value: T) -> Result<()> {
        if self.entries.contains_key(&key) {
            return Err(SpinMapError::Configuration(format!(
                "result for {key} already recorded"
            )));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &ResultKey) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResultKey, &T)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Spin tests of each keyed map against `reference`.
///
/// Every map is tested with the same rotation stream, so results are
/// comparable across cohorts and hemispheres.
pub fn cohort_spin_tests(
    maps: &[(ResultKey, Vec<f64>)],
    reference: &[f64],
    surface: &SurfaceDescriptor,
    config: &SpinConfig,
    cancel: Option<&CancelToken>,
) -> Result<ResultStore<SpinResult>> {
    config.validate()?;
    let seed = config.resolve_seed();
    let sampler = HaarSampler::new(seed);
    let mut store = ResultStore::new();
    for (key, values) in maps {
        let mut result =
            spatial_correlation_with(values, reference, surface, config, &sampler, cancel)?;
        result.seed = Some(seed);
        info!("{key}: r = {}, p = {}", result.r, result.p);
        store.insert(key.clone(), result)?;
    }
    Ok(store)
}
