use std::fmt;
use std::str::FromStr;

use rand::Rng;
use sphererot::Compartment;
use tracing::info;

use crate::error::{Result, SpinMapError};
use crate::types::Sidedness;

pub const DEFAULT_ROTATIONS: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceName {
    Fsa5,
    Fsa5WithSctx,
    Conte69,
}

impl SurfaceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceName::Fsa5 => "fsa5",
            SurfaceName::Fsa5WithSctx => "fsa5_with_sctx",
            SurfaceName::Conte69 => "conte69",
        }
    }
}

impl FromStr for SurfaceName {
    type Err = SpinMapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fsa5" => Ok(SurfaceName::Fsa5),
            "fsa5_with_sctx" => Ok(SurfaceName::Fsa5WithSctx),
            "conte69" => Ok(SurfaceName::Conte69),
            other => Err(SpinMapError::Configuration(format!(
                "Unknown surface: {other}. Use: fsa5, fsa5_with_sctx or conte69"
            ))),
        }
    }
}

impl fmt::Display for SurfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parcellation {
    /// Desikan-Killiany cortical parcels.
    Aparc,
    /// Desikan-Killiany cortical parcels followed by subcortical structures.
    AparcAseg,
}

impl Parcellation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Parcellation::Aparc => "aparc",
            Parcellation::AparcAseg => "aparc_aseg",
        }
    }
}

impl Parcellation {
    /// Compartment of region `index` when the surface table does not say.
    ///
    /// `aparc_aseg` lists the cortical parcels first and the subcortical
    /// structures after them.
    pub fn default_compartment(&self, index: usize) -> Compartment {
        match self {
            Parcellation::AparcAseg if index >= CORTICAL_REGIONS => Compartment::Subcortex,
            _ => Compartment::Cortex,
        }
    }
}

impl FromStr for Parcellation {
    type Err = SpinMapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aparc" => Ok(Parcellation::Aparc),
            "aparc_aseg" => Ok(Parcellation::AparcAseg),
            other => Err(SpinMapError::Configuration(format!(
                "Unknown parcellation: {other}. Use: aparc or aparc_aseg"
            ))),
        }
    }
}

impl fmt::Display for Parcellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const CORTICAL_REGIONS: usize = 68;
pub const SUBCORTICAL_REGIONS: usize = 14;

/// Number of regions of a supported surface/parcellation pair, `None` when unsupported.
pub fn expected_regions(surface: SurfaceName, parcellation: Parcellation) -> Option<usize> {
    match (surface, parcellation) {
        (SurfaceName::Fsa5, Parcellation::Aparc) => Some(CORTICAL_REGIONS),
        (SurfaceName::Conte69, Parcellation::Aparc) => Some(CORTICAL_REGIONS),
        (SurfaceName::Fsa5WithSctx, Parcellation::AparcAseg) => {
            Some(CORTICAL_REGIONS + SUBCORTICAL_REGIONS)
        }
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct SpinConfig {
    pub rotation_count: usize,
    pub surface: SurfaceName,
    pub parcellation: Parcellation,
    pub sidedness: Sidedness,
    pub seed: Option<u64>,
    pub keep_null: bool,
    pub parallel: bool,
    pub cores: Option<usize>,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            rotation_count: DEFAULT_ROTATIONS,
            surface: SurfaceName::Fsa5,
            parcellation: Parcellation::Aparc,
            sidedness: Sidedness::TwoSided,
            seed: None,
            keep_null: true,
            parallel: false,
            cores: None,
        }
    }
}

impl SpinConfig {
    /// Cortex plus subcortex defaults, used for concatenated epicentre maps.
    pub fn with_subcortex() -> Self {
        Self {
            surface: SurfaceName::Fsa5WithSctx,
            parcellation: Parcellation::AparcAseg,
            ..Self::default()
        }
    }

    pub fn from_names(surface: &str, parcellation: &str) -> Result<Self> {
        let config = Self {
            surface: surface.parse()?,
            parcellation: parcellation.parse()?,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rotation_count < 1 {
            return Err(SpinMapError::Configuration(
                "rotation count must be at least 1".to_string(),
            ));
        }
        if expected_regions(self.surface, self.parcellation).is_none() {
            return Err(SpinMapError::Configuration(format!(
                "Unsupported surface/parcellation combination: {} x {}",
                self.surface, self.parcellation
            )));
        }
        if self.cores == Some(0) {
            return Err(SpinMapError::Configuration(
                "cores must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn expected_regions(&self) -> Option<usize> {
        expected_regions(self.surface, self.parcellation)
    }

    /// Explicit seed, or a fresh one that is logged so the run can be repeated.
    pub fn resolve_seed(&self) -> u64 {
        match self.seed {
            Some(seed) => seed,
            None => {
                let seed: u64 = rand::rng().random();
                info!("No spin seed supplied; using {seed}");
                seed
            }
        }
    }
}
