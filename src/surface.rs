use sphererot::{Compartment, Hemisphere, Point, SphereLayout};
use tracing::warn;

use crate::config::{Parcellation, SpinConfig, SurfaceName, expected_regions};
use crate::error::{Result, SpinMapError};

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceRegion {
    pub label: String,
    pub hemisphere: Hemisphere,
    /// Subcortical structures rotate with their hemisphere but only exchange
    /// values with other subcortical structures.
    pub compartment: Compartment,
    pub point: Point,
}

/// Sphere coordinates for every region of a parcellation, in map order.
#[derive(Debug, Clone)]
pub struct SurfaceDescriptor {
    surface: SurfaceName,
    parcellation: Parcellation,
    regions: Vec<SurfaceRegion>,
}

impl SurfaceDescriptor {
    pub fn new(
        surface: SurfaceName,
        parcellation: Parcellation,
        regions: Vec<SurfaceRegion>,
    ) -> Result<Self> {
        if regions.is_empty() {
            return Err(SpinMapError::Geometry(format!(
                "surface descriptor {surface} x {parcellation} has no regions"
            )));
        }
        if let Some(idx) = regions.iter().position(|r| r.label.trim().is_empty()) {
            return Err(SpinMapError::Geometry(format!(
                "surface descriptor region {idx} has an empty label"
            )));
        }
        let subcortical = regions
            .iter()
            .filter(|r| r.compartment == Compartment::Subcortex)
            .count();
        if parcellation == Parcellation::Aparc && subcortical > 0 {
            return Err(SpinMapError::Configuration(format!(
                "{parcellation} is cortical only but the surface descriptor has {subcortical} subcortical regions"
            )));
        }
        if parcellation == Parcellation::AparcAseg && subcortical == 0 {
            warn!("Surface descriptor {surface} x {parcellation} has no subcortical regions");
        }
        if let Some(expected) = expected_regions(surface, parcellation)
            && expected != regions.len()
        {
            warn!(
                "Surface descriptor {surface} x {parcellation} has {} regions; the standard parcellation has {expected}",
                regions.len()
            );
        }
        Ok(Self {
            surface,
            parcellation,
            regions,
        })
    }

    pub fn surface(&self) -> SurfaceName {
        self.surface
    }

    pub fn parcellation(&self) -> Parcellation {
        self.parcellation
    }

    pub fn regions(&self) -> &[SurfaceRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.label.clone()).collect()
    }

    pub fn check_matches(&self, config: &SpinConfig) -> Result<()> {
        if self.surface != config.surface || self.parcellation != config.parcellation {
            return Err(SpinMapError::Configuration(format!(
                "surface descriptor is {} x {} but the configuration requests {} x {}",
                self.surface, self.parcellation, config.surface, config.parcellation
            )));
        }
        Ok(())
    }

    /// Checks that every region of a map of length `n` has coordinates.
    pub fn check_covers(&self, n: usize, map_name: &str) -> Result<()> {
        if n > self.regions.len() {
            return Err(SpinMapError::Geometry(format!(
                "surface descriptor lacks coordinates for {map_name} region {} ({} regions described, {n} in map)",
                self.regions.len(),
                self.regions.len()
            )));
        }
        if n < self.regions.len() {
            return Err(SpinMapError::Configuration(format!(
                "{map_name} has {n} regions but {} x {} describes {}",
                self.surface,
                self.parcellation,
                self.regions.len()
            )));
        }
        Ok(())
    }

    pub fn layout(&self) -> Result<SphereLayout> {
        let entries = self
            .regions
            .iter()
            .map(|r| (r.hemisphere, r.compartment, r.point))
            .collect();
        SphereLayout::with_compartments(entries).map_err(|e| SpinMapError::Geometry(e.to_string()))
    }
}
