use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;

use crate::rotation::Rotation;

pub type Point = [f64; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hemisphere {
    Left,
    Right,
}

impl Hemisphere {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hemisphere::Left => "L",
            Hemisphere::Right => "R",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hemisphere {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "left" | "lh" => Ok(Hemisphere::Left),
            "r" | "right" | "rh" => Ok(Hemisphere::Right),
            other => Err(anyhow!("Unknown hemisphere: {other}. Use: L, R, left, right, lh or rh")),
        }
    }
}

/// Cortical parcels and subcortical structures are reassigned separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Compartment {
    #[default]
    Cortex,
    Subcortex,
}

impl Compartment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compartment::Cortex => "ctx",
            Compartment::Subcortex => "sctx",
        }
    }
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compartment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ctx" | "cortex" | "cortical" => Ok(Compartment::Cortex),
            "sctx" | "subcortex" | "subcortical" => Ok(Compartment::Subcortex),
            other => Err(anyhow!(
                "Unknown compartment: {other}. Use: ctx, cortex, sctx or subcortex"
            )),
        }
    }
}

/// Rotations applied to each hemisphere for one null draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinPair {
    pub left: Rotation,
    pub right: Rotation,
}

impl SpinPair {
    pub fn identity() -> Self {
        Self {
            left: Rotation::identity(),
            right: Rotation::identity(),
        }
    }

    pub fn for_hemisphere(&self, hemisphere: Hemisphere) -> &Rotation {
        match hemisphere {
            Hemisphere::Left => &self.left,
            Hemisphere::Right => &self.right,
        }
    }
}
