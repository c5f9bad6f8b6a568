//! Spin-permutation spatial correlation of parcellated brain maps and
//! connectome epicentre mapping.

pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub mod io;
pub mod matrix;
pub mod parallel;
pub mod qc;
pub mod surface;

pub mod atrophy;
pub mod correlation;
pub mod epicentre;
pub mod results;
pub mod similarity;
pub mod spin;

pub use config::{Parcellation, SpinConfig, SurfaceName};
pub use epicentre::{Connectome, epicentre_mapping};
pub use error::{Result, SpinMapError};
pub use spin::spatial_correlation;
pub use surface::SurfaceDescriptor;
pub use types::{BrainMap, EpicentreResult, Sidedness, SimilarityMatrix, SpinResult};
