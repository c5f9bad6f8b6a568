pub mod layout;
pub mod rotation;
pub mod sampler;
pub mod types;

pub use layout::{SphereLayout, apply_permutation, is_identity_permutation};
pub use rotation::Rotation;
pub use sampler::{HaarSampler, IdentitySampler, RotationSampler};
pub use types::*;
