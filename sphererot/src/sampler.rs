use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::rotation::Rotation;
use crate::types::SpinPair;

/// Source of the rotations used to build a spin null.
///
/// Draw `index` must depend only on the sampler state and `index`, so that
/// rotations can be generated in any order or in parallel.
pub trait RotationSampler: Sync {
    fn draw(&self, index: usize) -> SpinPair;
}

/// Haar-uniform rotations with a partitionable seed stream.
///
/// Draw `index` keys its own generator with the seed and the index in separate
/// words of the key, so streams of different seeds never share a draw. The left
/// hemisphere receives the sampled rotation and the right hemisphere its mirror
/// image.
#[derive(Debug, Clone, Copy)]
pub struct HaarSampler {
    seed: u64,
}

impl HaarSampler {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RotationSampler for HaarSampler {
    fn draw(&self, index: usize) -> SpinPair {
        let mut key = [0u8; 32];
        key[..8].copy_from_slice(&self.seed.to_le_bytes());
        key[8..16].copy_from_slice(&(index as u64).to_le_bytes());
        let mut rng = StdRng::from_seed(key);
        let left = Rotation::haar(&mut rng);
        SpinPair {
            left,
            right: left.mirrored(),
        }
    }
}

/// Every draw is the identity rotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentitySampler;

impl RotationSampler for IdentitySampler {
    fn draw(&self, _index: usize) -> SpinPair {
        SpinPair::identity()
    }
}
