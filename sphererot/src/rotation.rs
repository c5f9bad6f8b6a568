//! Proper rotations of the unit sphere.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::types::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    m: [[f64; 3]; 3],
}

impl Rotation {
    pub fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Rotation matrix of the unit quaternion `(w, x, y, z)`.
    ///
    /// The quaternion is normalized first; a zero quaternion yields the identity.
    pub fn from_quaternion(w: f64, x: f64, y: f64, z: f64) -> Self {
        let norm = (w * w + x * x + y * y + z * z).sqrt();
        if !norm.is_finite() || norm == 0.0 {
            return Self::identity();
        }
        let (w, x, y, z) = (w / norm, x / norm, y / norm, z / norm);
        Self {
            m: [
                [
                    1.0 - 2.0 * (y * y + z * z),
                    2.0 * (x * y - w * z),
                    2.0 * (x * z + w * y),
                ],
                [
                    2.0 * (x * y + w * z),
                    1.0 - 2.0 * (x * x + z * z),
                    2.0 * (y * z - w * x),
                ],
                [
                    2.0 * (x * z - w * y),
                    2.0 * (y * z + w * x),
                    1.0 - 2.0 * (x * x + y * y),
                ],
            ],
        }
    }

    /// Uniform (Haar) draw from SO(3).
    ///
    /// A standard normal 4-vector normalized to unit length is uniform on S3, and
    /// the unit quaternion it defines is a uniformly distributed rotation.
    pub fn haar<R: Rng>(rng: &mut R) -> Self {
        loop {
            let w: f64 = rng.sample(StandardNormal);
            let x: f64 = rng.sample(StandardNormal);
            let y: f64 = rng.sample(StandardNormal);
            let z: f64 = rng.sample(StandardNormal);
            let norm_sq = w * w + x * x + y * y + z * z;
            if norm_sq > 1e-12 {
                return Self::from_quaternion(w, x, y, z);
            }
        }
    }

    /// Conjugate by the midsagittal reflection `diag(-1, 1, 1)`.
    pub fn mirrored(&self) -> Self {
        let sign = [-1.0, 1.0, 1.0];
        let mut m = self.m;
        for (i, row) in m.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v *= sign[i] * sign[j];
            }
        }
        Self { m }
    }

    pub fn apply(&self, p: &Point) -> Point {
        let m = &self.m;
        [
            m[0][0] * p[0] + m[0][1] * p[1] + m[0][2] * p[2],
            m[1][0] * p[0] + m[1][1] * p[1] + m[1][2] * p[2],
            m[2][0] * p[0] + m[2][1] * p[1] + m[2][2] * p[2],
        ]
    }

    /// Applies the inverse rotation.
    pub fn apply_transpose(&self, p: &Point) -> Point {
        let m = &self.m;
        [
            m[0][0] * p[0] + m[1][0] * p[1] + m[2][0] * p[2],
            m[0][1] * p[0] + m[1][1] * p[1] + m[2][1] * p[2],
            m[0][2] * p[0] + m[1][2] * p[1] + m[2][2] * p[2],
        ]
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }
}
