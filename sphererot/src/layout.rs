use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use tracing::trace;

use crate::rotation::Rotation;
use crate::types::{Compartment, Hemisphere, Point, SpinPair};

/// Region positions on the left and right hemisphere spheres.
///
/// Regions are grouped into pools by hemisphere and compartment. Values only
/// move between regions of the same pool.
#[derive(Debug, Clone)]
pub struct SphereLayout {
    points: Vec<Point>,
    pools: Vec<(Hemisphere, Vec<usize>)>,
}

impl SphereLayout {
    /// Builds a cortex-only layout from `(hemisphere, point)` entries in region order.
    pub fn new(entries: Vec<(Hemisphere, Point)>) -> Result<Self> {
        Self::with_compartments(
            entries
                .into_iter()
                .map(|(hemi, p)| (hemi, Compartment::Cortex, p))
                .collect(),
        )
    }

    /// Builds a layout from `(hemisphere, compartment, point)` entries in region order.
    ///
    /// Points are projected onto the unit sphere.
    pub fn with_compartments(entries: Vec<(Hemisphere, Compartment, Point)>) -> Result<Self> {
        if entries.is_empty() {
            return Err(anyhow!("sphere layout must contain at least one region"));
        }
        let mut points = Vec::with_capacity(entries.len());
        let mut pools: BTreeMap<(Hemisphere, Compartment), Vec<usize>> = BTreeMap::new();
        for (idx, (hemi, compartment, p)) in entries.into_iter().enumerate() {
            if !p.iter().all(|v| v.is_finite()) {
                return Err(anyhow!("region {idx} has non-finite coordinates"));
            }
            let norm = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            if norm == 0.0 {
                return Err(anyhow!("region {idx} lies at the sphere centre"));
            }
            pools.entry((hemi, compartment)).or_default().push(idx);
            points.push([p[0] / norm, p[1] / norm, p[2] / norm]);
        }
        Ok(Self {
            points,
            pools: pools
                .into_iter()
                .map(|((hemi, _), members)| (hemi, members))
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Region indices of each hemisphere/compartment pool.
    pub fn pools(&self) -> impl Iterator<Item = &[usize]> {
        self.pools.iter().map(|(_, members)| members.as_slice())
    }

    /// One-to-one reassignment under `pair`.
    ///
    /// Entry `i` is the region of the same pool whose rotated position is
    /// matched to region `i`. Matches are made greedily from the closest
    /// rotated/original pair downwards, and each source is used once, so the
    /// result is a permutation. Ties go to the lowest target, then the lowest
    /// source.
    pub fn permutation(&self, pair: &SpinPair) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..self.len()).collect();
        for (hemi, members) in &self.pools {
            assign_pool(
                &self.points,
                members,
                pair.for_hemisphere(*hemi),
                &mut perm,
            );
        }
        trace!("permutation: {} regions reassigned", self.len());
        perm
    }
}

fn assign_pool(points: &[Point], members: &[usize], rotation: &Rotation, perm: &mut [usize]) {
    let m = members.len();
    let mut candidates = Vec::with_capacity(m * m);
    for (a, &i) in members.iter().enumerate() {
        // <p_i, R p_j> == <R^T p_i, p_j>
        let target = rotation.apply_transpose(&points[i]);
        for (b, &j) in members.iter().enumerate() {
            let p = &points[j];
            let dot = target[0] * p[0] + target[1] * p[1] + target[2] * p[2];
            candidates.push((dot, a, b));
        }
    }
    candidates.sort_by(|x, y| {
        y.0.total_cmp(&x.0)
            .then(x.1.cmp(&y.1))
            .then(x.2.cmp(&y.2))
    });

    let mut matched = vec![false; m];
    let mut used = vec![false; m];
    let mut remaining = m;
    for (_, a, b) in candidates {
        if remaining == 0 {
            break;
        }
        if matched[a] || used[b] {
            continue;
        }
        perm[members[a]] = members[b];
        matched[a] = true;
        used[b] = true;
        remaining -= 1;
    }
}

pub fn apply_permutation(values: &[f64], perm: &[usize]) -> Vec<f64> {
    perm.iter().map(|&src| values[src]).collect()
}

pub fn is_identity_permutation(perm: &[usize]) -> bool {
    perm.iter().enumerate().all(|(i, &src)| i == src)
}
