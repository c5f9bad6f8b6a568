#![allow(dead_code)]

use spinmap::config::{Parcellation, SpinConfig, SurfaceName};
use spinmap::surface::{SurfaceDescriptor, SurfaceRegion};
use sphererot::{Compartment, Hemisphere, Point};

/// Fibonacci-lattice points of radius `radius`, mirrored across x for the right hemisphere.
fn lattice(n: usize, radius: f64, hemisphere: Hemisphere) -> Vec<Point> {
    let golden = std::f64::consts::PI * (3.0 - 5f64.sqrt());
    let sign = match hemisphere {
        Hemisphere::Left => 1.0,
        Hemisphere::Right => -1.0,
    };
    (0..n)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
            let r = (1.0 - y * y).sqrt();
            let theta = golden * i as f64;
            [
                sign * radius * r * theta.cos(),
                radius * y,
                radius * r * theta.sin(),
            ]
        })
        .collect()
}

fn push_regions(
    regions: &mut Vec<SurfaceRegion>,
    n: usize,
    radius: f64,
    compartment: Compartment,
    prefix: &str,
) {
    for hemisphere in [Hemisphere::Left, Hemisphere::Right] {
        let side = match hemisphere {
            Hemisphere::Left => "lh",
            Hemisphere::Right => "rh",
        };
        for (i, point) in lattice(n, radius, hemisphere).into_iter().enumerate() {
            regions.push(SurfaceRegion {
                label: format!("{side}_{prefix}{i}"),
                hemisphere,
                compartment,
                point,
            });
        }
    }
}

/// Fibonacci-lattice points on each hemisphere sphere, right mirrored from left.
pub fn fibonacci_surface(
    per_hemisphere: usize,
    surface: SurfaceName,
    parcellation: Parcellation,
) -> SurfaceDescriptor {
    let mut regions = Vec::new();
    push_regions(&mut regions, per_hemisphere, 1.0, Compartment::Cortex, "");
    SurfaceDescriptor::new(surface, parcellation, regions).expect("surface")
}

/// 68 cortical parcels followed by 7 subcortical structures per hemisphere.
pub fn subcortical_surface() -> SurfaceDescriptor {
    let mut regions = Vec::new();
    push_regions(&mut regions, 34, 1.0, Compartment::Cortex, "");
    push_regions(&mut regions, 7, 0.4, Compartment::Subcortex, "sctx_");
    SurfaceDescriptor::new(SurfaceName::Fsa5WithSctx, Parcellation::AparcAseg, regions)
        .expect("surface")
}

pub fn cortical_surface() -> SurfaceDescriptor {
    fibonacci_surface(34, SurfaceName::Fsa5, Parcellation::Aparc)
}

/// A smooth map over the surface plus a region-specific offset.
pub fn smooth_map(surface: &SurfaceDescriptor, wx: f64, wy: f64, wz: f64) -> Vec<f64> {
    surface
        .regions()
        .iter()
        .enumerate()
        .map(|(i, r)| {
            wx * r.point[0] + wy * r.point[1] + wz * r.point[2] + 0.01 * ((i * 7 % 11) as f64)
        })
        .collect()
}

pub fn seeded_config(rotations: usize, seed: u64) -> SpinConfig {
    SpinConfig {
        rotation_count: rotations,
        seed: Some(seed),
        ..SpinConfig::default()
    }
}
