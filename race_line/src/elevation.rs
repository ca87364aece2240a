//! Elevation and banking enrichment of track files.
//!
//! Profiles are tables keyed by lap progress in `[0, 1)`; lookups wrap from
//! the last entry back to the first.

use std::collections::BTreeMap;
use std::path::Path;

use crate::arc_length::build_arc_length;
use crate::error::{RaceLineError, Result};
use crate::geometry::{Point, Polyline};
use crate::io::track::{RacelineRecord, TrackFile, TrackNode};

/// Progress distance beyond which a banked corner has no influence.
pub const BANKING_REACH: f64 = 0.05;
/// Gaussian width of a banked corner, in lap progress.
pub const BANKING_SIGMA: f64 = 0.02;
pub const DEFAULT_SMOOTHING_WINDOW: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeyPoint {
    pub progress: f64,
    pub elevation: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BankedCorner {
    pub progress: f64,
    /// Peak banking in degrees.
    pub banking: f64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Elevation key points and banked corners for one track.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElevationProfile {
    #[serde(default)]
    pub total_elevation_change: Option<f64>,
    pub key_points: Vec<KeyPoint>,
    #[serde(default)]
    pub banked_corners: Vec<BankedCorner>,
    #[serde(default = "default_window")]
    pub smoothing_window: usize,
}

fn default_window() -> usize {
    DEFAULT_SMOOTHING_WINDOW
}

/// Profiles keyed by track name.
pub type ElevationConfig = BTreeMap<String, ElevationProfile>;

pub fn read_elevation_config<P: AsRef<Path>>(path: P) -> Result<ElevationConfig> {
    let contents = crate::io::read_to_string(path)?;
    if contents.trim_start().starts_with('{') {
        Ok(serde_json::from_str(&contents)?)
    } else {
        Ok(serde_yaml::from_str(&contents)?)
    }
}

/// Copy of `table` ordered by progress.
pub fn sorted_key_points(table: &[KeyPoint]) -> Vec<KeyPoint> {
    let mut points = table.to_vec();
    points.sort_by(|a, b| a.progress.total_cmp(&b.progress));
    points
}

/// Linear interpolation of the key point table at `progress`, wrapping from
/// the last key point to the first one across the start line. `points` must
/// be ordered by progress, see [`sorted_key_points`].
pub fn elevation_at(points: &[KeyPoint], progress: f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }

    for pair in points.windows(2) {
        let a = &pair[0];
        let b = &pair[1];
        if progress >= a.progress && progress <= b.progress {
            let t = if (b.progress - a.progress).abs() < f64::EPSILON {
                0.0
            } else {
                (progress - a.progress) / (b.progress - a.progress)
            };
            return a.elevation + t * (b.elevation - a.elevation);
        }
    }

    let first = &points[0];
    let last = &points[points.len() - 1];
    let span = 1.0 - last.progress + first.progress;
    if span < f64::EPSILON {
        return last.elevation;
    }
    let t = (progress - last.progress).rem_euclid(1.0) / span;
    last.elevation + t.min(1.0) * (first.elevation - last.elevation)
}

/// Centered moving average treating `values` as a loop.
pub fn smooth_circular(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 || window <= 1 {
        return values.to_vec();
    }
    let half = (window / 2) as isize;
    let count = (2 * half + 1) as f64;
    (0..n as isize)
        .map(|i| {
            (-half..=half)
                .map(|j| values[(i + j).rem_euclid(n as isize) as usize])
                .sum::<f64>()
                / count
        })
        .collect()
}

fn progress_of(station: f64, total: f64) -> f64 {
    if total > 0.0 {
        station / total
    } else {
        0.0
    }
}

/// Smoothed elevations at each station.
pub fn elevation_profile(stations: &[f64], profile: &ElevationProfile) -> Vec<f64> {
    let total = stations.last().copied().unwrap_or(0.0);
    let points = sorted_key_points(&profile.key_points);
    let raw: Vec<f64> = stations
        .iter()
        .map(|s| elevation_at(&points, progress_of(*s, total)))
        .collect();
    smooth_circular(&raw, profile.smoothing_window)
}

/// Banking at each station: a Gaussian bump per corner, combined by maximum.
pub fn banking_profile(stations: &[f64], corners: &[BankedCorner]) -> Vec<f64> {
    let total = stations.last().copied().unwrap_or(0.0);
    let mut banking = vec![0.0_f64; stations.len()];
    for corner in corners {
        for (b, s) in banking.iter_mut().zip(stations) {
            let p = progress_of(*s, total);
            let d = [p - corner.progress, p - corner.progress + 1.0, p - corner.progress - 1.0]
                .iter()
                .map(|d| d.abs())
                .fold(f64::INFINITY, f64::min);
            if d < BANKING_REACH {
                let factor = (-(d / BANKING_SIGMA).powi(2)).exp();
                *b = b.max(corner.banking * factor);
            }
        }
    }
    banking
}

/// Sets each raceline sample's `z` to that of the nearest centerline node.
pub fn project_raceline_z(nodes: &[TrackNode], raceline: &mut [RacelineRecord]) {
    let centerline = Polyline::new(nodes.iter().map(|n| Point::new(n.x, n.y)).collect());
    for rp in raceline.iter_mut() {
        if let Some(i) = centerline.nearest_vertex(Point::new(rp.x, rp.y)) {
            rp.z = Some(nodes[i].z);
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (value * f).round() / f
}

/// Writes elevations and banking into the nodes and re-projects the raceline.
///
/// Existing non-zero banking values are kept.
pub fn enrich_track(track: &mut TrackFile, profile: &ElevationProfile) -> Result<()> {
    if track.nodes.is_empty() {
        return Err(RaceLineError::DegenerateInput(
            "track has no nodes".to_string(),
        ));
    }
    let stations = build_arc_length(&track.waypoints());
    let elevations = elevation_profile(&stations, profile);
    let banking = banking_profile(&stations, &profile.banked_corners);
    for (node, (z, b)) in track.nodes.iter_mut().zip(elevations.iter().zip(&banking)) {
        node.z = round_to(*z, 3);
        if node.banking.map_or(true, |v| v == 0.0) {
            node.banking = Some(round_to(*b, 1));
        }
    }
    project_raceline_z(&track.nodes, &mut track.raceline);

    let (lo, hi) = elevations
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), z| (lo.min(*z), hi.max(*z)));
    log::info!(
        "enriched {} nodes, elevation {:.2}..{:.2}, {} raceline samples",
        track.nodes.len(),
        lo,
        hi,
        track.raceline.len()
    );
    Ok(())
}

/// Looks up the profile for `name` in `config`.
pub fn profile_for<'a>(config: &'a ElevationConfig, name: &str) -> Result<&'a ElevationProfile> {
    config
        .get(name)
        .ok_or_else(|| RaceLineError::UnknownTrack(name.to_string()))
}
