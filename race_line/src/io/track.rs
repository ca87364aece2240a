//! Track documents (YAML or JSON) and raceline output files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::raceline::{RaceLine, RaceLinePoint};
use crate::waypoint::Waypoint;

/// Suffix appended to a track's stem for its raceline file.
pub const RACELINE_SUFFIX: &str = ".raceline.yaml";

/// A track file. Keys this crate doesn't know about are kept in `extra` so
/// rewriting a file preserves them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_loop: Option<bool>,
    /// Full track width applied where nodes carry no width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_width: Option<f64>,
    pub nodes: Vec<TrackNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raceline: Vec<RacelineRecord>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackNode {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Full width, split evenly when a side has no explicit half-width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banking: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_type: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl TrackNode {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            width: None,
            width_left: None,
            width_right: None,
            banking: None,
            friction: None,
            surface_type: None,
            extra: BTreeMap::new(),
        }
    }
}

/// One persisted raceline sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RacelineRecord {
    pub s: f64,
    pub x: f64,
    pub y: f64,
    pub offset: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl From<RaceLinePoint> for RacelineRecord {
    fn from(p: RaceLinePoint) -> Self {
        Self {
            s: p.s,
            x: p.x,
            y: p.y,
            offset: p.offset,
            z: None,
        }
    }
}

/// Document written next to a track: `raceline: [...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RacelineFile {
    pub raceline: Vec<RacelineRecord>,
}

impl RacelineFile {
    pub fn from_race_line(line: &RaceLine) -> Self {
        Self {
            raceline: line.points.iter().copied().map(RacelineRecord::from).collect(),
        }
    }
}

impl TrackFile {
    /// Parses JSON when the document starts with `{`, YAML otherwise.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim_start().starts_with('{') {
            Ok(serde_json::from_str(content)?)
        } else {
            Ok(serde_yaml::from_str(content)?)
        }
    }

    /// Solver waypoints with half-widths resolved from `width_left` /
    /// `width_right`, then the node `width`, then `default_width`.
    pub fn waypoints(&self) -> Vec<Waypoint> {
        let default_half = self.default_width.filter(|w| *w > 0.0).map(|w| w / 2.0);
        self.nodes
            .iter()
            .map(|n| {
                let half = n.width.map(|w| w / 2.0).or(default_half);
                Waypoint {
                    x: n.x,
                    y: n.y,
                    z: n.z,
                    width_left: n.width_left.or(half),
                    width_right: n.width_right.or(half),
                    banking: n.banking.unwrap_or(0.0),
                    friction: n.friction.unwrap_or(1.0),
                    surface: n
                        .surface_type
                        .clone()
                        .unwrap_or_else(|| "Asphalt".to_string()),
                }
            })
            .collect()
    }
}

pub fn read_track<P: AsRef<Path>>(path: P) -> Result<TrackFile> {
    let contents = crate::io::read_to_string(path)?;
    TrackFile::parse(&contents)
}

/// Writes a track as JSON for `.json` paths and YAML otherwise.
pub fn write_track<P: AsRef<Path>>(path: P, track: &TrackFile) -> Result<()> {
    let text = if crate::io::is_json_path(&path) {
        serde_json::to_string_pretty(track)?
    } else {
        serde_yaml::to_string(track)?
    };
    crate::io::write_string(path, &text)?;
    Ok(())
}

pub fn read_raceline<P: AsRef<Path>>(path: P) -> Result<RacelineFile> {
    let contents = crate::io::read_to_string(path)?;
    if contents.trim_start().starts_with('{') {
        Ok(serde_json::from_str(&contents)?)
    } else {
        Ok(serde_yaml::from_str(&contents)?)
    }
}

/// Writes the raceline document as JSON for `.json` paths and YAML otherwise.
pub fn write_raceline<P: AsRef<Path>>(path: P, line: &RaceLine) -> Result<()> {
    let doc = RacelineFile::from_race_line(line);
    let text = if crate::io::is_json_path(&path) {
        serde_json::to_string_pretty(&doc)?
    } else {
        serde_yaml::to_string(&doc)?
    };
    crate::io::write_string(path, &text)?;
    Ok(())
}

/// `dir/track.yaml` -> `dir/track.raceline.yaml`.
pub fn raceline_output_path<P: AsRef<Path>>(track_path: P) -> PathBuf {
    let path = track_path.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}", stem, RACELINE_SUFFIX))
}

/// Whether `path` names a track input rather than a generated raceline.
pub fn is_track_path<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.ends_with(".yaml") && !name.ends_with(RACELINE_SUFFIX)
}
