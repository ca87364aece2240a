//! Racing line generation for single track files and whole folders.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::io::track::{is_track_path, raceline_output_path, read_track, write_raceline};
use crate::raceline::{ideal_racing_line, RaceLine, RaceLineParams};

/// Solves the track at `input` and writes its raceline to `output`.
///
/// Nothing is written when reading or solving fails.
pub fn generate_raceline_file(input: &Path, output: &Path, params: &RaceLineParams) -> Result<RaceLine> {
    let track = read_track(input)?;
    let waypoints = track.waypoints();
    log::debug!("{}: {} nodes", input.display(), waypoints.len());
    let line = ideal_racing_line(&waypoints, params)?;
    write_raceline(output, &line)?;
    log::info!(
        "{} -> {} ({} samples, {} iterations{})",
        input.display(),
        output.display(),
        line.points.len(),
        line.iterations,
        if line.converged { "" } else { ", not converged" }
    );
    Ok(line)
}

/// Outcome of a folder run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.failed.len()
    }
}

/// Track files in `folder`, sorted by name.
pub fn track_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_file() && is_track_path(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn process_one(path: PathBuf, params: &RaceLineParams) -> std::result::Result<PathBuf, (PathBuf, String)> {
    let output = raceline_output_path(&path);
    match generate_raceline_file(&path, &output, params) {
        Ok(_) => Ok(output),
        Err(e) => {
            log::warn!("skipping {}: {}", path.display(), e);
            Err((path, e.to_string()))
        }
    }
}

/// Writes `<stem>.raceline.yaml` for every track file in `folder`.
///
/// A failing track is recorded in the report and doesn't stop the others.
pub fn process_folder(folder: &Path, params: &RaceLineParams) -> Result<BatchReport> {
    params.validate()?;
    let files = track_files(folder)?;
    log::info!("processing {} track files in {}", files.len(), folder.display());

    #[cfg(feature = "parallel")]
    let results: Vec<_> = {
        use rayon::prelude::*;
        files.into_par_iter().map(|p| process_one(p, params)).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = files.into_iter().map(|p| process_one(p, params)).collect();

    let mut report = BatchReport::default();
    for result in results {
        match result {
            Ok(out) => report.written.push(out),
            Err(failure) => report.failed.push(failure),
        }
    }
    Ok(report)
}
