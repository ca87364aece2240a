use assert_fs::prelude::*;
use predicates::prelude::*;
use race_line::{
    batch::{generate_raceline_file, process_folder, track_files},
    io::track::read_raceline,
    RaceLineError, RaceLineParams,
};

const SQUARE: &str = "\
name: Square
nodes:
  - { x: 0.0, y: 0.0, width: 10.0 }
  - { x: 10.0, y: 0.0, width: 10.0 }
  - { x: 10.0, y: 10.0, width: 10.0 }
  - { x: 0.0, y: 10.0, width: 10.0 }
";

fn params() -> RaceLineParams {
    RaceLineParams {
        num_samples: 24,
        max_iterations: 50,
        ..Default::default()
    }
}

#[test]
fn single_file_is_written() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = dir.child("square.yaml");
    input.write_str(SQUARE).unwrap();
    let output = dir.child("square.raceline.yaml");

    let line = generate_raceline_file(input.path(), output.path(), &params()).unwrap();
    output.assert(predicate::str::starts_with("raceline:"));
    let saved = read_raceline(output.path()).unwrap();
    assert_eq!(saved.raceline.len(), 24);
    assert_eq!(saved.raceline.len(), line.points.len());
    assert!(saved.raceline.iter().all(|r| r.offset.abs() <= 5.0 + 1e-9));
    dir.close().unwrap();
}

#[test]
fn failed_solve_writes_nothing() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = dir.child("dot.yaml");
    input.write_str("nodes:\n  - { x: 1.0, y: 1.0 }\n").unwrap();
    let output = dir.child("dot.raceline.yaml");

    let err = generate_raceline_file(input.path(), output.path(), &params()).unwrap_err();
    assert!(matches!(err, RaceLineError::DegenerateInput(_)));
    output.assert(predicate::path::missing());
    dir.close().unwrap();
}

#[test]
fn folder_run_skips_failures_and_outputs() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("a_square.yaml").write_str(SQUARE).unwrap();
    dir.child("b_broken.yaml").write_str("nodes: 12\n").unwrap();
    dir.child("c_old.raceline.yaml").write_str("raceline: []\n").unwrap();
    dir.child("notes.txt").write_str("not a track").unwrap();

    let files = track_files(dir.path()).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["a_square.yaml", "b_broken.yaml"]);

    let report = process_folder(dir.path(), &params()).unwrap();
    assert_eq!(report.total(), 2);
    assert_eq!(report.written, vec![dir.child("a_square.raceline.yaml").path().to_path_buf()]);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].0.ends_with("b_broken.yaml"));
    dir.child("a_square.raceline.yaml").assert(predicate::path::exists());
    dir.child("b_broken.raceline.yaml").assert(predicate::path::missing());
    dir.close().unwrap();
}

#[test]
fn missing_folder_is_an_error() {
    let dir = assert_fs::TempDir::new().unwrap();
    let err = process_folder(&dir.path().join("nope"), &params()).unwrap_err();
    assert!(matches!(err, RaceLineError::Io(_)));
}

#[test]
fn invalid_params_fail_before_reading() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("a.yaml").write_str(SQUARE).unwrap();
    let bad = RaceLineParams {
        num_samples: 0,
        ..Default::default()
    };
    let err = process_folder(dir.path(), &bad).unwrap_err();
    assert!(matches!(err, RaceLineError::InvalidParameter(_)));
    dir.child("a.raceline.yaml").assert(predicate::path::missing());
}
