use assert_fs::prelude::*;
use race_line::{
    elevation::{enrich_track, profile_for, read_elevation_config},
    io::track::{read_track, write_track},
};

const TRACK: &str = "\
name: Ring
pit_lane: [1, 2]
nodes:
  - { x: 0.0, y: 0.0, width: 8.0 }
  - { x: 100.0, y: 0.0, width: 8.0, banking: 4.0 }
  - { x: 100.0, y: 100.0, width: 8.0 }
  - { x: 0.0, y: 100.0, width: 8.0 }
raceline:
  - { s: 0.0, x: 1.0, y: 1.0, offset: 1.0 }
  - { s: 200.0, x: 99.0, y: 99.0, offset: 1.0 }
";

const CONFIG: &str = "\
Ring:
  total_elevation_change: 10.0
  smoothing_window: 1
  key_points:
    - { progress: 0.0, elevation: 0.0 }
    - { progress: 0.5, elevation: 10.0 }
  banked_corners:
    - { progress: 0.25, banking: 8.0, name: Turn 1 }
    - { progress: 0.5, banking: 6.0 }
";

#[test]
fn enriches_nodes_and_raceline() {
    let dir = assert_fs::TempDir::new().unwrap();
    let track_file = dir.child("ring.yaml");
    track_file.write_str(TRACK).unwrap();
    let config_file = dir.child("elevation.yaml");
    config_file.write_str(CONFIG).unwrap();

    let config = read_elevation_config(config_file.path()).unwrap();
    let profile = profile_for(&config, "Ring").unwrap();
    let mut track = read_track(track_file.path()).unwrap();
    enrich_track(&mut track, profile).unwrap();

    // open polyline of 300 m: progress 0, 1/3, 2/3, 1
    let z: Vec<f64> = track.nodes.iter().map(|n| n.z).collect();
    assert_eq!(z[0], 0.0);
    assert!((z[1] - 6.667).abs() < 1e-9);
    assert!((z[2] - 6.667).abs() < 1e-9);
    assert_eq!(z[3], 0.0);

    // explicit banking is kept, the others come from the corners
    assert_eq!(track.nodes[1].banking, Some(4.0));
    assert_eq!(track.nodes[0].banking, Some(0.0));

    assert_eq!(track.raceline[0].z, Some(0.0));
    assert_eq!(track.raceline[1].z, Some(z[2]));

    write_track(track_file.path(), &track).unwrap();
    let reread = read_track(track_file.path()).unwrap();
    assert!(reread.extra.contains_key("pit_lane"));
    assert_eq!(reread.nodes[1].z, track.nodes[1].z);
    dir.close().unwrap();
}
