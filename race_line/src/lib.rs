//! Core library for computing ideal racing lines through closed tracks.

pub mod arc_length;
pub mod batch;
pub mod centerline;
pub mod config;
pub mod cost;
pub mod elevation;
pub mod error;
pub mod geometry;
pub mod io;
pub mod optimize;
pub mod raceline;
pub mod spline;
pub mod waypoint;
pub mod width;

pub use error::{RaceLineError, Result};
pub use raceline::{ideal_racing_line, ideal_racing_line_with, RaceLine, RaceLineParams, RaceLinePoint};
pub use waypoint::Waypoint;
