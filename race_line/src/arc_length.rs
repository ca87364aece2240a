//! Cumulative arc-length (station) tables along a waypoint sequence.

use crate::error::{RaceLineError, Result};
use crate::geometry::distance;
use crate::waypoint::{close_loop, distinct_count, Waypoint};
use crate::width::WidthProfile;

/// Cumulative distance along `waypoints`, starting at zero.
///
/// Zero-length steps produce repeated stations rather than errors.
pub fn build_arc_length(waypoints: &[Waypoint]) -> Vec<f64> {
    let mut stations = Vec::with_capacity(waypoints.len());
    let mut total = 0.0;
    if !waypoints.is_empty() {
        stations.push(0.0);
    }
    for pair in waypoints.windows(2) {
        total += distance(pair[0].point(), pair[1].point());
        stations.push(total);
    }
    stations
}

/// A closed waypoint loop together with its strictly increasing stations and
/// gap-filled half-widths, one entry per kept waypoint.
#[derive(Debug, Clone)]
pub struct StationedLoop {
    pub waypoints: Vec<Waypoint>,
    pub stations: Vec<f64>,
    pub widths: WidthProfile,
}

fn explicit(width: Option<f64>) -> Option<f64> {
    width.filter(|w| w.is_finite())
}

impl StationedLoop {
    /// Validates, closes and stations the raw waypoints.
    ///
    /// Widths are filled over the full closed sequence first. Waypoints that
    /// repeat the previous station are then dropped so the result can be used
    /// directly as spline knots; an explicit width on a dropped waypoint
    /// replaces the one kept at that station.
    pub fn build(raw: &[Waypoint]) -> Result<Self> {
        if raw.len() < 2 || distinct_count(raw) < 2 {
            return Err(RaceLineError::DegenerateInput(format!(
                "need at least 2 distinct waypoints, got {}",
                distinct_count(raw)
            )));
        }
        let closed = close_loop(raw);
        let stations = build_arc_length(&closed);
        let total = stations.last().copied().unwrap_or(0.0);
        if total <= 0.0 || !total.is_finite() {
            return Err(RaceLineError::DegenerateInput(format!(
                "track has no usable length ({})",
                total
            )));
        }

        let filled = WidthProfile::from_waypoints(&closed);
        let mut waypoints = Vec::with_capacity(closed.len());
        let mut knots = Vec::with_capacity(closed.len());
        let mut widths = WidthProfile {
            left: Vec::with_capacity(closed.len()),
            right: Vec::with_capacity(closed.len()),
        };
        for (i, (w, s)) in closed.into_iter().zip(stations).enumerate() {
            match knots.last() {
                Some(&prev) if s <= prev => {
                    log::debug!("dropping duplicate waypoint at station {:.3}", s);
                    if let (Some(kept), Some(v)) = (widths.left.last_mut(), explicit(w.width_left)) {
                        *kept = v;
                    }
                    if let (Some(kept), Some(v)) = (widths.right.last_mut(), explicit(w.width_right))
                    {
                        *kept = v;
                    }
                }
                _ => {
                    knots.push(s);
                    widths.left.push(filled.left[i]);
                    widths.right.push(filled.right[i]);
                    waypoints.push(w);
                }
            }
        }
        Ok(Self {
            waypoints,
            stations: knots,
            widths,
        })
    }

    /// Total length of the closed loop.
    pub fn total_length(&self) -> f64 {
        self.stations.last().copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Waypoint> {
        vec![
            Waypoint::new(0.0, 0.0),
            Waypoint::new(10.0, 0.0),
            Waypoint::new(10.0, 10.0),
            Waypoint::new(0.0, 10.0),
        ]
    }

    #[test]
    fn cumulative_distances() {
        let s = build_arc_length(&square());
        assert_eq!(s, vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn empty_input_has_no_stations() {
        assert!(build_arc_length(&[]).is_empty());
    }

    #[test]
    fn loop_is_closed_before_stationing() {
        let sl = StationedLoop::build(&square()).unwrap();
        assert_eq!(sl.stations, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert!((sl.total_length() - 40.0).abs() < 1e-12);
        assert_eq!(sl.waypoints.len(), 5);
    }

    #[test]
    fn duplicate_waypoints_are_removed() {
        let mut pts = square();
        pts.insert(2, Waypoint::new(10.0, 0.0));
        let sl = StationedLoop::build(&pts).unwrap();
        assert_eq!(sl.stations, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert!(sl.stations.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(sl.widths.left.len(), sl.stations.len());
    }

    #[test]
    fn widths_on_duplicates_survive_the_drop() {
        let mut pts = square();
        pts.insert(2, Waypoint::with_widths(10.0, 0.0, 1.0, 2.0));
        let sl = StationedLoop::build(&pts).unwrap();
        assert_eq!(sl.waypoints.len(), 5);
        assert_eq!(sl.widths.left, vec![1.0; 5]);
        assert_eq!(sl.widths.right, vec![2.0; 5]);
    }

    #[test]
    fn later_duplicate_width_wins() {
        let mut pts = square();
        pts[1] = Waypoint::with_widths(10.0, 0.0, 3.0, 3.0);
        pts.insert(2, Waypoint::with_widths(10.0, 0.0, 1.0, 1.0));
        pts[3] = Waypoint::with_widths(10.0, 10.0, 4.0, 4.0);
        let sl = StationedLoop::build(&pts).unwrap();
        assert_eq!(sl.widths.left, vec![4.0, 1.0, 4.0, 4.0, 4.0]);
        assert_eq!(sl.widths.right, vec![4.0, 1.0, 4.0, 4.0, 4.0]);
    }

    #[test]
    fn single_waypoint_is_degenerate() {
        let err = StationedLoop::build(&[Waypoint::new(1.0, 2.0)]).unwrap_err();
        assert!(matches!(err, RaceLineError::DegenerateInput(_)));
    }

    #[test]
    fn coincident_waypoints_are_degenerate() {
        let pts = vec![Waypoint::new(1.0, 2.0), Waypoint::new(1.0, 2.0)];
        let err = StationedLoop::build(&pts).unwrap_err();
        assert!(matches!(err, RaceLineError::DegenerateInput(_)));
    }

    #[test]
    fn two_distinct_points_make_a_loop() {
        let pts = vec![Waypoint::new(0.0, 0.0), Waypoint::new(4.0, 0.0)];
        let sl = StationedLoop::build(&pts).unwrap();
        assert_eq!(sl.stations, vec![0.0, 4.0, 8.0]);
    }
}
