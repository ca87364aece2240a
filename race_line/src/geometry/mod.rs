//! Basic geometry primitives for track computations.

/// Representation of a 2D point.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Calculates the Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    distance_squared(a, b).sqrt()
}

/// Squared Euclidean distance, used where only comparisons are needed.
pub fn distance_squared(a: Point, b: Point) -> f64 {
    (b.x - a.x).powi(2) + (b.y - a.y).powi(2)
}

/// Normalizes `(dx, dy)`, clamping a zero length to `min_len`.
pub fn unit(dx: f64, dy: f64, min_len: f64) -> (f64, f64) {
    let mut len = dx.hypot(dy);
    if len == 0.0 {
        len = min_len;
    }
    (dx / len, dy / len)
}

/// Rotates a direction 90 degrees counter-clockwise, giving the left normal.
pub fn left_normal(tx: f64, ty: f64) -> (f64, f64) {
    (-ty, tx)
}

/// Representation of a series of connected line segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub vertices: Vec<Point>,
}

impl Polyline {
    /// Creates a new polyline from a list of vertices.
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Returns the total length of all segments in the polyline.
    pub fn length(&self) -> f64 {
        self.vertices
            .windows(2)
            .map(|pair| distance(pair[0], pair[1]))
            .sum()
    }

    /// Index of the vertex closest to `p`, or `None` for an empty polyline.
    pub fn nearest_vertex(&self, p: Point) -> Option<usize> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (i, distance_squared(*v, p)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_three_four_five() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(distance(a, b), 5.0);
        assert_eq!(distance_squared(a, b), 25.0);
    }

    #[test]
    fn unit_clamps_zero_length() {
        let (ux, uy) = unit(0.0, 0.0, 1e-9);
        assert_eq!((ux, uy), (0.0, 0.0));
        let (ux, uy) = unit(3.0, 4.0, 1e-9);
        assert!((ux - 0.6).abs() < 1e-12);
        assert!((uy - 0.8).abs() < 1e-12);
    }

    #[test]
    fn left_normal_points_left() {
        assert_eq!(left_normal(1.0, 0.0), (-0.0, 1.0));
        assert_eq!(left_normal(0.0, 1.0), (-1.0, 0.0));
    }

    #[test]
    fn polyline_length() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 4.0),
            Point::new(6.0, 8.0),
        ];
        let pl = Polyline::new(pts);
        assert!((pl.length() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn polyline_nearest_vertex() {
        let pl = Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ]);
        assert_eq!(pl.nearest_vertex(Point::new(9.0, 1.0)), Some(1));
        assert_eq!(pl.nearest_vertex(Point::new(9.0, 8.0)), Some(2));
        assert_eq!(Polyline::new(Vec::new()).nearest_vertex(Point::new(0.0, 0.0)), None);
    }
}
