//! Geometry helpers shared by every pipeline stage.
//!
//! Detector boxes arrive as axis-aligned rectangles, OCR boxes as 4-point
//! polygons (or rectangles, depending on the OCR backend). Both are folded
//! into [`Shape`] so fusion, matching and masking can treat them alike.

use serde::{Deserialize, Serialize};

/// A point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::default()
    }

    pub fn is_origin(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Axis-aligned rectangle `(x1, y1, x2, y2)` in pixels.
///
/// Detectors promise `x1 < x2` and `y1 < y2` but we do not rely on it:
/// [`Rect::normalized`] swaps inverted corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Same rectangle with `x1 <= x2` and `y1 <= y2`.
    pub fn normalized(&self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    /// Integer corners, truncated toward zero like detector pixel indices.
    pub fn to_pixels(&self) -> (i32, i32, i32, i32) {
        let r = self.normalized();
        (r.x1 as i32, r.y1 as i32, r.x2 as i32, r.y2 as i32)
    }

    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }
}

impl From<[f64; 4]> for Rect {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rect> for [f64; 4] {
    fn from(r: Rect) -> Self {
        [r.x1, r.y1, r.x2, r.y2]
    }
}

/// Region covered by an OCR fragment or a detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Shape {
    Rect(Rect),
    Polygon(Vec<[f64; 2]>),
}

impl Shape {
    pub fn polygon(points: &[(f64, f64)]) -> Self {
        Shape::Polygon(points.iter().map(|&(x, y)| [x, y]).collect())
    }

    /// Midpoint for rectangles, vertex centroid for polygons.
    ///
    /// An empty polygon yields the origin; callers treat `(0, 0)` as unknown.
    pub fn center(&self) -> Point {
        match self {
            Shape::Rect(r) => r.center(),
            Shape::Polygon(points) => {
                if points.is_empty() {
                    return Point::origin();
                }
                let n = points.len() as f64;
                let (sx, sy) = points
                    .iter()
                    .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
                Point::new(sx / n, sy / n)
            }
        }
    }

    /// Smallest axis-aligned rectangle containing the shape, if any.
    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            Shape::Rect(r) => Some(r.normalized()),
            Shape::Polygon(points) if points.is_empty() => None,
            Shape::Polygon(points) => {
                let (min_x, min_y, max_x, max_y) = points.iter().fold(
                    (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
                    |(min_x, min_y, max_x, max_y), p| {
                        (min_x.min(p[0]), min_y.min(p[1]), max_x.max(p[0]), max_y.max(p[1]))
                    },
                );
                Some(Rect::new(min_x, min_y, max_x, max_y))
            }
        }
    }

    /// A shape we cannot locate: empty polygon or non-finite coordinates.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Shape::Rect(r) => !r.is_finite(),
            Shape::Polygon(points) => {
                points.is_empty() || points.iter().any(|p| !p[0].is_finite() || !p[1].is_finite())
            }
        }
    }
}

impl From<Rect> for Shape {
    fn from(r: Rect) -> Self {
        Shape::Rect(r)
    }
}

/// Euclidean distance between two points.
pub fn distance(p1: Point, p2: Point) -> f64 {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_center() {
        let r = Rect::new(10.0, 20.0, 30.0, 60.0);
        assert_eq!(r.center(), Point::new(20.0, 40.0));
    }

    #[test]
    fn test_inverted_rect_is_normalized() {
        let r = Rect::new(30.0, 60.0, 10.0, 20.0).normalized();
        assert_eq!(r, Rect::new(10.0, 20.0, 30.0, 60.0));
        assert_eq!(Rect::new(30.0, 60.0, 10.0, 20.0).to_pixels(), (10, 20, 30, 60));
    }

    #[test]
    fn test_polygon_center() {
        let shape = Shape::polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 4.0), (0.0, 4.0)]);
        assert_eq!(shape.center(), Point::new(5.0, 2.0));
    }

    #[test]
    fn test_empty_polygon_centers_at_origin() {
        let shape = Shape::Polygon(vec![]);
        assert!(shape.center().is_origin());
        assert!(shape.is_degenerate());
        assert!(shape.bounding_rect().is_none());
    }

    #[test]
    fn test_distance() {
        let d = distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_shape_deserializes_both_layouts() {
        let rect: Shape = serde_json::from_str("[1, 2, 3, 4]").unwrap();
        assert_eq!(rect, Shape::Rect(Rect::new(1.0, 2.0, 3.0, 4.0)));

        let poly: Shape = serde_json::from_str("[[0,0],[4,0],[4,2],[0,2]]").unwrap();
        assert_eq!(poly.center(), Point::new(2.0, 1.0));
    }
}
