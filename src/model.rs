use serde::{Deserialize, Serialize};

/// Fewest vertices a shape needs before it can be committed.
pub const MIN_POLYGON_POINTS: usize = 3;

// ── Point ───────────────────────────────────────────────────────────────────

/// Pixel coordinate in image space. Serialized as `[x, y]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

// ── Vertex Buffer ───────────────────────────────────────────────────────────

/// The shape currently being drawn. Insertion order is winding order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexBuffer {
    points: Vec<Point>,
}

impl VertexBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Drops the most recent point. Returns it, or `None` when already empty.
    pub fn undo(&mut self) -> Option<Point> {
        self.points.pop()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_committable(&self) -> bool {
        self.points.len() >= MIN_POLYGON_POINTS
    }

    /// Moves the points out, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<Point> {
        std::mem::take(&mut self.points)
    }
}

// ── Polygon ─────────────────────────────────────────────────────────────────

/// A committed, labelled region. Always holds at least three points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPolygon")]
pub struct Polygon {
    label: String,
    points: Vec<Point>,
}

#[derive(Deserialize)]
struct RawPolygon {
    label: String,
    points: Vec<Point>,
}

impl TryFrom<RawPolygon> for Polygon {
    type Error = String;

    fn try_from(raw: RawPolygon) -> Result<Self, Self::Error> {
        let count = raw.points.len();
        Polygon::new(raw.label, raw.points).ok_or_else(|| {
            format!("polygon needs at least {MIN_POLYGON_POINTS} points, got {count}")
        })
    }
}

impl Polygon {
    /// Returns `None` when fewer than three points are given.
    pub fn new(label: impl Into<String>, points: Vec<Point>) -> Option<Self> {
        if points.len() < MIN_POLYGON_POINTS {
            return None;
        }
        Some(Self {
            label: label.into(),
            points,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Mean of the vertices, rounded half-to-even.
    pub fn centroid(&self) -> Point {
        let n = self.points.len() as f64;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0i64, 0i64), |(sx, sy), p| (sx + p.x as i64, sy + p.y as i64));
        Point::new(
            (sx as f64 / n).round_ties_even() as i32,
            (sy as f64 / n).round_ties_even() as i32,
        )
    }
}

// ── Finished-Polygon Set ────────────────────────────────────────────────────

/// Append-only list of committed polygons, keyed by position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolygonSet {
    polygons: Vec<Polygon>,
}

impl PolygonSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends and returns the positional index of the new polygon.
    pub fn push(&mut self, polygon: Polygon) -> usize {
        self.polygons.push(polygon);
        self.polygons.len() - 1
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Polygon> {
        self.polygons.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Polygon> {
        self.polygons.iter()
    }

    pub fn as_slice(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Distinct labels in first-use order.
    pub fn labels(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for p in &self.polygons {
            if !seen.contains(&p.label()) {
                seen.push(p.label());
            }
        }
        seen
    }
}

impl From<Vec<Polygon>> for PolygonSet {
    fn from(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }
}

impl<'a> IntoIterator for &'a PolygonSet {
    type Item = &'a Polygon;
    type IntoIter = std::slice::Iter<'a, Polygon>;

    fn into_iter(self) -> Self::IntoIter {
        self.polygons.iter()
    }
}
