//! Planar coordinate type and axis-aligned rectangles.
//!
//! Vertex positions in the graph description are projected planar
//! coordinates, not WGS-84, so all arithmetic here is plain Euclidean `f64`.

/// A planar position.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Axis-aligned rectangle given by its bottom-left and top-right corners.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub bottom_left: Point,
    pub top_right:   Point,
}

impl Rect {
    #[inline]
    pub fn new(bottom_left: Point, top_right: Point) -> Self {
        Self { bottom_left, top_right }
    }

    /// Smallest rectangle enclosing every point.  `None` for an empty input.
    pub fn bounding<I>(points: I) -> Option<Rect>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min, mut max) = (first, first);
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Rect::new(min, max))
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.top_right.x - self.bottom_left.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.top_right.y - self.bottom_left.y
    }

    /// Closed containment test on both axes.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.bottom_left.x
            && p.x <= self.top_right.x
            && p.y >= self.bottom_left.y
            && p.y <= self.top_right.y
    }

    /// Split into `n` equal-width vertical strips, ordered left to right.
    ///
    /// Strip `i` spans `[min_x + i*w, min_x + (i+1)*w]` horizontally and the
    /// full height vertically.  The last strip's right edge is pinned to
    /// `top_right.x` so rounding never shrinks the covered area.
    pub fn vertical_strips(&self, n: usize) -> Vec<Rect> {
        if n == 0 {
            return Vec::new();
        }
        let w = self.width() / n as f64;
        (0..n)
            .map(|i| {
                let left  = self.bottom_left.x + i as f64 * w;
                let right = if i + 1 == n {
                    self.top_right.x
                } else {
                    self.bottom_left.x + (i + 1) as f64 * w
                };
                Rect::new(
                    Point::new(left, self.bottom_left.y),
                    Point::new(right, self.top_right.y),
                )
            })
            .collect()
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {}]", self.bottom_left, self.top_right)
    }
}
