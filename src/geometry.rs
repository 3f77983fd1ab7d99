use std::fmt;

/// A pointer position in global logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// An axis-aligned rectangle in global logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Normalises two drag corners into a rectangle.
    ///
    /// Each component is rounded on its own, and a degenerate span still
    /// yields a 1x1 rectangle so there is always at least one pixel to grab.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x1 = a.x.min(b.x);
        let y1 = a.y.min(b.y);
        let x2 = a.x.max(b.x);
        let y2 = a.y.max(b.y);

        let width = ((x2 - x1).round() as i32).max(1);
        let height = ((y2 - y1).round() as i32).max(1);

        Self::new(x1.round() as i32, y1.round() as i32, width, height)
    }

    /// Smallest rectangle containing every non-empty input, or `None`.
    pub fn bounding<I>(rects: I) -> Option<Rect>
    where
        I: IntoIterator<Item = Rect>,
    {
        rects
            .into_iter()
            .filter(|r| !r.is_empty())
            .reduce(|acc, r| acc.union(&r))
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Saturates at `i32::MAX` instead of wrapping.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, p: Point) -> bool {
        !self.is_empty()
            && p.x >= self.x as f64
            && p.y >= self.y as f64
            && p.x < self.right() as f64
            && p.y < self.bottom() as f64
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }

        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        x2 > x1 && y2 > y1
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }

        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        Some(Rect::new(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1)))
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = self.right().max(other.right());
        let y2 = self.bottom().max(other.bottom());

        Rect::new(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1))
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} {}x{}", self.x, self.y, self.width, self.height)
    }
}

impl std::str::FromStr for Rect {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || crate::Error::InvalidGeometry(s.to_string());

        let (xy, wh) = s.trim().split_once(' ').ok_or_else(invalid)?;
        let (x, y) = xy.split_once(',').ok_or_else(invalid)?;
        let (w, h) = wh.trim().split_once('x').ok_or_else(invalid)?;

        let x: i32 = x.parse().map_err(|_| invalid())?;
        let y: i32 = y.parse().map_err(|_| invalid())?;
        let width: i32 = w.parse().map_err(|_| invalid())?;
        let height: i32 = h.parse().map_err(|_| invalid())?;

        // The far edges must stay representable.
        x.checked_add(width).ok_or_else(invalid)?;
        y.checked_add(height).ok_or_else(invalid)?;

        Ok(Rect::new(x, y, width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_parsing() {
        let parsed: Rect = "10,20 300x400".parse().unwrap();
        assert_eq!(parsed, Rect::new(10, 20, 300, 400));

        let negative: Rect = "-1920,0 1920x1080".parse().unwrap();
        assert_eq!(negative.x(), -1920);
    }

    #[test]
    fn test_rect_parsing_rejects_garbage() {
        for bad in ["", "10,20", "10 20x30", "a,b cxd", "10,20 30x"] {
            assert!(bad.parse::<Rect>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 50, 100, 100);

        assert!(a.intersects(&b));
        assert_eq!(a.intersection(&b), Some(Rect::new(50, 50, 50, 50)));
    }

    #[test]
    fn test_from_corners_any_order() {
        let a = Point::new(300.0, 40.0);
        let b = Point::new(100.0, 240.0);
        assert_eq!(Rect::from_corners(a, b), Rect::new(100, 40, 200, 200));
        assert_eq!(Rect::from_corners(b, a), Rect::new(100, 40, 200, 200));
    }

    #[test]
    fn test_from_corners_rounds_and_clamps() {
        let r = Rect::from_corners(Point::new(10.4, 10.6), Point::new(10.6, 10.7));
        assert_eq!(r, Rect::new(10, 11, 1, 1));

        let r = Rect::from_corners(Point::new(0.5, 0.0), Point::new(20.7, 9.4));
        assert_eq!(r.width(), 20);
        assert_eq!(r.height(), 9);
    }

    #[test]
    fn test_bounding_spans_side_by_side_outputs() {
        let left = Rect::new(-1920, 0, 1920, 1080);
        let right = Rect::new(0, -200, 2560, 1440);
        let bounds = Rect::bounding([left, right]).unwrap();
        assert_eq!(bounds, Rect::new(-1920, -200, 4480, 1440));

        assert_eq!(Rect::bounding(Vec::new()), None);
    }

    #[test]
    fn test_contains_is_half_open() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(9.9, 9.9)));
        assert!(!r.contains(Point::new(10.0, 5.0)));
    }
}
