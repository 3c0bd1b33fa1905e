use kurbo::{BezPath, Line, ParamCurveNearest, Point, Rect};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new_default() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

/// Distance from `p` to the closest point of any segment in `points`.
///
/// `closed` adds the segment from the last point back to the first.
pub(crate) fn polyline_distance(points: &[Point], closed: bool, p: Point) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => only.distance(p),
        _ => {
            let mut best = f64::INFINITY;
            for pair in points.windows(2) {
                best = best.min(segment_distance(pair[0], pair[1], p));
            }
            if closed && let (Some(&first), Some(&last)) = (points.first(), points.last()) {
                best = best.min(segment_distance(last, first, p));
            }
            best
        }
    }
}

pub(crate) fn segment_distance(a: Point, b: Point, p: Point) -> f64 {
    if a == b {
        return a.distance(p);
    }
    Line::new(a, b).nearest(p, 1e-9).distance_sq.sqrt()
}

/// Build a closed (or open) path through `points`.
pub(crate) fn path_through(points: &[Point], closed: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.iter();
    if let Some(&first) = iter.next() {
        path.move_to(first);
        for &p in iter {
            path.line_to(p);
        }
        if closed {
            path.close_path();
        }
    }
    path
}

/// Axis-aligned bounds of a point set. Empty input yields `Rect::ZERO`.
pub(crate) fn bounds_of(points: &[Point]) -> Rect {
    let mut iter = points.iter();
    let Some(&first) = iter.next() else {
        return Rect::ZERO;
    };
    iter.fold(Rect::from_points(first, first), |acc, &p| acc.union_pt(p))
}

/// Arithmetic mean of a point set. Empty input yields the origin.
pub(crate) fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::ORIGIN;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}

/// Convex hull in counter-clockwise order (Andrew's monotone chain).
pub(crate) fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    fn cross(o: Point, a: Point, b: Point) -> f64 {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    }

    let mut lower: Vec<Point> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<Point> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
