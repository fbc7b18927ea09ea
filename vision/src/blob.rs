use imageproc::geometry::arc_length;
use imageproc::point::Point;
use imageproc::rect::Rect;
use std::f64::consts::PI;

/// A candidate cap: the outer boundary of one connected mask region plus the
/// shape measurements derived from it.
#[derive(Debug, Clone)]
pub struct Blob {
    /// Boundary pixels in traversal order, implicitly closed.
    pub outline: Vec<Point<i32>>,
    /// Enclosed polygon area in pixels (shoelace).
    pub area: f64,
    pub perimeter: f64,
    pub bounding_rect: Rect,
    /// First-moment center, `None` when the outline encloses no area.
    pub centroid: Option<(f64, f64)>,
    /// `4π·area / perimeter²`, 1.0 for a perfect circle.
    pub circularity: f64,
    /// Bounding box width over height.
    pub aspect_ratio: f64,
}

impl Blob {
    /// Measure a closed outline. Returns `None` for an empty point list.
    pub fn from_outline(outline: Vec<Point<i32>>) -> Option<Self> {
        let bounding_rect = bounding_rect(&outline)?;
        let moments = Moments::of_polygon(&outline);
        let area = moments.m00.abs();
        let perimeter = arc_length(&outline, true);

        let centroid = if moments.m00 != 0.0 {
            Some((moments.m10 / moments.m00, moments.m01 / moments.m00))
        } else {
            None
        };

        let circularity = if perimeter > 0.0 {
            4.0 * PI * area / (perimeter * perimeter)
        } else {
            0.0
        };
        let aspect_ratio = bounding_rect.width() as f64 / bounding_rect.height() as f64;

        Some(Self {
            outline,
            area,
            perimeter,
            bounding_rect,
            centroid,
            circularity,
            aspect_ratio,
        })
    }

    /// Roundness test, computed for every blob but not used to reject any.
    pub fn looks_round(&self) -> bool {
        self.circularity > 0.5 && self.aspect_ratio > 0.5 && self.aspect_ratio < 2.0
    }
}

/// Raw spatial moments of a polygon, via Green's theorem over its edges.
/// `m00` is signed by winding direction; the centroid ratio cancels it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Moments {
    m00: f64,
    m10: f64,
    m01: f64,
}

impl Moments {
    fn of_polygon(points: &[Point<i32>]) -> Self {
        let n = points.len();
        if n < 3 {
            return Self::default();
        }

        let mut acc = Self::default();
        for i in 0..n {
            let p = points[i];
            let q = points[(i + 1) % n];
            let (xi, yi) = (p.x as f64, p.y as f64);
            let (xj, yj) = (q.x as f64, q.y as f64);
            let cross = xi * yj - xj * yi;
            acc.m00 += cross;
            acc.m10 += cross * (xi + xj);
            acc.m01 += cross * (yi + yj);
        }

        Self {
            m00: acc.m00 / 2.0,
            m10: acc.m10 / 6.0,
            m01: acc.m01 / 6.0,
        }
    }
}

/// Smallest axis-aligned rectangle containing every point, inclusive of the
/// far edge pixels.
fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(
        Rect::at(min_x, min_y)
            .of_size((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32),
    )
}
