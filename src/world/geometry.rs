use glam::{DVec2, DVec3, IVec2};
use smallvec::SmallVec;

/// 2-D line segment in grid units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub p1: DVec2,
    pub p2: DVec2,
}

impl Line {
    pub fn new(p1: DVec2, p2: DVec2) -> Self {
        Self { p1, p2 }
    }

    /// Segment starting at `origin`, pointing along `angle` (radians, CCW from +X).
    pub fn from_angle(origin: DVec2, angle: f64, length: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            p1: origin,
            p2: origin + DVec2::new(c, s) * length,
        }
    }

    #[inline]
    pub fn angle(&self) -> f64 {
        let d = self.p2 - self.p1;
        d.y.atan2(d.x)
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.p1.distance(self.p2)
    }
}

/// 3-D line segment; `z` is measured in grid-cell heights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line3d {
    pub p1: DVec3,
    pub p2: DVec3,
}

impl Line3d {
    pub fn new(p1: DVec3, p2: DVec3) -> Self {
        Self { p1, p2 }
    }

    /// Segment of 3-D `length` from `origin` along `heading`/`pitch`.
    pub fn from_angle(origin: DVec3, heading: f64, pitch: f64, length: f64) -> Self {
        let (sp, cp) = pitch.sin_cos();
        let (sh, ch) = heading.sin_cos();
        let base = length * cp;
        Self {
            p1: origin,
            p2: origin + DVec3::new(base * ch, base * sh, length * sp),
        }
    }

    /// Like [`Line3d::from_angle`], but `base_length` is measured on the XY
    /// plane and the Z rise follows from the pitch.
    pub fn from_base_angle(origin: DVec3, heading: f64, pitch: f64, base_length: f64) -> Self {
        let (sh, ch) = heading.sin_cos();
        Self {
            p1: origin,
            p2: origin
                + DVec3::new(
                    base_length * ch,
                    base_length * sh,
                    base_length * pitch.tan(),
                ),
        }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.p1.distance(self.p2)
    }

    /// Angle on the XY plane (radians).
    #[inline]
    pub fn heading(&self) -> f64 {
        let d = self.p2 - self.p1;
        d.y.atan2(d.x)
    }

    /// Elevation above the XY plane (radians).
    #[inline]
    pub fn pitch(&self) -> f64 {
        let d = self.p2 - self.p1;
        d.z.atan2(d.truncate().length())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: DVec2,
    pub radius: f64,
}

/// Half-open screen or texture rectangle: `min` inclusive, `max` exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min: IVec2,
    pub max: IVec2,
}

impl Rect {
    #[inline]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: IVec2::new(x0, y0),
            max: IVec2::new(x1, y1),
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    #[inline]
    pub fn contains(&self, p: IVec2) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }
}

/*──────────────────────── intersections ─────────────────────────*/

/// Intersection point of two segments, `None` if parallel or disjoint.
pub fn line_intersection(a: Line, b: Line) -> Option<DVec2> {
    let da = a.p1 - a.p2;
    let db = b.p1 - b.p2;
    let denom = da.x * db.y - da.y * db.x;
    if denom == 0.0 {
        return None;
    }

    let ab = a.p1 - b.p1;
    let t = (ab.x * db.y - ab.y * db.x) / denom;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let u = -(da.x * ab.y - da.y * ab.x) / denom;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    Some(a.p1 + (a.p2 - a.p1) * t)
}

/// Points where `line` crosses `circle`.
///
/// With `segment_only` the hits are limited to the segment itself,
/// otherwise the line is treated as infinite.
pub fn line_circle_intersection(
    line: Line,
    circle: Circle,
    segment_only: bool,
) -> SmallVec<[DVec2; 2]> {
    let mut out = SmallVec::new();

    let d = line.p2 - line.p1;
    let f = line.p1 - circle.center;
    let a = d.length_squared();
    if a == 0.0 {
        return out;
    }
    let b = 2.0 * f.dot(d);
    let c = f.length_squared() - circle.radius * circle.radius;

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return out;
    }

    let root = disc.sqrt();
    let t1 = (-b - root) / (2.0 * a);
    let t2 = (-b + root) / (2.0 * a);

    for t in [t1, t2] {
        if segment_only && !(0.0..=1.0).contains(&t) {
            continue;
        }
        let p = line.p1 + d * t;
        // tangent hit: both roots land on the same point
        if out.last() == Some(&p) {
            continue;
        }
        out.push(p);
    }
    out
}

/*──────────────────────── scalar helpers ────────────────────────*/

#[inline]
pub fn dist_squared(a: DVec2, b: DVec2) -> f64 {
    a.distance_squared(b)
}

#[inline]
pub fn radians(degrees: f64) -> f64 {
    degrees.to_radians()
}

#[inline]
pub fn degrees(radians: f64) -> f64 {
    radians.to_degrees()
}

/// Length of the leg opposite `angle` in a right triangle with the given
/// adjacent leg.
#[inline]
pub fn opposite_leg(angle: f64, adjacent: f64) -> f64 {
    adjacent * angle.tan()
}

/// Unit-free polar → cartesian.
#[inline]
pub fn polar(angle: f64, length: f64) -> DVec2 {
    let (s, c) = angle.sin_cos();
    DVec2::new(c, s) * length
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
