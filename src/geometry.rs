use crate::types::Point;

/// Euclidean distance on raw coordinate deltas. No geodesic correction.
pub fn planar_distance(p1: Point, p2: Point) -> f64 {
    (p2.latitude - p1.latitude).hypot(p2.longitude - p1.longitude)
}

/// Cosine of the angle at `origin` between the rays to `a` and `b`.
///
/// Returns `None` when `origin` coincides with either point, since the angle
/// is undefined there.
pub fn direction_cosine(origin: Point, a: Point, b: Point) -> Option<f64> {
    let (ax, ay) = (a.latitude - origin.latitude, a.longitude - origin.longitude);
    let (bx, by) = (b.latitude - origin.latitude, b.longitude - origin.longitude);

    let len_a = ax.hypot(ay);
    let len_b = bx.hypot(by);
    if len_a == 0.0 || len_b == 0.0 {
        return None;
    }

    // rounding can push |cos| slightly past 1
    Some(((ax * bx + ay * by) / (len_a * len_b)).clamp(-1.0, 1.0))
}
