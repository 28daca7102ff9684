use super::{Point3, Vector3, TOLERANCE};

/// Closest point on a triangle `(a, b, c)` to the query point `p`.
///
/// Returns the closest point together with its barycentric coordinates
/// `[u, v, w]` such that `closest = u*a + v*b + w*c` and `u + v + w = 1`.
/// Works for points inside the triangle's prism as well as points whose
/// projection falls outside (the result is clamped to an edge or corner).
///
/// Walks the triangle's Voronoi regions: corner regions first, then edge
/// regions, then the face interior. Degenerate (near zero-area) triangles
/// collapse to their closest edge or corner.
#[must_use]
pub fn closest_point_on_triangle(
    p: &Point3,
    a: &Point3,
    b: &Point3,
    c: &Point3,
) -> (Point3, [f64; 3]) {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (*a, [1.0, 0.0, 0.0]);
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (*b, [0.0, 1.0, 0.0]);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let t = clamped_ratio(d1, d1 - d3);
        return (a + ab * t, [1.0 - t, t, 0.0]);
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (*c, [0.0, 0.0, 1.0]);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let t = clamped_ratio(d2, d2 - d6);
        return (a + ac * t, [1.0 - t, 0.0, t]);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let t = clamped_ratio(d4 - d3, (d4 - d3) + (d5 - d6));
        let bc: Vector3 = c - b;
        return (b + bc * t, [0.0, 1.0 - t, t]);
    }

    // Interior of the face
    let denom = va + vb + vc;
    if denom.abs() < TOLERANCE {
        // Zero-area triangle whose edge regions all rejected: fall back
        // to the nearest corner.
        return (*a, [1.0, 0.0, 0.0]);
    }
    let v = vb / denom;
    let w = vc / denom;
    (a + ab * v + ac * w, [1.0 - v - w, v, w])
}

/// Squared distance from `p` to the triangle `(a, b, c)`.
#[must_use]
pub fn point_triangle_distance_squared(p: &Point3, a: &Point3, b: &Point3, c: &Point3) -> f64 {
    let (closest, _) = closest_point_on_triangle(p, a, b, c);
    (p - closest).norm_squared()
}

fn clamped_ratio(num: f64, denom: f64) -> f64 {
    if denom.abs() < TOLERANCE {
        0.0
    } else {
        (num / denom).clamp(0.0, 1.0)
    }
}
