use super::vector::Vec3;

/// Closest point on the solid triangle `abc` to `p`.
///
/// Walks the seven Voronoi regions of the triangle: the three vertex
/// regions, the three edge regions and the interior. Region boundaries are
/// the usual dot-product inequalities, with ties resolved toward the
/// vertex regions first, then the edges. Zero-length edges never select
/// their edge region, so degenerate triangles still return an exact point.
pub fn closest_point_on_triangle(p: &Vec3, a: &Vec3, b: &Vec3, c: &Vec3) -> Vec3 {
    let ab = *b - *a;
    let ac = *c - *a;

    let ap = *p - *a;
    let ab_ap = ab.dot(&ap);
    let ac_ap = ac.dot(&ap);
    if ab_ap <= 0.0 && ac_ap <= 0.0 {
        return *a;
    }

    let bp = *p - *b;
    let ab_bp = ab.dot(&bp);
    let ac_bp = ac.dot(&bp);
    if ab_bp >= 0.0 && ac_bp <= ab_bp {
        return *b;
    }

    let cp = *p - *c;
    let ab_cp = ab.dot(&cp);
    let ac_cp = ac.dot(&cp);
    if ac_cp >= 0.0 && ab_cp <= ac_cp {
        return *c;
    }

    // Edge ab. Each barycentric weight is a difference of products, so it
    // is compared against the rounding error of that difference.
    let lambda_c = ab_ap * ac_bp - ab_bp * ac_ap;
    let denom_ab = ab_ap - ab_bp;
    if nonpositive(lambda_c, ab_ap * ac_bp, ab_bp * ac_ap)
        && ab_ap >= 0.0
        && ab_bp <= 0.0
        && denom_ab > 0.0
    {
        return *a + (ab_ap / denom_ab) * ab;
    }

    // Edge ac.
    let lambda_b = ab_cp * ac_ap - ab_ap * ac_cp;
    let denom_ac = ac_ap - ac_cp;
    if nonpositive(lambda_b, ab_cp * ac_ap, ab_ap * ac_cp)
        && ac_ap >= 0.0
        && ac_cp <= 0.0
        && denom_ac > 0.0
    {
        return *a + (ac_ap / denom_ac) * ac;
    }

    // Edge bc.
    let lambda_a = ab_bp * ac_cp - ab_cp * ac_bp;
    let bc_b = ac_bp - ab_bp;
    let bc_c = ab_cp - ac_cp;
    if nonpositive(lambda_a, ab_bp * ac_cp, ab_cp * ac_bp)
        && bc_b >= 0.0
        && bc_c >= 0.0
        && bc_b + bc_c > 0.0
    {
        return *b + (bc_b / (bc_b + bc_c)) * (*c - *b);
    }

    // The weights sum to |ab x ac|^2; a vanishing sum means a flat triangle.
    let sum = lambda_a + lambda_b + lambda_c;
    if sum <= ROUNDING * ab.length_squared() * ac.length_squared() {
        return nearest_on_edges(p, a, b, c);
    }
    (lambda_a * *a + lambda_b * *b + lambda_c * *c) / sum
}

const ROUNDING: f64 = 1e-12;

fn nonpositive(value: f64, lhs: f64, rhs: f64) -> bool {
    value <= ROUNDING * (lhs.abs() + rhs.abs())
}

fn nearest_on_edges(p: &Vec3, a: &Vec3, b: &Vec3, c: &Vec3) -> Vec3 {
    let on_segment = |s: &Vec3, e: &Vec3| {
        let d = *e - *s;
        let len2 = d.length_squared();
        if len2 == 0.0 {
            return *s;
        }
        *s + ((*p - *s).dot(&d) / len2).clamp(0.0, 1.0) * d
    };
    [on_segment(a, b), on_segment(b, c), on_segment(c, a)]
        .into_iter()
        .min_by(|u, v| p.distance_to(u).total_cmp(&p.distance_to(v)))
        .unwrap_or(*a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> (Vec3, Vec3, Vec3) {
        (Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0))
    }

    #[test]
    fn test_interior_projects_onto_plane() {
        let (a, b, c) = tri();
        let q = closest_point_on_triangle(&Vec3::new(0.5, 0.5, 3.0), &a, &b, &c);
        approx::assert_abs_diff_eq!(q, Vec3::new(0.5, 0.5, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_vertex_regions() {
        let (a, b, c) = tri();
        approx::assert_abs_diff_eq!(
            closest_point_on_triangle(&Vec3::new(-1.0, -1.0, 0.0), &a, &b, &c),
            a
        );
        approx::assert_abs_diff_eq!(
            closest_point_on_triangle(&Vec3::new(5.0, -1.0, 1.0), &a, &b, &c),
            b
        );
        approx::assert_abs_diff_eq!(
            closest_point_on_triangle(&Vec3::new(-1.0, 5.0, 1.0), &a, &b, &c),
            c
        );
    }

    #[test]
    fn test_edge_regions() {
        let (a, b, c) = tri();
        let on_ab = closest_point_on_triangle(&Vec3::new(1.0, -3.0, 0.0), &a, &b, &c);
        approx::assert_abs_diff_eq!(on_ab, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        let on_ac = closest_point_on_triangle(&Vec3::new(-3.0, 1.0, 0.0), &a, &b, &c);
        approx::assert_abs_diff_eq!(on_ac, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        let on_bc = closest_point_on_triangle(&Vec3::new(2.0, 2.0, 0.0), &a, &b, &c);
        approx::assert_abs_diff_eq!(on_bc, Vec3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_collinear_triangle() {
        let a = Vec3::ZERO;
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(3.0, 0.0, 0.0);
        let q = closest_point_on_triangle(&Vec3::new(2.0, 1.0, 0.0), &a, &b, &c);
        approx::assert_abs_diff_eq!(q, Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_point_triangle() {
        let a = Vec3::new(1.0, 1.0, 1.0);
        let q = closest_point_on_triangle(&Vec3::ZERO, &a, &a, &a);
        assert_eq!(q, a);
    }
}
