//! Sibling circle packing.
//!
//! Places a set of circles so that no two of them overlap, keeping the
//! arrangement compact.
//!
//! # Algorithm
//!
//! Circles are placed largest-first. The first sits at the origin, the
//! second touches it on the right. Every further circle is tried in each
//! position where it touches two already placed circles; of the positions
//! that overlap nothing, the one closest to the area-weighted centroid of
//! the placed circles wins. If no tangent position is free the circle is
//! appended to the right of everything placed so far.
//!
//! The output is deterministic for a given input.

use std::cmp::Ordering;

/// Relative tolerance when checking a tangent candidate against placed circles.
const TOUCH_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
struct Placed {
    x: f64,
    y: f64,
    r: f64,
}

/// Pack circles with the given radii.
///
/// Returns one center per input radius, in input order. Centers of any two
/// circles are at least `r_i + r_j` apart, up to a relative rounding error
/// of [`TOUCH_TOLERANCE`].
pub fn pack_siblings(radii: &[f64]) -> Vec<[f64; 2]> {
    let mut centers = vec![[0.0, 0.0]; radii.len()];
    if radii.len() < 2 {
        return centers;
    }

    let mut order: Vec<usize> = (0..radii.len()).collect();
    order.sort_by(|&a, &b| {
        radii[b]
            .partial_cmp(&radii[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut placed: Vec<Placed> = Vec::with_capacity(radii.len());
    placed.push(Placed {
        x: 0.0,
        y: 0.0,
        r: radii[order[0]],
    });
    placed.push(Placed {
        x: radii[order[0]] + radii[order[1]],
        y: 0.0,
        r: radii[order[1]],
    });

    for &idx in &order[2..] {
        let r = radii[idx];
        let (x, y) = place_next(&placed, r);
        placed.push(Placed { x, y, r });
    }

    for (slot, &idx) in order.iter().enumerate() {
        centers[idx] = [placed[slot].x, placed[slot].y];
    }
    centers
}

/// Pick the position for a circle of radius `r` next to `placed`.
fn place_next(placed: &[Placed], r: f64) -> (f64, f64) {
    let (cx, cy) = centroid(placed);

    let mut best: Option<(f64, f64, f64)> = None;
    for (i, a) in placed.iter().enumerate() {
        for b in &placed[i + 1..] {
            for (x, y) in tangent_positions(a, b, r).into_iter().flatten() {
                if !is_free(placed, x, y, r) {
                    continue;
                }
                let score = (x - cx).hypot(y - cy);
                if best.is_none_or(|(best_score, _, _)| score < best_score) {
                    best = Some((score, x, y));
                }
            }
        }
    }

    match best {
        Some((_, x, y)) => (x, y),
        None => {
            let right = placed
                .iter()
                .map(|p| p.x + p.r)
                .fold(f64::NEG_INFINITY, f64::max);
            (right + r, cy)
        }
    }
}

/// Area-weighted centroid of the placed circles.
fn centroid(placed: &[Placed]) -> (f64, f64) {
    let (mut sx, mut sy, mut total) = (0.0, 0.0, 0.0);
    for p in placed {
        let weight = p.r * p.r;
        sx += p.x * weight;
        sy += p.y * weight;
        total += weight;
    }
    if total > 0.0 {
        (sx / total, sy / total)
    } else {
        (0.0, 0.0)
    }
}

/// The (up to two) centers where a circle of radius `r` touches both `a` and `b`.
fn tangent_positions(a: &Placed, b: &Placed, r: f64) -> [Option<(f64, f64)>; 2] {
    let da = a.r + r;
    let db = b.r + r;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d = dx.hypot(dy);

    if d <= f64::EPSILON || d > da + db || d < (da - db).abs() {
        return [None, None];
    }

    let along = (da * da - db * db + d * d) / (2.0 * d);
    let h = (da * da - along * along).max(0.0).sqrt();
    let (ux, uy) = (dx / d, dy / d);
    let (px, py) = (a.x + along * ux, a.y + along * uy);

    [
        Some((px - h * uy, py + h * ux)),
        Some((px + h * uy, py - h * ux)),
    ]
}

fn is_free(placed: &[Placed], x: f64, y: f64, r: f64) -> bool {
    placed.iter().all(|p| {
        let min_dist = p.r + r;
        (p.x - x).hypot(p.y - y) >= min_dist - TOUCH_TOLERANCE * min_dist.max(1.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_no_overlap(radii: &[f64], centers: &[[f64; 2]]) {
        for i in 0..radii.len() {
            for j in (i + 1)..radii.len() {
                let d = (centers[i][0] - centers[j][0]).hypot(centers[i][1] - centers[j][1]);
                let min = radii[i] + radii[j];
                assert!(
                    d >= min - 1e-9 * min.max(1.0),
                    "circles {i} and {j} overlap: distance {d} < {min}"
                );
            }
        }
    }

    #[test]
    fn test_empty_and_single() {
        assert!(pack_siblings(&[]).is_empty());
        assert_eq!(pack_siblings(&[5.0]), vec![[0.0, 0.0]]);
    }

    #[test]
    fn test_two_circles_touch() {
        let centers = pack_siblings(&[3.0, 4.0]);
        let d = (centers[0][0] - centers[1][0]).hypot(centers[0][1] - centers[1][1]);
        assert!((d - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_equal_circles() {
        let radii = vec![10.0; 7];
        let centers = pack_siblings(&radii);
        assert_no_overlap(&radii, &centers);

        // Tangent placement keeps the cluster compact.
        let (cx, cy) = centroid(
            &centers
                .iter()
                .map(|c| Placed { x: c[0], y: c[1], r: 10.0 })
                .collect::<Vec<_>>(),
        );
        for c in &centers {
            assert!((c[0] - cx).hypot(c[1] - cy) <= 40.0);
        }
    }

    #[test]
    fn test_mixed_sizes() {
        let radii = [1.0, 25.0, 3.5, 7.0, 0.5, 12.0, 12.0, 2.0, 40.0, 6.0];
        let centers = pack_siblings(&radii);
        assert_eq!(centers.len(), radii.len());
        assert_no_overlap(&radii, &centers);
    }

    #[test]
    fn test_zero_radii() {
        let radii = [0.0, 0.0, 0.0];
        let centers = pack_siblings(&radii);
        assert_no_overlap(&radii, &centers);
    }

    #[test]
    fn test_deterministic() {
        let radii = [4.0, 9.0, 1.0, 9.0, 3.0];
        assert_eq!(pack_siblings(&radii), pack_siblings(&radii));
    }

    #[test]
    fn test_tangent_positions_touch_both() {
        let a = Placed { x: 0.0, y: 0.0, r: 2.0 };
        let b = Placed { x: 5.0, y: 0.0, r: 3.0 };
        for (x, y) in tangent_positions(&a, &b, 1.0).into_iter().flatten() {
            assert!((x.hypot(y) - 3.0).abs() < 1e-12);
            assert!(((x - 5.0).hypot(y) - 4.0).abs() < 1e-12);
        }
    }
}
