/// 16 point sampling ring at radius 5, as `(dx, dy)` offsets.
///
/// Order is counter-clockwise starting just right of the top sample. Sample
/// `k`, `k + 4`, `k + 8` and `k + 12` form rotation `k` of the ChESS cross.
pub const RING5: [(i32, i32); 16] = [
    (2, -5),
    (0, -5),
    (-2, -5),
    (-4, -4),
    (-5, -2),
    (-5, 0),
    (-5, 2),
    (-4, 4),
    (-2, 5),
    (0, 5),
    (2, 5),
    (4, 4),
    (5, 2),
    (5, 0),
    (5, -2),
    (4, -4),
];

/// Largest absolute offset used by [`RING5`].
pub const RING_RADIUS: i32 = 5;

/// Ring indices `(a, b, c, d)` of the four orientation sampling crosses.
///
/// Cross `k` uses indices `(2 - k, 14 - k, 10 - k, 6 - k) mod 16`, so the crosses
/// are ordered by angle and cross 3 is rotation 3 of the response with its
/// sign flipped.
pub const ORIENTATION_CROSSES: [[usize; 4]; 4] = cross_indices();

const fn cross_indices() -> [[usize; 4]; 4] {
    let mut out = [[0usize; 4]; 4];
    let mut k = 0;
    while k < 4 {
        out[k] = [(18 - k) % 16, 14 - k, 10 - k, 6 - k];
        k += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_is_point_symmetric() {
        for k in 0..8 {
            let (dx, dy) = RING5[k];
            assert_eq!(RING5[k + 8], (-dx, -dy), "sample {k}");
        }
        assert!(RING5
            .iter()
            .all(|&(dx, dy)| dx.abs() <= RING_RADIUS && dy.abs() <= RING_RADIUS));
    }

    #[test]
    fn crosses_pick_opposite_pairs() {
        assert_eq!(ORIENTATION_CROSSES[0], [2, 14, 10, 6]);
        assert_eq!(ORIENTATION_CROSSES[3], [15, 11, 7, 3]);
        for cross in ORIENTATION_CROSSES {
            let (a, c) = (RING5[cross[0]], RING5[cross[2]]);
            assert_eq!(a, (-c.0, -c.1));
            let (b, d) = (RING5[cross[1]], RING5[cross[3]]);
            assert_eq!(b, (-d.0, -d.1));
        }
    }
}
