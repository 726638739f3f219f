//! Contrast-adaptive culling of weak maxima.
//!
//! A maximum survives only if it is a meaningful fraction of the strongest
//! maximum around it, which compensates for uneven lighting across the frame.
use crate::maxima::Candidate;

/// Thresholds used by [`cull_neighbourhood`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CullParams {
    /// Chebyshev distance below which two candidates are neighbours.
    pub halfwidth: u32,
    /// Strength must reach `max_strength >> strength_shift`.
    pub strength_shift: u32,
    /// Mass must reach `max_mass >> mass_shift`.
    pub mass_shift: u32,
}

impl Default for CullParams {
    fn default() -> Self {
        Self {
            halfwidth: 20,
            strength_shift: 4,
            mass_shift: 5,
        }
    }
}

/// Invalidate candidates that are much weaker than their neighbourhood.
///
/// Candidates are visited in order. Each still-valid candidate forms a group
/// with every other still-valid candidate closer than `halfwidth` on both
/// axes; group members below the shifted group maxima lose their validity.
/// Returns the number of candidates invalidated by this call.
pub fn cull_neighbourhood(cands: &mut [Candidate], params: &CullParams) -> usize {
    let s = params.halfwidth as usize;
    let mut invalidated = 0;
    let mut group = Vec::new();

    for i in 0..cands.len() {
        if !cands[i].valid {
            continue;
        }

        group.clear();
        group.push(i);
        let (cx, cy) = (cands[i].x, cands[i].y);
        let (mut max_strength, mut max_mass) = (cands[i].strength, cands[i].mass);
        for (t, c) in cands.iter().enumerate() {
            if t == i || !c.valid || c.x.abs_diff(cx) >= s || c.y.abs_diff(cy) >= s {
                continue;
            }
            group.push(t);
            max_strength = max_strength.max(c.strength);
            max_mass = max_mass.max(c.mass);
        }

        let min_strength = max_strength >> params.strength_shift;
        let min_mass = max_mass >> params.mass_shift;
        for &t in &group {
            let c = &mut cands[t];
            if c.strength < min_strength || c.mass < min_mass {
                c.valid = false;
                invalidated += 1;
            }
        }
    }

    if invalidated > 0 {
        log::trace!("culled {invalidated} of {} maxima", cands.len());
    }
    invalidated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(x: usize, y: usize, strength: i32, mass: i32) -> Candidate {
        Candidate {
            valid: true,
            x,
            y,
            strength,
            xy: [x as f32 + 0.5, y as f32 + 0.5],
            mass,
        }
    }

    fn valid(cands: &[Candidate]) -> Vec<bool> {
        cands.iter().map(|c| c.valid).collect()
    }

    #[test]
    fn weak_neighbour_is_culled() {
        let mut cands = vec![cand(10, 10, 1600, 0), cand(20, 15, 99, 0), cand(25, 10, 100, 0)];
        // 1600 >> 4 == 100
        assert_eq!(cull_neighbourhood(&mut cands, &CullParams::default()), 1);
        assert_eq!(valid(&cands), vec![true, false, true]);
    }

    #[test]
    fn distant_candidates_are_independent() {
        let mut cands = vec![cand(10, 10, 5000, 0), cand(30, 10, 10, 0), cand(10, 50, 10, 0)];
        assert_eq!(cull_neighbourhood(&mut cands, &CullParams::default()), 0);
        assert!(cands.iter().all(|c| c.valid));
    }

    #[test]
    fn earlier_candidates_are_culled_by_later_ones() {
        let mut cands = vec![cand(10, 10, 50, 0), cand(12, 12, 4000, 0)];
        assert_eq!(cull_neighbourhood(&mut cands, &CullParams::default()), 1);
        assert_eq!(valid(&cands), vec![false, true]);
    }

    #[test]
    fn low_mass_is_culled() {
        let mut cands = vec![
            cand(10, 10, 500, 6400),
            cand(15, 10, 500, 199),
            cand(5, 14, 500, 200),
        ];
        // 6400 >> 5 == 200
        assert_eq!(cull_neighbourhood(&mut cands, &CullParams::default()), 1);
        assert_eq!(valid(&cands), vec![true, false, true]);
    }

    #[test]
    fn invalid_candidates_neither_cull_nor_get_counted() {
        let mut cands = vec![cand(10, 10, 9000, 0), cand(11, 11, 20, 0)];
        cands[0].valid = false;
        assert_eq!(cull_neighbourhood(&mut cands, &CullParams::default()), 0);
        assert!(cands[1].valid);
    }

    #[test]
    fn shifts_are_configurable() {
        let params = CullParams {
            halfwidth: 20,
            strength_shift: 1,
            mass_shift: 5,
        };
        let mut cands = vec![cand(10, 10, 1000, 0), cand(12, 10, 499, 0), cand(14, 10, 500, 0)];
        assert_eq!(cull_neighbourhood(&mut cands, &params), 1);
        assert_eq!(valid(&cands), vec![true, false, true]);
    }
}
