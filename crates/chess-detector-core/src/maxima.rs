//! Thresholded non-maximum suppression over a response map.
//!
//! The scan avoids a full `(2r+1)²` window test for most pixels: a short
//! forward probe along the row catches the common case where a stronger pixel
//! lies just ahead, and once a pixel is known to be dominated (or accepted)
//! the scan jumps past the columns it has already proven weaker.
use crate::error::DetectError;
use crate::localize::{refine_window_5x5, CenterOfMass, Refined};
use crate::{Localization, ResponseMap};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A local maximum considered for output.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// Cleared by culling; never set again.
    pub valid: bool,
    /// Integer location of the maximum.
    pub x: usize,
    pub y: usize,
    /// Maximum value plus its strongest positive 8-neighbour.
    pub strength: i32,
    /// Sub-pixel location.
    pub xy: [f32; 2],
    /// Connected response mass (0 when refined with the 5×5 window).
    pub mass: i32,
}

/// Inputs of [`find_maxima`].
#[derive(Clone, Debug)]
pub struct SearchParams {
    /// Border without valid maxima, including the refinement margin.
    pub border: usize,
    /// Suppression radius.
    pub radius: usize,
    /// Only responses strictly above this are considered.
    pub threshold: i32,
    pub localization: Localization,
    /// Half-width of the center-of-mass window.
    pub com_radius: u32,
}

/// Find and refine the local maxima of `resp`, in raster order.
///
/// The search window is `[m, dim - m)` with `m = max(border, radius)`;
/// maxima within 2 px of that window's edge are dropped. The number of
/// candidates is capped at `(w / r) * (h / r)`.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(resp, params),
        fields(w = resp.w, h = resp.h, thr = params.threshold)
    )
)]
pub fn find_maxima(
    resp: &ResponseMap,
    params: &SearchParams,
) -> Result<Vec<Candidate>, DetectError> {
    let (w, h) = (resp.w, resp.h);
    let r = params.radius.max(1);
    let margin = params.border.max(r);
    if w <= 2 * margin || h <= 2 * margin {
        return Ok(Vec::new());
    }

    let max_candidates = (w / r) * (h / r);
    let (min_xy, max_x, max_y) = (margin, w - margin, h - margin);
    let thr = params.threshold;
    let mut com = match params.localization {
        Localization::CenterOfMass => Some(CenterOfMass::new(params.com_radius)),
        Localization::Window5x5 => None,
    };

    let mut out = Vec::new();
    for y in min_xy..max_y {
        let mut x = min_xy;
        while x < max_x {
            let v = resp.at(x, y) as i32;
            if v <= thr {
                x += 1;
                continue;
            }

            // a stronger pixel just ahead in the row: move straight to it
            if let Some(dx) = (1..=r).find(|&dx| resp.at(x + dx, y) as i32 > v) {
                x += dx;
                continue;
            }

            if let Some(dx) = first_stronger_in_window(resp, x, y, r, v) {
                // shift the stronger pixel out of the window, but never past
                // the columns the forward probe proved weaker
                x += (dx.min(0) + r as isize) as usize + 1;
                continue;
            }

            if x < min_xy + 2 || x + 3 > max_x || y < min_xy + 2 || y + 3 > max_y {
                x += 1;
                continue;
            }

            if let Some(strength) = combined_strength(resp, x, y) {
                let refined = match com.as_mut() {
                    Some(com) => com.refine(resp, x, y)?,
                    None => refine_window_5x5(resp, x, y, thr)?,
                };
                out.push(candidate(x, y, strength, refined));
                if out.len() == max_candidates {
                    log::warn!(
                        "hit the candidate limit, only processing the first {max_candidates} maxima"
                    );
                    return Ok(out);
                }
            }

            // nothing within the radius can be another maximum
            x += r + 1;
        }
    }

    Ok(out)
}

fn candidate(x: usize, y: usize, strength: i32, refined: Refined) -> Candidate {
    Candidate {
        valid: true,
        x,
        y,
        strength,
        xy: refined.xy,
        mass: refined.mass,
    }
}

/// Column offset of the first (raster order) strictly greater pixel in the
/// `(2r+1)²` window around `(x, y)`.
fn first_stronger_in_window(
    resp: &ResponseMap,
    x: usize,
    y: usize,
    r: usize,
    v: i32,
) -> Option<isize> {
    let ri = r as isize;
    for yy in y - r..=y + r {
        for dx in -ri..=ri {
            let xx = (x as isize + dx) as usize;
            if resp.at(xx, yy) as i32 > v {
                return Some(dx);
            }
        }
    }
    None
}

/// Value at `(x, y)` plus its largest strictly positive 8-neighbour.
///
/// `None` when no neighbour is positive, or when the neighbour ties the
/// maximum and comes earlier in raster order (that plateau was already
/// reported from the earlier pixel).
fn combined_strength(resp: &ResponseMap, x: usize, y: usize) -> Option<i32> {
    let v = resp.at(x, y) as i32;
    let mut second = 0i32;
    let mut second_at = None;
    for dy in -1isize..=1 {
        for dx in -1isize..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let n = resp.at((x as isize + dx) as usize, (y as isize + dy) as usize) as i32;
            if n > second {
                second = n;
                second_at = Some((dy, dx));
            }
        }
    }

    let at = second_at?;
    if second == v && at < (0, 0) {
        return None;
    }
    Some(v + second)
}
