//! Sub-pixel refinement of response maxima.
use crate::error::DetectError;
use crate::ResponseMap;
use std::collections::VecDeque;

/// Refined location of a maximum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Refined {
    /// Sub-pixel position; pixel centers sit at +0.5.
    pub xy: [f32; 2],
    /// Summed response of the pixels that contributed (0 for the 5×5 window).
    pub mass: i32,
}

/// Reusable flood-fill state for [`CenterOfMass::refine`].
///
/// The visited arena covers the `(2R+1)²` window around the maximum and is
/// indexed by window offset, so the fill can never leave the window.
#[derive(Clone, Debug)]
pub struct CenterOfMass {
    radius: i32,
    side: usize,
    visited: Vec<bool>,
    queue: VecDeque<(i32, i32)>,
}

impl CenterOfMass {
    pub fn new(radius: u32) -> Self {
        let side = 2 * radius as usize + 1;
        Self {
            radius: radius as i32,
            side,
            visited: vec![false; side * side],
            queue: VecDeque::with_capacity(side * side),
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius as u32
    }

    #[inline]
    fn slot(&self, dx: i32, dy: i32) -> usize {
        (dy + self.radius) as usize * self.side + (dx + self.radius) as usize
    }

    /// Center of mass of the positive response blob 4-connected to `(x, y)`.
    ///
    /// The maximum itself always belongs to the blob. Pixels outside the map
    /// or the window are never visited.
    pub fn refine(
        &mut self,
        resp: &ResponseMap,
        x: usize,
        y: usize,
    ) -> Result<Refined, DetectError> {
        self.visited.fill(false);
        self.queue.clear();

        let r = self.radius;
        let (cx, cy) = (x as isize, y as isize);
        let center = self.slot(0, 0);
        self.visited[center] = true;
        self.queue.push_back((0, 0));

        let (mut sx, mut sy, mut mass) = (0i64, 0i64, 0i64);
        while let Some((ox, oy)) = self.queue.pop_front() {
            let v = resp.get(cx + ox as isize, cy + oy as isize).unwrap_or(0) as i64;
            sx += ox as i64 * v;
            sy += oy as i64 * v;
            mass += v;

            for (nx, ny) in [(ox - 1, oy), (ox + 1, oy), (ox, oy - 1), (ox, oy + 1)] {
                if nx.abs() > r || ny.abs() > r {
                    continue;
                }
                let slot = self.slot(nx, ny);
                if self.visited[slot] {
                    continue;
                }
                if resp.get(cx + nx as isize, cy + ny as isize).is_some_and(|v| v > 0) {
                    self.visited[slot] = true;
                    self.queue.push_back((nx, ny));
                }
            }
        }

        if mass == 0 {
            return Err(DetectError::ZeroMass { x, y });
        }

        Ok(Refined {
            xy: [
                x as f32 + sx as f32 / mass as f32 + 0.5,
                y as f32 + sy as f32 / mass as f32 + 0.5,
            ],
            mass: mass.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        })
    }
}

/// 5×5 centroid of responses strictly above `threshold`.
///
/// The caller keeps `(x, y)` at least 2 px away from the map border.
pub fn refine_window_5x5(
    resp: &ResponseMap,
    x: usize,
    y: usize,
    threshold: i32,
) -> Result<Refined, DetectError> {
    let (mut sx, mut sy, mut sw) = (0i32, 0i32, 0i32);
    for dy in -2i32..=2 {
        for dx in -2i32..=2 {
            let v = resp.get(x as isize + dx as isize, y as isize + dy as isize);
            let v = match v {
                Some(v) if v as i32 > threshold => v as i32,
                _ => continue,
            };
            sx += v * dx;
            sy += v * dy;
            sw += v;
        }
    }

    if sw == 0 {
        return Err(DetectError::ZeroMass { x, y });
    }

    Ok(Refined {
        xy: [
            x as f32 + 0.5 + sx as f32 / sw as f32,
            y as f32 + 0.5 + sy as f32 / sw as f32,
        ],
        mass: 0,
    })
}
