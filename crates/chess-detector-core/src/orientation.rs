//! Discrete ChESS feature orientations.
//!
//! The four sampling crosses that make up the response are re-evaluated at a
//! feature and the strongest (neighbour-averaged) one, together with its sign,
//! gives one of 8 bins. Bins live on a circle: `-4..=3` with `3 + 1 == -4`.
use crate::features::FeatureList;
use crate::ring::{ORIENTATION_CROSSES, RING5, RING_RADIUS};
use crate::ImageView;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Raw value reported when no valid orientation is available.
pub const INVALID_ORIENTATION: i32 = 1000;

/// One of the 8 orientation classes, stored as an integer in `-4..=3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct OrientationBin(i8);

impl OrientationBin {
    pub const MIN: i32 = -4;
    pub const MAX: i32 = 3;

    /// `None` unless `value` lies in `-4..=3`.
    pub fn new(value: i32) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&value)
            .then_some(Self(value as i8))
    }

    #[inline]
    pub fn get(self) -> i32 {
        self.0 as i32
    }

    /// Raw integer form, [`INVALID_ORIENTATION`] for `None`.
    pub fn to_raw(bin: Option<Self>) -> i32 {
        bin.map_or(INVALID_ORIENTATION, Self::get)
    }

    /// Signed circular distance `self - other` in `-4..=3`; `-4` means opposite.
    #[inline]
    pub fn circular_offset(self, other: Self) -> i32 {
        (self.get() - other.get() + 4).rem_euclid(8) - 4
    }

    /// Equal up to one bin of noise.
    #[inline]
    pub fn is_similar(self, other: Self) -> bool {
        (self.get() - other.get() + 6).rem_euclid(8) > 4
    }

    /// Opposite up to one bin of noise.
    #[inline]
    pub fn is_opposite(self, other: Self) -> bool {
        (self.get() - other.get() + 5).rem_euclid(8) < 3
    }

    /// The bin four steps around the circle.
    #[inline]
    pub fn opposite(self) -> Self {
        Self(((self.get() + 8).rem_euclid(8) - 4) as i8)
    }

    /// Expected bins of corners lying on an image line of the given slope
    /// (`dy/dx`), as `(along, across)`. The two are always opposite.
    pub fn for_line_slope(slope: f32) -> (Self, Self) {
        let along = if slope < -5.0 {
            3
        } else if slope < -1.5 {
            -4
        } else if slope < -0.67 {
            -3
        } else if slope < -0.2 {
            -2
        } else if slope < 0.2 {
            -1
        } else if slope < 0.67 {
            0
        } else if slope < 1.5 {
            1
        } else if slope < 5.0 {
            2
        } else {
            3
        };
        let along = Self(along);
        (along, along.opposite())
    }
}

impl TryFrom<i32> for OrientationBin {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("orientation bin {value} outside -4..=3"))
    }
}

impl From<OrientationBin> for i32 {
    fn from(bin: OrientationBin) -> Self {
        bin.get()
    }
}

/// Classify the orientation of the feature at integer pixel `(x, y)`.
///
/// `radius` scales the sampling crosses. Returns `None` when a cross would
/// leave the image or when all combined magnitudes are zero.
pub fn assign_orientation(
    img: &ImageView<'_>,
    x: usize,
    y: usize,
    radius: u32,
) -> Option<OrientationBin> {
    let reach = (RING_RADIUS as usize).checked_mul(radius as usize)?;
    if x < reach || y < reach || x + reach >= img.width() || y + reach >= img.height() {
        return None;
    }

    let m = radius as i32;
    let sample = |k: usize| {
        let (dx, dy) = RING5[k];
        let xx = (x as i32 + dx * m) as usize;
        let yy = (y as i32 + dy * m) as usize;
        img.at(xx, yy) as i32
    };

    let mut val = [0i32; 4];
    for (v, cross) in val.iter_mut().zip(ORIENTATION_CROSSES.iter()) {
        *v = sample(cross[0]) - sample(cross[1]) + sample(cross[2]) - sample(cross[3]);
    }

    let mut best = 0;
    let mut bin = None;
    for s in 0..4 {
        // the cycle wraps with a sign flip between crosses 3 and 0
        let prev = if s == 0 { -val[3] } else { val[s - 1] };
        let next = if s == 3 { -val[0] } else { val[s + 1] };
        let mag = (prev + val[s] + next).abs();
        if mag > best {
            best = mag;
            let s = s as i32;
            bin = OrientationBin::new(if val[s as usize] < 0 { s - 4 } else { s });
        }
    }
    bin
}

/// Assign orientations to every feature in `list` from its rounded location.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img, list), fields(features = list.len()))
)]
pub fn assign_orientations(img: &ImageView<'_>, list: &mut FeatureList, radius: u32) {
    for i in 0..list.len() {
        let [fx, fy] = list.as_slice()[i].xy;
        let bin = pixel_of(fx, img.width())
            .zip(pixel_of(fy, img.height()))
            .and_then(|(x, y)| assign_orientation(img, x, y, radius));
        list.set_orientation(i, bin);
    }
}

fn pixel_of(coord: f32, limit: usize) -> Option<usize> {
    let p = (coord - 0.5).round_ties_even();
    (p >= 0.0 && (p as usize) < limit).then_some(p as usize)
}

/// Most frequent bin, first seen wins ties. `None` for an empty input.
pub fn majority_orientation(bins: &[OrientationBin]) -> Option<OrientationBin> {
    let mut best = None;
    let mut best_count = 0;
    for (i, &bin) in bins.iter().enumerate() {
        let count = 1 + bins[i + 1..].iter().filter(|&&b| b == bin).count();
        if count > best_count {
            best_count = count;
            best = Some(bin);
        }
    }
    best
}

/// Indices of features whose bin is similar to `major`, in order.
pub fn similar_indices(
    orientations: &[Option<OrientationBin>],
    major: OrientationBin,
) -> Vec<usize> {
    orientations
        .iter()
        .enumerate()
        .filter_map(|(i, o)| (*o).filter(|b| b.is_similar(major)).map(|_| i))
        .collect()
}
