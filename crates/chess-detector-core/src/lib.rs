//! ChESS feature detection for hybrid circle/checkerboard marker tracking.
//!
//! # Overview
//!
//! The detector turns a pre-blurred 8-bit grayscale frame into a short list of
//! sub-pixel checkerboard vertices plus a dominant orientation bin. It is built
//! from small stages that can also be used on their own:
//!
//! - [`response`] – dense ChESS response over the 16-sample ring in [`ring`].
//! - [`maxima`] – thresholded non-maximum suppression with row skipping.
//! - [`localize`] – sub-pixel refinement (connected-component center of mass
//!   or a fixed 5×5 centroid).
//! - [`cull`] – contrast-adaptive suppression of weak neighbours.
//! - [`features`] – the fixed-capacity output list and its sink trait.
//! - [`orientation`] – 8-bin orientation classification and majority filter.
//! - [`outlier`] – spatial partition and majority-cluster selection.
//! - [`detector`] – the stateful per-frame [`ChessDetector`].
//!
//! The response is the one described in the ChESS paper
//! (“Chess-board Extraction by Subtraction and Summation”), evaluated in
//! integer arithmetic into an `i16` map.
//!
//! # Features
//!
//! - `rayon` – computes response rows in parallel. Results are identical to
//!   the sequential path.
//! - `tracing` – adds `tracing` spans around the heavy stages.

pub mod cull;
pub mod detect;
pub mod detector;
pub mod error;
pub mod features;
pub mod localize;
pub mod maxima;
pub mod orientation;
pub mod outlier;
pub mod response;
pub mod ring;

use serde::{Deserialize, Serialize};

pub use crate::detector::{ChessDetector, Detection};
pub use crate::error::DetectError;
pub use crate::features::{Feature, FeatureList, FeatureSink};
pub use crate::orientation::{OrientationBin, INVALID_ORIENTATION};

/// How an accepted maximum is refined to sub-pixel precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Localization {
    /// Flood fill of the positive response blob around the maximum.
    CenterOfMass,
    /// Centroid of above-threshold responses in a 5×5 window.
    #[default]
    Window5x5,
}

/// Tunable parameters for the detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Minimum separation between accepted maxima (suppression radius, px).
    pub radius: u32,
    /// Half-width of the contrast-adaptive culling neighbourhood (px).
    pub neighbourhood: u32,
    /// Assign an orientation bin to every accepted feature.
    pub estimate_orientation: bool,
    /// Keep only features whose bin agrees with the majority bin.
    pub filter_minor_orientation: bool,
    /// Sub-pixel refinement mode.
    pub localization: Localization,
    /// A frame is rejected unless its maximum response exceeds this value.
    pub min_max_response: i32,
    /// Minimum number of features for a frame to count as detected.
    pub min_features: usize,
    /// Half-width of the center-of-mass flood fill window.
    pub com_radius: u32,
    /// Strength must be at least `1 / 2^strength_shift` of the local maximum.
    pub strength_shift: u32,
    /// Mass must be at least `1 / 2^mass_shift` of the local maximum.
    pub mass_shift: u32,
    /// Radius multiplier of the orientation sampling crosses.
    pub orientation_radius: u32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            radius: 10,
            neighbourhood: 20,
            estimate_orientation: true,
            filter_minor_orientation: true,
            localization: Localization::Window5x5,
            min_max_response: 250,
            min_features: 3,
            com_radius: 7,
            strength_shift: 4,
            mass_shift: 5,
            orientation_radius: 1,
        }
    }
}

impl DetectorParams {
    /// Border (in px) excluded from the maxima scan, before `radius` is applied.
    #[inline]
    pub fn search_border(&self) -> usize {
        let refine = match self.localization {
            Localization::CenterOfMass => self.com_radius as usize,
            Localization::Window5x5 => 2,
        };
        response::RESPONSE_BORDER + refine
    }

    /// Reject parameter sets the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.radius == 0 {
            return Err(DetectError::InvalidParams("radius must be >= 1"));
        }
        if self.neighbourhood == 0 {
            return Err(DetectError::InvalidParams("neighbourhood must be >= 1"));
        }
        if self.com_radius == 0 {
            return Err(DetectError::InvalidParams("com_radius must be >= 1"));
        }
        if self.orientation_radius == 0 {
            return Err(DetectError::InvalidParams("orientation_radius must be >= 1"));
        }
        if self.strength_shift >= 16 || self.mass_shift >= 31 {
            return Err(DetectError::InvalidParams("culling shift out of range"));
        }
        Ok(())
    }
}

/// Borrowed row-major 8-bit grayscale image.
///
/// The buffer length always equals `width * height`.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
    width: usize,
    height: usize,
    data: &'a [u8],
}

impl<'a> ImageView<'a> {
    /// Wrap a raw buffer, rejecting a length other than `width * height`.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, DetectError> {
        match width.checked_mul(height) {
            Some(expected) if expected == data.len() => Ok(Self {
                width,
                height,
                data,
            }),
            expected => Err(DetectError::BufferSize {
                width,
                height,
                actual: data.len(),
                expected,
            }),
        }
    }

    /// [`new`](Self::new) without the error details.
    pub fn from_u8_slice(width: usize, height: usize, data: &'a [u8]) -> Option<Self> {
        Self::new(width, height, data).ok()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

/// Dense response map in row-major layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseMap {
    pub w: usize,
    pub h: usize,
    pub data: Vec<i16>,
}

impl ResponseMap {
    /// Zero-filled map of the given size.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0; w * h],
        }
    }

    #[inline]
    /// Response value at an integer coordinate.
    pub fn at(&self, x: usize, y: usize) -> i16 {
        self.data[y * self.w + x]
    }

    /// Response at a signed coordinate, `None` outside the map.
    #[inline]
    pub fn get(&self, x: isize, y: isize) -> Option<i16> {
        if x < 0 || y < 0 || x as usize >= self.w || y as usize >= self.h {
            return None;
        }
        Some(self.data[y as usize * self.w + x as usize])
    }

    /// Largest response, clamped below at zero.
    pub fn max_response(&self) -> i16 {
        self.data.iter().copied().fold(0, i16::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_view_checks_buffer_length() {
        let data = vec![0u8; 12];
        assert!(ImageView::from_u8_slice(4, 3, &data).is_some());
        assert!(ImageView::from_u8_slice(4, 4, &data).is_none());
        assert!(ImageView::from_u8_slice(usize::MAX, 2, &data).is_none());
        assert_eq!(
            ImageView::new(5, 3, &data).unwrap_err(),
            DetectError::BufferSize {
                width: 5,
                height: 3,
                actual: 12,
                expected: Some(15)
            }
        );
    }

    #[test]
    fn params_round_trip_through_json_with_defaults() {
        let params: DetectorParams =
            serde_json::from_str(r#"{"radius": 6, "localization": "center_of_mass"}"#).unwrap();
        assert_eq!(params.radius, 6);
        assert_eq!(params.localization, Localization::CenterOfMass);
        assert_eq!(params.neighbourhood, 20);
        assert_eq!(params.search_border(), 14);
        assert_eq!(DetectorParams::default().search_border(), 9);
    }

    #[test]
    fn validate_rejects_zero_radius() {
        let params = DetectorParams {
            radius: 0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(DetectError::InvalidParams(_))
        ));
        assert!(DetectorParams::default().validate().is_ok());
    }

    #[test]
    fn response_map_accessors() {
        let mut map = ResponseMap::new(3, 2);
        map.data[4] = 17;
        map.data[1] = -40;
        assert_eq!(map.at(1, 1), 17);
        assert_eq!(map.get(1, 1), Some(17));
        assert_eq!(map.get(-1, 0), None);
        assert_eq!(map.get(3, 0), None);
        assert_eq!(map.max_response(), 17);
        assert_eq!(ResponseMap::new(2, 2).max_response(), 0);
    }
}
