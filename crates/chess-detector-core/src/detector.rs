//! Stateful per-frame detector.
use crate::detect::{detect_features_from_response, frame_threshold};
use crate::error::DetectError;
use crate::features::FeatureList;
use crate::orientation::{
    assign_orientations, majority_orientation, similar_indices, OrientationBin,
};
use crate::outlier::filter_spatial_outliers;
use crate::response::{chess_response_u8_into, RESPONSE_BORDER};
use crate::{DetectorParams, ImageView, ResponseMap};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Result of a successful detection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Detection {
    /// Features that passed the orientation and spatial filters.
    pub points: Vec<[f32; 2]>,
    /// Every localized feature that survived culling.
    pub all_points: Vec<[f32; 2]>,
    /// Dominant orientation bin, when orientations were estimated.
    pub orientation: Option<OrientationBin>,
}

/// ChESS detector that keeps its response buffer across frames.
///
/// The buffer is sized by the first frame; later frames must have the same
/// resolution.
#[derive(Debug)]
pub struct ChessDetector {
    params: DetectorParams,
    resp: Option<ResponseMap>,
    features: FeatureList,
    orientation: Option<OrientationBin>,
}

impl Default for ChessDetector {
    fn default() -> Self {
        Self::new(DetectorParams::default())
    }
}

impl ChessDetector {
    pub fn new(params: DetectorParams) -> Self {
        Self {
            params,
            resp: None,
            features: FeatureList::default(),
            orientation: None,
        }
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Response map of the last processed frame.
    pub fn response_map(&self) -> Option<&ResponseMap> {
        self.resp.as_ref()
    }

    /// Features of the last frame that got past suppression, with orientations.
    pub fn features(&self) -> &FeatureList {
        &self.features
    }

    /// Dominant orientation of the last successful frame.
    pub fn orientation(&self) -> Option<OrientationBin> {
        self.orientation
    }

    /// [`orientation`](Self::orientation) as an integer, 1000 when unset.
    pub fn orientation_raw(&self) -> i32 {
        OrientationBin::to_raw(self.orientation)
    }

    /// Run the full pipeline on one pre-blurred frame.
    ///
    /// `outlier_tolerance > 0` enables the spatial majority filter with that
    /// linking distance (px). Any error leaves the orientation unset and the
    /// feature list empty.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, img), fields(w = img.width(), h = img.height()))
    )]
    pub fn try_detect(
        &mut self,
        img: ImageView<'_>,
        outlier_tolerance: f32,
    ) -> Result<Detection, DetectError> {
        self.orientation = None;
        self.features = FeatureList::default();
        self.params.validate()?;

        let (w, h) = (img.width(), img.height());
        let margin = RESPONSE_BORDER.max(self.params.radius as usize);
        if w <= 2 * margin || h <= 2 * margin {
            return Err(DetectError::ImageTooSmall {
                width: w,
                height: h,
                margin,
            });
        }

        match &self.resp {
            Some(r) if (r.w, r.h) != (w, h) => {
                return Err(DetectError::ResolutionChanged {
                    expected: (r.w, r.h),
                    actual: (w, h),
                });
            }
            Some(_) => {}
            None => log::debug!("allocating {w}x{h} response buffer"),
        }
        let resp = self.resp.get_or_insert_with(|| ResponseMap::new(w, h));
        chess_response_u8_into(img.data(), w, h, resp);

        let max_response = resp.max_response() as i32;
        if max_response <= self.params.min_max_response {
            return Err(DetectError::WeakFrame {
                max_response,
                required: self.params.min_max_response,
            });
        }

        let found = detect_features_from_response(
            resp,
            &self.params,
            frame_threshold(max_response),
            &mut self.features,
        )?;
        if found < self.params.min_features {
            return Err(DetectError::TooFewFeatures {
                found,
                required: self.params.min_features,
            });
        }

        let mut points = Vec::new();
        let mut major = None;
        if self.params.estimate_orientation {
            assign_orientations(&img, &mut self.features, self.params.orientation_radius);
            let orientations: Vec<_> = self.features.iter().map(|f| f.orientation).collect();
            let bins: Vec<_> = orientations.iter().flatten().copied().collect();
            major = majority_orientation(&bins);
            if self.params.filter_minor_orientation {
                if let Some(major) = major {
                    points = similar_indices(&orientations, major)
                        .into_iter()
                        .map(|i| self.features.as_slice()[i].xy)
                        .collect();
                }
            }
        }

        let all_points = self.features.positions();
        if points.is_empty() {
            points = all_points.clone();
        }
        if points.len() < self.params.min_features {
            return Err(DetectError::TooFewFeatures {
                found: points.len(),
                required: self.params.min_features,
            });
        }

        if outlier_tolerance > 0.0 {
            points = filter_spatial_outliers(&points, outlier_tolerance);
        }

        self.orientation = major;
        Ok(Detection {
            points,
            all_points,
            orientation: major,
        })
    }

    /// Boolean front end to [`try_detect`](Self::try_detect).
    ///
    /// `out` is cleared first and stays empty on failure; `all` is replaced
    /// only on success.
    pub fn detect(
        &mut self,
        img: ImageView<'_>,
        out: &mut Vec<[f32; 2]>,
        all: &mut Vec<[f32; 2]>,
        outlier_tolerance: f32,
    ) -> bool {
        out.clear();
        match self.try_detect(img, outlier_tolerance) {
            Ok(det) => {
                *out = det.points;
                *all = det.all_points;
                true
            }
            Err(e) if e.is_internal() => {
                log::error!("chess detection failed: {e}");
                false
            }
            Err(e) => {
                log::debug!("no target in frame: {e}");
                false
            }
        }
    }
}
