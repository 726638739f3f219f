//! Feature extraction on top of the dense ChESS response map.
use crate::cull::{cull_neighbourhood, CullParams};
use crate::error::DetectError;
use crate::features::{FeatureList, FeatureSink};
use crate::maxima::{find_maxima, SearchParams};
use crate::response::chess_response_u8;
use crate::{DetectorParams, ImageView, ResponseMap};
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Timed extraction outcome containing features and profiling data.
#[derive(Clone, Debug)]
pub struct FeatureTrace {
    /// Localized features, orientations not assigned.
    pub features: FeatureList,
    /// Maximum of the response map.
    pub max_response: i32,
    /// Time spent computing the dense response (milliseconds).
    pub resp_ms: f64,
    /// Time spent on suppression, refinement and culling (milliseconds).
    pub detect_ms: f64,
}

/// Suppression threshold for a frame: half its maximum response.
#[inline]
pub fn frame_threshold(max_response: i32) -> i32 {
    max_response >> 1
}

/// Compute features starting from an 8-bit grayscale image.
///
/// This is a convenience that combines:
/// - chess_response_u8 (dense response map)
/// - thresholding at half the maximum response
/// - non-maximum suppression, sub-pixel refinement and culling
///
/// No frame-level acceptance checks are applied; see
/// [`ChessDetector`](crate::ChessDetector) for those.
pub fn find_features_u8_with_trace(
    img: &ImageView<'_>,
    params: &DetectorParams,
) -> Result<FeatureTrace, DetectError> {
    params.validate()?;

    let resp_started = Instant::now();
    let resp = chess_response_u8(img.data(), img.width(), img.height());
    let resp_ms = resp_started.elapsed().as_secs_f64() * 1000.0;

    let detect_started = Instant::now();
    let max_response = resp.max_response() as i32;
    let mut features = FeatureList::default();
    detect_features_from_response(&resp, params, frame_threshold(max_response), &mut features)?;
    let detect_ms = detect_started.elapsed().as_secs_f64() * 1000.0;

    Ok(FeatureTrace {
        features,
        max_response,
        resp_ms,
        detect_ms,
    })
}

/// Core extraction: run suppression, refinement and culling on an existing
/// response map and hand the survivors to `sink`.
///
/// The sink is allocated once with the exact survivor count, then receives
/// every survivor in discovery order. Returns that count; an empty result
/// leaves the sink untouched.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(resp, params, sink), fields(w = resp.w, h = resp.h))
)]
pub fn detect_features_from_response<S: FeatureSink + ?Sized>(
    resp: &ResponseMap,
    params: &DetectorParams,
    threshold: i32,
    sink: &mut S,
) -> Result<usize, DetectError> {
    let search = SearchParams {
        border: params.search_border(),
        radius: params.radius as usize,
        threshold,
        localization: params.localization,
        com_radius: params.com_radius,
    };
    let mut cands = find_maxima(resp, &search)?;
    if cands.is_empty() {
        return Ok(0);
    }

    let cull = CullParams {
        halfwidth: params.neighbourhood,
        strength_shift: params.strength_shift,
        mass_shift: params.mass_shift,
    };
    let culled = cull_neighbourhood(&mut cands, &cull);
    let kept = cands.len() - culled;

    if !sink.allocate(kept) {
        return Err(DetectError::AllocationFailed { capacity: kept });
    }
    for c in cands.iter().filter(|c| c.valid) {
        if !sink.append(c.xy) {
            return Err(DetectError::CapacityExceeded { capacity: kept });
        }
    }

    log::trace!("{} maxima, {culled} culled, {kept} kept", cands.len());
    Ok(kept)
}
