//! `image::GrayImage` helpers for the ChESS detector.
//!
//! These wrappers expose the core response and detection primitives in terms
//! of `image::GrayImage`, together with the 5×5 mean filter that frames are
//! expected to go through before detection.

use chess_detector_core::detect::{self, FeatureTrace};
use chess_detector_core::{
    ChessDetector, DetectError, Detection, DetectorParams, ImageView, ResponseMap,
};
use image::GrayImage;

/// Borrow a `GrayImage` as a core [`ImageView`].
#[inline]
pub fn view(img: &GrayImage) -> Result<ImageView<'_>, DetectError> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    // the backing buffer may be longer than the pixels it holds
    let raw = img.as_raw();
    ImageView::new(w, h, raw.get(..w * h).unwrap_or(raw))
}

/// Compute a dense ChESS response map for an `image::GrayImage`.
#[inline]
pub fn chess_response_image(img: &GrayImage) -> ResponseMap {
    chess_detector_core::response::chess_response_u8(
        img.as_raw(),
        img.width() as usize,
        img.height() as usize,
    )
}

/// Run `det` on an `image::GrayImage`.
#[inline]
pub fn detect_image(
    det: &mut ChessDetector,
    img: &GrayImage,
    outlier_tolerance: f32,
) -> Result<Detection, DetectError> {
    det.try_detect(view(img)?, outlier_tolerance)
}

/// Extract localized features with response/detect timings, without the
/// frame-level acceptance checks of [`ChessDetector`].
#[inline]
pub fn find_features_image_trace(
    img: &GrayImage,
    params: &DetectorParams,
) -> Result<FeatureTrace, DetectError> {
    detect::find_features_u8_with_trace(&view(img)?, params)
}

/// 5×5 mean filter with rounding and mirrored borders (`dcb|abcd|cba`).
pub fn box_blur_5x5(img: &GrayImage) -> GrayImage {
    let (w, h) = (img.width() as usize, img.height() as usize);
    if w == 0 || h == 0 {
        return img.clone();
    }
    let src = img.as_raw();

    // horizontal 5-tap sums, then vertical sums of those
    let mut rows = vec![0u16; w * h];
    for y in 0..h {
        let line = &src[y * w..(y + 1) * w];
        for x in 0..w {
            rows[y * w + x] = (-2isize..=2)
                .map(|d| line[mirror(x as isize + d, w)] as u16)
                .sum();
        }
    }

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let s: u32 = (-2isize..=2)
                .map(|d| rows[mirror(y as isize + d, h) * w + x] as u32)
                .sum();
            out[y * w + x] = ((s + 12) / 25) as u8;
        }
    }

    GrayImage::from_raw(img.width(), img.height(), out).unwrap_or_else(|| img.clone())
}

/// Reflect an index into `0..n` without repeating the edge sample.
fn mirror(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let period = 2 * (n - 1);
    let i = i.rem_euclid(period);
    (if i < n { i } else { period - i }) as usize
}
