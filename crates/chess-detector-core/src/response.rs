//! Dense ChESS response on 8-bit grayscale images.
use crate::ring::{RING5, RING_RADIUS};
use crate::ResponseMap;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pixels closer than this to any image edge keep a zero response
/// (ring radius 5 plus the 2 px margin of the upstream 5×5 blur).
pub const RESPONSE_BORDER: usize = 7;

/// Compute a fresh response map for `img`.
pub fn chess_response_u8(img: &[u8], w: usize, h: usize) -> ResponseMap {
    let mut resp = ResponseMap::new(w, h);
    chess_response_u8_into(img, w, h, &mut resp);
    resp
}

/// Compute the response map into an existing buffer of the same size.
///
/// Every pixel is overwritten; pixels in the [`RESPONSE_BORDER`] are zero.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img, resp))
)]
pub fn chess_response_u8_into(img: &[u8], w: usize, h: usize, resp: &mut ResponseMap) {
    debug_assert_eq!(img.len(), w * h);
    debug_assert_eq!((resp.w, resp.h), (w, h));

    resp.data.fill(0);
    if w <= 2 * RESPONSE_BORDER || h <= 2 * RESPONSE_BORDER {
        return;
    }

    let y0 = RESPONSE_BORDER;
    let y1 = h - RESPONSE_BORDER;

    #[cfg(feature = "rayon")]
    resp.data
        .par_chunks_mut(w)
        .enumerate()
        .filter(|(y, _)| (y0..y1).contains(y))
        .for_each(|(y, row)| response_row(img, w, y, row));

    #[cfg(not(feature = "rayon"))]
    for (y, row) in resp.data.chunks_mut(w).enumerate().take(y1).skip(y0) {
        response_row(img, w, y, row);
    }
}

#[inline]
fn response_row(img: &[u8], w: usize, y: usize, row: &mut [i16]) {
    for (x, out) in row
        .iter_mut()
        .enumerate()
        .take(w - RESPONSE_BORDER)
        .skip(RESPONSE_BORDER)
    {
        *out = response_at(img, w, x, y);
    }
}

/// Response of a single pixel of a `w`-wide image, `None` when the ring
/// around `(x, y)` leaves the image.
pub fn chess_response_at_u8(img: &[u8], w: usize, x: usize, y: usize) -> Option<i16> {
    let r = RING_RADIUS as usize;
    let h = img.len().checked_div(w)?;
    if x < r || y < r || x + r >= w || y + r >= h {
        return None;
    }
    Some(response_at(img, w, x, y))
}

/// Ring must fit around `(x, y)`.
#[inline]
fn response_at(img: &[u8], w: usize, x: usize, y: usize) -> i16 {
    let mut s = [0i32; 16];
    for (k, &(dx, dy)) in RING5.iter().enumerate() {
        let xx = (x as i32 + dx) as usize;
        let yy = (y as i32 + dy) as usize;
        s[k] = img[yy * w + xx] as i32;
    }

    let mut sum_resp = 0i32;
    let mut diff_resp = 0i32;
    let mut mean = 0i32;
    for k in 0..4 {
        let (a, b, c, d) = (s[k], s[k + 4], s[k + 8], s[k + 12]);
        sum_resp += (a - b + c - d).abs();
        diff_resp += (a - c).abs() + (b - d).abs();
        mean += a + b + c + d;
    }

    // horizontal 3 px mean, scaled to the 16-sample sum
    let o = y * w + x;
    let local_mean = (img[o - 1] as i32 + img[o] as i32 + img[o + 1] as i32) * 16 / 3;

    (sum_resp - diff_resp - (mean - local_mean).abs()) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Four quadrants meeting at the center pixel, separated by mid-gray lines.
    fn quadrant_corner(size: usize, dark: u8, bright: u8) -> Vec<u8> {
        let mid = size / 2;
        let mut img = vec![dark; size * size];
        for y in 0..size {
            for x in 0..size {
                img[y * size + x] = if x == mid || y == mid {
                    ((dark as u16 + bright as u16) / 2) as u8
                } else if (y < mid) ^ (x < mid) {
                    bright
                } else {
                    dark
                };
            }
        }
        img
    }

    #[test]
    fn flat_image_has_zero_response() {
        let img = vec![90u8; 32 * 32];
        let resp = chess_response_u8(&img, 32, 32);
        assert!(resp.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn border_stays_zero_and_corner_peaks_at_center() {
        let size = 32;
        let img = quadrant_corner(size, 20, 220);
        let resp = chess_response_u8(&img, size, size);

        for y in 0..size {
            for x in 0..size {
                let inside = (RESPONSE_BORDER..size - RESPONSE_BORDER).contains(&x)
                    && (RESPONSE_BORDER..size - RESPONSE_BORDER).contains(&y);
                if !inside {
                    assert_eq!(resp.at(x, y), 0, "border pixel ({x}, {y})");
                }
            }
        }

        let (best, _) = resp
            .data
            .iter()
            .enumerate()
            .max_by_key(|&(_, &v)| v)
            .unwrap();
        let (bx, by) = (best % size, best / size);
        assert_eq!((bx, by), (size / 2, size / 2));
        assert_eq!(resp.max_response(), 1200);
    }

    #[test]
    fn single_pixel_response_checks_the_ring() {
        let size = 32;
        let img = quadrant_corner(size, 20, 220);
        assert_eq!(chess_response_at_u8(&img, size, 16, 16), Some(1200));
        assert_eq!(chess_response_at_u8(&img, size, 5, 5), Some(0));
        assert_eq!(chess_response_at_u8(&img, size, 4, 16), None);
        assert_eq!(chess_response_at_u8(&img, size, 16, 27), None);
        assert_eq!(chess_response_at_u8(&img, 0, 16, 16), None);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_rows_match_the_sequential_kernel() {
        let (w, h) = (53, 41);
        let img: Vec<u8> = (0..w * h)
            .map(|i| ((i % w) * 37 + (i / w) * 11 + (i * i) % 7) as u8)
            .collect();
        let resp = chess_response_u8(&img, w, h);
        for y in 0..h {
            for x in 0..w {
                let inside = (RESPONSE_BORDER..w - RESPONSE_BORDER).contains(&x)
                    && (RESPONSE_BORDER..h - RESPONSE_BORDER).contains(&y);
                let expected = if inside { response_at(&img, w, x, y) } else { 0 };
                assert_eq!(resp.at(x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn straight_edge_is_not_rewarded() {
        let size = 32;
        let mut img = vec![20u8; size * size];
        for y in 0..size {
            for x in size / 2..size {
                img[y * size + x] = 220;
            }
        }
        let resp = chess_response_u8(&img, size, size);
        assert!(resp.data.iter().all(|&v| v <= 0));
    }

    #[test]
    fn tiny_image_is_all_border() {
        let img = vec![0u8; 14 * 40];
        let resp = chess_response_u8(&img, 14, 40);
        assert_eq!(resp.data.len(), 14 * 40);
        assert!(resp.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn into_overwrites_previous_contents() {
        let size = 24;
        let mut resp = ResponseMap::new(size, size);
        resp.data.fill(123);
        let img = vec![0u8; size * size];
        chess_response_u8_into(&img, size, size, &mut resp);
        assert!(resp.data.iter().all(|&v| v == 0));
    }
}
