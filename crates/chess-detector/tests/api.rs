use approx::assert_abs_diff_eq;
use chess_detector::app::{load_config, run_detection, DetectionDump};
use chess_detector::response::chess_response_u8;
use chess_detector::{
    box_blur_5x5, chess_response_image, detect_image, find_features_image_trace, ChessDetector,
    DetectorParams,
};
use image::{GrayImage, Luma};
use std::fs;

fn make_gradient_image(w: u32, h: u32) -> GrayImage {
    let mut data = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        for x in 0..w {
            data.push(((x * 7 + y * 3) % 255) as u8);
        }
    }
    GrayImage::from_vec(w, h, data).expect("gradient image")
}

/// Hard-edged checkerboard, 20 px cells, inner corners at (30 + 20i, 30 + 20j).
fn make_board() -> GrayImage {
    GrayImage::from_fn(160, 120, |x, y| {
        let (u, v) = (x + 10, y + 10);
        Luma([if (u / 20 + v / 20) % 2 == 0 { 220 } else { 30 }])
    })
}

/// Nearest inner board corner to `p`.
fn grid_corner(p: [f32; 2]) -> [f32; 2] {
    let snap = |c: f32| ((c - 30.0) / 20.0).round().clamp(0.0, 5.0) * 20.0 + 30.0;
    [snap(p[0]), snap(p[1])]
}

#[test]
fn response_helper_matches_core_kernel() {
    let img = make_gradient_image(40, 30);
    let helper_resp = chess_response_image(&img);
    let core_resp = chess_response_u8(img.as_raw(), 40, 30);
    assert_eq!(helper_resp, core_resp);
}

#[test]
fn blurred_board_is_detected_on_the_grid() {
    let img = box_blur_5x5(&make_board());
    let mut det = ChessDetector::default();
    let found = detect_image(&mut det, &img, 0.0).expect("board is detected");

    assert_eq!(found.all_points.len(), 24);
    for p in &found.all_points {
        let [gx, gy] = grid_corner(*p);
        assert_abs_diff_eq!(p[0], gx, epsilon = 0.25);
        assert_abs_diff_eq!(p[1], gy, epsilon = 0.25);
    }
    assert_eq!(found.points.len(), 12);
    assert_eq!(det.orientation_raw(), -1);
}

#[test]
fn traced_features_match_the_detector() {
    let img = box_blur_5x5(&make_board());
    let trace = find_features_image_trace(&img, &DetectorParams::default()).unwrap();
    assert!(trace.max_response > 250);
    assert!(trace.resp_ms >= 0.0 && trace.detect_ms >= 0.0);

    let mut det = ChessDetector::default();
    let found = detect_image(&mut det, &img, 0.0).unwrap();
    assert_eq!(trace.features.positions(), found.all_points);
}

#[test]
fn run_detection_writes_dump_and_overlay() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("board.png");
    make_board().save(&image_path).unwrap();

    let json_path = dir.path().join("out.json");
    let cfg_path = dir.path().join("config.json");
    let cfg = serde_json::json!({
        "image": image_path,
        "outlier_tolerance": 30.0,
        "output_json": json_path,
        "params": { "radius": 10 }
    });
    fs::write(&cfg_path, serde_json::to_vec_pretty(&cfg).unwrap()).unwrap();

    let dump = run_detection(load_config(&cfg_path).unwrap()).unwrap();
    assert!(dump.detected);
    assert!(dump.blurred);
    assert_eq!(dump.features.len(), 24);
    assert_eq!(dump.points.len(), 12);
    assert_eq!(dump.orientation, -1);

    let written: DetectionDump =
        serde_json::from_slice(&fs::read(&json_path).unwrap()).unwrap();
    assert_eq!(written.points, dump.points);
    assert!(dir.path().join("board.features.png").exists());
}

#[test]
fn flat_image_is_reported_not_failed() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("flat.png");
    GrayImage::from_pixel(64, 64, Luma([90])).save(&image_path).unwrap();

    let cfg = chess_detector::app::DetectionConfig::for_image(&image_path);
    let dump = run_detection(cfg).unwrap();
    assert!(!dump.detected);
    assert!(dump.error.is_some());
    assert!(dump.points.is_empty());
    assert_eq!(dump.orientation, 1000);
    assert!(dir.path().join("flat.features.json").exists());
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("bad.json");
    fs::write(&cfg_path, r#"{"image": "x.png", "params": {"radius": 0}}"#).unwrap();
    assert!(load_config(&cfg_path).is_err());

    fs::write(&cfg_path, "not json").unwrap();
    assert!(load_config(&cfg_path).is_err());
}
