//! Shared application-level helpers for tools and examples.
//!
//! These functions wire up I/O (load image, optional pre-blur, JSON/PNG
//! output) around the detector so the example front end and the tests share
//! the same behavior.

use crate::image::{box_blur_5x5, detect_image};
use anyhow::{Context, Result};
use chess_detector_core::{ChessDetector, DetectorParams, OrientationBin};
use image::{GrayImage, ImageReader, Luma};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Write, path::Path, path::PathBuf, time::Instant};

fn default_blur() -> bool {
    true
}

/// JSON description of one detection run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    pub image: PathBuf,
    /// Apply the 5×5 mean filter before detection.
    #[serde(default = "default_blur")]
    pub blur: bool,
    /// Linking distance of the spatial outlier filter; 0 disables it.
    #[serde(default)]
    pub outlier_tolerance: f32,
    pub output_json: Option<PathBuf>,
    pub output_png: Option<PathBuf>,
    #[serde(default)]
    pub params: DetectorParams,
    pub log_level: Option<String>,
}

impl DetectionConfig {
    /// Config with default settings for `image`.
    pub fn for_image(image: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            blur: true,
            outlier_tolerance: 0.0,
            output_json: None,
            output_png: None,
            params: DetectorParams::default(),
            log_level: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureOut {
    pub x: f32,
    pub y: f32,
    /// Orientation bin, absent when it could not be estimated.
    pub orientation: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionDump {
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub blurred: bool,
    pub detected: bool,
    /// Why the frame was rejected, when it was.
    pub error: Option<String>,
    /// Dominant orientation bin, 1000 when unset.
    pub orientation: i32,
    pub detect_ms: f64,
    /// Points that passed every filter.
    pub points: Vec<[f32; 2]>,
    /// Every localized feature with its orientation.
    pub features: Vec<FeatureOut>,
}

/// Detect features in the configured image and write the JSON dump and the
/// PNG overlay. A frame without a target is not an error: it is reported in
/// the dump with `detected: false`.
pub fn run_detection(cfg: DetectionConfig) -> Result<DetectionDump> {
    let img = ImageReader::open(&cfg.image)
        .with_context(|| format!("opening image {}", cfg.image.display()))?
        .decode()
        .with_context(|| format!("decoding image {}", cfg.image.display()))?
        .to_luma8();
    let work_img = if cfg.blur {
        box_blur_5x5(&img)
    } else {
        img.clone()
    };

    let mut det = ChessDetector::new(cfg.params.clone());
    let started = Instant::now();
    let result = detect_image(&mut det, &work_img, cfg.outlier_tolerance);
    let detect_ms = started.elapsed().as_secs_f64() * 1000.0;

    let (detected, error, points) = match result {
        Ok(found) => {
            log::info!(
                "{} points ({} features), orientation {}",
                found.points.len(),
                found.all_points.len(),
                det.orientation_raw()
            );
            (true, None, found.points)
        }
        Err(e) => {
            log::warn!("no detection in {}: {e}", cfg.image.display());
            (false, Some(e.to_string()), Vec::new())
        }
    };

    let dump = DetectionDump {
        image: cfg.image.to_string_lossy().into_owned(),
        width: img.width(),
        height: img.height(),
        blurred: cfg.blur,
        detected,
        error,
        orientation: det.orientation_raw(),
        detect_ms,
        points,
        features: det
            .features()
            .iter()
            .map(|f| FeatureOut {
                x: f.xy[0],
                y: f.xy[1],
                orientation: f.orientation.map(OrientationBin::get),
            })
            .collect(),
    };

    let json_out = cfg
        .output_json
        .unwrap_or_else(|| cfg.image.with_extension("features.json"));
    write_json(&json_out, &dump)?;
    log::debug!("saved JSON dump to {}", json_out.display());

    let png_out = cfg
        .output_png
        .unwrap_or_else(|| cfg.image.with_extension("features.png"));
    let mut vis = img;
    draw_points(&mut vis, dump.features.iter().map(|f| (f.x, f.y)), 128);
    draw_points(&mut vis, dump.points.iter().map(|p| (p[0], p[1])), 255);
    vis.save(&png_out)
        .with_context(|| format!("writing overlay {}", png_out.display()))?;
    log::debug!("saved visualization to {}", png_out.display());

    Ok(dump)
}

/// Mark each point with a 3×3 square of `value`.
fn draw_points(vis: &mut GrayImage, points: impl Iterator<Item = (f32, f32)>, value: u8) {
    for (x_f, y_f) in points {
        let x = x_f.round() as i32;
        let y = y_f.round() as i32;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let xx = x + dx;
                let yy = y + dy;
                if xx >= 0 && yy >= 0 && xx < vis.width() as i32 && yy < vis.height() as i32 {
                    vis.put_pixel(xx as u32, yy as u32, Luma([value]));
                }
            }
        }
    }
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let mut json_file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(&mut json_file, value)?;
    json_file.write_all(b"\n")?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<DetectionConfig> {
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    let cfg: DetectionConfig = serde_json::from_reader(file)
        .with_context(|| format!("parsing config {}", path.display()))?;
    cfg.params
        .validate()
        .with_context(|| format!("checking params in {}", path.display()))?;
    Ok(cfg)
}
