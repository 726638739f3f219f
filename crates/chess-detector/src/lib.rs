//! Ergonomic wrappers over `chess-detector-core` that accept `image::GrayImage`
//! inputs.
//!
//! This crate is organized into a few focused modules:
//! - [`image`] – single-frame helpers on `image::GrayImage` and the 5×5
//!   pre-blur.
//! - [`app`] – JSON-configured detection runs with JSON/PNG output.
//! - [`logger`] – a simple `log` implementation used by examples.

pub mod app;
pub mod image;
pub mod logger;

pub use chess_detector_core::*;

pub use crate::image::{
    box_blur_5x5, chess_response_image, detect_image, find_features_image_trace,
};
