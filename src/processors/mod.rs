//! Image processing stages of the OCR pipeline.
//!
//! # Modules
//!
//! * `db_postprocess` - DB detection post-processing (heatmap to polygons)
//! * `decode` - CTC decoding of recognition lattices
//! * `geometry` - Geometric primitives and algorithms
//! * `nms` - Non-maximum suppression of overlapping regions
//! * `normalization` - Image to tensor normalization
//! * `rectify` - Cropping and deskewing regions into strips
//! * `resize_detection` - Resizing for detection models
//! * `resize_recognition` - Resizing for recognition models
//! * `sorting` - Reading-order sorting
//! * `types` - Type definitions used across the processors module

pub mod db_postprocess;
mod decode;
mod geometry;
mod nms;
mod normalization;
mod rectify;
pub mod resize_detection;
pub mod resize_recognition;
mod sorting;
pub mod types;

pub use db_postprocess::*;
pub use decode::*;
pub use geometry::*;
pub use nms::*;
pub use normalization::*;
pub use rectify::*;
pub use resize_detection::*;
pub use resize_recognition::*;
pub use sorting::*;
pub use types::*;
