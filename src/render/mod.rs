//! Annotation rendering module
//!
//! This module contains:
//! - Geometry constants for arrows, strokes and labels
//! - Photo compositing using tiny-skia (for embedding into documents)
//! - Bitmap text for labels and measurements

pub mod geometry;
pub mod image;
pub mod text;

pub use self::image::{annotate_photo, draw_annotations};
