//! Blue bottle-cap detection: threshold, clean, trace, measure, draw.

pub mod annotate;
pub mod blob;
pub mod detect;
pub mod glyph;
pub mod hsv;
pub mod mask;
pub mod params;

pub use annotate::annotate;
pub use blob::Blob;
pub use detect::{detect, detect_stages, DetectionStages};
pub use params::DetectionParameters;
