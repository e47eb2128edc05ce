//! Visual quality control for headmark datasets
//!
//! Renders annotations back onto dataset images:
//! - Keypoint and bounding box overlays
//! - A navigator over every image of every patient
//! - Step-by-step keypoint sequences and summary images

pub mod navigator;
pub mod overlay;
pub mod sequence;

pub use navigator::*;
pub use overlay::*;
pub use sequence::*;
