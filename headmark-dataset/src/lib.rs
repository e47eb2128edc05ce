//! # headmark dataset generation
//!
//! Turns `markups_<patient>` study folders into a 2D keypoint dataset:
//!
//! - [`labeling`]: map soft tissue points from markup files onto landmark labels
//! - [`sweep`]: pitch and yaw camera series around the head
//! - [`render`]: the [`SliceRenderer`] seam to the 3D host
//! - [`builder`]: the [`DatasetBuilder`] batch job

pub mod builder;
pub mod labeling;
pub mod render;
pub mod sweep;

pub use builder::{BuildConfig, BuildFailure, BuildReport, DatasetBuilder, ImageFormat};
pub use labeling::{label_landmarks, LabelingStrategy};
pub use render::{BlankCanvasRenderer, RenderedSlice, SliceRenderer};
pub use sweep::{CameraSweep, Series, ViewPose};
