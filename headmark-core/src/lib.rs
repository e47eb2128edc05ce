//! Core data structures for headmark
//!
//! This crate provides the landmark model of a CT head study, the plane
//! transforms that map world points onto rendered images, and the
//! [`AnnotationProjector`] that turns four labeled 3D landmarks into a
//! normalized keypoint annotation record.

pub mod error;
pub mod keypoint;
pub mod landmark;
pub mod point;
pub mod projector;
pub mod transform;

pub use error::*;
pub use keypoint::*;
pub use landmark::*;
pub use point::*;
pub use projector::*;
pub use transform::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3x4, Matrix4, Point2, Point3, Vector3};
