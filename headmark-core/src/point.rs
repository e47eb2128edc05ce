//! Point types and coordinate conventions

use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 2D point with double precision coordinates
pub type Point2d = Point2<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// Patient coordinate convention of a 3D point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CoordinateSystem {
    /// Left-Posterior-Superior, the convention of DICOM and Slicer markup files
    #[serde(rename = "LPS")]
    Lps,
    /// Right-Anterior-Superior, the world space of the rendering host
    #[default]
    #[serde(rename = "RAS")]
    Ras,
}

impl CoordinateSystem {
    /// Parse the `coordinateSystem` tag used by Slicer files
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "LPS" => Some(CoordinateSystem::Lps),
            "RAS" => Some(CoordinateSystem::Ras),
            _ => None,
        }
    }

    /// Convert a point expressed in `self` into `target`.
    ///
    /// LPS and RAS differ by the sign of the first two axes.
    pub fn convert(self, point: &Point3d, target: CoordinateSystem) -> Point3d {
        if self == target {
            *point
        } else {
            Point3d::new(-point.x, -point.y, point.z)
        }
    }
}
