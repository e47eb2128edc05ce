//! Projection of a landmark set into a normalized 2D annotation record

use crate::error::{Error, Result};
use crate::keypoint::{AnnotationRecord, BoundingBox};
use crate::landmark::{LandmarkLabel, LandmarkSet, MarkupPoint};
use crate::transform::PlaneTransform;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Image axis of a normalized coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

/// A normalized keypoint coordinate outside `[0, 1]`.
///
/// Non-fatal: the value is kept as computed and the caller decides whether
/// to discard the sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateRangeWarning {
    pub label: LandmarkLabel,
    pub axis: Axis,
    pub value: f64,
}

impl fmt::Display for CoordinateRangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} = {:.6} is outside [0, 1]",
            self.label, self.axis, self.value
        )
    }
}

/// Settings applied to every projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Class index written in the bounding box row
    pub class_index: u32,
    /// Normalized margin added on every side of the keypoint extent
    pub padding: f64,
    /// Truncate pixel coordinates to whole pixels before normalizing
    pub snap_to_pixel: bool,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            class_index: 0,
            padding: 0.0,
            snap_to_pixel: false,
        }
    }
}

/// Output of a projection: the record plus any range warnings
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub record: AnnotationRecord,
    pub warnings: Vec<CoordinateRangeWarning>,
}

impl Projection {
    /// Whether every keypoint landed inside the image
    pub fn is_in_frame(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Projects 3D markup through a plane transform into an [`AnnotationRecord`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationProjector {
    config: ProjectorConfig,
}

impl AnnotationProjector {
    pub fn new(config: ProjectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    /// Project four labeled markup points.
    ///
    /// Points may arrive in any order; keypoints come out in
    /// [`LandmarkLabel::ORDER`]. Fails when a label is missing or repeated,
    /// when the image size is zero, or when a point has no image on the plane.
    pub fn project<T>(
        &self,
        markup_points: &[MarkupPoint],
        image_width: u32,
        image_height: u32,
        plane_transform: &T,
    ) -> Result<Projection>
    where
        T: PlaneTransform + ?Sized,
    {
        let landmarks = LandmarkSet::from_points(markup_points)?;
        self.project_set(&landmarks, image_width, image_height, plane_transform)
    }

    /// Project an already validated landmark set
    pub fn project_set<T>(
        &self,
        landmarks: &LandmarkSet,
        image_width: u32,
        image_height: u32,
        plane_transform: &T,
    ) -> Result<Projection>
    where
        T: PlaneTransform + ?Sized,
    {
        if image_width == 0 || image_height == 0 {
            return Err(Error::InvalidImageSize {
                width: image_width,
                height: image_height,
            });
        }
        let (w, h) = (image_width as f64, image_height as f64);

        let mut coords = [(0.0, 0.0); 4];
        for (slot, point) in coords.iter_mut().zip(landmarks.iter()) {
            let pixel = plane_transform
                .to_pixel(&point.position)
                .filter(|p| p.x.is_finite() && p.y.is_finite())
                .ok_or(Error::Unprojectable { label: point.label })?;

            let (px, py) = if self.config.snap_to_pixel {
                (pixel.x.trunc(), pixel.y.trunc())
            } else {
                (pixel.x, pixel.y)
            };
            *slot = (px / w, py / h);
        }

        let bbox = self.enclosing_box(&coords);
        let record = AnnotationRecord::from_ordered(bbox, coords);
        let warnings = range_warnings(&record);
        for warning in &warnings {
            log::debug!("{warning}");
        }

        Ok(Projection { record, warnings })
    }

    fn enclosing_box(&self, coords: &[(f64, f64); 4]) -> BoundingBox {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for &(x, y) in coords {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let pad = self.config.padding.max(0.0);
        if pad > 0.0 {
            // Grow into the frame only, never shrink below the keypoints
            min_x = (min_x - pad).max(0.0).min(min_x);
            min_y = (min_y - pad).max(0.0).min(min_y);
            max_x = (max_x + pad).min(1.0).max(max_x);
            max_y = (max_y + pad).min(1.0).max(max_y);
        }

        BoundingBox::from_extent(self.config.class_index, min_x, min_y, max_x, max_y)
    }
}

/// Collect a warning for every keypoint coordinate outside `[0, 1]`
pub fn range_warnings(record: &AnnotationRecord) -> Vec<CoordinateRangeWarning> {
    let mut warnings = Vec::new();
    for kp in &record.keypoints {
        for (axis, value) in [(Axis::X, kp.x), (Axis::Y, kp.y)] {
            if !(0.0..=1.0).contains(&value) {
                warnings.push(CoordinateRangeWarning {
                    label: kp.label,
                    axis,
                    value,
                });
            }
        }
    }
    warnings
}
