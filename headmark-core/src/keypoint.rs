//! Normalized 2D keypoints, bounding boxes and annotation records

use crate::landmark::LandmarkLabel;
use serde::{Deserialize, Serialize};

/// A landmark projected into the image and normalized by its size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedKeypoint {
    pub label: LandmarkLabel,
    pub x: f64,
    pub y: f64,
}

impl ProjectedKeypoint {
    pub fn new(label: LandmarkLabel, x: f64, y: f64) -> Self {
        Self { label, x, y }
    }

    /// Whether both coordinates lie in `[0, 1]`
    pub fn is_in_frame(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }

    /// Pixel position in an image of the given size, truncated to whole pixels
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        (
            (self.x * width as f64) as i32,
            (self.y * height as f64) as i32,
        )
    }
}

/// Axis aligned box in center/size form, normalized to the image frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub class_index: u32,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    pub fn new(class_index: u32, cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            class_index,
            cx,
            cy,
            w,
            h,
        }
    }

    /// Build a box from its corner extents
    pub fn from_extent(class_index: u32, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            class_index,
            cx: (min_x + max_x) / 2.0,
            cy: (min_y + max_y) / 2.0,
            w: max_x - min_x,
            h: max_y - min_y,
        }
    }

    pub fn min_x(&self) -> f64 {
        self.cx - self.w / 2.0
    }

    pub fn min_y(&self) -> f64 {
        self.cy - self.h / 2.0
    }

    pub fn max_x(&self) -> f64 {
        self.cx + self.w / 2.0
    }

    pub fn max_y(&self) -> f64 {
        self.cy + self.h / 2.0
    }

    /// Whether the keypoint lies inside the box, allowing `epsilon` slack
    pub fn contains(&self, keypoint: &ProjectedKeypoint, epsilon: f64) -> bool {
        keypoint.x >= self.min_x() - epsilon
            && keypoint.x <= self.max_x() + epsilon
            && keypoint.y >= self.min_y() - epsilon
            && keypoint.y <= self.max_y() + epsilon
    }

    /// Pixel corners `(x0, y0, x1, y1)` in an image of the given size
    pub fn to_pixel_rect(&self, width: u32, height: u32) -> (i32, i32, i32, i32) {
        (
            (self.min_x() * width as f64) as i32,
            (self.min_y() * height as f64) as i32,
            (self.max_x() * width as f64) as i32,
            (self.max_y() * height as f64) as i32,
        )
    }
}

/// One bounding box followed by the four keypoints in [`LandmarkLabel::ORDER`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub bbox: BoundingBox,
    pub keypoints: [ProjectedKeypoint; 4],
}

impl AnnotationRecord {
    /// Assemble a record from coordinate pairs given in label order
    pub fn from_ordered(bbox: BoundingBox, coords: [(f64, f64); 4]) -> Self {
        let keypoints = std::array::from_fn(|i| {
            let (x, y) = coords[i];
            ProjectedKeypoint::new(LandmarkLabel::ORDER[i], x, y)
        });
        Self { bbox, keypoints }
    }

    pub fn keypoint(&self, label: LandmarkLabel) -> &ProjectedKeypoint {
        &self.keypoints[label.index()]
    }

    /// Whether the box contains every keypoint
    pub fn box_contains_keypoints(&self, epsilon: f64) -> bool {
        self.keypoints.iter().all(|kp| self.bbox.contains(kp, epsilon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bbox_extent_round_trip() {
        let bbox = BoundingBox::from_extent(0, 0.5, 0.5, 0.6, 0.6);
        assert_relative_eq!(bbox.cx, 0.55, epsilon = 1e-12);
        assert_relative_eq!(bbox.w, 0.1, epsilon = 1e-12);
        assert_relative_eq!(bbox.min_x(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(bbox.max_y(), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_record_keeps_label_order() {
        let bbox = BoundingBox::from_extent(0, 0.1, 0.1, 0.4, 0.4);
        let record = AnnotationRecord::from_ordered(bbox, [(0.1, 0.1), (0.1, 0.4), (0.4, 0.1), (0.4, 0.4)]);
        for (i, kp) in record.keypoints.iter().enumerate() {
            assert_eq!(kp.label, LandmarkLabel::ORDER[i]);
        }
        assert_eq!(record.keypoint(LandmarkLabel::RightInfraorbital).x, 0.4);
        assert!(record.box_contains_keypoints(1e-9));
    }

    #[test]
    fn test_keypoint_pixels_truncate() {
        let kp = ProjectedKeypoint::new(LandmarkLabel::LeftMental, 0.5049, 0.999);
        assert_eq!(kp.to_pixel(200, 100), (100, 99));
        assert!(kp.is_in_frame());
        assert!(!ProjectedKeypoint::new(LandmarkLabel::LeftMental, -0.1, 0.5).is_in_frame());
    }
}
