//! Mappings from 3D world space onto a 2D image plane

use crate::point::{Point2d, Point3d, Vector3d};
use nalgebra::{Isometry3, Matrix3x4, Matrix4};
use serde::{Deserialize, Serialize};

/// Maps a 3D world point to pixel coordinates of a rendered image.
///
/// Returns `None` when the point has no image on the plane, e.g. it lies
/// behind the camera or the mapping degenerates.
pub trait PlaneTransform {
    fn to_pixel(&self, point: &Point3d) -> Option<Point2d>;
}

impl<T: PlaneTransform + ?Sized> PlaneTransform for &T {
    fn to_pixel(&self, point: &Point3d) -> Option<Point2d> {
        (**self).to_pixel(point)
    }
}

impl<T: PlaneTransform + ?Sized> PlaneTransform for Box<T> {
    fn to_pixel(&self, point: &Point3d) -> Option<Point2d> {
        (**self).to_pixel(point)
    }
}

/// A pinhole camera as reported by the rendering host, in RAS world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveCamera {
    pub position: Point3d,
    pub focal_point: Point3d,
    pub view_up: Vector3d,
    /// Vertical field of view in degrees
    pub fov_degrees: f64,
    /// Viewport size in pixels as `(width, height)`
    pub image_size: (u32, u32),
}

impl PerspectiveCamera {
    pub fn new(
        position: Point3d,
        focal_point: Point3d,
        view_up: Vector3d,
        fov_degrees: f64,
        image_size: (u32, u32),
    ) -> Self {
        Self {
            position,
            focal_point,
            view_up,
            fov_degrees,
            image_size,
        }
    }

    /// Get the view matrix (world to camera, camera looking down -z)
    pub fn view_matrix(&self) -> Matrix4<f64> {
        self.view_isometry().to_homogeneous()
    }

    fn view_isometry(&self) -> Isometry3<f64> {
        Isometry3::look_at_rh(&self.position, &self.focal_point, &self.view_up)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.image_size.0 as f64 / self.image_size.1 as f64
    }

    /// Distance between the camera and its focal point
    pub fn distance(&self) -> f64 {
        (self.focal_point - self.position).norm()
    }
}

impl PlaneTransform for PerspectiveCamera {
    fn to_pixel(&self, point: &Point3d) -> Option<Point2d> {
        let (width, height) = self.image_size;
        if width == 0 || height == 0 {
            return None;
        }
        let forward = self.focal_point - self.position;
        if forward.cross(&self.view_up).norm() <= f64::EPSILON * forward.norm().max(1.0) {
            return None;
        }

        let cam = self.view_isometry().transform_point(point);
        let depth = -cam.z;
        if !depth.is_finite() || depth <= 0.0 {
            return None;
        }

        let tan_half = (self.fov_degrees.to_radians() / 2.0).tan();
        let x_ndc = (cam.x / depth) / tan_half / self.aspect_ratio();
        let y_ndc = (cam.y / depth) / tan_half;

        let pixel = Point2d::new(
            (x_ndc + 1.0) * width as f64 / 2.0,
            (1.0 - y_ndc) * height as f64 / 2.0,
        );
        (pixel.x.is_finite() && pixel.y.is_finite()).then_some(pixel)
    }
}

/// A general homogeneous projection `pixel ~ M * [x y z 1]^T`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineProjection {
    pub matrix: Matrix3x4<f64>,
}

impl AffineProjection {
    pub fn new(matrix: Matrix3x4<f64>) -> Self {
        Self { matrix }
    }

    /// Drop the z axis: `(x, y, z) -> (x, y)`
    pub fn orthographic_xy() -> Self {
        Self::scaled_xy(1.0, 1.0, 0.0, 0.0)
    }

    /// Orthographic view along z with per-axis scale and pixel offset
    pub fn scaled_xy(scale_x: f64, scale_y: f64, offset_x: f64, offset_y: f64) -> Self {
        #[rustfmt::skip]
        let matrix = Matrix3x4::new(
            scale_x, 0.0,     0.0, offset_x,
            0.0,     scale_y, 0.0, offset_y,
            0.0,     0.0,     0.0, 1.0,
        );
        Self { matrix }
    }
}

impl Default for AffineProjection {
    fn default() -> Self {
        Self::orthographic_xy()
    }
}

impl PlaneTransform for AffineProjection {
    fn to_pixel(&self, point: &Point3d) -> Option<Point2d> {
        let h = self.matrix * point.to_homogeneous();
        if h.z.abs() < f64::EPSILON {
            return None;
        }
        let pixel = Point2d::new(h.x / h.z, h.y / h.z);
        (pixel.x.is_finite() && pixel.y.is_finite()).then_some(pixel)
    }
}

impl From<Matrix3x4<f64>> for AffineProjection {
    fn from(matrix: Matrix3x4<f64>) -> Self {
        Self { matrix }
    }
}
