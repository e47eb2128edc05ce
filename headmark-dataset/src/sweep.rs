//! Camera poses used to render each study

use headmark_core::{Point3d, Vector3d};
use serde::{Deserialize, Serialize};

/// Rotation series of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Series {
    /// Camera tilts up and down in the sagittal plane
    Pitch,
    /// Camera swings left and right in the axial plane
    Yaw,
}

impl Series {
    fn name(self) -> &'static str {
        match self {
            Series::Pitch => "pitch",
            Series::Yaw => "yaw",
        }
    }
}

/// One camera placement, looking at the scene origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewPose {
    /// File stem of the rendered view, e.g. `image_pitch03`
    pub name: String,
    pub series: Series,
    pub angle_degrees: f64,
    pub position: Point3d,
    pub focal_point: Point3d,
    pub view_up: Vector3d,
}

/// Pitch and yaw series around a frontal camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSweep {
    /// Camera distance from the scene origin
    pub distance: f64,
    /// Pitch range in degrees `(min, max)`
    pub pitch_range: (f64, f64),
    pub pitch_num: usize,
    /// Yaw range in degrees `(min, max)`
    pub yaw_range: (f64, f64),
    pub yaw_num: usize,
}

impl Default for CameraSweep {
    fn default() -> Self {
        Self {
            distance: 450.0,
            pitch_range: (-15.0, 15.0),
            pitch_num: 10,
            yaw_range: (-10.0, 10.0),
            yaw_num: 10,
        }
    }
}

impl CameraSweep {
    /// Evenly spaced angles over `range`, inclusive of both ends
    fn angles(range: (f64, f64), count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![range.0],
            _ => (0..count)
                .map(|i| range.0 + (range.1 - range.0) * i as f64 / (count - 1) as f64)
                .collect(),
        }
    }

    /// Camera pose for one angle of a series
    pub fn pose(&self, series: Series, index: usize, angle_degrees: f64) -> ViewPose {
        let angle = angle_degrees.to_radians();
        let d = self.distance;
        let position = match series {
            Series::Pitch => Point3d::new(0.0, d * angle.cos(), d * angle.sin()),
            Series::Yaw => Point3d::new(d * angle.sin(), d * angle.cos(), 0.0),
        };

        ViewPose {
            name: format!("image_{}{:02}", series.name(), index),
            series,
            angle_degrees,
            position,
            focal_point: Point3d::origin(),
            view_up: Vector3d::new(0.0, 0.0, 1.0),
        }
    }

    /// All poses: the pitch series followed by the yaw series
    pub fn poses(&self) -> Vec<ViewPose> {
        let pitch = Self::angles(self.pitch_range, self.pitch_num)
            .into_iter()
            .enumerate()
            .map(|(i, a)| self.pose(Series::Pitch, i, a));
        let yaw = Self::angles(self.yaw_range, self.yaw_num)
            .into_iter()
            .enumerate()
            .map(|(i, a)| self.pose(Series::Yaw, i, a));
        pitch.chain(yaw).collect()
    }

    pub fn len(&self) -> usize {
        self.pitch_num + self.yaw_num
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_sweep() {
        let sweep = CameraSweep::default();
        let poses = sweep.poses();
        assert_eq!(poses.len(), 20);
        assert_eq!(sweep.len(), 20);

        assert_eq!(poses[0].name, "image_pitch00");
        assert_relative_eq!(poses[0].angle_degrees, -15.0);
        assert_eq!(poses[9].name, "image_pitch09");
        assert_relative_eq!(poses[9].angle_degrees, 15.0);
        assert_eq!(poses[10].name, "image_yaw00");
        assert_relative_eq!(poses[19].angle_degrees, 10.0);
    }

    #[test]
    fn test_pose_positions_keep_distance() {
        let sweep = CameraSweep::default();
        for pose in sweep.poses() {
            assert_relative_eq!((pose.position - pose.focal_point).norm(), 450.0, epsilon = 1e-9);
        }

        let pitch = sweep.pose(Series::Pitch, 0, 90.0);
        assert_relative_eq!(pitch.position.z, 450.0, epsilon = 1e-9);
        let yaw = sweep.pose(Series::Yaw, 0, 90.0);
        assert_relative_eq!(yaw.position.x, 450.0, epsilon = 1e-9);
        assert_relative_eq!(yaw.position.z, 0.0);
    }

    #[test]
    fn test_single_and_empty_series() {
        let sweep = CameraSweep {
            pitch_num: 1,
            yaw_num: 0,
            ..Default::default()
        };
        let poses = sweep.poses();
        assert_eq!(poses.len(), 1);
        assert_relative_eq!(poses[0].angle_degrees, -15.0);
        assert_relative_eq!(poses[0].position.y, 450.0 * 15f64.to_radians().cos(), epsilon = 1e-9);
        assert!(CameraSweep { pitch_num: 0, yaw_num: 0, ..Default::default() }.is_empty());
    }
}
