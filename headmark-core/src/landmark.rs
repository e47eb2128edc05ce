//! Anatomical landmark labels and 3D markup points

use crate::error::{Error, Result};
use crate::point::Point3d;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four facial landmarks tracked per study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LandmarkLabel {
    LeftInfraorbital,
    LeftMental,
    RightInfraorbital,
    RightMental,
}

impl LandmarkLabel {
    /// Positional order of keypoints in every annotation record
    pub const ORDER: [LandmarkLabel; 4] = [
        LandmarkLabel::LeftInfraorbital,
        LandmarkLabel::LeftMental,
        LandmarkLabel::RightInfraorbital,
        LandmarkLabel::RightMental,
    ];

    /// Position of this label in [`LandmarkLabel::ORDER`]
    pub fn index(self) -> usize {
        match self {
            LandmarkLabel::LeftInfraorbital => 0,
            LandmarkLabel::LeftMental => 1,
            LandmarkLabel::RightInfraorbital => 2,
            LandmarkLabel::RightMental => 3,
        }
    }

    /// Human readable name
    pub fn display_name(self) -> &'static str {
        match self {
            LandmarkLabel::LeftInfraorbital => "Left Infraorbital",
            LandmarkLabel::LeftMental => "Left Mental",
            LandmarkLabel::RightInfraorbital => "Right Infraorbital",
            LandmarkLabel::RightMental => "Right Mental",
        }
    }

    pub fn is_left(self) -> bool {
        matches!(self, LandmarkLabel::LeftInfraorbital | LandmarkLabel::LeftMental)
    }

    pub fn is_mental(self) -> bool {
        matches!(self, LandmarkLabel::LeftMental | LandmarkLabel::RightMental)
    }

    /// Label for a side/region pair
    pub fn from_parts(left: bool, mental: bool) -> Self {
        match (left, mental) {
            (true, false) => LandmarkLabel::LeftInfraorbital,
            (true, true) => LandmarkLabel::LeftMental,
            (false, false) => LandmarkLabel::RightInfraorbital,
            (false, true) => LandmarkLabel::RightMental,
        }
    }

    /// Parse a label from the many spellings found in markup files.
    ///
    /// Accepts display names, snake/camel case and short forms such as
    /// `L_infraorbital`, `R-Mental` or `LI`.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "li" | "lio" => return Some(LandmarkLabel::LeftInfraorbital),
            "lm" => return Some(LandmarkLabel::LeftMental),
            "ri" | "rio" => return Some(LandmarkLabel::RightInfraorbital),
            "rm" => return Some(LandmarkLabel::RightMental),
            _ => {}
        }

        let left = if normalized.starts_with("left") || normalized.starts_with('l') {
            true
        } else if normalized.starts_with("right") || normalized.starts_with('r') {
            false
        } else {
            return None;
        };

        let mental = if normalized.contains("infraorbital") || normalized.contains("orbit") {
            false
        } else if normalized.contains("mental") || normalized.contains("chin") {
            true
        } else {
            return None;
        };

        Some(Self::from_parts(left, mental))
    }
}

impl fmt::Display for LandmarkLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for LandmarkLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::InvalidData(format!("Unknown landmark label: {s}")))
    }
}

/// A labeled 3D landmark placed on a CT volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkupPoint {
    pub position: Point3d,
    pub label: LandmarkLabel,
}

impl MarkupPoint {
    pub fn new(label: LandmarkLabel, position: Point3d) -> Self {
        Self { position, label }
    }
}

/// Exactly one markup point per landmark label, stored in label order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: [MarkupPoint; 4],
}

impl LandmarkSet {
    /// Validate a point set and arrange it in [`LandmarkLabel::ORDER`].
    ///
    /// Fails with [`Error::DuplicateLandmark`] when a label repeats and with
    /// [`Error::MissingLandmark`] naming every absent label.
    pub fn from_points(points: &[MarkupPoint]) -> Result<Self> {
        let mut slots: [Option<MarkupPoint>; 4] = [None; 4];

        for point in points {
            let slot = &mut slots[point.label.index()];
            if slot.is_some() {
                return Err(Error::DuplicateLandmark(point.label));
            }
            *slot = Some(*point);
        }

        let missing: Vec<LandmarkLabel> = LandmarkLabel::ORDER
            .iter()
            .copied()
            .filter(|label| slots[label.index()].is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingLandmark { labels: missing });
        }

        let mut ordered = [MarkupPoint::new(LandmarkLabel::LeftInfraorbital, Point3d::origin()); 4];
        for (dst, src) in ordered.iter_mut().zip(slots.iter()) {
            if let Some(point) = src {
                *dst = *point;
            }
        }
        Ok(Self { points: ordered })
    }

    /// Points in label order
    pub fn points(&self) -> &[MarkupPoint; 4] {
        &self.points
    }

    pub fn get(&self, label: LandmarkLabel) -> &MarkupPoint {
        &self.points[label.index()]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MarkupPoint> {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a LandmarkSet {
    type Item = &'a MarkupPoint;
    type IntoIter = std::slice::Iter<'a, MarkupPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
