//! Assigning landmark labels to soft tissue points read from markup

use headmark_core::{Error, LandmarkLabel, LandmarkSet, MarkupPoint, Result};
use headmark_io::LandmarkCandidate;
use serde::{Deserialize, Serialize};

/// How candidates are mapped onto the four landmark labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelingStrategy {
    /// Names when every candidate has a recognisable one, quadrants otherwise
    #[default]
    Auto,
    /// Parse each candidate name with [`LandmarkLabel::from_name`]
    ByName,
    /// Split the first four points on their median x and z, sides as seen
    /// from the front
    ByQuadrant,
}

/// Label candidates and validate that each landmark appears exactly once
pub fn label_landmarks(candidates: &[LandmarkCandidate], strategy: LabelingStrategy) -> Result<LandmarkSet> {
    match strategy {
        LabelingStrategy::ByName => label_by_name(candidates),
        LabelingStrategy::ByQuadrant => label_by_quadrant(candidates),
        LabelingStrategy::Auto => label_by_name(candidates).or_else(|err| {
            log::debug!("Name based labeling failed ({err}), falling back to quadrants");
            label_by_quadrant(candidates)
        }),
    }
}

/// Label every candidate from its name
pub fn label_by_name(candidates: &[LandmarkCandidate]) -> Result<LandmarkSet> {
    let points = candidates
        .iter()
        .map(|candidate| {
            let name = candidate.name.as_deref().unwrap_or_default();
            LandmarkLabel::from_name(name)
                .map(|label| MarkupPoint::new(label, candidate.position))
                .ok_or_else(|| {
                    Error::InvalidData(format!(
                        "{}: '{name}' does not name a landmark",
                        candidate.source.display()
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;
    LandmarkSet::from_points(&points)
}

/// Label the first four candidates by their position relative to the medians.
///
/// Sides are taken as seen in the frontal view: "left" is the high-x side in
/// RAS (low x in LPS), which is the image left when facing the patient. This
/// is the viewer's left, not the patient's; name the markups to get anatomical
/// sides. The mental points are the inferior (low-z) pair. When two points
/// share a quadrant only the first is kept and the empty quadrant is reported
/// as missing.
pub fn label_by_quadrant(candidates: &[LandmarkCandidate]) -> Result<LandmarkSet> {
    let points: Vec<_> = candidates.iter().take(4).map(|c| c.position).collect();

    let median_x = median(points.iter().map(|p| p.x).collect());
    let median_z = median(points.iter().map(|p| p.z).collect());

    let mut assigned: Vec<MarkupPoint> = Vec::with_capacity(4);
    for position in points {
        let left = position.x > median_x;
        let mental = position.z < median_z;
        let label = LandmarkLabel::from_parts(left, mental);
        if assigned.iter().any(|p| p.label == label) {
            continue;
        }
        assigned.push(MarkupPoint::new(label, position));
    }

    LandmarkSet::from_points(&assigned)
}

fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
