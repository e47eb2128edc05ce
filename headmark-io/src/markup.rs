//! 3D Slicer markup JSON support
//!
//! Landmarks of a study live in a `markups_<patient>` folder as Slicer
//! `.mrk.json` files named `L_*.json`. Every `Line` markup measures soft
//! tissue thickness; its second control point sits on the skin surface and
//! is the landmark used for the 2D dataset.

use headmark_core::{CoordinateSystem, Error, Point3d, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of landmark files inside a study folder
pub const LANDMARK_FILE_PREFIX: &str = "L_";

#[derive(Debug, Clone, Deserialize)]
struct MarkupFile {
    #[serde(default)]
    markups: Vec<Markup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Markup {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    coordinate_system: Option<String>,
    #[serde(default)]
    control_points: Vec<ControlPoint>,
}

#[derive(Debug, Clone, Deserialize)]
struct ControlPoint {
    #[serde(default)]
    label: Option<String>,
    position: [f64; 3],
}

/// A soft tissue point read from a markup file, before labeling
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkCandidate {
    /// Best available name: control point label, markup name, or file stem
    pub name: Option<String>,
    /// Position in RAS world space
    pub position: Point3d,
    pub source: PathBuf,
}

/// Slicer markup reader implementation
pub struct MarkupReader;

impl MarkupReader {
    /// Read the soft tissue points of every `Line` markup in one file
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<LandmarkCandidate>> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Parse markup JSON; `source` is recorded on every candidate
    pub fn parse(text: &str, source: &Path) -> Result<Vec<LandmarkCandidate>> {
        let file: MarkupFile = serde_json::from_str(text)?;
        let stem = file_stem(source);
        let mut candidates = Vec::new();

        for markup in &file.markups {
            if markup.kind != "Line" || markup.control_points.len() < 2 {
                continue;
            }

            let system = match markup.coordinate_system.as_deref() {
                Some(tag) => CoordinateSystem::from_tag(tag).ok_or_else(|| {
                    Error::InvalidData(format!(
                        "{}: unsupported coordinate system '{tag}'",
                        source.display()
                    ))
                })?,
                // Slicer has written LPS by default since 5.0
                None => CoordinateSystem::Lps,
            };

            let tissue = &markup.control_points[1];
            let [x, y, z] = tissue.position;
            let position = system.convert(&Point3d::new(x, y, z), CoordinateSystem::Ras);

            let name = tissue
                .label
                .clone()
                .filter(|l| !l.trim().is_empty())
                .or_else(|| markup.name.clone())
                .or_else(|| stem.clone());

            candidates.push(LandmarkCandidate {
                name,
                position,
                source: source.to_path_buf(),
            });
        }

        Ok(candidates)
    }

    /// Landmark files of a study folder (`L_*.json`), sorted by name
    pub fn landmark_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_landmark = path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(LANDMARK_FILE_PREFIX) && n.ends_with(".json"))
                    .unwrap_or(false);
            if is_landmark {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Read every landmark file in a study folder
    pub fn read_study_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<LandmarkCandidate>> {
        let mut candidates = Vec::new();
        for path in Self::landmark_files(&dir)? {
            candidates.extend(Self::read_file(&path)?);
        }
        log::debug!(
            "Extracted {} soft tissue points from {}",
            candidates.len(),
            dir.as_ref().display()
        );
        Ok(candidates)
    }
}

fn file_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    // `.mrk.json` carries two extensions
    let stem = name.split('.').next().unwrap_or(name);
    (!stem.is_empty()).then(|| stem.to_string())
}
