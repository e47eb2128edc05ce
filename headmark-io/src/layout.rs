//! Directory conventions for source studies and generated datasets
//!
//! Sources: `<data>/markups_<patient>/` holding a scene file and `L_*.json`
//! landmark files. Datasets: `<dataset>/<patient>/images/<stem>.png` paired
//! with `<dataset>/<patient>/labels/<stem>.txt`.

use crate::annotation::ANNOTATION_EXTENSION;
use headmark_core::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of study folders in the source data directory
pub const STUDY_FOLDER_PREFIX: &str = "markups_";

pub const IMAGES_DIR: &str = "images";
pub const LABELS_DIR: &str = "labels";

/// Image extensions recognised when listing samples
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// One `markups_<patient>` folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyFolder {
    pub path: PathBuf,
    /// Folder name without the `markups_` prefix
    pub patient: String,
}

impl StudyFolder {
    /// Build from a folder path; `None` unless the name has the study prefix
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let patient = name.strip_prefix(STUDY_FOLDER_PREFIX)?;
        Some(Self {
            path: path.to_path_buf(),
            patient: patient.to_string(),
        })
    }

    /// First `.mrml` scene file in the folder, if any
    pub fn scene_file(&self) -> Result<Option<PathBuf>> {
        let mut scenes: Vec<PathBuf> = fs::read_dir(&self.path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| has_extension(p, &["mrml"]))
            .collect();
        scenes.sort();
        Ok(scenes.into_iter().next())
    }
}

/// All study folders of a source data directory, sorted by name
pub fn find_study_folders<P: AsRef<Path>>(data_path: P) -> Result<Vec<StudyFolder>> {
    let mut studies = Vec::new();
    for entry in fs::read_dir(data_path)? {
        let path = entry?.path();
        if path.is_dir() {
            if let Some(study) = StudyFolder::from_path(&path) {
                studies.push(study);
            }
        }
    }
    studies.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(studies)
}

/// An image with the path its annotation should have
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub stem: String,
    pub image_path: PathBuf,
    pub label_path: PathBuf,
}

impl Sample {
    pub fn has_label(&self) -> bool {
        self.label_path.is_file()
    }
}

/// Standardized dataset directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn patient_dir(&self, patient: &str) -> PathBuf {
        self.root.join(patient)
    }

    pub fn images_dir(&self, patient: &str) -> PathBuf {
        self.patient_dir(patient).join(IMAGES_DIR)
    }

    pub fn labels_dir(&self, patient: &str) -> PathBuf {
        self.patient_dir(patient).join(LABELS_DIR)
    }

    pub fn image_path(&self, patient: &str, stem: &str, extension: &str) -> PathBuf {
        self.images_dir(patient).join(format!("{stem}.{extension}"))
    }

    pub fn label_path(&self, patient: &str, stem: &str) -> PathBuf {
        self.labels_dir(patient)
            .join(format!("{stem}.{ANNOTATION_EXTENSION}"))
    }

    /// Create the `images/` and `labels/` folders of a patient
    pub fn create_patient_dirs(&self, patient: &str) -> Result<()> {
        fs::create_dir_all(self.images_dir(patient))?;
        fs::create_dir_all(self.labels_dir(patient))?;
        Ok(())
    }

    /// Patients with an `images/` folder, sorted by name
    pub fn patients(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut patients = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.join(IMAGES_DIR).is_dir() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    patients.push(name.to_string());
                }
            }
        }
        patients.sort();
        Ok(patients)
    }

    /// Images of one patient paired with their label paths, sorted by file name
    pub fn samples(&self, patient: &str) -> Result<Vec<Sample>> {
        let labels_dir = self.labels_dir(patient);
        list_samples(&self.images_dir(patient), &labels_dir)
    }
}

/// Pair every image in `images_dir` with `<labels_dir>/<stem>.txt`.
///
/// Overlays written by the review tools (`*_with_markup`, `*_step_NN`,
/// `*_final`) are not samples and are skipped.
pub fn list_samples(images_dir: &Path, labels_dir: &Path) -> Result<Vec<Sample>> {
    let mut images: Vec<PathBuf> = fs::read_dir(images_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_extension(p, &IMAGE_EXTENSIONS))
        .collect();
    images.sort();

    let samples = images
        .into_iter()
        .filter_map(|image_path| {
            let stem = image_path.file_stem()?.to_str()?.to_string();
            if is_overlay_stem(&stem) {
                return None;
            }
            let label_path = labels_dir.join(format!("{stem}.{ANNOTATION_EXTENSION}"));
            Some(Sample {
                stem,
                image_path,
                label_path,
            })
        })
        .collect();
    Ok(samples)
}

fn is_overlay_stem(stem: &str) -> bool {
    if stem.ends_with("_with_markup") || stem.ends_with("_final") {
        return true;
    }
    match stem.rsplit_once("_step_") {
        Some((_, n)) => !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}
