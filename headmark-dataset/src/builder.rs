//! Batch conversion of study folders into an image + annotation dataset

use crate::labeling::{label_landmarks, LabelingStrategy};
use crate::render::SliceRenderer;
use crate::sweep::{CameraSweep, ViewPose};
use headmark_core::{AnnotationProjector, Error, LandmarkSet, ProjectorConfig, Result};
use headmark_io::{find_study_folders, write_annotation, DatasetLayout, MarkupReader, StudyFolder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Encoding of the written images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
        }
    }

    /// Encode `image` to `path`. JPEG has no alpha channel, so the image is
    /// converted to RGB first.
    pub fn save(self, image: &image::DynamicImage, path: &Path) -> Result<()> {
        match self {
            ImageFormat::Png => image.save_with_format(path, image::ImageFormat::Png)?,
            ImageFormat::Jpg => image::DynamicImage::ImageRgb8(image.to_rgb8())
                .save_with_format(path, image::ImageFormat::Jpeg)?,
        }
        Ok(())
    }
}

/// Settings of a dataset build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory holding the `markups_<patient>` folders
    pub data_path: PathBuf,
    /// Output dataset root
    pub dataset_path: PathBuf,
    pub sweep: CameraSweep,
    pub projector: ProjectorConfig,
    pub labeling: LabelingStrategy,
    /// Drop views whose keypoints fall outside the image
    pub discard_out_of_range: bool,
    /// Skip studies without a `.mrml` scene file
    pub require_scene: bool,
    /// `"png"` or `"jpg"` (`"jpeg"` accepted)
    pub image_format: ImageFormat,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::new(),
            dataset_path: PathBuf::new(),
            sweep: CameraSweep::default(),
            projector: ProjectorConfig::default(),
            labeling: LabelingStrategy::default(),
            discard_out_of_range: false,
            require_scene: false,
            image_format: ImageFormat::Png,
        }
    }
}

impl BuildConfig {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(data_path: P, dataset_path: Q) -> Self {
        Self {
            data_path: data_path.into(),
            dataset_path: dataset_path.into(),
            ..Default::default()
        }
    }

    /// Load a JSON config; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Something that went wrong for a study or one of its views
#[derive(Debug)]
pub struct BuildFailure {
    pub patient: String,
    /// `None` when the whole study was skipped
    pub view: Option<String>,
    pub error: Error,
}

/// Outcome of a dataset build
#[derive(Debug, Default)]
pub struct BuildReport {
    pub studies_found: usize,
    pub studies_completed: usize,
    pub views_written: usize,
    pub views_discarded: usize,
    pub failures: Vec<BuildFailure>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.views_discarded == 0
    }
}

/// Converts study folders into the standardized dataset layout
pub struct DatasetBuilder<R> {
    config: BuildConfig,
    renderer: R,
    projector: AnnotationProjector,
    layout: DatasetLayout,
}

impl<R: SliceRenderer> DatasetBuilder<R> {
    pub fn new(config: BuildConfig, renderer: R) -> Self {
        let projector = AnnotationProjector::new(config.projector);
        let layout = DatasetLayout::new(config.dataset_path.clone());
        Self {
            config,
            renderer,
            projector,
            layout,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    /// Process every study folder under `data_path`.
    ///
    /// Only a missing or unreadable data directory fails the build; problems
    /// with individual studies and views are collected in the report.
    pub fn build(&mut self) -> Result<BuildReport> {
        fs::create_dir_all(&self.config.dataset_path)?;
        let studies = find_study_folders(&self.config.data_path)?;

        let mut report = BuildReport {
            studies_found: studies.len(),
            ..Default::default()
        };
        if studies.is_empty() {
            log::warn!(
                "No {}* folders found in {}",
                headmark_io::layout::STUDY_FOLDER_PREFIX,
                self.config.data_path.display()
            );
            return Ok(report);
        }

        log::info!("Found {} studies to process", studies.len());
        for study in &studies {
            self.build_study(study, &mut report);
        }

        log::info!(
            "Processing completed: {} views written, {} discarded, {} failures; results saved to {}",
            report.views_written,
            report.views_discarded,
            report.failures.len(),
            self.config.dataset_path.display()
        );
        Ok(report)
    }

    /// Process one study, recording failures in `report`
    pub fn build_study(&mut self, study: &StudyFolder, report: &mut BuildReport) {
        log::info!("Processing {} -> {}", study.path.display(), study.patient);

        let landmarks = match self.prepare_study(study) {
            Ok(landmarks) => landmarks,
            Err(error) => {
                log::warn!("Skipping {}: {error}", study.patient);
                report.failures.push(BuildFailure {
                    patient: study.patient.clone(),
                    view: None,
                    error,
                });
                return;
            }
        };

        for pose in self.config.sweep.poses() {
            match self.build_view(study, &landmarks, &pose) {
                Ok(true) => report.views_written += 1,
                Ok(false) => report.views_discarded += 1,
                Err(error) => {
                    log::warn!("{}/{}: {error}", study.patient, pose.name);
                    report.failures.push(BuildFailure {
                        patient: study.patient.clone(),
                        view: Some(pose.name.clone()),
                        error,
                    });
                }
            }
        }

        report.studies_completed += 1;
        log::info!("Completed: {}", study.patient);
    }

    /// Read and label landmarks, then create output folders and load the scene.
    ///
    /// Labeling happens first so a study with missing landmarks leaves
    /// nothing behind in the dataset.
    fn prepare_study(&mut self, study: &StudyFolder) -> Result<LandmarkSet> {
        if self.config.require_scene && study.scene_file()?.is_none() {
            return Err(Error::InvalidData(format!(
                "No .mrml file found in {}",
                study.path.display()
            )));
        }

        let candidates = MarkupReader::read_study_dir(&study.path)?;
        log::info!("Extracted {} soft tissue points", candidates.len());
        let landmarks = label_landmarks(&candidates, self.config.labeling)?;

        self.layout.create_patient_dirs(&study.patient)?;
        self.renderer.load_study(study)?;
        Ok(landmarks)
    }

    /// Render, project and write one view. Returns `false` when discarded.
    fn build_view(&mut self, study: &StudyFolder, landmarks: &LandmarkSet, pose: &ViewPose) -> Result<bool> {
        let slice = self.renderer.render_slice(study, pose)?;
        let projection = self
            .projector
            .project_set(landmarks, slice.width(), slice.height(), &slice.transform)?;

        for warning in &projection.warnings {
            log::warn!("{}/{}: {warning}", study.patient, pose.name);
        }
        if self.config.discard_out_of_range && !projection.is_in_frame() {
            log::info!("{}/{}: discarded, keypoints outside the image", study.patient, pose.name);
            return Ok(false);
        }

        let image_path = self
            .layout
            .image_path(&study.patient, &pose.name, self.config.image_format.extension());
        let label_path = self.layout.label_path(&study.patient, &pose.name);

        self.config.image_format.save(&slice.image, &image_path)?;
        if let Err(error) = write_annotation(&projection.record, &label_path) {
            // Keep pairs complete
            let _ = fs::remove_file(&image_path);
            return Err(error);
        }

        log::debug!("Wrote {} and {}", image_path.display(), label_path.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_json_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.json");
        fs::write(
            &path,
            r#"{ "data_path": "/in", "dataset_path": "/out",
                 "sweep": { "pitch_num": 3 },
                 "projector": { "padding": 0.05 },
                 "labeling": "by_quadrant" }"#,
        )
        .unwrap();

        let config = BuildConfig::from_json_file(&path).unwrap();
        assert_eq!(config.data_path, PathBuf::from("/in"));
        assert_eq!(config.sweep.pitch_num, 3);
        assert_eq!(config.sweep.yaw_num, 10);
        assert_eq!(config.projector.padding, 0.05);
        assert_eq!(config.projector.class_index, 0);
        assert_eq!(config.labeling, LabelingStrategy::ByQuadrant);
        assert_eq!(config.image_format, ImageFormat::Png);
        assert!(!config.discard_out_of_range);
    }

    #[test]
    fn test_bad_config_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.json");
        fs::write(&path, r#"{ "labeling": "by_magic" }"#).unwrap();
        assert!(matches!(BuildConfig::from_json_file(&path), Err(Error::Json(_))));
    }

    #[test]
    fn test_image_format_is_checked() {
        let jpeg: BuildConfig = serde_json::from_str(r#"{ "image_format": "jpeg" }"#).unwrap();
        assert_eq!(jpeg.image_format, ImageFormat::Jpg);
        assert_eq!(jpeg.image_format.extension(), "jpg");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.json");
        fs::write(&path, r#"{ "image_format": "bmp" }"#).unwrap();
        assert!(matches!(BuildConfig::from_json_file(&path), Err(Error::Json(_))));
    }

    #[test]
    fn test_report_cleanliness() {
        let mut report = BuildReport::default();
        assert!(report.is_clean());
        report.views_discarded = 1;
        assert!(!report.is_clean());
    }
}
