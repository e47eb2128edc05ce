//! Step-by-step rendering of keypoints for manual review

use crate::overlay::{draw_annotation, draw_caption, draw_partial, AnnotatedImage, OverlayStyle};
use headmark_core::{Error, Result};
use headmark_io::layout::IMAGE_EXTENSIONS;
use headmark_io::{list_samples, ANNOTATION_EXTENSION};
use image::RgbImage;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Files written for one image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceOutput {
    pub steps: Vec<PathBuf>,
    pub final_path: Option<PathBuf>,
}

/// Draws the keypoints of each image one at a time, in label order
#[derive(Debug, Clone)]
pub struct SequenceVisualizer {
    images_path: PathBuf,
    labels_path: PathBuf,
    output_path: Option<PathBuf>,
    style: OverlayStyle,
}

impl SequenceVisualizer {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(images_path: P, labels_path: Q) -> Self {
        Self {
            images_path: images_path.into(),
            labels_path: labels_path.into(),
            output_path: None,
            style: OverlayStyle::default(),
        }
    }

    /// Directory for step and final frames; created on first write
    pub fn with_output<P: Into<PathBuf>>(mut self, output_path: P) -> Self {
        self.output_path = Some(output_path.into());
        self
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    /// Image stems in the images folder, sorted
    pub fn image_names(&self) -> Result<Vec<String>> {
        Ok(list_samples(&self.images_path, &self.labels_path)?
            .into_iter()
            .map(|sample| sample.stem)
            .collect())
    }

    fn image_path(&self, stem: &str) -> Result<PathBuf> {
        IMAGE_EXTENSIONS
            .iter()
            .map(|ext| self.images_path.join(format!("{stem}.{ext}")))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                Error::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Image not found: {}/{stem}", self.images_path.display()),
                ))
            })
    }

    /// Load an image and its annotation by stem
    pub fn load(&self, stem: &str) -> Result<AnnotatedImage> {
        let image_path = self.image_path(stem)?;
        let label_path = self.labels_path.join(format!("{stem}.{ANNOTATION_EXTENSION}"));
        AnnotatedImage::load(image_path, label_path)
    }

    /// Frame `i` shows keypoints `0..=i`; no frames without an annotation
    pub fn frames(&self, annotated: &AnnotatedImage) -> Vec<RgbImage> {
        let Some(record) = &annotated.record else {
            return Vec::new();
        };
        (1..=record.keypoints.len())
            .map(|count| {
                let mut frame = annotated.image.clone();
                draw_partial(&mut frame, record, count, &self.style);
                frame
            })
            .collect()
    }

    /// Render the sequence of one image.
    ///
    /// With an output directory, `<stem>_final.png` is always written and
    /// `<stem>_step_NN.png` (1-based) per keypoint when `save_steps` is set.
    pub fn visualize(&self, stem: &str, save_steps: bool) -> Result<SequenceOutput> {
        let annotated = self.load(stem)?;
        let frames = self.frames(&annotated);
        if frames.is_empty() {
            log::warn!("{stem}: no keypoints to draw");
        }

        let mut output = SequenceOutput::default();
        let Some(dir) = &self.output_path else {
            return Ok(output);
        };
        fs::create_dir_all(dir)?;

        if save_steps {
            for (i, frame) in frames.iter().enumerate() {
                let path = dir.join(format!("{stem}_step_{:02}.png", i + 1));
                frame.save(&path)?;
                log::debug!("Saved step: {}", path.display());
                output.steps.push(path);
            }
        }

        let final_frame = frames.last().unwrap_or(&annotated.image);
        let final_path = dir.join(format!("{stem}_final.png"));
        final_frame.save(&final_path)?;
        log::info!("Saved final result: {}", final_path.display());
        output.final_path = Some(final_path);

        Ok(output)
    }

    /// Run [`Self::visualize`] over every image. Failures are logged and
    /// skipped; returns the number of images processed.
    pub fn visualize_all(&self, save_steps: bool) -> Result<usize> {
        let names = self.image_names()?;
        if names.is_empty() {
            log::warn!("No images found in {}", self.images_path.display());
            return Ok(0);
        }
        log::info!("Found {} images", names.len());

        let mut done = 0;
        for (i, name) in names.iter().enumerate() {
            log::info!("Image {}/{}: {name}", i + 1, names.len());
            match self.visualize(name, save_steps) {
                Ok(_) => done += 1,
                Err(e) => log::warn!("{name}: {e}"),
            }
        }
        Ok(done)
    }

    /// All keypoints of one image drawn at once under an `All keypoints: <stem>`
    /// title, optionally saved to `save_path`
    pub fn summary(&self, stem: &str, save_path: Option<&Path>) -> Result<RgbImage> {
        let annotated = self.load(stem)?;
        let Some(record) = &annotated.record else {
            return Err(Error::InvalidData(format!("No annotation for {stem}")));
        };
        let mut summary = annotated.image.clone();
        if self.style.labels {
            draw_caption(&mut summary, &format!("All keypoints: {stem}"));
        }
        draw_annotation(&mut summary, record, &self.style);
        if let Some(path) = save_path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            summary.save(path)?;
            log::info!("Saved: {}", path.display());
        }
        Ok(summary)
    }
}
