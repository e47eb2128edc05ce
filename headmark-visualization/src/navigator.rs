//! Browsing a generated dataset image by image

use crate::overlay::{draw_caption, AnnotatedImage, OverlayStyle};
use headmark_core::Result;
use headmark_io::{DatasetLayout, Sample};
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Suffix of overlays saved from the navigator
pub const MARKUP_SUFFIX: &str = "_with_markup";

/// Navigation commands, bound to the same keys as the review window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorCommand {
    PreviousImage,
    NextImage,
    PreviousPatient,
    NextPatient,
    Save,
    Quit,
}

impl NavigatorCommand {
    /// `a`/`d` previous/next image, `w`/`s` previous/next patient,
    /// `z` save, `q` quit
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'a' => Some(Self::PreviousImage),
            'd' => Some(Self::NextImage),
            'w' => Some(Self::PreviousPatient),
            's' => Some(Self::NextPatient),
            'z' => Some(Self::Save),
            'q' => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Images of one patient
#[derive(Debug, Clone)]
pub struct PatientImages {
    pub name: String,
    pub samples: Vec<Sample>,
}

/// Where the navigator currently is, 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorPosition {
    pub patient_index: usize,
    pub patient_count: usize,
    pub image_index: usize,
    pub image_count: usize,
}

/// Cursor over every image of every patient in a dataset.
///
/// Moving past the last image of a patient continues with the next patient,
/// and both ends of the dataset wrap around.
#[derive(Debug, Clone)]
pub struct DatasetNavigator {
    patients: Vec<PatientImages>,
    patient_index: usize,
    image_index: usize,
    style: OverlayStyle,
}

impl DatasetNavigator {
    /// Scan a dataset root. Patients without images are left out.
    pub fn open<P: AsRef<Path>>(dataset_path: P) -> Result<Self> {
        let layout = DatasetLayout::new(dataset_path.as_ref());
        let mut patients = Vec::new();
        for name in layout.patients()? {
            let samples = layout.samples(&name)?;
            if samples.is_empty() {
                log::warn!("Patient {name} has no images");
                continue;
            }
            log::info!("Loaded patient: {name} ({} images)", samples.len());
            patients.push(PatientImages { name, samples });
        }
        if patients.is_empty() {
            log::warn!("No patient folders found in: {}", dataset_path.as_ref().display());
        }
        Ok(Self::from_patients(patients))
    }

    pub fn from_patients(patients: Vec<PatientImages>) -> Self {
        Self {
            patients: patients.into_iter().filter(|p| !p.samples.is_empty()).collect(),
            patient_index: 0,
            image_index: 0,
            style: OverlayStyle::review(),
        }
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    pub fn patients(&self) -> &[PatientImages] {
        &self.patients
    }

    /// Current patient name and sample
    pub fn current(&self) -> Option<(&str, &Sample)> {
        let patient = self.patients.get(self.patient_index)?;
        let sample = patient.samples.get(self.image_index)?;
        Some((patient.name.as_str(), sample))
    }

    pub fn position(&self) -> Option<NavigatorPosition> {
        let patient = self.patients.get(self.patient_index)?;
        Some(NavigatorPosition {
            patient_index: self.patient_index,
            patient_count: self.patients.len(),
            image_index: self.image_index,
            image_count: patient.samples.len(),
        })
    }

    fn image_count(&self) -> usize {
        self.patients
            .get(self.patient_index)
            .map(|p| p.samples.len())
            .unwrap_or(0)
    }

    pub fn next_image(&mut self) {
        if self.is_empty() {
            return;
        }
        self.image_index += 1;
        if self.image_index >= self.image_count() {
            self.image_index = 0;
            self.patient_index = (self.patient_index + 1) % self.patients.len();
        }
    }

    pub fn previous_image(&mut self) {
        if self.is_empty() {
            return;
        }
        if self.image_index > 0 {
            self.image_index -= 1;
            return;
        }
        self.patient_index = match self.patient_index {
            0 => self.patients.len() - 1,
            i => i - 1,
        };
        self.image_index = self.image_count().saturating_sub(1);
    }

    pub fn next_patient(&mut self) {
        if self.is_empty() {
            return;
        }
        self.patient_index = (self.patient_index + 1) % self.patients.len();
        self.image_index = 0;
    }

    pub fn previous_patient(&mut self) {
        if self.is_empty() {
            return;
        }
        self.patient_index = match self.patient_index {
            0 => self.patients.len() - 1,
            i => i - 1,
        };
        self.image_index = 0;
    }

    /// Load the current sample
    pub fn load_current(&self) -> Result<Option<AnnotatedImage>> {
        match self.current() {
            Some((_, sample)) => AnnotatedImage::load(&sample.image_path, &sample.label_path).map(Some),
            None => Ok(None),
        }
    }

    /// `Patient: <name> (i/n) | Image: <stem> (j/m)`, 1-based
    pub fn info_line(&self) -> Option<String> {
        let (patient, sample) = self.current()?;
        let position = self.position()?;
        Some(format!(
            "Patient: {patient} ({}/{}) | Image: {} ({}/{})",
            position.patient_index + 1,
            position.patient_count,
            sample.stem,
            position.image_index + 1,
            position.image_count
        ))
    }

    /// Current image with its markup drawn, plus the info line when the
    /// style has labels
    pub fn render_current(&self) -> Result<Option<RgbImage>> {
        let Some(annotated) = self.load_current()? else {
            return Ok(None);
        };
        let mut rendered = annotated.render(&self.style);
        if self.style.labels {
            if let Some(info) = self.info_line() {
                draw_caption(&mut rendered, &info);
            }
        }
        Ok(Some(rendered))
    }

    /// Save the current overlay as `<stem>_with_markup.png` next to the image
    pub fn save_current(&self) -> Result<Option<PathBuf>> {
        let Some((_, sample)) = self.current() else {
            return Ok(None);
        };
        let Some(rendered) = self.render_current()? else {
            return Ok(None);
        };
        let path = sample
            .image_path
            .with_file_name(format!("{}{MARKUP_SUFFIX}.png", sample.stem));
        rendered.save(&path)?;
        log::info!("Saved: {}", path.display());
        Ok(Some(path))
    }

    /// Apply a command. Returns the saved path for [`NavigatorCommand::Save`].
    pub fn apply(&mut self, command: NavigatorCommand) -> Result<Option<PathBuf>> {
        match command {
            NavigatorCommand::PreviousImage => self.previous_image(),
            NavigatorCommand::NextImage => self.next_image(),
            NavigatorCommand::PreviousPatient => self.previous_patient(),
            NavigatorCommand::NextPatient => self.next_patient(),
            NavigatorCommand::Save => return self.save_current(),
            NavigatorCommand::Quit => {}
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(stem: &str) -> Sample {
        Sample {
            stem: stem.to_string(),
            image_path: PathBuf::from(format!("{stem}.png")),
            label_path: PathBuf::from(format!("{stem}.txt")),
        }
    }

    fn navigator() -> DatasetNavigator {
        DatasetNavigator::from_patients(vec![
            PatientImages {
                name: "p1".to_string(),
                samples: vec![sample("a"), sample("b")],
            },
            PatientImages {
                name: "empty".to_string(),
                samples: Vec::new(),
            },
            PatientImages {
                name: "p2".to_string(),
                samples: vec![sample("c")],
            },
        ])
    }

    fn stem(nav: &DatasetNavigator) -> String {
        nav.current().map(|(_, s)| s.stem.clone()).unwrap()
    }

    #[test]
    fn test_next_image_wraps_across_patients() {
        let mut nav = navigator();
        assert_eq!(nav.patients().len(), 2);
        assert_eq!(stem(&nav), "a");
        nav.next_image();
        assert_eq!(stem(&nav), "b");
        nav.next_image();
        assert_eq!(nav.current().unwrap().0, "p2");
        assert_eq!(stem(&nav), "c");
        nav.next_image();
        assert_eq!(stem(&nav), "a");
    }

    #[test]
    fn test_previous_image_lands_on_last_of_previous_patient() {
        let mut nav = navigator();
        nav.previous_image();
        assert_eq!(stem(&nav), "c");
        nav.previous_image();
        assert_eq!(stem(&nav), "b");
        assert_eq!(
            nav.position(),
            Some(NavigatorPosition {
                patient_index: 0,
                patient_count: 2,
                image_index: 1,
                image_count: 2,
            })
        );
    }

    #[test]
    fn test_patient_navigation_resets_image() {
        let mut nav = navigator();
        nav.next_image();
        nav.next_patient();
        assert_eq!(stem(&nav), "c");
        nav.next_patient();
        assert_eq!(stem(&nav), "a");
        nav.previous_patient();
        assert_eq!(stem(&nav), "c");
    }

    #[test]
    fn test_empty_navigator() {
        let mut nav = DatasetNavigator::from_patients(Vec::new());
        nav.next_image();
        nav.previous_image();
        nav.next_patient();
        nav.previous_patient();
        assert!(nav.current().is_none());
        assert!(nav.position().is_none());
        assert!(nav.save_current().unwrap().is_none());
    }

    #[test]
    fn test_info_line() {
        let mut nav = navigator();
        nav.next_image();
        assert_eq!(nav.info_line().unwrap(), "Patient: p1 (1/2) | Image: b (2/2)");
        assert!(DatasetNavigator::from_patients(Vec::new()).info_line().is_none());
    }

    #[test]
    fn test_unreadable_image_does_not_move_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.png");
        std::fs::write(&broken, b"not a png").unwrap();
        let good = dir.path().join("good.png");
        RgbImage::new(200, 60).save(&good).unwrap();

        let mut nav = DatasetNavigator::from_patients(vec![PatientImages {
            name: "p1".to_string(),
            samples: vec![
                Sample {
                    stem: "broken".to_string(),
                    image_path: broken,
                    label_path: dir.path().join("broken.txt"),
                },
                Sample {
                    stem: "good".to_string(),
                    image_path: good,
                    label_path: dir.path().join("good.txt"),
                },
            ],
        }]);

        assert!(nav.load_current().is_err());
        assert!(nav.apply(NavigatorCommand::Save).is_err());
        assert_eq!(stem(&nav), "broken");

        nav.apply(NavigatorCommand::NextImage).unwrap();
        let saved = nav.apply(NavigatorCommand::Save).unwrap().unwrap();
        assert_eq!(saved, dir.path().join("good_with_markup.png"));

        let rendered = image::open(&saved).unwrap().to_rgb8();
        assert!(rendered.pixels().any(|p| p != &image::Rgb([0, 0, 0])));
    }

    #[test]
    fn test_command_keys() {
        let keys: Vec<_> = "adwszqx".chars().map(NavigatorCommand::from_key).collect();
        assert_eq!(
            keys,
            vec![
                Some(NavigatorCommand::PreviousImage),
                Some(NavigatorCommand::NextImage),
                Some(NavigatorCommand::PreviousPatient),
                Some(NavigatorCommand::NextPatient),
                Some(NavigatorCommand::Save),
                Some(NavigatorCommand::Quit),
                None,
            ]
        );
        assert_eq!(NavigatorCommand::from_key('D'), Some(NavigatorCommand::NextImage));
    }
}
