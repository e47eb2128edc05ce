//! I/O operations for headmark
//!
//! This crate reads 3D Slicer landmark markup, reads and writes the keypoint
//! annotation text format, and knows the directory layout of source studies
//! and generated datasets.

pub mod annotation;
pub mod layout;
pub mod markup;

pub use annotation::{AnnotationReader, AnnotationWriter, ANNOTATION_EXTENSION};
pub use layout::{find_study_folders, list_samples, DatasetLayout, Sample, StudyFolder};
pub use markup::{LandmarkCandidate, MarkupReader};

use headmark_core::{AnnotationRecord, Result};
use std::path::Path;

/// Read an annotation file
pub fn read_annotation<P: AsRef<Path>>(path: P) -> Result<AnnotationRecord> {
    AnnotationReader::read_record(path)
}

/// Write an annotation file
pub fn write_annotation<P: AsRef<Path>>(record: &AnnotationRecord, path: P) -> Result<()> {
    AnnotationWriter::write_record(record, path)
}
