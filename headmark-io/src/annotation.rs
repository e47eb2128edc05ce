//! Keypoint annotation text format
//!
//! One file per image, one bounding box row followed by four keypoint rows:
//!
//! ```text
//! <class-index> <cx> <cy> <w> <h>
//! <px1> <py1>
//! <px2> <py2>
//! <px3> <py3>
//! <px4> <py4>
//! ```
//!
//! Keypoint rows follow [`LandmarkLabel::ORDER`]. Values are written with six
//! decimals; blank lines are ignored on read.

use headmark_core::{AnnotationRecord, BoundingBox, Error, LandmarkLabel, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// File extension of annotation files
pub const ANNOTATION_EXTENSION: &str = "txt";

/// Annotation writer implementation
pub struct AnnotationWriter;

impl AnnotationWriter {
    /// Render a record in the annotation text format
    pub fn to_text(record: &AnnotationRecord) -> String {
        let mut text = Self::format_bbox(&record.bbox);
        text.push('\n');
        for kp in &record.keypoints {
            text.push_str(&format!("{:.6} {:.6}\n", kp.x, kp.y));
        }
        text
    }

    /// Write a record to `path`, replacing any existing file
    pub fn write_record<P: AsRef<Path>>(record: &AnnotationRecord, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(Self::to_text(record).as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn format_bbox(bbox: &BoundingBox) -> String {
        format!(
            "{} {:.6} {:.6} {:.6} {:.6}",
            bbox.class_index, bbox.cx, bbox.cy, bbox.w, bbox.h
        )
    }
}

/// Annotation reader implementation
pub struct AnnotationReader;

impl AnnotationReader {
    /// Read a record from an annotation file
    pub fn read_record<P: AsRef<Path>>(path: P) -> Result<AnnotationRecord> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = Vec::new();
        for line in reader.lines() {
            lines.push(line?);
        }
        Self::parse_lines(lines.iter().map(String::as_str))
    }

    /// Parse a record from annotation text
    pub fn parse(text: &str) -> Result<AnnotationRecord> {
        Self::parse_lines(text.lines())
    }

    fn parse_lines<'a, I>(lines: I) -> Result<AnnotationRecord>
    where
        I: Iterator<Item = &'a str>,
    {
        let mut bbox = None;
        let mut coords = Vec::with_capacity(4);

        for (index, line) in lines.enumerate() {
            let line_no = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match bbox {
                None => bbox = Some(Self::parse_bbox(trimmed, line_no)?),
                Some(_) if coords.len() < 4 => coords.push(Self::parse_keypoint(trimmed, line_no)?),
                Some(_) => {
                    return Err(Error::format(line_no, "unexpected row after the fourth keypoint"));
                }
            }
        }

        let bbox = bbox.ok_or_else(|| Error::format(1, "missing bounding box row"))?;
        if coords.len() != 4 {
            return Err(Error::format(
                coords.len() + 2,
                format!(
                    "expected 4 keypoint rows, found {} (missing {})",
                    coords.len(),
                    LandmarkLabel::ORDER[coords.len()]
                ),
            ));
        }

        let coords = [coords[0], coords[1], coords[2], coords[3]];
        Ok(AnnotationRecord::from_ordered(bbox, coords))
    }

    fn parse_bbox(line: &str, line_no: usize) -> Result<BoundingBox> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(Error::format(
                line_no,
                format!("bounding box row needs 5 values, found {}", parts.len()),
            ));
        }

        let class_index = parts[0]
            .parse::<u32>()
            .map_err(|_| Error::format(line_no, format!("invalid class index '{}'", parts[0])))?;
        let cx = parse_value(parts[1], line_no)?;
        let cy = parse_value(parts[2], line_no)?;
        let w = parse_value(parts[3], line_no)?;
        let h = parse_value(parts[4], line_no)?;

        Ok(BoundingBox::new(class_index, cx, cy, w, h))
    }

    fn parse_keypoint(line: &str, line_no: usize) -> Result<(f64, f64)> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 2 {
            return Err(Error::format(
                line_no,
                format!("keypoint row needs 2 values, found {}", parts.len()),
            ));
        }
        Ok((parse_value(parts[0], line_no)?, parse_value(parts[1], line_no)?))
    }
}

fn parse_value(token: &str, line_no: usize) -> Result<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::format(line_no, format!("invalid coordinate '{token}'")))
}
