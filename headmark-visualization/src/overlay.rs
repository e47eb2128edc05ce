//! Drawing keypoint annotations onto dataset images

use headmark_core::{AnnotationRecord, BoundingBox, LandmarkLabel, ProjectedKeypoint, Result};
use headmark_io::read_annotation;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use std::path::Path;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

static FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Marker color of a landmark
pub fn label_color(label: LandmarkLabel) -> Rgb<u8> {
    match label {
        LandmarkLabel::LeftInfraorbital => Rgb([0, 255, 0]),
        LandmarkLabel::LeftMental => Rgb([0, 0, 255]),
        LandmarkLabel::RightInfraorbital => Rgb([255, 0, 0]),
        LandmarkLabel::RightMental => Rgb([255, 255, 0]),
    }
}

/// How markers are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayStyle {
    /// Marker radius in pixels
    pub radius: i32,
    /// Two pixel white ring around each marker
    pub outline: bool,
    pub draw_box: bool,
    /// `"<n>: <name>"` next to each marker
    pub labels: bool,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            radius: 8,
            outline: true,
            draw_box: false,
            labels: true,
        }
    }
}

impl OverlayStyle {
    /// Small markers plus the bounding box, used when browsing a dataset
    pub fn review() -> Self {
        Self {
            radius: 5,
            outline: false,
            draw_box: true,
            labels: true,
        }
    }

    /// Same style without text
    pub fn without_labels(mut self) -> Self {
        self.labels = false;
        self
    }
}

/// Pixel center of a marker, or `None` when the whole marker would fall
/// outside the image. Keeps far out-of-range keypoints away from the
/// integer drawing routines.
fn marker_center(keypoint: &ProjectedKeypoint, width: u32, height: u32, radius: i32) -> Option<(i32, i32)> {
    let margin = radius.max(0) as f64 + 2.0;
    let x = keypoint.x * width as f64;
    let y = keypoint.y * height as f64;
    let visible = (-margin..=width as f64 + margin).contains(&x) && (-margin..=height as f64 + margin).contains(&y);
    visible.then_some((x as i32, y as i32))
}

fn draw_text(image: &mut RgbImage, text: &str, x: i32, y: i32, size: f32, color: Rgb<u8>) {
    match Font::try_from_bytes(FONT_BYTES) {
        Some(font) => draw_text_mut(image, color, x, y, Scale::uniform(size), &font, text),
        None => log::warn!("Embedded font could not be loaded, skipping text '{text}'"),
    }
}

/// Draw one keypoint marker. Markers entirely outside the image are skipped;
/// returns whether anything was drawn.
pub fn draw_keypoint(image: &mut RgbImage, keypoint: &ProjectedKeypoint, style: &OverlayStyle) -> bool {
    let Some(center) = marker_center(keypoint, image.width(), image.height(), style.radius + 1) else {
        log::debug!("{} at ({}, {}) is outside the image", keypoint.label, keypoint.x, keypoint.y);
        return false;
    };

    draw_filled_circle_mut(image, center, style.radius, label_color(keypoint.label));
    if style.outline {
        draw_hollow_circle_mut(image, center, style.radius, WHITE);
        draw_hollow_circle_mut(image, center, style.radius + 1, WHITE);
    }
    if style.labels {
        let text = format!("{}: {}", keypoint.label.index() + 1, keypoint.label);
        draw_text(image, &text, center.0 + 15, center.1 - 10 - 14, 16.0, WHITE);
    }
    true
}

/// Draw the bounding box outline in white, clipped to the image
pub fn draw_bbox(image: &mut RgbImage, bbox: &BoundingBox) {
    let (width, height) = (image.width() as f64, image.height() as f64);
    let clamp_x = |v: f64| (v * width).clamp(-1.0, width + 1.0) as i32;
    let clamp_y = |v: f64| (v * height).clamp(-1.0, height + 1.0) as i32;

    let (x0, y0) = (clamp_x(bbox.min_x()), clamp_y(bbox.min_y()));
    let (x1, y1) = (clamp_x(bbox.max_x()), clamp_y(bbox.max_y()));
    let rect_width = (x1 - x0).max(1) as u32;
    let rect_height = (y1 - y0).max(1) as u32;
    draw_hollow_rect_mut(image, Rect::at(x0, y0).of_size(rect_width, rect_height), WHITE);
}

/// Write a caption line in the top left corner
pub fn draw_caption(image: &mut RgbImage, text: &str) {
    draw_text(image, text, 10, 10, 20.0, WHITE);
}

/// Draw the box (if the style asks for it) and the first `count` keypoints
pub fn draw_partial(image: &mut RgbImage, record: &AnnotationRecord, count: usize, style: &OverlayStyle) {
    if style.draw_box {
        draw_bbox(image, &record.bbox);
    }
    for keypoint in record.keypoints.iter().take(count) {
        draw_keypoint(image, keypoint, style);
    }
}

/// Draw a whole annotation record
pub fn draw_annotation(image: &mut RgbImage, record: &AnnotationRecord, style: &OverlayStyle) {
    draw_partial(image, record, record.keypoints.len(), style);
}

/// A dataset image with its annotation, if one could be read
#[derive(Debug, Clone)]
pub struct AnnotatedImage {
    pub image: RgbImage,
    pub record: Option<AnnotationRecord>,
}

impl AnnotatedImage {
    /// Load an image and its annotation.
    ///
    /// A missing or malformed annotation is logged and leaves `record` empty;
    /// only an unreadable image is an error.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(image_path: P, label_path: Q) -> Result<Self> {
        let image = image::open(image_path.as_ref())?.to_rgb8();
        let label_path = label_path.as_ref();

        let record = if !label_path.is_file() {
            log::warn!("Annotation not found: {}", label_path.display());
            None
        } else {
            match read_annotation(label_path) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Error reading annotation {}: {e}", label_path.display());
                    None
                }
            }
        };

        Ok(Self { image, record })
    }

    /// Keypoints in pixel coordinates of this image, in label order
    pub fn keypoint_pixels(&self) -> Vec<(LandmarkLabel, i32, i32)> {
        let (width, height) = self.image.dimensions();
        self.record
            .iter()
            .flat_map(|r| r.keypoints.iter())
            .map(|kp| {
                let (x, y) = kp.to_pixel(width, height);
                (kp.label, x, y)
            })
            .collect()
    }

    /// Copy of the image with the annotation drawn on it
    pub fn render(&self, style: &OverlayStyle) -> RgbImage {
        let mut canvas = self.image.clone();
        if let Some(record) = &self.record {
            draw_annotation(&mut canvas, record, style);
        }
        canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headmark_io::write_annotation;

    fn record() -> AnnotationRecord {
        AnnotationRecord::from_ordered(
            BoundingBox::new(0, 0.5, 0.5, 0.5, 0.5),
            [(0.25, 0.25), (0.25, 0.75), (0.75, 0.25), (0.75, 0.75)],
        )
    }

    #[test]
    fn test_label_colors_are_distinct() {
        let colors: Vec<_> = LandmarkLabel::ORDER.iter().map(|l| label_color(*l)).collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(label_color(LandmarkLabel::LeftInfraorbital), Rgb([0, 255, 0]));
    }

    #[test]
    fn test_draw_annotation_marks_pixels() {
        let mut image = RgbImage::new(100, 100);
        draw_annotation(&mut image, &record(), &OverlayStyle::default().without_labels());

        assert_eq!(image.get_pixel(25, 25), &label_color(LandmarkLabel::LeftInfraorbital));
        assert_eq!(image.get_pixel(25, 75), &label_color(LandmarkLabel::LeftMental));
        assert_eq!(image.get_pixel(75, 25), &label_color(LandmarkLabel::RightInfraorbital));
        assert_eq!(image.get_pixel(75, 75), &label_color(LandmarkLabel::RightMental));
        // Outline ring
        assert_eq!(image.get_pixel(25 + 9, 25), &WHITE);
        // No box with the default style
        assert_eq!(image.get_pixel(50, 25), &Rgb([0, 0, 0]));
        assert_eq!(image.get_pixel(50, 50), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_review_style_draws_box() {
        let mut image = RgbImage::new(100, 100);
        draw_annotation(&mut image, &record(), &OverlayStyle::review().without_labels());
        assert_eq!(image.get_pixel(50, 25), &WHITE);
        assert_eq!(image.get_pixel(50, 50), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_partial_and_out_of_frame() {
        let mut image = RgbImage::new(100, 100);
        let mut rec = record();
        rec.keypoints[1].x = 1.7;
        draw_partial(&mut image, &rec, 2, &OverlayStyle::default().without_labels());
        assert_eq!(image.get_pixel(25, 25), &label_color(LandmarkLabel::LeftInfraorbital));
        assert_eq!(image.get_pixel(75, 25), &Rgb([0, 0, 0]));
    }

    fn lit_pixels(image: &RgbImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> usize {
        xs.flat_map(|x| ys.clone().map(move |y| (x, y)))
            .filter(|&(x, y)| image.get_pixel(x, y) != &Rgb([0, 0, 0]))
            .count()
    }

    #[test]
    fn test_labels_are_written_next_to_markers() {
        let mut plain = RgbImage::new(200, 100);
        draw_annotation(&mut plain, &record(), &OverlayStyle::default().without_labels());
        assert_eq!(lit_pixels(&plain, 70..200, 0..15), 0);

        let mut labeled = RgbImage::new(200, 100);
        draw_annotation(&mut labeled, &record(), &OverlayStyle::default());
        assert!(lit_pixels(&labeled, 70..200, 0..15) > 0);
        // Markers stay on top of the text
        assert_eq!(labeled.get_pixel(50, 25), &label_color(LandmarkLabel::LeftInfraorbital));
    }

    #[test]
    fn test_caption() {
        let mut image = RgbImage::new(200, 60);
        draw_caption(&mut image, "Patient 1/2 | Image 3/4");
        assert!(lit_pixels(&image, 10..200, 10..35) > 0);
        assert_eq!(lit_pixels(&image, 0..200, 40..60), 0);
    }

    #[test]
    fn test_far_out_keypoints_are_skipped() {
        let mut image = RgbImage::new(100, 100);
        let mut rec = record();
        rec.keypoints[0].x = 5e9;
        rec.keypoints[1].y = -5e9;
        rec.keypoints[2].x = -5e9;
        rec.keypoints[2].y = 5e9;
        rec.bbox = BoundingBox::new(0, 0.0, 0.0, 1e10, 1e10);

        assert!(!draw_keypoint(&mut image, &rec.keypoints[0], &OverlayStyle::default()));
        draw_annotation(&mut image, &rec, &OverlayStyle::review());
        draw_annotation(&mut image, &rec, &OverlayStyle::default());
        assert_eq!(image.get_pixel(75, 75), &label_color(LandmarkLabel::RightMental));
        assert_eq!(image.get_pixel(25, 25), &Rgb([0, 0, 0]));
        // Box edges are clipped just outside the frame
        assert_eq!(image.get_pixel(0, 50), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_marker_partly_inside_is_drawn() {
        let mut image = RgbImage::new(100, 100);
        let mut rec = record();
        rec.keypoints[3].x = 1.04;
        let style = OverlayStyle::default().without_labels();
        assert!(draw_keypoint(&mut image, &rec.keypoints[3], &style));
        assert_eq!(image.get_pixel(99, 75), &label_color(LandmarkLabel::RightMental));
    }

    #[test]
    fn test_load_with_and_without_annotation() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("view.png");
        RgbImage::new(40, 20).save(&image_path).unwrap();
        let label_path = dir.path().join("view.txt");

        let missing = AnnotatedImage::load(&image_path, &label_path).unwrap();
        assert!(missing.record.is_none());
        assert!(missing.keypoint_pixels().is_empty());

        std::fs::write(&label_path, "0 0.5 0.5 0.1 0.1\n0.5 0.5\n").unwrap();
        let malformed = AnnotatedImage::load(&image_path, &label_path).unwrap();
        assert!(malformed.record.is_none());

        write_annotation(&record(), &label_path).unwrap();
        let loaded = AnnotatedImage::load(&image_path, &label_path).unwrap();
        assert_eq!(
            loaded.keypoint_pixels(),
            vec![
                (LandmarkLabel::LeftInfraorbital, 10, 5),
                (LandmarkLabel::LeftMental, 10, 15),
                (LandmarkLabel::RightInfraorbital, 30, 5),
                (LandmarkLabel::RightMental, 30, 15),
            ]
        );
    }

    #[test]
    fn test_unreadable_image_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("broken.png");
        std::fs::write(&image_path, b"not a png").unwrap();
        assert!(AnnotatedImage::load(&image_path, dir.path().join("broken.txt")).is_err());
    }
}
