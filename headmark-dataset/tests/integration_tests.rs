//! Integration tests for headmark-dataset
//!
//! These build small datasets from Slicer markup folders on disk and read
//! the results back through headmark-io.

use headmark_core::{Error, LandmarkLabel};
use headmark_dataset::*;
use headmark_io::{read_annotation, DatasetLayout};
use std::fs;
use std::path::Path;

/// RAS positions of a face looking towards +y
const FACE: [(&str, [f64; 3]); 4] = [
    ("Left Infraorbital", [-32.0, 80.0, 20.0]),
    ("Left Mental", [-28.0, 78.0, -42.0]),
    ("Right Infraorbital", [33.0, 80.0, 21.0]),
    ("Right Mental", [30.0, 79.0, -40.0]),
];

/// Write one Slicer line markup; the file stores LPS like Slicer does
fn write_line_markup(dir: &Path, file_name: &str, label: &str, ras: [f64; 3]) {
    let [x, y, z] = ras;
    let json = format!(
        r#"{{
  "@schema": "https://raw.githubusercontent.com/slicer/slicer/master/Modules/Loadable/Markups/Resources/Schema/markups-schema-v1.0.3.json#",
  "markups": [
    {{
      "type": "Line",
      "coordinateSystem": "LPS",
      "controlPoints": [
        {{ "label": "bone", "position": [{}, {}, {}] }},
        {{ "label": "{label}", "position": [{}, {}, {}] }}
      ]
    }}
  ]
}}"#,
        -x * 0.9,
        -y * 0.9,
        z,
        -x,
        -y,
        z
    );
    fs::write(dir.join(file_name), json).unwrap();
}

/// Create `markups_<patient>` with the given subset of the face landmarks
fn create_study(data: &Path, patient: &str, count: usize, with_scene: bool) {
    let dir = data.join(format!("markups_{patient}"));
    fs::create_dir_all(&dir).unwrap();
    for (i, (label, ras)) in FACE.iter().take(count).enumerate() {
        write_line_markup(&dir, &format!("L_{i}.mrk.json"), label, *ras);
    }
    // Unrelated files are ignored
    fs::write(dir.join("notes.json"), "{}").unwrap();
    if with_scene {
        fs::write(dir.join("scene.mrml"), "<MRML></MRML>").unwrap();
    }
}

fn small_renderer() -> BlankCanvasRenderer {
    BlankCanvasRenderer::new(320, 240, 30.0)
}

#[test]
fn test_build_writes_paired_views() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    create_study(data.path(), "001", 4, true);
    create_study(data.path(), "002", 4, false);

    let config = BuildConfig::new(data.path(), out.path());
    let mut builder = DatasetBuilder::new(config, small_renderer());
    let report = builder.build().unwrap();

    assert_eq!(report.studies_found, 2);
    assert_eq!(report.studies_completed, 2);
    assert_eq!(report.views_written, 40);
    assert!(report.is_clean(), "unexpected failures: {:?}", report.failures);

    let layout = DatasetLayout::new(out.path());
    assert_eq!(layout.patients().unwrap(), vec!["001".to_string(), "002".to_string()]);

    let samples = layout.samples("001").unwrap();
    assert_eq!(samples.len(), 20);
    assert_eq!(samples[0].stem, "image_pitch00");
    assert!(samples.iter().all(|s| s.has_label()));

    for sample in &samples {
        let image = image::open(&sample.image_path).unwrap();
        assert_eq!((image.width(), image.height()), (320, 240));

        let record = read_annotation(&sample.label_path).unwrap();
        assert_eq!(record.bbox.class_index, 0);
        assert!(record.box_contains_keypoints(1e-5));
        for (keypoint, label) in record.keypoints.iter().zip(LandmarkLabel::ORDER) {
            assert_eq!(keypoint.label, label);
            assert!(keypoint.is_in_frame(), "{} out of frame in {}", label, sample.stem);
        }
    }
}

#[test]
fn test_frontal_view_orientation() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    create_study(data.path(), "frontal", 4, false);

    let mut config = BuildConfig::new(data.path(), out.path());
    config.sweep = CameraSweep {
        pitch_range: (0.0, 0.0),
        pitch_num: 1,
        yaw_num: 0,
        ..Default::default()
    };
    let mut builder = DatasetBuilder::new(config, small_renderer());
    let report = builder.build().unwrap();
    assert_eq!(report.views_written, 1);

    let record = read_annotation(builder.layout().label_path("frontal", "image_pitch00")).unwrap();
    let li = record.keypoint(LandmarkLabel::LeftInfraorbital);
    let lm = record.keypoint(LandmarkLabel::LeftMental);
    let ri = record.keypoint(LandmarkLabel::RightInfraorbital);

    // Facing the patient, their left side is on the right of the image
    assert!(li.x > 0.5);
    assert!(ri.x < 0.5);
    // Chin points sit below the orbits
    assert!(lm.y > li.y);
}

#[test]
fn test_unnamed_markups_use_frontal_view_sides() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let dir = data.path().join("markups_unnamed");
    fs::create_dir_all(&dir).unwrap();
    for (i, (_, ras)) in FACE.iter().enumerate() {
        write_line_markup(&dir, &format!("L_{i}.mrk.json"), "", *ras);
    }

    let mut config = BuildConfig::new(data.path(), out.path());
    config.sweep = CameraSweep {
        pitch_range: (0.0, 0.0),
        pitch_num: 1,
        yaw_num: 0,
        ..Default::default()
    };
    let mut builder = DatasetBuilder::new(config, small_renderer());
    let report = builder.build().unwrap();
    assert!(report.is_clean(), "unexpected failures: {:?}", report.failures);

    let record = read_annotation(builder.layout().label_path("unnamed", "image_pitch00")).unwrap();
    let li = record.keypoint(LandmarkLabel::LeftInfraorbital);
    let lm = record.keypoint(LandmarkLabel::LeftMental);
    let ri = record.keypoint(LandmarkLabel::RightInfraorbital);

    // Without names, left is the image left of the frontal view
    assert!(li.x < 0.5);
    assert!(ri.x > 0.5);
    assert!(lm.y > li.y);
}

#[test]
fn test_missing_landmark_skips_study() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    create_study(data.path(), "complete", 4, false);
    create_study(data.path(), "partial", 3, false);

    let config = BuildConfig::new(data.path(), out.path());
    let mut builder = DatasetBuilder::new(config, small_renderer());
    let report = builder.build().unwrap();

    assert_eq!(report.studies_found, 2);
    assert_eq!(report.studies_completed, 1);
    assert_eq!(report.views_written, 20);
    assert_eq!(report.failures.len(), 1);

    let failure = &report.failures[0];
    assert_eq!(failure.patient, "partial");
    assert!(failure.view.is_none());
    assert!(matches!(failure.error, Error::MissingLandmark { .. }));

    // Nothing is written for the skipped study
    assert!(!out.path().join("partial").exists());
}

#[test]
fn test_discard_out_of_range_views() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    create_study(data.path(), "zoomed", 4, false);

    let mut config = BuildConfig::new(data.path(), out.path());
    config.discard_out_of_range = true;
    // Too narrow to see the whole face
    let renderer = BlankCanvasRenderer::new(320, 240, 2.0);
    let mut builder = DatasetBuilder::new(config.clone(), renderer.clone());
    let report = builder.build().unwrap();

    assert_eq!(report.views_written, 0);
    assert_eq!(report.views_discarded, 20);
    assert!(builder.layout().samples("zoomed").unwrap().is_empty());

    // Without the flag the views are kept and only warned about
    let out_kept = tempfile::tempdir().unwrap();
    config.discard_out_of_range = false;
    config.dataset_path = out_kept.path().to_path_buf();
    let report = DatasetBuilder::new(config, renderer).build().unwrap();
    assert_eq!(report.views_written, 20);
    let record = read_annotation(DatasetLayout::new(out_kept.path()).label_path("zoomed", "image_yaw00")).unwrap();
    assert!(record.keypoints.iter().any(|k| !k.is_in_frame()));
}

#[test]
fn test_require_scene_and_jpeg_output() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    create_study(data.path(), "with_scene", 4, true);
    create_study(data.path(), "no_scene", 4, false);

    let mut config = BuildConfig::new(data.path(), out.path());
    config.require_scene = true;
    config.image_format = ImageFormat::Jpg;
    config.sweep.yaw_num = 0;
    let mut builder = DatasetBuilder::new(config, small_renderer());
    let report = builder.build().unwrap();

    assert_eq!(report.studies_completed, 1);
    assert_eq!(report.views_written, 10);
    assert_eq!(report.failures[0].patient, "no_scene");

    let samples = builder.layout().samples("with_scene").unwrap();
    assert_eq!(samples.len(), 10);
    assert!(samples[0].image_path.extension().is_some_and(|e| e == "jpg"));
}

#[test]
fn test_missing_data_directory_fails_build() {
    let out = tempfile::tempdir().unwrap();
    let config = BuildConfig::new(out.path().join("does-not-exist"), out.path().join("dataset"));
    let result = DatasetBuilder::new(config, small_renderer()).build();
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_empty_data_directory() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let config = BuildConfig::new(data.path(), out.path());
    let report = DatasetBuilder::new(config, small_renderer()).build().unwrap();
    assert_eq!(report.studies_found, 0);
    assert_eq!(report.views_written, 0);
}
