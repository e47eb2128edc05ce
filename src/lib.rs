//! # headmark
//!
//! Converts landmark markup placed on 3D CT head scans into a 2D keypoint
//! dataset, and renders the dataset back for visual review.
//!
//! Everything is re-exported here; depend on the member crates directly to
//! pull in less.
//!
//! ## Features
//!
//! - **Core**: Landmarks, plane transforms and the annotation projector
//! - **I/O**: Slicer markup JSON, the annotation text format and dataset layout
//! - **Dataset**: Camera sweeps and the batch dataset builder
//! - **Visualization**: Keypoint overlays, dataset navigator and sequences
//!
//! ## Quick Start
//!
//! ```rust
//! use headmark::prelude::*;
//!
//! let points = vec![
//!     MarkupPoint::new(LandmarkLabel::RightMental, Point3d::new(120.0, 120.0, 0.0)),
//!     MarkupPoint::new(LandmarkLabel::LeftInfraorbital, Point3d::new(100.0, 100.0, 0.0)),
//!     MarkupPoint::new(LandmarkLabel::RightInfraorbital, Point3d::new(100.0, 120.0, 0.0)),
//!     MarkupPoint::new(LandmarkLabel::LeftMental, Point3d::new(120.0, 100.0, 0.0)),
//! ];
//!
//! let projector = AnnotationProjector::default();
//! let projection = projector
//!     .project(&points, 200, 200, &AffineProjection::orthographic_xy())
//!     .unwrap();
//!
//! assert!(projection.warnings.is_empty());
//! assert_eq!(projection.record.keypoints[0].label, LandmarkLabel::LeftInfraorbital);
//! println!("{}", AnnotationWriter::to_text(&projection.record));
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables core, io and dataset
//! - `io`: File format support
//! - `dataset`: Dataset generation
//! - `visualization`: Overlays and review tools
//! - `all`: Enables all features

// Re-export core functionality
pub use headmark_core::*;

// Re-export sub-crates
#[cfg(feature = "io")]
pub use headmark_io as io;

#[cfg(feature = "dataset")]
pub use headmark_dataset as dataset;

#[cfg(feature = "visualization")]
pub use headmark_visualization as visualization;

/// Convenient imports for common use cases
pub mod prelude {
    pub use headmark_core::*;

    #[cfg(feature = "io")]
    pub use headmark_io::{
        read_annotation, write_annotation, AnnotationReader, AnnotationWriter, DatasetLayout, MarkupReader,
    };

    #[cfg(feature = "dataset")]
    pub use headmark_dataset::{BlankCanvasRenderer, BuildConfig, CameraSweep, DatasetBuilder, SliceRenderer};

    #[cfg(feature = "visualization")]
    pub use headmark_visualization::{DatasetNavigator, OverlayStyle, SequenceVisualizer};
}
