//! Rendering seam between the dataset builder and the visualization host

use crate::sweep::ViewPose;
use headmark_core::{PerspectiveCamera, PlaneTransform, Result};
use headmark_io::StudyFolder;
use image::{DynamicImage, Rgb, RgbImage};

/// An image of the study together with the transform that produced it
pub struct RenderedSlice<T> {
    pub image: DynamicImage,
    pub transform: T,
}

impl<T> RenderedSlice<T> {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Produces 2D views of a study.
///
/// Implementations wrap the 3D host (scene loading, camera placement,
/// screenshot). The transform they return maps RAS world points to pixels of
/// the returned image and is otherwise opaque to the builder.
pub trait SliceRenderer {
    type Transform: PlaneTransform;

    /// Prepare the host for a study, e.g. load its scene and hide markup
    fn load_study(&mut self, _study: &StudyFolder) -> Result<()> {
        Ok(())
    }

    /// Render one view of the loaded study
    fn render_slice(&mut self, study: &StudyFolder, pose: &ViewPose) -> Result<RenderedSlice<Self::Transform>>;
}

impl<R: SliceRenderer + ?Sized> SliceRenderer for &mut R {
    type Transform = R::Transform;

    fn load_study(&mut self, study: &StudyFolder) -> Result<()> {
        (**self).load_study(study)
    }

    fn render_slice(&mut self, study: &StudyFolder, pose: &ViewPose) -> Result<RenderedSlice<Self::Transform>> {
        (**self).render_slice(study, pose)
    }
}

/// Renders a uniform canvas through a pinhole camera at each pose.
///
/// Useful for dry runs of the whole pipeline without a host: annotations are
/// exact and the images carry the requested viewport size.
#[derive(Debug, Clone, PartialEq)]
pub struct BlankCanvasRenderer {
    pub width: u32,
    pub height: u32,
    /// Vertical field of view in degrees
    pub fov_degrees: f64,
    pub background: [u8; 3],
}

impl BlankCanvasRenderer {
    pub fn new(width: u32, height: u32, fov_degrees: f64) -> Self {
        Self {
            width,
            height,
            fov_degrees,
            background: [0, 0, 0],
        }
    }

    pub fn with_background(mut self, background: [u8; 3]) -> Self {
        self.background = background;
        self
    }

    /// Camera the renderer uses for a pose
    pub fn camera(&self, pose: &ViewPose) -> PerspectiveCamera {
        PerspectiveCamera::new(
            pose.position,
            pose.focal_point,
            pose.view_up,
            self.fov_degrees,
            (self.width, self.height),
        )
    }
}

impl Default for BlankCanvasRenderer {
    fn default() -> Self {
        // Default 3D view angle of the host
        Self::new(800, 600, 30.0)
    }
}

impl SliceRenderer for BlankCanvasRenderer {
    type Transform = PerspectiveCamera;

    fn load_study(&mut self, study: &StudyFolder) -> Result<()> {
        match study.scene_file()? {
            Some(scene) => log::debug!("Blank canvas ignores scene {}", scene.display()),
            None => log::debug!("No scene file in {}", study.path.display()),
        }
        Ok(())
    }

    fn render_slice(&mut self, _study: &StudyFolder, pose: &ViewPose) -> Result<RenderedSlice<PerspectiveCamera>> {
        let canvas = RgbImage::from_pixel(self.width, self.height, Rgb(self.background));
        Ok(RenderedSlice {
            image: DynamicImage::ImageRgb8(canvas),
            transform: self.camera(pose),
        })
    }
}
