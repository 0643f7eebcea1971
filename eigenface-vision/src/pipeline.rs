use image::GrayImage;
use log::info;
use ndarray::Array1;

use crate::preprocess;
use crate::subspace::{self, SubspaceError, SubspaceModel};

/// Full pipeline: preprocess → flatten → project
pub struct Pipeline {
    model: SubspaceModel,
    width: u32,
    height: u32,
}

impl Pipeline {
    /// Fit the subspace on `images`, which must all share one size.
    ///
    /// Images are used as given; run [`preprocess::preprocess`] on them first
    /// when the model should see normalized rasters.
    pub fn fit(images: &[GrayImage], components: usize) -> Result<Self, SubspaceError> {
        let (width, height) = images.first().map(|i| i.dimensions()).unwrap_or((0, 0));
        let samples: Vec<Array1<f64>> = images.iter().map(preprocess::flatten).collect();
        let data = subspace::stack(&samples)?;
        let model = SubspaceModel::fit(&data, components)?;

        info!(
            "Fitted {} eigenfaces on {} images ({}x{}), {:.1}% variance retained",
            model.components(),
            images.len(),
            width,
            height,
            model.explained_variance_ratio() * 100.0
        );

        Ok(Self {
            model,
            width,
            height,
        })
    }

    pub fn model(&self) -> &SubspaceModel {
        &self.model
    }

    /// Raster size the model was fitted on.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Preprocess an image and project it; returns the normalized raster too.
    pub fn process_image(&self, img: &GrayImage) -> Result<(GrayImage, Array1<f64>), SubspaceError> {
        let prepared = preprocess::preprocess(img);
        let features = self.project_image(&prepared)?;
        Ok((prepared, features))
    }

    /// Process and return only the projection (convenience method)
    pub fn extract_features(&self, img: &GrayImage) -> Result<Array1<f64>, SubspaceError> {
        let (_prepared, features) = self.process_image(img)?;
        Ok(features)
    }

    /// Project an image without preprocessing it.
    pub fn project_image(&self, img: &GrayImage) -> Result<Array1<f64>, SubspaceError> {
        self.model.project(preprocess::flatten(img).view())
    }

    /// Render projection coordinates back into a raster of the fitted size.
    pub fn reconstruct(&self, coords: &Array1<f64>) -> Result<GrayImage, SubspaceError> {
        let pixels = self.model.back_project(coords.view())?;
        let raw: Vec<u8> = pixels.iter().map(|&v| v.round().clamp(0.0, 255.0) as u8).collect();
        GrayImage::from_raw(self.width, self.height, raw).ok_or(SubspaceError::DimensionMismatch {
            expected: (self.width * self.height) as usize,
            found: pixels.len(),
        })
    }
}
