use crate::error::{Error, Result};
use crate::identity::FaceId;
use image::GrayImage;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// A database image together with where it came from.
#[derive(Debug, Clone)]
pub struct FaceImage {
    pub id: FaceId,
    pub path: PathBuf,
    pub image: GrayImage,
}

pub fn face_path(base: &Path, id: FaceId) -> PathBuf {
    id.path_in(base)
}

/// Load a single image as grayscale.
pub fn load_face(path: &Path) -> Result<GrayImage> {
    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_luma8())
}

/// Load samples `1..=samples` of subjects `1..=subjects`, subject-major.
///
/// Any unreadable file or size mismatch fails the whole load.
pub fn load_training_set(base: &Path, subjects: u32, samples: u32) -> Result<Vec<FaceImage>> {
    let mut faces = Vec::new();
    let mut expected: Option<(u32, u32)> = None;

    for subject in 1..=subjects {
        for sample in 1..=samples {
            let id = FaceId::new(subject, sample);
            let path = face_path(base, id);
            let image = load_face(&path)?;

            let found = image.dimensions();
            match expected {
                None => expected = Some(found),
                Some(expected) if expected != found => {
                    return Err(Error::DimensionMismatch {
                        path,
                        expected,
                        found,
                    });
                }
                Some(_) => {}
            }

            debug!("loaded {} ({}x{})", path.display(), found.0, found.1);
            faces.push(FaceImage { id, path, image });
        }
    }

    info!(
        "Loaded {} training images from {}",
        faces.len(),
        base.display()
    );
    Ok(faces)
}
