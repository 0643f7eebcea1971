use eigenface_vision::SubspaceError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read image {}", .path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image {} is {}x{}, expected {}x{}", .path.display(), .found.0, .found.1, .expected.0, .expected.1)]
    DimensionMismatch {
        path: PathBuf,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error(transparent)]
    Subspace(#[from] SubspaceError),

    #[error("empty candidate set: {0}")]
    EmptyCandidateSet(String),

    #[error("cannot derive a subject from {}", .0.display())]
    UnknownIdentity(PathBuf),

    #[error("failed to write {}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to save image {}", .path.display())]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
