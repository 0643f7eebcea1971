pub mod config;
pub mod error;
pub mod identity;
pub mod matcher;
pub mod report;
pub mod session;
pub mod storage;

pub use error::{Error, Result};

// Re-export vision types for convenience
pub use eigenface_vision::{preprocess, subspace, Pipeline, SubspaceError, SubspaceModel};
