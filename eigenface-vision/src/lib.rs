pub mod pipeline;
pub mod preprocess;
pub mod subspace;

// Re-export commonly used types
pub use pipeline::Pipeline;
pub use subspace::{fit, project, SubspaceError, SubspaceModel};
