use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of one database image: `<base>/s<subject>/<sample>.pgm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FaceId {
    pub subject: u32,
    pub sample: u32,
}

impl FaceId {
    pub fn new(subject: u32, sample: u32) -> Self {
        Self { subject, sample }
    }

    /// Recover the identity from a path following the database layout.
    pub fn from_path(path: &Path) -> Option<Self> {
        let sample = path.file_stem()?.to_str()?.parse().ok()?;
        let subject = path
            .parent()?
            .file_name()?
            .to_str()?
            .strip_prefix('s')?
            .parse()
            .ok()?;
        Some(Self { subject, sample })
    }

    pub fn path_in(&self, base: &Path) -> PathBuf {
        base.join(format!("s{}", self.subject))
            .join(format!("{}.pgm", self.sample))
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}/{}", self.subject, self.sample)
    }
}
