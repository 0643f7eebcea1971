use crate::error::{Error, Result};
use crate::identity::FaceId;
use image::GrayImage;
use log::{debug, info};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const SIGNIFICANT_DIGITS: i32 = 6;

/// Outcome of a recognition session.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub probe: PathBuf,
    pub probe_id: FaceId,
    pub matched: PathBuf,
    pub matched_id: FaceId,
    pub distance: f64,
    pub recognition_rate: f64,
    pub evaluated: usize,
    pub correct: usize,
}

impl Summary {
    /// Console lines: the matched path, then the rate.
    pub fn print(&self) {
        println!("Input image matched: {}", self.matched.display());
        println!("{}", rate_line(self.recognition_rate));
    }
}

/// Six significant digits without trailing zeros: `100`, `66.6667`, `87.5`.
pub fn format_rate(rate: f64) -> String {
    if !rate.is_finite() {
        return rate.to_string();
    }
    if rate == 0.0 {
        return "0".to_string();
    }
    let exponent = rate.abs().log10().floor() as i32;
    let decimals = (SIGNIFICANT_DIGITS - 1 - exponent).max(0) as usize;
    let s = format!("{:.*}", decimals, rate);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

pub fn rate_line(rate: f64) -> String {
    format!("Recognition Rate: {}%", format_rate(rate))
}

/// Replace `path` with the single rate line.
///
/// The line goes to a sibling temporary file first and is renamed into
/// place, so readers never observe a partial file.
pub fn write_rate(path: &Path, rate: f64) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recognition_rate.txt".to_string());
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    let written = fs::write(&tmp, format!("{}\n", rate_line(rate))).and_then(|_| fs::rename(&tmp, path));
    if let Err(source) = written {
        let _ = fs::remove_file(&tmp);
        return Err(Error::OutputWrite {
            path: path.to_path_buf(),
            source,
        });
    }

    info!("Wrote {}", path.display());
    Ok(())
}

/// Where the probe and its match end up for a human to look at.
pub trait Presenter {
    fn show(&mut self, title: &str, image: &GrayImage) -> Result<()>;
}

/// Discards images.
#[derive(Debug, Default)]
pub struct Headless;

impl Presenter for Headless {
    fn show(&mut self, title: &str, image: &GrayImage) -> Result<()> {
        debug!("{}: {}x{} (not shown)", title, image.width(), image.height());
        Ok(())
    }
}

/// Saves each image as `<dir>/<title>.png`, title lowercased with
/// non-alphanumerics turned into underscores.
#[derive(Debug)]
pub struct SaveToDir {
    dir: PathBuf,
    saved: Vec<PathBuf>,
}

impl SaveToDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            saved: Vec::new(),
        }
    }

    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }
}

impl Presenter for SaveToDir {
    fn show(&mut self, title: &str, image: &GrayImage) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| Error::OutputWrite {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(format!("{}.png", slug(title)));
        image.save(&path).map_err(|source| Error::ImageSave {
            path: path.clone(),
            source,
        })?;
        info!("{} saved to {}", title, path.display());
        self.saved.push(path);
        Ok(())
    }
}

fn slug(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
