use anyhow::Result;
use eigenface::config::{Config, Scope};
use eigenface::identity::FaceId;
use eigenface::report::{Headless, SaveToDir};
use eigenface::{session, Error, SubspaceError};
use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};

/// Scratch face database removed on drop.
struct Database {
    root: PathBuf,
}

impl Database {
    /// `subjects` subjects with `samples` identical 4x4 rasters each.
    fn synthetic(subjects: u32, samples: u32) -> Result<Self> {
        let root = std::env::temp_dir().join(format!("eigenface-{}", uuid::Uuid::new_v4()));
        let db = Self { root };
        for subject in 1..=subjects {
            for sample in 1..=samples {
                db.write(FaceId::new(subject, sample), &subject_raster(subject))?;
            }
        }
        Ok(db)
    }

    fn faces(&self) -> PathBuf {
        self.root.join("orl_faces")
    }

    fn write(&self, id: FaceId, img: &GrayImage) -> Result<()> {
        let path = id.path_in(&self.faces());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        img.save(&path)?;
        Ok(())
    }

    fn config(&self, subjects: u32, samples: u32, probe: FaceId) -> Config {
        Config {
            database: self.faces(),
            subjects,
            training_samples: samples,
            eigenfaces: 1,
            probe: probe.path_in(&self.faces()),
            output: self.root.join("recognition_rate.txt"),
            seed: Some(17),
            ..Config::default()
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.root).ok();
    }
}

/// Odd subjects get a horizontal gradient, even subjects a vertical one,
/// offset by subject so no two subjects share a raster.
fn subject_raster(subject: u32) -> GrayImage {
    GrayImage::from_fn(4, 4, |x, y| {
        let ramp = if subject % 2 == 1 { x } else { y };
        Luma([(ramp * 60 + subject) as u8])
    })
}

#[test]
fn test_two_subjects_recognized_perfectly() -> Result<()> {
    env_logger::try_init().ok();
    let db = Database::synthetic(2, 2)?;
    let cfg = db.config(2, 2, FaceId::new(1, 2));

    let summary = session::run(&cfg, &mut StdRng::seed_from_u64(1), &mut Headless)?;

    assert_eq!(summary.probe_id, FaceId::new(1, 2));
    assert_eq!(summary.matched_id.subject, 1);
    assert!(summary.distance < 1e-9);
    assert_eq!(summary.recognition_rate, 100.0);
    assert_eq!(summary.evaluated, 2);

    let line = fs::read_to_string(&cfg.output)?;
    assert_eq!(line, "Recognition Rate: 100%\n");

    println!("✓ {} -> {}", summary.probe.display(), summary.matched.display());
    Ok(())
}

#[test]
fn test_gallery_scope_with_leave_one_out() -> Result<()> {
    env_logger::try_init().ok();
    let db = Database::synthetic(2, 2)?;
    let cfg = Config {
        scope: Scope::Gallery,
        ..db.config(2, 2, FaceId::new(2, 1))
    };

    let summary = session::run(&cfg, &mut StdRng::seed_from_u64(5), &mut Headless)?;
    assert_eq!(summary.matched_id.subject, 2);
    assert_eq!(summary.recognition_rate, 100.0);
    Ok(())
}

#[test]
fn test_single_sample_subject() -> Result<()> {
    env_logger::try_init().ok();
    let db = Database::synthetic(3, 1)?;
    let cfg = Config {
        eigenfaces: 2,
        ..db.config(3, 1, FaceId::new(3, 1))
    };

    let summary = session::run(&cfg, &mut StdRng::seed_from_u64(0), &mut Headless)?;
    assert_eq!(summary.evaluated, 1);
    assert_eq!(summary.recognition_rate, 100.0);
    assert_eq!(summary.matched_id, FaceId::new(3, 1));
    Ok(())
}

#[test]
fn test_same_seed_same_match() -> Result<()> {
    let db = Database::synthetic(2, 3)?;
    let cfg = db.config(2, 3, FaceId::new(1, 1));

    let a = session::run(&cfg, &mut StdRng::seed_from_u64(99), &mut Headless)?;
    let b = session::run(&cfg, &mut StdRng::seed_from_u64(99), &mut Headless)?;
    assert_eq!(a.matched_id, b.matched_id);
    Ok(())
}

#[test]
fn test_missing_image_aborts_without_output() -> Result<()> {
    let db = Database::synthetic(2, 2)?;
    fs::remove_file(FaceId::new(2, 2).path_in(&db.faces()))?;
    let cfg = db.config(2, 2, FaceId::new(1, 1));

    let err = session::run(&cfg, &mut StdRng::seed_from_u64(1), &mut Headless).unwrap_err();
    match err {
        Error::ImageLoad { path, .. } => assert!(path.ends_with("s2/2.pgm")),
        other => panic!("expected ImageLoad, got {}", other),
    }
    assert!(!cfg.output.exists());
    Ok(())
}

#[test]
fn test_mismatched_image_size_aborts() -> Result<()> {
    let db = Database::synthetic(2, 2)?;
    db.write(FaceId::new(2, 1), &GrayImage::new(5, 4))?;
    let cfg = db.config(2, 2, FaceId::new(1, 1));

    let err = session::run(&cfg, &mut StdRng::seed_from_u64(1), &mut Headless).unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: (4, 4),
            found: (5, 4),
            ..
        }
    ));
    assert!(!cfg.output.exists());
    Ok(())
}

#[test]
fn test_too_many_eigenfaces() -> Result<()> {
    let db = Database::synthetic(2, 2)?;
    let cfg = Config {
        eigenfaces: 4,
        ..db.config(2, 2, FaceId::new(1, 1))
    };

    let err = session::run(&cfg, &mut StdRng::seed_from_u64(1), &mut Headless).unwrap_err();
    assert!(matches!(
        err,
        Error::Subspace(SubspaceError::DegenerateSubspace {
            requested: 4,
            max: 3
        })
    ));
    assert!(!cfg.output.exists());
    Ok(())
}

#[test]
fn test_probe_subject_outside_training_set() -> Result<()> {
    let db = Database::synthetic(2, 2)?;
    db.write(FaceId::new(3, 1), &subject_raster(3))?;
    let cfg = db.config(2, 2, FaceId::new(3, 1));

    let err = session::run(&cfg, &mut StdRng::seed_from_u64(1), &mut Headless).unwrap_err();
    assert!(matches!(err, Error::EmptyCandidateSet(_)));
    assert!(!cfg.output.exists());
    Ok(())
}

#[test]
fn test_probe_outside_layout() -> Result<()> {
    let db = Database::synthetic(2, 2)?;
    let cfg = Config {
        probe: db.root.join("probe.pgm"),
        ..db.config(2, 2, FaceId::new(1, 1))
    };

    let err = session::run(&cfg, &mut StdRng::seed_from_u64(1), &mut Headless).unwrap_err();
    assert!(matches!(err, Error::UnknownIdentity(_)));
    Ok(())
}

#[test]
fn test_images_saved_for_inspection() -> Result<()> {
    let db = Database::synthetic(2, 2)?;
    let cfg = db.config(2, 2, FaceId::new(2, 2));
    let out = db.root.join("shown");
    let mut presenter = SaveToDir::new(&out);

    session::run(&cfg, &mut StdRng::seed_from_u64(3), &mut presenter)?;

    let saved: Vec<&Path> = presenter.saved().iter().map(|p| p.as_path()).collect();
    assert_eq!(
        saved,
        vec![
            out.join("input_image.png").as_path(),
            out.join("recognized_image.png").as_path()
        ]
    );
    for path in saved {
        let img = image::open(path)?.to_luma8();
        assert_eq!(img.dimensions(), (4, 4));
    }
    Ok(())
}

#[test]
fn test_presenter_failure_leaves_no_rate_file() -> Result<()> {
    let db = Database::synthetic(2, 2)?;
    let cfg = db.config(2, 2, FaceId::new(1, 1));
    let blocker = db.root.join("blocker");
    fs::write(&blocker, b"not a directory")?;
    let mut presenter = SaveToDir::new(blocker.join("shown"));

    let err = session::run(&cfg, &mut StdRng::seed_from_u64(1), &mut presenter).unwrap_err();
    assert!(matches!(err, Error::OutputWrite { .. }));
    assert!(!cfg.output.exists());
    Ok(())
}

#[test]
fn test_gallery_matches_query_exactly() -> Result<()> {
    // A query that is also a training image projects onto its own gallery
    // entry in both fitting modes.
    let db = Database::synthetic(2, 2)?;
    for preprocess_training in [true, false] {
        let cfg = Config {
            preprocess_training,
            ..db.config(2, 2, FaceId::new(2, 1))
        };
        let summary = session::run(&cfg, &mut StdRng::seed_from_u64(8), &mut Headless)?;
        assert_eq!(summary.matched_id.subject, 2);
        assert!(summary.distance < 1e-9, "distance {}", summary.distance);
        assert_eq!(summary.recognition_rate, 100.0);
    }
    Ok(())
}
