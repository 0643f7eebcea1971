//! One recognition run: load, fit, recognize the probe, score, report.

use crate::config::{Config, Scope};
use crate::error::{Error, Result};
use crate::identity::FaceId;
use crate::matcher::{self, Candidate};
use crate::report::{self, Presenter, Summary};
use crate::storage;
use eigenface_vision::{preprocess, Pipeline};
use image::GrayImage;
use log::info;
use rand::Rng;

pub fn run<R: Rng + ?Sized>(
    cfg: &Config,
    rng: &mut R,
    presenter: &mut dyn Presenter,
) -> Result<Summary> {
    let training =
        storage::load_training_set(&cfg.database, cfg.subjects, cfg.training_samples)?;

    let fit_images: Vec<GrayImage> = if cfg.preprocess_training {
        training
            .iter()
            .map(|f| preprocess::preprocess(&f.image))
            .collect()
    } else {
        training.iter().map(|f| f.image.clone()).collect()
    };
    let pipeline = Pipeline::fit(&fit_images, cfg.eigenfaces)?;

    let probe_id = FaceId::from_path(&cfg.probe)
        .ok_or_else(|| Error::UnknownIdentity(cfg.probe.clone()))?;
    let probe = storage::load_face(&cfg.probe)?;
    if probe.dimensions() != pipeline.dimensions() {
        return Err(Error::DimensionMismatch {
            path: cfg.probe.clone(),
            expected: pipeline.dimensions(),
            found: probe.dimensions(),
        });
    }
    let (probe_prepared, probe_features) = pipeline.process_image(&probe)?;

    // Fitted rasters are reused when they are already preprocessed.
    let gallery = training
        .iter()
        .zip(&fit_images)
        .map(|(f, fitted)| -> Result<Candidate> {
            let features = if cfg.preprocess_training {
                pipeline.project_image(fitted)?
            } else {
                pipeline.extract_features(&f.image)?
            };
            Ok(Candidate::new(f.id, features))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut candidates = matcher::select_subject(&gallery, probe_id.subject);
    if candidates.is_empty() {
        return Err(Error::EmptyCandidateSet(format!(
            "no training images of subject {}",
            probe_id.subject
        )));
    }
    matcher::shuffle_candidates(&mut candidates, rng);

    let best = matcher::identify(&probe_features, &candidates)?;
    let matched_path = storage::face_path(&cfg.database, best.id);
    info!(
        "Probe {} matched {} at distance {:.3}",
        probe_id, best.id, best.distance
    );

    let evaluation = match cfg.scope {
        Scope::Subject => matcher::evaluate(probe_id.subject, &candidates)?,
        Scope::Gallery => matcher::evaluate_against(&candidates, &gallery, true)?,
    };
    let rate = evaluation.rate();
    info!(
        "{} of {} recognized correctly ({}%)",
        evaluation.correct(),
        evaluation.evaluated(),
        report::format_rate(rate)
    );

    presenter.show("Input Image", &probe_prepared)?;
    if let Some(face) = training.iter().find(|f| f.id == best.id) {
        presenter.show("Recognized Image", &face.image)?;
    }

    // Last fallible step: the rate file only appears for a complete run.
    report::write_rate(&cfg.output, rate)?;

    Ok(Summary {
        probe: cfg.probe.clone(),
        probe_id,
        matched: matched_path,
        matched_id: best.id,
        distance: best.distance,
        recognition_rate: rate,
        evaluated: evaluation.evaluated(),
        correct: evaluation.correct(),
    })
}
