use crate::error::{Error, Result};
use crate::identity::FaceId;
use eigenface_vision::SubspaceError;
use log::debug;
use ndarray::{Array1, ArrayView1};
use rand::seq::SliceRandom;
use rand::Rng;

/// A projected training image.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: FaceId,
    pub features: Array1<f64>,
}

impl Candidate {
    pub fn new(id: FaceId, features: Array1<f64>) -> Self {
        Self { id, features }
    }
}

/// Nearest candidate for a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub id: FaceId,
    pub distance: f64,
    /// Position of the match in the candidate slice.
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub query: FaceId,
    pub matched: FaceId,
    pub distance: f64,
    pub correct: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub outcomes: Vec<Outcome>,
}

impl Evaluation {
    pub fn evaluated(&self) -> usize {
        self.outcomes.len()
    }

    pub fn correct(&self) -> usize {
        self.outcomes.iter().filter(|o| o.correct).count()
    }

    /// Percentage of correct outcomes, in `[0, 100]`.
    pub fn rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.correct() as f64 / self.evaluated() as f64 * 100.0
    }
}

pub fn euclidean_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Result<f64> {
    if a.len() != b.len() {
        return Err(SubspaceError::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        }
        .into());
    }
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt())
}

/// Find the candidate nearest to `query`.
///
/// Candidates are scanned in order and only a strictly smaller distance
/// replaces the current best, so the earliest of several equally near
/// candidates wins. If no distance compares below infinity (NaN features),
/// the first candidate is returned with an infinite distance.
pub fn identify(query: &Array1<f64>, candidates: &[Candidate]) -> Result<Match> {
    nearest(query.view(), candidates, None)
}

fn nearest(query: ArrayView1<f64>, candidates: &[Candidate], skip: Option<FaceId>) -> Result<Match> {
    let mut best: Option<Match> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        if skip == Some(candidate.id) {
            continue;
        }
        let distance = euclidean_distance(query, candidate.features.view())?;
        debug!("candidate {}: distance {:.3}", candidate.id, distance);

        let best_distance = best.map(|b| b.distance).unwrap_or(f64::INFINITY);
        if distance < best_distance {
            best = Some(Match {
                id: candidate.id,
                distance,
                index,
            });
        } else if best.is_none() {
            // Default pick until something compares closer.
            best = Some(Match {
                id: candidate.id,
                distance: f64::INFINITY,
                index,
            });
        }
    }

    best.ok_or_else(|| Error::EmptyCandidateSet("no candidates to match against".to_string()))
}

/// Use every candidate as a query against the whole list.
///
/// A query counts as correct when its nearest candidate belongs to
/// `query_subject`. Best-match state starts fresh for each query.
pub fn evaluate(query_subject: u32, candidates: &[Candidate]) -> Result<Evaluation> {
    if candidates.is_empty() {
        return Err(Error::EmptyCandidateSet(format!(
            "no images of subject {} to evaluate",
            query_subject
        )));
    }

    let mut outcomes = Vec::with_capacity(candidates.len());
    for query in candidates {
        let m = identify(&query.features, candidates)?;
        outcomes.push(Outcome {
            query: query.id,
            matched: m.id,
            distance: m.distance,
            correct: m.id.subject == query_subject,
        });
    }
    Ok(Evaluation { outcomes })
}

/// Match each query against `gallery`, expecting its own subject back.
///
/// With `leave_one_out` the gallery entry sharing the query's id is ignored,
/// so a query cannot trivially match itself.
pub fn evaluate_against(
    queries: &[Candidate],
    gallery: &[Candidate],
    leave_one_out: bool,
) -> Result<Evaluation> {
    if queries.is_empty() {
        return Err(Error::EmptyCandidateSet("no queries to evaluate".to_string()));
    }

    let mut outcomes = Vec::with_capacity(queries.len());
    for query in queries {
        let skip = leave_one_out.then_some(query.id);
        let m = nearest(query.features.view(), gallery, skip)?;
        outcomes.push(Outcome {
            query: query.id,
            matched: m.id,
            distance: m.distance,
            correct: m.id.subject == query.id.subject,
        });
    }
    Ok(Evaluation { outcomes })
}

/// Candidates belonging to `subject`, in their original order.
pub fn select_subject(candidates: &[Candidate], subject: u32) -> Vec<Candidate> {
    candidates
        .iter()
        .filter(|c| c.id.subject == subject)
        .cloned()
        .collect()
}

pub fn shuffle_candidates<R: Rng + ?Sized>(candidates: &mut [Candidate], rng: &mut R) {
    candidates.shuffle(rng);
}
