//! Principal component subspace ("eigenfaces").
//!
//! Samples are rows of an `n × d` matrix. When there are fewer samples than
//! features the `n × n` Gram matrix of the centered data is decomposed and its
//! eigenvectors are lifted back to feature space.

use log::{debug, warn};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use thiserror::Error;

/// Eigenvalues below this fraction of the largest one are treated as zero.
const ZERO_VARIANCE_RATIO: f64 = 1e-10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubspaceError {
    #[error("cannot retain {requested} components, at most {max} are available")]
    DegenerateSubspace { requested: usize, max: usize },
    #[error("sample has {found} features, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// Mean sample plus the retained principal directions.
#[derive(Debug, Clone)]
pub struct SubspaceModel {
    mean: Array1<f64>,
    /// One unit-length direction per row, `k × d`.
    basis: Array2<f64>,
    eigenvalues: Array1<f64>,
    total_variance: f64,
}

impl SubspaceModel {
    /// Fit the top `components` directions of maximal variance.
    ///
    /// `components` must lie in `1..=min(n, d) - 1`.
    pub fn fit(samples: &Array2<f64>, components: usize) -> Result<Self, SubspaceError> {
        let (n, d) = samples.dim();
        let max = n.min(d).saturating_sub(1);
        if components == 0 || components > max {
            return Err(SubspaceError::DegenerateSubspace {
                requested: components,
                max,
            });
        }

        let mean = samples
            .mean_axis(Axis(0))
            .ok_or(SubspaceError::DegenerateSubspace {
                requested: components,
                max,
            })?;
        let centered = samples - &mean;

        // Both paths yield (eigenvalue, direction in feature space) pairs.
        let scatter = if n < d {
            centered.dot(&centered.t())
        } else {
            centered.t().dot(&centered)
        };
        let eig = SymmetricEigen::new(to_dmatrix(&scatter));

        let mut order: Vec<usize> = (0..eig.eigenvalues.len()).collect();
        order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));

        let largest = order
            .first()
            .map(|&i| eig.eigenvalues[i].max(0.0))
            .unwrap_or(0.0);
        let cutoff = largest * ZERO_VARIANCE_RATIO;
        let dof = (n - 1) as f64;

        let mut basis = Array2::<f64>::zeros((components, d));
        let mut eigenvalues = Array1::<f64>::zeros(components);
        for (row, &idx) in order.iter().take(components).enumerate() {
            let lambda = eig.eigenvalues[idx];
            if lambda <= cutoff || lambda <= 0.0 {
                warn!(
                    "component {} has no variance, keeping a zero direction",
                    row
                );
                continue;
            }

            let column: Array1<f64> = eig.eigenvectors.column(idx).iter().copied().collect();
            let mut direction = if n < d {
                centered.t().dot(&column)
            } else {
                column
            };
            let norm = direction.dot(&direction).sqrt();
            if norm <= f64::EPSILON {
                continue;
            }
            direction /= norm;
            normalize_sign(&mut direction);

            basis.row_mut(row).assign(&direction);
            eigenvalues[row] = lambda / dof;
        }

        let total_variance = centered.iter().map(|x| x * x).sum::<f64>() / dof;

        debug!(
            "fitted {} of {} components over {} samples x {} features",
            components, max, n, d
        );

        Ok(Self {
            mean,
            basis,
            eigenvalues,
            total_variance,
        })
    }

    /// Map a flattened sample onto the retained directions.
    pub fn project(&self, sample: ArrayView1<f64>) -> Result<Array1<f64>, SubspaceError> {
        if sample.len() != self.dimension() {
            return Err(SubspaceError::DimensionMismatch {
                expected: self.dimension(),
                found: sample.len(),
            });
        }
        let centered = &sample - &self.mean;
        Ok(self.basis.dot(&centered))
    }

    /// Reconstruct a sample from subspace coordinates.
    pub fn back_project(&self, coords: ArrayView1<f64>) -> Result<Array1<f64>, SubspaceError> {
        if coords.len() != self.components() {
            return Err(SubspaceError::DimensionMismatch {
                expected: self.components(),
                found: coords.len(),
            });
        }
        Ok(self.basis.t().dot(&coords) + &self.mean)
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn basis(&self) -> &Array2<f64> {
        &self.basis
    }

    /// Variance captured by each retained direction, in descending order.
    pub fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    pub fn components(&self) -> usize {
        self.basis.nrows()
    }

    /// Length of a flattened sample accepted by [`SubspaceModel::project`].
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// Fraction of the training variance captured by the retained directions.
    pub fn explained_variance_ratio(&self) -> f64 {
        if self.total_variance <= 0.0 {
            return 0.0;
        }
        (self.eigenvalues.sum() / self.total_variance).clamp(0.0, 1.0)
    }
}

pub fn fit(samples: &Array2<f64>, components: usize) -> Result<SubspaceModel, SubspaceError> {
    SubspaceModel::fit(samples, components)
}

pub fn project(model: &SubspaceModel, sample: ArrayView1<f64>) -> Result<Array1<f64>, SubspaceError> {
    model.project(sample)
}

/// Stack equally sized samples into an `n × d` matrix.
pub fn stack(samples: &[Array1<f64>]) -> Result<Array2<f64>, SubspaceError> {
    let d = samples.first().map(|s| s.len()).unwrap_or(0);
    let mut data = Array2::<f64>::zeros((samples.len(), d));
    for (mut row, sample) in data.rows_mut().into_iter().zip(samples) {
        if sample.len() != d {
            return Err(SubspaceError::DimensionMismatch {
                expected: d,
                found: sample.len(),
            });
        }
        row.assign(sample);
    }
    Ok(data)
}

fn to_dmatrix(m: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = m.dim();
    DMatrix::from_fn(rows, cols, |i, j| m[[i, j]])
}

/// Flip `v` so its largest-magnitude entry is positive.
fn normalize_sign(v: &mut Array1<f64>) {
    let pivot = v
        .iter()
        .copied()
        .fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
    if pivot < 0.0 {
        v.mapv_inplace(|x| -x);
    }
}
