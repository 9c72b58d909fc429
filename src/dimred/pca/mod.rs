//! # Principal Component Analysis
//!
//! Dense PCA on `samples × features` matrices. The decomposition itself is
//! delegated to an [`SVDImplementation`]; this module handles centering,
//! optional scaling, the variance report and the mapping between feature space
//! and score space in both directions.

use crate::error::invalid_argument;
use crate::svd::{NalgebraSVD, SVDImplementation};
use anyhow::anyhow;
use log::{debug, warn};
use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use rayon::prelude::*;
use std::sync::Arc;

// Singular values below this fraction of the largest are treated as zero when
// warning about rank deficiency.
const RANK_TOLERANCE: f64 = 1e-10;

pub struct PCABuilder<S: SVDImplementation> {
    n_components: Option<usize>,
    center: bool,
    scale: bool,
    svd_implementation: Arc<S>,
}

impl Default for PCABuilder<NalgebraSVD> {
    fn default() -> Self {
        PCABuilder::new(NalgebraSVD)
    }
}

impl<S: SVDImplementation> PCABuilder<S> {
    pub fn new(svd_implementation: S) -> Self {
        PCABuilder {
            n_components: None,
            center: true,
            scale: false,
            svd_implementation: Arc::new(svd_implementation),
        }
    }

    /// Number of components to keep. Defaults to `min(n_samples, n_features)`.
    pub fn n_components(mut self, n_components: usize) -> Self {
        self.n_components = Some(n_components);
        self
    }

    pub fn center(mut self, center: bool) -> Self {
        self.center = center;
        self
    }

    /// Divide every feature by its standard deviation before decomposing.
    pub fn scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    pub fn build(self) -> Pca<S> {
        Pca {
            n_components: self.n_components,
            center: self.center,
            scale: self.scale,
            svd_implementation: self.svd_implementation,
            fitted: None,
        }
    }
}

struct FittedPca {
    components: Array2<f64>,
    mean: Option<Array1<f64>>,
    std_dev: Option<Array1<f64>>,
    singular_values: Array1<f64>,
    explained_variance: Array1<f64>,
    explained_variance_ratio: Array1<f64>,
    total_variance: f64,
}

pub struct Pca<S: SVDImplementation> {
    n_components: Option<usize>,
    center: bool,
    scale: bool,
    svd_implementation: Arc<S>,
    fitted: Option<FittedPca>,
}

impl<S: SVDImplementation> Pca<S> {
    /// Learns the principal axes of `x` (`samples × features`).
    ///
    /// Components are sign-normalised so that the largest-magnitude loading of
    /// each one is positive, which makes repeated fits comparable.
    pub fn fit(&mut self, x: ArrayView2<f64>) -> anyhow::Result<&mut Self> {
        let (n_samples, n_features) = x.dim();
        if n_samples < 2 {
            return Err(invalid_argument(
                "x",
                format!("PCA needs at least 2 samples, got {}", n_samples),
            ));
        }
        if n_features == 0 {
            return Err(invalid_argument("x", "PCA needs at least one feature"));
        }

        let max_components = n_samples.min(n_features);
        let n_components = self.n_components.unwrap_or(max_components);
        if n_components == 0 || n_components > max_components {
            return Err(invalid_argument(
                "n_components",
                format!(
                    "must be between 1 and min(n_samples, n_features) = {}, got {}",
                    max_components, n_components
                ),
            ));
        }

        // Center the data
        let mean = if self.center {
            Some(
                x.mean_axis(Axis(0))
                    .ok_or_else(|| anyhow!("Failed to compute feature means"))?,
            )
        } else {
            None
        };

        // Scale the data; constant features are left unscaled
        let std_dev = if self.scale {
            Some(
                x.std_axis(Axis(0), 0.0)
                    .mapv(|s| if s > 0.0 { s } else { 1.0 }),
            )
        } else {
            None
        };

        let x_preprocessed = preprocess(x, mean.as_ref(), std_dev.as_ref());
        let svd = self
            .svd_implementation
            .compute(x_preprocessed.view())?
            .flip_signs();

        let eigenvalues = svd.s.mapv(|v| v * v / (n_samples as f64 - 1.0));
        let total_variance = eigenvalues.sum();
        let explained_variance = eigenvalues.slice(s![..n_components]).to_owned();
        let explained_variance_ratio = if total_variance > 0.0 {
            &explained_variance / total_variance
        } else {
            Array1::zeros(n_components)
        };

        let largest = svd.s.get(0).copied().unwrap_or(0.0);
        let rank = svd
            .s
            .iter()
            .filter(|&&v| v > largest * RANK_TOLERANCE)
            .count();
        if rank < n_components {
            warn!(
                "Data has numerical rank {} but {} components were requested; trailing components are arbitrary",
                rank, n_components
            );
        }

        debug!(
            "PCA fit: {} samples x {} features -> {} components, total variance {:.6}",
            n_samples, n_features, n_components, total_variance
        );

        self.fitted = Some(FittedPca {
            components: svd.vt.slice(s![..n_components, ..]).to_owned(),
            mean,
            std_dev,
            singular_values: svd.s.slice(s![..n_components]).to_owned(),
            explained_variance,
            explained_variance_ratio,
            total_variance,
        });

        Ok(self)
    }

    /// Projects `x` onto the fitted components, returning `samples × n_components` scores.
    pub fn transform(&self, x: ArrayView2<f64>) -> anyhow::Result<Array2<f64>> {
        let fitted = self.fitted()?;
        let n_features = fitted.components.ncols();
        if x.ncols() != n_features {
            return Err(invalid_argument(
                "x",
                format!("expected {} features, got {}", n_features, x.ncols()),
            ));
        }

        let x_preprocessed = preprocess(x, fitted.mean.as_ref(), fitted.std_dev.as_ref());
        Ok(x_preprocessed.dot(&fitted.components.t()))
    }

    pub fn fit_transform(&mut self, x: ArrayView2<f64>) -> anyhow::Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Maps scores back into feature space. With fewer components than
    /// features this is the rank-`k` approximation of the original data.
    pub fn inverse_transform(&self, scores: ArrayView2<f64>) -> anyhow::Result<Array2<f64>> {
        let fitted = self.fitted()?;
        let n_components = fitted.components.nrows();
        if scores.ncols() != n_components {
            return Err(invalid_argument(
                "scores",
                format!("expected {} components, got {}", n_components, scores.ncols()),
            ));
        }

        let mut reconstruction = scores.dot(&fitted.components);
        reconstruction
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .for_each(|mut row| {
                if let Some(s) = &fitted.std_dev {
                    row *= s;
                }
                if let Some(m) = &fitted.mean {
                    row += m;
                }
            });
        Ok(reconstruction)
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn fitted(&self) -> anyhow::Result<&FittedPca> {
        self.fitted
            .as_ref()
            .ok_or_else(|| anyhow!("PCA has not been fitted yet"))
    }

    /// Loading vectors, one row per component (`n_components × n_features`).
    pub fn components(&self) -> Option<&Array2<f64>> {
        self.fitted.as_ref().map(|f| &f.components)
    }

    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.fitted.as_ref().and_then(|f| f.mean.as_ref())
    }

    pub fn singular_values(&self) -> Option<&Array1<f64>> {
        self.fitted.as_ref().map(|f| &f.singular_values)
    }

    /// Variance of the data along each kept component.
    pub fn explained_variance(&self) -> Option<&Array1<f64>> {
        self.fitted.as_ref().map(|f| &f.explained_variance)
    }

    /// Share of the total variance captured by each kept component.
    pub fn explained_variance_ratio(&self) -> Option<&Array1<f64>> {
        self.fitted.as_ref().map(|f| &f.explained_variance_ratio)
    }

    /// Variance summed over every feature, not just the kept components.
    pub fn total_variance(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.total_variance)
    }

    pub fn cumulative_explained_variance_ratio(&self) -> anyhow::Result<Array1<f64>> {
        let ratios = &self.fitted()?.explained_variance_ratio;
        let mut sum = 0.0;
        Ok(ratios
            .iter()
            .map(|&r| {
                sum += r;
                sum
            })
            .collect())
    }

    /// Smallest number of kept components whose cumulative variance ratio
    /// reaches `threshold`, or `None` if the kept components fall short.
    pub fn n_components_for_variance(&self, threshold: f64) -> anyhow::Result<Option<usize>> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(invalid_argument(
                "threshold",
                format!("must lie in [0, 1], got {}", threshold),
            ));
        }
        let cumulative = self.cumulative_explained_variance_ratio()?;
        Ok(cumulative
            .iter()
            // Tolerate rounding in the running sum.
            .position(|&c| c >= threshold - 1e-12)
            .map(|i| i + 1))
    }
}

fn preprocess(
    x: ArrayView2<f64>,
    mean: Option<&Array1<f64>>,
    std_dev: Option<&Array1<f64>>,
) -> Array2<f64> {
    let mut x_preprocessed = x.to_owned();

    x_preprocessed
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .for_each(|mut row| {
            if let Some(m) = mean {
                row -= m;
            }
            if let Some(s) = std_dev {
                row /= s;
            }
        });

    x_preprocessed
}

/// Rank-`n_components` approximation of `x`: fit, project and map back.
pub fn reconstruct<S: SVDImplementation>(
    x: ArrayView2<f64>,
    n_components: usize,
    svd_implementation: S,
) -> anyhow::Result<Array2<f64>> {
    let mut pca = PCABuilder::new(svd_implementation)
        .n_components(n_components)
        .build();
    let scores = pca.fit_transform(x)?;
    pca.inverse_transform(scores.view())
}
