use super::{rows_by_decreasing_scale, Experiment, Values};
use crate::dimred::pca::PCABuilder;
use crate::evaluation::{
    cosine_similarity_of_subspaces, match_signals, rowwise_alignment, SignalMatch,
};
use crate::svd::NalgebraSVD;
use crate::synthetic::{generate_mixture, normalize_rows};
use anyhow::anyhow;
use log::info;
use ndarray::{array, s, Array1, Array2};
use std::fmt;

/// Two latent factors embedded in three dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ToyRecovery {
    pub seed: u64,
    pub n_samples: usize,
    pub scales: Vec<f64>,
    pub mixing: Array2<f64>,
    /// Rescale the mixing rows to unit norm before generating.
    pub normalize_mixing: bool,
}

impl Default for ToyRecovery {
    fn default() -> Self {
        Self {
            seed: 17,
            n_samples: 500,
            scales: vec![1.5, 1.0],
            mixing: array![[-0.3, 0.4, 0.866], [0.885, 0.46, 0.1]],
            normalize_mixing: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToyReport {
    pub mixing: Array2<f64>,
    /// All `p` loading vectors, one per row.
    pub loadings: Array2<f64>,
    pub explained_variance_ratio: Array1<f64>,
    /// Span of the top-`q` loadings against the span of the mixing rows.
    pub subspace_similarity: f64,
    /// |cos| between each mixing row and the loading expected to recover it.
    pub loading_alignment: Array1<f64>,
    /// Hidden coordinates against the top-`q` scores.
    pub signal_match: SignalMatch,
}

impl Experiment for ToyRecovery {
    type Report = ToyReport;

    fn run(&self) -> anyhow::Result<ToyReport> {
        let mixing = if self.normalize_mixing {
            normalize_rows(self.mixing.view())?
        } else {
            self.mixing.clone()
        };
        let mixture = generate_mixture(self.seed, self.n_samples, &self.scales, mixing.view())?;
        let q = mixture.latent_dim();

        let mut pca = PCABuilder::new(NalgebraSVD).build();
        let scores = pca.fit_transform(mixture.observed().view())?;
        let loadings = pca
            .components()
            .cloned()
            .ok_or_else(|| anyhow!("PCA returned no components"))?;
        let explained_variance_ratio = pca
            .explained_variance_ratio()
            .cloned()
            .ok_or_else(|| anyhow!("PCA returned no variance report"))?;

        let top = loadings.slice(s![..q, ..]);
        let subspace_similarity = cosine_similarity_of_subspaces(mixing.view(), top)?;
        let expected = rows_by_decreasing_scale(mixing.view(), &self.scales);
        let loading_alignment = rowwise_alignment(expected.view(), top)?;
        let signal_match = match_signals(mixture.hidden().view(), scores.slice(s![.., ..q]))?;

        info!(
            "Toy recovery (seed {}): subspace similarity {:.6}, mean |r| {:.4}",
            self.seed,
            subspace_similarity,
            signal_match.mean_abs_correlation()
        );

        Ok(ToyReport {
            mixing,
            loadings,
            explained_variance_ratio,
            subspace_similarity,
            loading_alignment,
            signal_match,
        })
    }
}

impl fmt::Display for ToyReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Toy generative model recovery")?;
        writeln!(
            f,
            "explained variance ratio: {}",
            Values(&self.explained_variance_ratio)
        )?;
        writeln!(f, "mixing matrix:\n{:.4}", self.mixing)?;
        writeln!(f, "loadings:\n{:.4}", self.loadings)?;
        writeln!(f, "subspace similarity: {:.6}", self.subspace_similarity)?;
        writeln!(f, "loading alignment: {}", Values(&self.loading_alignment))?;
        write!(f, "hidden signals vs scores:\n{}", self.signal_match)
    }
}
