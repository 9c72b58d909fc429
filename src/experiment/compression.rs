use super::{Experiment, Values};
use crate::dimred::pca::{reconstruct, PCABuilder};
use crate::evaluation::{reconstruction_error, ReconstructionError};
use crate::svd::NalgebraSVD;
use crate::synthetic::{generate_mixture_with_rng, normalize_rows};
use crate::utils::seeded_rng;
use anyhow::anyhow;
use log::{debug, info};
use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::StandardNormal;
use std::fmt;

/// Keeps `k = 1..=p` components of a `q`-factor model in `p` dimensions and
/// measures what each truncation costs.
#[derive(Debug, Clone, PartialEq)]
pub struct Compression {
    pub seed: u64,
    pub n_samples: usize,
    pub scales: Vec<f64>,
    pub observed_dim: usize,
}

impl Default for Compression {
    fn default() -> Self {
        Self {
            seed: 3,
            n_samples: 400,
            scales: vec![4.0, 2.0, 1.0, 0.5, 0.25],
            observed_dim: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionLevel {
    pub n_components: usize,
    /// Cumulative explained variance ratio of the kept components.
    pub retained_variance: f64,
    pub error: ReconstructionError,
    /// Numbers stored (scores, loadings and mean) over numbers in the data.
    pub storage_ratio: f64,
}

#[derive(Debug, Clone)]
pub struct CompressionReport {
    pub explained_variance_ratio: Array1<f64>,
    pub levels: Vec<CompressionLevel>,
}

impl CompressionReport {
    /// Smallest level whose relative error is at most `tolerance`.
    pub fn smallest_within(&self, tolerance: f64) -> Option<&CompressionLevel> {
        self.levels.iter().find(|l| l.error.relative <= tolerance)
    }
}

impl Experiment for Compression {
    type Report = CompressionReport;

    fn run(&self) -> anyhow::Result<CompressionReport> {
        let mut rng = seeded_rng(self.seed);
        let raw_mixing = Array2::from_shape_fn((self.scales.len(), self.observed_dim), |_| {
            rng.sample::<f64, _>(StandardNormal)
        });
        let mixing = normalize_rows(raw_mixing.view())?;
        let mixture =
            generate_mixture_with_rng(&mut rng, self.n_samples, &self.scales, mixing.view())?;
        let observed = mixture.observed();
        let (n, p) = observed.dim();

        let mut full = PCABuilder::new(NalgebraSVD).build();
        full.fit(observed.view())?;
        let explained_variance_ratio = full
            .explained_variance_ratio()
            .cloned()
            .ok_or_else(|| anyhow!("PCA returned no variance report"))?;
        let cumulative = full.cumulative_explained_variance_ratio()?;

        let mut levels = Vec::with_capacity(cumulative.len());
        for k in 1..=cumulative.len() {
            let rebuilt = reconstruct(observed.view(), k, NalgebraSVD)?;
            let error = reconstruction_error(observed.view(), rebuilt.view())?;
            debug!("Kept {} of {} components: {}", k, p, error);
            levels.push(CompressionLevel {
                n_components: k,
                retained_variance: cumulative[k - 1],
                error,
                storage_ratio: (k * (n + p) + p) as f64 / (n * p) as f64,
            });
        }

        info!(
            "Compression of {}x{} data: {} levels evaluated",
            n,
            p,
            levels.len()
        );

        Ok(CompressionReport {
            explained_variance_ratio,
            levels,
        })
    }
}

impl fmt::Display for CompressionReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Compression by truncation")?;
        writeln!(
            f,
            "explained variance ratio: {}",
            Values(&self.explained_variance_ratio)
        )?;
        for level in &self.levels {
            writeln!(
                f,
                "  k = {:>2}: retained {:.4}, storage {:.3}, {}",
                level.n_components, level.retained_variance, level.storage_ratio, level.error
            )?;
        }
        Ok(())
    }
}
