use super::{Experiment, Values};
use crate::dimred::pca::PCABuilder;
use crate::evaluation::{
    cosine_similarity_of_subspaces, match_signals, reconstruction_error, ReconstructionError,
    SignalMatch,
};
use crate::spikes::{add_gaussian_noise, generate_electrode_recording, SpikeTrainConfig};
use crate::svd::NalgebraSVD;
use crate::utils::{ensure_non_negative, seeded_rng};
use anyhow::anyhow;
use log::info;
use ndarray::{array, Array1, Array2};
use std::fmt;

/// Two neurons recorded on several electrodes, then denoised by keeping the
/// two leading principal components.
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeUnmixing {
    pub seed: u64,
    pub train: SpikeTrainConfig,
    /// `2 × electrodes`; row 0 carries neuron 2, row 1 neuron 1.
    pub mixing: Array2<f64>,
    /// Independent noise on every electrode sample, added after mixing.
    pub sensor_noise_std: f64,
}

impl Default for SpikeUnmixing {
    fn default() -> Self {
        Self {
            seed: 7,
            train: SpikeTrainConfig {
                horizon: 200.0,
                ..SpikeTrainConfig::default()
            },
            mixing: array![[0.8, 0.5, 0.3], [0.2, 0.6, 0.9]],
            sensor_noise_std: 0.02,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpikeUnmixingReport {
    pub n_samples: usize,
    pub events: (usize, usize),
    pub explained_variance_ratio: Array1<f64>,
    /// Plane of the mixing rows against the two leading loadings.
    pub subspace_similarity: f64,
    /// Recorded electrodes against the noise-free electrode signals.
    pub recorded_error: ReconstructionError,
    /// Rank-2 reconstruction against the noise-free electrode signals.
    pub denoised_error: ReconstructionError,
    /// Clean neuron traces (`[neuron 2, neuron 1]`) against the two scores.
    pub signal_match: SignalMatch,
    pub denoised: Array2<f64>,
}

impl Experiment for SpikeUnmixing {
    type Report = SpikeUnmixingReport;

    fn run(&self) -> anyhow::Result<SpikeUnmixingReport> {
        ensure_non_negative("sensor_noise_std", self.sensor_noise_std)?;

        let mut rng = seeded_rng(self.seed);
        let recording = generate_electrode_recording(&mut rng, &self.train, self.mixing.view())?;
        let recorded = add_gaussian_noise(&mut rng, recording.electrodes.view(), self.sensor_noise_std);

        let mut pca = PCABuilder::new(NalgebraSVD).n_components(2).build();
        let scores = pca.fit_transform(recorded.view())?;
        let denoised = pca.inverse_transform(scores.view())?;
        let loadings = pca
            .components()
            .ok_or_else(|| anyhow!("PCA returned no components"))?;
        let explained_variance_ratio = pca
            .explained_variance_ratio()
            .cloned()
            .ok_or_else(|| anyhow!("PCA returned no variance report"))?;

        let subspace_similarity =
            cosine_similarity_of_subspaces(self.mixing.view(), loadings.view())?;
        let recorded_error = reconstruction_error(recording.electrodes.view(), recorded.view())?;
        let denoised_error = reconstruction_error(recording.electrodes.view(), denoised.view())?;
        let signal_match = match_signals(recording.clean_sources()?.view(), scores.view())?;

        info!(
            "Spike unmixing (seed {}): rmse {:.4e} recorded -> {:.4e} denoised",
            self.seed, recorded_error.rmse, denoised_error.rmse
        );

        Ok(SpikeUnmixingReport {
            n_samples: recorded.nrows(),
            events: (
                recording.neuron_1.events().len(),
                recording.neuron_2.events().len(),
            ),
            explained_variance_ratio,
            subspace_similarity,
            recorded_error,
            denoised_error,
            signal_match,
            denoised,
        })
    }
}

impl fmt::Display for SpikeUnmixingReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Spike train denoising")?;
        writeln!(
            f,
            "{} samples, {} / {} firing times (neuron 1 / neuron 2)",
            self.n_samples, self.events.0, self.events.1
        )?;
        writeln!(
            f,
            "explained variance ratio: {}",
            Values(&self.explained_variance_ratio)
        )?;
        writeln!(f, "subspace similarity: {:.6}", self.subspace_similarity)?;
        writeln!(f, "recorded error: {}", self.recorded_error)?;
        writeln!(f, "denoised error: {}", self.denoised_error)?;
        write!(f, "clean traces vs scores:\n{}", self.signal_match)
    }
}
