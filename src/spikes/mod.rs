//! # Spike-train simulation
//!
//! Simulates extracellular recordings of two neurons. Each neuron fires at
//! random even-integer times; its trace is the superposition of a fixed
//! [`SpikeKernel`] at every firing time plus independent Gaussian noise.
//! The traces are then mixed linearly onto a set of electrodes.

use crate::error::invalid_argument;
use crate::utils::{ensure_non_negative, ensure_positive, seeded_rng};
use log::{debug, warn};
use ndarray::{stack, Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use std::collections::BTreeSet;

mod kernel;

pub use kernel::{SpikeKernel, NEURON_1, NEURON_2};

// Ratios within this many ulps of an integer count as that integer,
// e.g. 0.3 / 0.1 = 2.9999999999999996.
const SAMPLE_GRID_ULPS: f64 = 4.0;

/// Largest horizon whose even-integer firing grid is exact in `f64`.
pub const MAX_HORIZON: f64 = 9_007_199_254_740_992.0;

/// Sampling grid, firing and noise parameters for a single simulated neuron.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeTrainConfig {
    /// Samples cover `[0, horizon]`.
    pub horizon: f64,
    pub step: f64,
    /// Number of firing times drawn (with replacement) before de-duplication.
    pub rate_n: usize,
    /// Standard deviation of the additive per-sample noise.
    pub noise_std: f64,
}

impl Default for SpikeTrainConfig {
    fn default() -> Self {
        Self {
            horizon: 1000.0,
            step: 0.02,
            rate_n: 100,
            noise_std: 0.01,
        }
    }
}

impl SpikeTrainConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure_positive("horizon", self.horizon)?;
        ensure_positive("step", self.step)?;
        if self.horizon > MAX_HORIZON {
            return Err(invalid_argument(
                "horizon",
                format!("{} exceeds the largest supported horizon {}", self.horizon, MAX_HORIZON),
            ));
        }
        if self.step > self.horizon {
            return Err(invalid_argument(
                "step",
                format!("step {} exceeds horizon {}", self.step, self.horizon),
            ));
        }
        if self.rate_n == 0 {
            return Err(invalid_argument("rate_n", "at least one event must be drawn"));
        }
        ensure_non_negative("noise_std", self.noise_std)
    }

    pub fn sample_count(&self) -> usize {
        sample_count(self.horizon, self.step)
    }
}

/// `⌊horizon / step⌋ + 1`, so the last sample never lies past `horizon`.
pub fn sample_count(horizon: f64, step: f64) -> usize {
    let ratio = horizon / step;
    let nearest = ratio.round();
    let intervals = if (ratio - nearest).abs() <= SAMPLE_GRID_ULPS * f64::EPSILON * ratio {
        nearest
    } else {
        ratio.floor()
    };
    intervals as usize + 1
}

pub fn sample_times(horizon: f64, step: f64) -> Array1<f64> {
    (0..sample_count(horizon, step))
        .map(|i| i as f64 * step)
        .collect()
}

/// Draws `rate_n` firing times uniformly from `{0, 2, 4, ..., 2⌊horizon/2⌋}`
/// with replacement. Duplicates collapse, so the result holds at most
/// `rate_n` distinct times, in ascending order.
pub fn draw_event_times<R: Rng>(rng: &mut R, horizon: f64, rate_n: usize) -> Vec<f64> {
    let slots = (horizon / 2.0).floor() as u64;
    let events: BTreeSet<u64> = (0..rate_n).map(|_| rng.random_range(0..=slots)).collect();

    debug!(
        "Drew {} distinct firing times from {} draws over {} slots",
        events.len(),
        rate_n,
        slots.saturating_add(1)
    );
    if events.len() * 2 < rate_n {
        warn!(
            "More than half of the {} firing-time draws were duplicates; consider a longer horizon",
            rate_n
        );
    }

    events.into_iter().map(|slot| 2.0 * slot as f64).collect()
}

/// Noiseless trace: at every grid time `t`, the sum of `kernel(t - e)` over `events`.
pub fn superpose(kernel: &SpikeKernel, events: &[f64], horizon: f64, step: f64) -> Array1<f64> {
    let mut sorted = events.to_vec();
    sorted.sort_by(f64::total_cmp);

    let samples: Vec<f64> = (0..sample_count(horizon, step))
        .into_par_iter()
        .map(|i| {
            let t = i as f64 * step;
            let fired = sorted.partition_point(|&e| e <= t);
            sorted[..fired]
                .iter()
                .map(|&e| kernel.evaluate(t - e))
                .sum::<f64>()
        })
        .collect();

    Array1::from(samples)
}

/// One simulated neuron: its firing times, the clean trace and the noisy trace.
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeTrain {
    events: Vec<f64>,
    clean: Array1<f64>,
    samples: Array1<f64>,
    step: f64,
}

impl SpikeTrain {
    pub fn events(&self) -> &[f64] {
        &self.events
    }

    /// The trace before noise was added.
    pub fn clean(&self) -> &Array1<f64> {
        &self.clean
    }

    pub fn samples(&self) -> &Array1<f64> {
        &self.samples
    }

    pub fn times(&self) -> Array1<f64> {
        (0..self.len()).map(|i| i as f64 * self.step).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

pub fn generate_spike_train(
    kernel: &SpikeKernel,
    seed: u64,
    config: &SpikeTrainConfig,
) -> anyhow::Result<SpikeTrain> {
    let mut rng = seeded_rng(seed);
    generate_spike_train_with_rng(kernel, &mut rng, config)
}

/// Draws firing times, superposes `kernel` at each of them and adds noise.
///
/// RNG draws happen in a fixed order (firing times, then one noise sample per
/// grid point), so the output depends only on the RNG state and `config`.
pub fn generate_spike_train_with_rng<R: Rng>(
    kernel: &SpikeKernel,
    rng: &mut R,
    config: &SpikeTrainConfig,
) -> anyhow::Result<SpikeTrain> {
    config.validate()?;

    let events = draw_event_times(rng, config.horizon, config.rate_n);
    let clean = superpose(kernel, &events, config.horizon, config.step);
    let samples = add_gaussian_noise(rng, clean.view(), config.noise_std);

    Ok(SpikeTrain {
        events,
        clean,
        samples,
        step: config.step,
    })
}

/// Returns `signal + noise_std · z` with a fresh `z ~ N(0, 1)` per sample.
pub fn add_gaussian_noise<R: Rng, D: ndarray::Dimension>(
    rng: &mut R,
    signal: ndarray::ArrayView<f64, D>,
    noise_std: f64,
) -> ndarray::Array<f64, D> {
    let mut noisy = signal.to_owned();
    noisy
        .iter_mut()
        .for_each(|v| *v += noise_std * rng.sample::<f64, _>(StandardNormal));
    noisy
}

/// Projects the two neuron traces onto the electrodes:
/// `[train_2, train_1] · mixing`, so row 0 of `mixing` carries neuron 2.
///
/// # Errors
/// The traces must have equal length and `mixing` must have exactly two rows.
pub fn mix_electrodes<'a>(
    train_1: ArrayView1<'a, f64>,
    train_2: ArrayView1<'a, f64>,
    mixing: ArrayView2<f64>,
) -> anyhow::Result<Array2<f64>> {
    if train_1.len() != train_2.len() {
        return Err(invalid_argument(
            "train_2",
            format!(
                "length {} does not match train_1 length {}",
                train_2.len(),
                train_1.len()
            ),
        ));
    }
    if mixing.nrows() != 2 {
        return Err(invalid_argument(
            "mixing",
            format!("expected 2 rows (one per neuron), got {}", mixing.nrows()),
        ));
    }

    let sources = stack(Axis(1), &[train_2, train_1])?;
    Ok(sources.dot(&mixing))
}

/// Both neurons and the electrode signals they produce.
#[derive(Debug, Clone)]
pub struct ElectrodeRecording {
    pub neuron_1: SpikeTrain,
    pub neuron_2: SpikeTrain,
    pub electrodes: Array2<f64>,
}

impl ElectrodeRecording {
    /// `[clean_2, clean_1]`, column-ordered like the mixing matrix rows.
    pub fn clean_sources(&self) -> anyhow::Result<Array2<f64>> {
        Ok(stack(
            Axis(1),
            &[self.neuron_2.clean().view(), self.neuron_1.clean().view()],
        )?)
    }
}

/// Simulates [`NEURON_1`] then [`NEURON_2`] from one RNG and mixes them.
pub fn generate_electrode_recording<R: Rng>(
    rng: &mut R,
    config: &SpikeTrainConfig,
    mixing: ArrayView2<f64>,
) -> anyhow::Result<ElectrodeRecording> {
    let neuron_1 = generate_spike_train_with_rng(&NEURON_1, rng, config)?;
    let neuron_2 = generate_spike_train_with_rng(&NEURON_2, rng, config)?;
    let electrodes = mix_electrodes(neuron_1.samples().view(), neuron_2.samples().view(), mixing)?;

    debug!(
        "Recorded {} samples on {} electrodes ({} + {} firing times)",
        electrodes.nrows(),
        electrodes.ncols(),
        neuron_1.events().len(),
        neuron_2.events().len()
    );

    Ok(ElectrodeRecording {
        neuron_1,
        neuron_2,
        electrodes,
    })
}
