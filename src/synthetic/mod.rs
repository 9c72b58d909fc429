//! # Synthetic generative models
//!
//! Builds ground-truth data for PCA recovery experiments: a hidden signal of
//! `q` independent, per-dimension scaled Gaussian coordinates is pushed through
//! a fixed `q × p` mixing matrix to produce the observed `p`-dimensional data.
//!
//! The mixing step is an exact linear map. Any noise lives in the hidden
//! signal, so `observed == hidden · mixing` holds to floating point precision.
//!
//! Generation is deterministic for a given seed (or RNG state). Values are
//! reproducible within this crate and the pinned `rand_chacha` version only.

use crate::error::invalid_argument;
use crate::utils::{seeded_rng, Direction, UnitNorm};
use log::debug;
use ndarray::{Array2, ArrayView2};
use rand::Rng;
use rand_distr::StandardNormal;

mod rotation;

pub use rotation::{
    build_rotation_mixing, random_rotation_mixing, rotation_x, rotation_z,
    seeded_rotation_mixing, AngleRange,
};

/// A hidden signal together with its image under a mixing matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Mixture {
    hidden: Array2<f64>,
    observed: Array2<f64>,
}

impl Mixture {
    /// `N × q` latent coordinates.
    pub fn hidden(&self) -> &Array2<f64> {
        &self.hidden
    }

    /// `N × p` observations.
    pub fn observed(&self) -> &Array2<f64> {
        &self.observed
    }

    pub fn n_samples(&self) -> usize {
        self.hidden.nrows()
    }

    pub fn latent_dim(&self) -> usize {
        self.hidden.ncols()
    }

    pub fn observed_dim(&self) -> usize {
        self.observed.ncols()
    }

    pub fn into_parts(self) -> (Array2<f64>, Array2<f64>) {
        (self.hidden, self.observed)
    }
}

/// Generates a mixture from a bare seed.
///
/// Equivalent to seeding a [`crate::utils::SeededRng`] with `seed` and calling
/// [`generate_mixture_with_rng`].
pub fn generate_mixture(
    seed: u64,
    n_samples: usize,
    scales: &[f64],
    mixing: ArrayView2<f64>,
) -> anyhow::Result<Mixture> {
    let mut rng = seeded_rng(seed);
    generate_mixture_with_rng(&mut rng, n_samples, scales, mixing)
}

/// Draws `hidden[i, j] = scales[j] · z` with `z ~ N(0, 1)` and returns it
/// alongside `observed = hidden · mixing`.
///
/// # Errors
/// Returns an [`crate::error::InvalidArgument`] if `n_samples` is zero, the
/// scales are empty, negative or not finite, the mixing matrix does not have
/// one row per scale, contains non-finite entries, or has fewer columns than
/// rows (`q > p`).
pub fn generate_mixture_with_rng<R: Rng>(
    rng: &mut R,
    n_samples: usize,
    scales: &[f64],
    mixing: ArrayView2<f64>,
) -> anyhow::Result<Mixture> {
    validate_mixture_args(n_samples, scales, mixing)?;

    let hidden = sample_hidden(rng, n_samples, scales);
    let observed = hidden.dot(&mixing);

    debug!(
        "Generated mixture: {} samples, {} latent -> {} observed dimensions",
        n_samples,
        scales.len(),
        mixing.ncols()
    );

    Ok(Mixture { hidden, observed })
}

/// Samples the hidden signal alone. Draws are taken in row-major order.
pub fn sample_hidden<R: Rng>(rng: &mut R, n_samples: usize, scales: &[f64]) -> Array2<f64> {
    Array2::from_shape_fn((n_samples, scales.len()), |(_, j)| {
        scales[j] * rng.sample::<f64, _>(StandardNormal)
    })
}

/// Returns a copy of `mixing` with every row rescaled to unit norm.
pub fn normalize_rows(mixing: ArrayView2<f64>) -> anyhow::Result<Array2<f64>> {
    let mut normalized = mixing.to_owned();
    normalized.unit_norm(&Direction::Row)?;
    Ok(normalized)
}

fn validate_mixture_args(
    n_samples: usize,
    scales: &[f64],
    mixing: ArrayView2<f64>,
) -> anyhow::Result<()> {
    if n_samples == 0 {
        return Err(invalid_argument("n_samples", "must be at least 1"));
    }
    if scales.is_empty() {
        return Err(invalid_argument("scales", "at least one latent dimension is required"));
    }
    if let Some(bad) = scales.iter().find(|s| !s.is_finite() || **s < 0.0) {
        return Err(invalid_argument(
            "scales",
            format!("scale factors must be finite and non-negative, got {}", bad),
        ));
    }

    let (q, p) = mixing.dim();
    if q != scales.len() {
        return Err(invalid_argument(
            "mixing",
            format!("expected {} rows (one per scale), got {}", scales.len(), q),
        ));
    }
    if q > p {
        return Err(invalid_argument(
            "mixing",
            format!("latent dimension {} exceeds observed dimension {}", q, p),
        ));
    }
    if mixing.iter().any(|v| !v.is_finite()) {
        return Err(invalid_argument("mixing", "entries must be finite"));
    }
    Ok(())
}
