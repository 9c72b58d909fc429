use crate::error::invalid_argument;
use anyhow::anyhow;
use log::debug;
use ndarray::{Array2, ArrayView2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TSNEConfig {
    pub output_dim: u8,
    pub perplexity: f64,
    pub epochs: usize,
    /// Barnes-Hut accuracy trade-off; 0 would be exact.
    pub theta: f64,
}

impl Default for TSNEConfig {
    fn default() -> Self {
        Self {
            output_dim: 2,
            perplexity: 30.0,
            epochs: 1000,
            theta: 0.5,
        }
    }
}

/// Barnes-Hut t-SNE embedding of the rows of `x` under Euclidean distance.
///
/// The embedding is randomly initialised by `bhtsne` and is therefore not
/// seed-reproducible.
pub fn tsne(x: ArrayView2<f64>, config: &TSNEConfig) -> anyhow::Result<Array2<f64>> {
    let (n_obs, n_dim) = x.dim();
    if config.output_dim == 0 {
        return Err(invalid_argument("output_dim", "must be at least 1"));
    }
    if !(config.perplexity > 0.0) || (n_obs as f64 - 1.0) < 3.0 * config.perplexity {
        return Err(invalid_argument(
            "perplexity",
            format!(
                "must be positive and at most (n_samples - 1) / 3 = {:.2}, got {}",
                (n_obs as f64 - 1.0) / 3.0,
                config.perplexity
            ),
        ));
    }
    if !(config.theta > 0.0) {
        return Err(invalid_argument("theta", "must be positive"));
    }

    let x_standard = x.as_standard_layout();
    let x_slice = x_standard
        .as_slice()
        .ok_or_else(|| anyhow!("Input is not contiguous"))?;
    let x_chunked_slice: Vec<&[f64]> = x_slice.chunks(n_dim).collect();

    debug!(
        "Running t-SNE on {} samples x {} features (perplexity {}, {} epochs)",
        n_obs, n_dim, config.perplexity, config.epochs
    );

    let tsne_result = bhtsne::tSNE::new(&x_chunked_slice)
        .embedding_dim(config.output_dim)
        .perplexity(config.perplexity)
        .epochs(config.epochs)
        .barnes_hut(config.theta, |sample_a, sample_b| {
            sample_a
                .iter()
                .zip(sample_b.iter())
                .map(|(&a, &b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt()
        })
        .embedding();

    let result = Array2::from_shape_vec((n_obs, config.output_dim as usize), tsne_result)?;
    Ok(result)
}
