//! # Experiments
//!
//! Each experiment is a plain configuration value and a pure [`Experiment::run`]
//! that composes a generator, a PCA fit and the recovery metrics. Changing a
//! parameter and calling `run` again is the whole update cycle. The returned
//! report implements [`std::fmt::Display`] for a textual summary; nothing is
//! printed or rendered while computing.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use std::fmt;

mod compression;
mod rotation;
mod spike_unmixing;
mod toy;
#[cfg(feature = "tsne")]
mod versus_tsne;

pub use compression::{Compression, CompressionLevel, CompressionReport};
pub use rotation::{RotationRecovery, RotationReport};
pub use spike_unmixing::{SpikeUnmixing, SpikeUnmixingReport};
pub use toy::{ToyRecovery, ToyReport};
#[cfg(feature = "tsne")]
pub use versus_tsne::{PcaVersusTsne, PcaVersusTsneReport};

/// A reproducible, self-contained PCA demonstration.
pub trait Experiment {
    type Report: fmt::Display;

    fn run(&self) -> anyhow::Result<Self::Report>;
}

/// Rows of `mixing` ordered by decreasing latent scale, i.e. in the order
/// PCA is expected to return them.
pub(crate) fn rows_by_decreasing_scale(mixing: ArrayView2<f64>, scales: &[f64]) -> Array2<f64> {
    let mut order: Vec<usize> = (0..scales.len()).collect();
    order.sort_by(|&a, &b| scales[b].total_cmp(&scales[a]));
    mixing.select(Axis(0), &order)
}

pub(crate) struct Values<'a>(pub &'a Array1<f64>);

impl fmt::Display for Values<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.4}", v)?;
        }
        write!(f, "]")
    }
}
