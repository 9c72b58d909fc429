//! # Dimensionality Reduction
//!
//! Projections used to look at the synthetic data from fewer dimensions.
//!
//! ## Available
//! - **PCA** ([`pca`]): linear projection onto the directions of largest variance,
//!   with an inverse map back into feature space
//! - **t-SNE** (`tsne`, behind the `tsne` feature): non-linear embedding that keeps
//!   local neighbourhoods, useful as a contrast to PCA on clustered data
//!
//! ## Algorithm Selection Guide
//! - Use **PCA** when the data is (close to) a linear image of a few latent factors,
//!   when loadings need to be interpreted, or when the data must be reconstructed
//! - Use **t-SNE** for visual inspection of cluster structure only; distances and
//!   axes of the embedding carry no global meaning

pub mod pca;
#[cfg(feature = "tsne")]
pub mod tsne;
