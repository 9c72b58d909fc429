use super::{Experiment, Values};
use crate::dimred::pca::PCABuilder;
use crate::dimred::tsne::{tsne, TSNEConfig};
use crate::evaluation::neighbourhood_preservation;
use crate::svd::NalgebraSVD;
use crate::synthetic::generate_mixture_with_rng;
use crate::utils::seeded_rng;
use anyhow::anyhow;
use log::info;
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand_distr::StandardNormal;
use std::fmt;

/// Separated clusters in a high-dimensional space, projected to 2D by PCA and
/// by t-SNE.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaVersusTsne {
    pub seed: u64,
    pub n_clusters: usize,
    pub samples_per_cluster: usize,
    pub observed_dim: usize,
    /// Spread of the cluster centres relative to the within-cluster spread.
    pub separation: f64,
    pub neighbours: usize,
    pub tsne: TSNEConfig,
}

impl Default for PcaVersusTsne {
    fn default() -> Self {
        Self {
            seed: 5,
            n_clusters: 4,
            samples_per_cluster: 50,
            observed_dim: 10,
            separation: 6.0,
            neighbours: 10,
            tsne: TSNEConfig {
                perplexity: 15.0,
                epochs: 500,
                ..TSNEConfig::default()
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PcaVersusTsneReport {
    pub labels: Vec<usize>,
    pub pca_projection: Array2<f64>,
    pub tsne_projection: Array2<f64>,
    pub pca_explained_variance_ratio: Array1<f64>,
    pub pca_neighbourhood_preservation: f64,
    pub tsne_neighbourhood_preservation: f64,
}

impl Experiment for PcaVersusTsne {
    type Report = PcaVersusTsneReport;

    fn run(&self) -> anyhow::Result<PcaVersusTsneReport> {
        let mut rng = seeded_rng(self.seed);
        let identity = Array2::<f64>::eye(self.observed_dim);
        let scales = vec![1.0; self.observed_dim];

        let mut blocks = Vec::with_capacity(self.n_clusters);
        let mut labels = Vec::with_capacity(self.n_clusters * self.samples_per_cluster);
        for cluster in 0..self.n_clusters {
            let centre: Array1<f64> = (0..self.observed_dim)
                .map(|_| self.separation * rng.sample::<f64, _>(StandardNormal))
                .collect();
            let mixture = generate_mixture_with_rng(
                &mut rng,
                self.samples_per_cluster,
                &scales,
                identity.view(),
            )?;
            blocks.push(mixture.observed() + &centre);
            labels.extend(std::iter::repeat(cluster).take(self.samples_per_cluster));
        }
        let views: Vec<_> = blocks.iter().map(|b| b.view()).collect();
        let data = ndarray::concatenate(Axis(0), &views)?;

        let mut pca = PCABuilder::new(NalgebraSVD).n_components(2).build();
        let pca_projection = pca.fit_transform(data.view())?;
        let pca_explained_variance_ratio = pca
            .explained_variance_ratio()
            .cloned()
            .ok_or_else(|| anyhow!("PCA returned no variance report"))?;
        let tsne_projection = tsne(data.view(), &self.tsne)?;

        let pca_neighbourhood_preservation =
            neighbourhood_preservation(data.view(), pca_projection.view(), self.neighbours)?;
        let tsne_neighbourhood_preservation =
            neighbourhood_preservation(data.view(), tsne_projection.view(), self.neighbours)?;

        info!(
            "PCA vs t-SNE: {}-NN preservation {:.3} (PCA) vs {:.3} (t-SNE)",
            self.neighbours, pca_neighbourhood_preservation, tsne_neighbourhood_preservation
        );

        Ok(PcaVersusTsneReport {
            labels,
            pca_projection,
            tsne_projection,
            pca_explained_variance_ratio,
            pca_neighbourhood_preservation,
            tsne_neighbourhood_preservation,
        })
    }
}

impl fmt::Display for PcaVersusTsneReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "PCA versus t-SNE on {} samples", self.labels.len())?;
        writeln!(
            f,
            "PCA explained variance ratio (2D): {}",
            Values(&self.pca_explained_variance_ratio)
        )?;
        writeln!(
            f,
            "neighbourhood preservation: PCA {:.4}, t-SNE {:.4}",
            self.pca_neighbourhood_preservation, self.tsne_neighbourhood_preservation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projections_have_matching_shapes() {
        let report = PcaVersusTsne::default().run().unwrap();
        assert_eq!(report.labels.len(), 200);
        assert_eq!(report.pca_projection.dim(), (200, 2));
        assert_eq!(report.tsne_projection.dim(), (200, 2));
        assert!((0.0..=1.0).contains(&report.pca_neighbourhood_preservation));
        assert!((0.0..=1.0).contains(&report.tsne_neighbourhood_preservation));
    }
}
