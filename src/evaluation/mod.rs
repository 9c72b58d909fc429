//! # Recovery metrics
//!
//! PCA recovers latent structure only up to sign, order and (for equal
//! variances) rotation. The functions here compare ground truth with what PCA
//! returned in ways that are blind to exactly those ambiguities:
//!
//! - [`cosine_similarity_of_subspaces`] compares the spans of two bases via
//!   their principal angles.
//! - [`match_signals`] pairs every true signal with its most correlated
//!   estimate, reporting the sign.
//! - [`reconstruction_error`] measures elementwise closeness of a
//!   reconstruction to the data it approximates.
//! - [`neighbourhood_preservation`] scores how much local structure a
//!   low-dimensional embedding keeps, for projections that have no inverse.

use crate::dense::frobenius_norm;
use crate::error::invalid_argument;
use crate::similarity::{CosineSimilarity, PearsonSimilarity, SimilarityMeasure};
use nalgebra::DMatrix;
use ndarray::{Array1, ArrayView2};
use nshare::IntoNalgebra;
use rayon::prelude::*;
use std::fmt;

// Relative size of an R diagonal entry below which a basis counts as rank deficient.
const RANK_TOLERANCE: f64 = 1e-10;

/// Cosines of the principal angles between the row spaces of two bases,
/// in non-increasing order. There are `min(k₁, k₂)` of them.
///
/// Rows of each argument are basis vectors in a common `p`-dimensional space.
/// Neither basis needs to be orthonormal, but both must have full row rank.
pub fn principal_angle_cosines(
    true_basis: ArrayView2<f64>,
    estimated_basis: ArrayView2<f64>,
) -> anyhow::Result<Array1<f64>> {
    if true_basis.ncols() != estimated_basis.ncols() {
        return Err(invalid_argument(
            "estimated_basis",
            format!(
                "vectors have {} coordinates but true_basis vectors have {}",
                estimated_basis.ncols(),
                true_basis.ncols()
            ),
        ));
    }

    let q_true = orthonormal_columns(true_basis, "true_basis")?;
    let q_estimated = orthonormal_columns(estimated_basis, "estimated_basis")?;
    let overlap = q_true.transpose() * q_estimated;

    let mut cosines: Vec<f64> = overlap
        .singular_values()
        .iter()
        .map(|c| c.clamp(0.0, 1.0))
        .collect();
    cosines.sort_by(|a, b| b.total_cmp(a));

    Ok(Array1::from(cosines))
}

/// Mean principal-angle cosine between two subspaces, in `[0, 1]`.
///
/// 1 means the smaller subspace lies entirely inside the larger one
/// (in particular, any basis compared with itself, a rescaled or sign-flipped
/// copy, or a rotation within its span). 0 means they are orthogonal.
pub fn cosine_similarity_of_subspaces(
    true_basis: ArrayView2<f64>,
    estimated_basis: ArrayView2<f64>,
) -> anyhow::Result<f64> {
    let cosines = principal_angle_cosines(true_basis, estimated_basis)?;
    Ok(cosines.mean().unwrap_or(0.0))
}

/// |cos| between row `i` of `a` and row `i` of `b`, for every row.
pub fn rowwise_alignment(a: ArrayView2<f64>, b: ArrayView2<f64>) -> anyhow::Result<Array1<f64>> {
    if a.dim() != b.dim() {
        return Err(invalid_argument(
            "b",
            format!("shape {:?} does not match {:?}", b.dim(), a.dim()),
        ));
    }
    Ok(a.rows()
        .into_iter()
        .zip(b.rows())
        .map(|(ra, rb)| CosineSimilarity.calculate(ra, rb).abs())
        .collect())
}

fn orthonormal_columns(basis: ArrayView2<f64>, argument: &'static str) -> anyhow::Result<DMatrix<f64>> {
    let (k, p) = basis.dim();
    if k == 0 || p == 0 {
        return Err(invalid_argument(argument, "basis is empty"));
    }
    if k > p {
        return Err(invalid_argument(
            argument,
            format!("{} vectors cannot be independent in {} dimensions", k, p),
        ));
    }
    if basis.iter().any(|v| !v.is_finite()) {
        return Err(invalid_argument(argument, "entries must be finite"));
    }

    let columns = basis.t().as_standard_layout().into_owned().into_nalgebra();
    let qr = columns.qr();
    let r = qr.r();
    let diagonal = r.diagonal();
    let largest = diagonal.amax();
    if largest == 0.0 {
        return Err(invalid_argument(argument, "basis is zero"));
    }
    if diagonal.iter().any(|d| d.abs() <= largest * RANK_TOLERANCE) {
        return Err(invalid_argument(argument, "basis vectors are linearly dependent"));
    }

    Ok(qr.q())
}

/// Best correlated estimate for one true signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentMatch {
    pub truth: usize,
    pub estimate: usize,
    /// Signed Pearson correlation; negative means the estimate is flipped.
    pub correlation: f64,
}

impl ComponentMatch {
    pub fn sign(&self) -> f64 {
        if self.correlation < 0.0 {
            -1.0
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalMatch {
    pub matches: Vec<ComponentMatch>,
}

impl SignalMatch {
    pub fn mean_abs_correlation(&self) -> f64 {
        if self.matches.is_empty() {
            return 0.0;
        }
        self.matches.iter().map(|m| m.correlation.abs()).sum::<f64>() / self.matches.len() as f64
    }

    pub fn min_abs_correlation(&self) -> f64 {
        self.matches
            .iter()
            .map(|m| m.correlation.abs())
            .fold(f64::INFINITY, f64::min)
    }

    /// Whether every true signal was matched to a different estimate.
    pub fn is_one_to_one(&self) -> bool {
        let mut seen: Vec<usize> = self.matches.iter().map(|m| m.estimate).collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len() == self.matches.len()
    }
}

impl fmt::Display for SignalMatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for m in &self.matches {
            writeln!(
                f,
                "  signal {} <- estimate {} (r = {:+.4})",
                m.truth, m.estimate, m.correlation
            )?;
        }
        Ok(())
    }
}

/// Pairs each column of `truth` with the column of `estimate` of largest |r|.
///
/// Columns are signals and rows are samples, as for PCA scores.
pub fn match_signals(truth: ArrayView2<f64>, estimate: ArrayView2<f64>) -> anyhow::Result<SignalMatch> {
    if truth.nrows() != estimate.nrows() {
        return Err(invalid_argument(
            "estimate",
            format!("{} samples, expected {}", estimate.nrows(), truth.nrows()),
        ));
    }
    if truth.nrows() < 2 {
        return Err(invalid_argument("truth", "at least 2 samples are needed"));
    }
    if truth.ncols() == 0 {
        return Err(invalid_argument("truth", "no signals to match"));
    }
    if estimate.ncols() == 0 {
        return Err(invalid_argument("estimate", "no signals to match against"));
    }

    let matches = truth
        .columns()
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            let (estimate_idx, correlation) = estimate
                .columns()
                .into_iter()
                .map(|e| PearsonSimilarity.calculate(t, e))
                .enumerate()
                .fold((0, 0.0f64), |best, (j, r)| {
                    if r.abs() > best.1.abs() {
                        (j, r)
                    } else {
                        best
                    }
                });
            ComponentMatch {
                truth: i,
                estimate: estimate_idx,
                correlation,
            }
        })
        .collect();

    Ok(SignalMatch { matches })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconstructionError {
    pub rmse: f64,
    pub max_abs: f64,
    /// `‖original − reconstruction‖_F / ‖original‖_F`.
    pub relative: f64,
}

impl fmt::Display for ReconstructionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "rmse {:.3e}, max |err| {:.3e}, relative {:.3e}",
            self.rmse, self.max_abs, self.relative
        )
    }
}

pub fn reconstruction_error(
    original: ArrayView2<f64>,
    reconstruction: ArrayView2<f64>,
) -> anyhow::Result<ReconstructionError> {
    if original.dim() != reconstruction.dim() {
        return Err(invalid_argument(
            "reconstruction",
            format!(
                "shape {:?} does not match original {:?}",
                reconstruction.dim(),
                original.dim()
            ),
        ));
    }
    if original.is_empty() {
        return Err(invalid_argument("original", "matrix is empty"));
    }

    let diff = &original - &reconstruction;
    let diff_norm = frobenius_norm(diff.view());
    let original_norm = frobenius_norm(original);
    let relative = if original_norm > 0.0 {
        diff_norm / original_norm
    } else if diff_norm == 0.0 {
        0.0
    } else {
        f64::INFINITY
    };

    Ok(ReconstructionError {
        rmse: diff_norm / (diff.len() as f64).sqrt(),
        max_abs: diff.iter().fold(0.0f64, |m, v| m.max(v.abs())),
        relative,
    })
}

/// Average fraction of each sample's `k` nearest neighbours (Euclidean, in
/// `original`) that are also among its `k` nearest neighbours in `embedding`.
pub fn neighbourhood_preservation(
    original: ArrayView2<f64>,
    embedding: ArrayView2<f64>,
    k: usize,
) -> anyhow::Result<f64> {
    let n = original.nrows();
    if embedding.nrows() != n {
        return Err(invalid_argument(
            "embedding",
            format!("{} samples, expected {}", embedding.nrows(), n),
        ));
    }
    if k == 0 || k >= n {
        return Err(invalid_argument(
            "k",
            format!("must lie in 1..{} for {} samples, got {}", n, n, k),
        ));
    }

    let kept: usize = (0..n)
        .into_par_iter()
        .map(|i| {
            let before = nearest_neighbours(original, i, k);
            let after = nearest_neighbours(embedding, i, k);
            before.iter().filter(|&j| after.contains(j)).count()
        })
        .sum();

    Ok(kept as f64 / (n * k) as f64)
}

fn nearest_neighbours(x: ArrayView2<f64>, i: usize, k: usize) -> Vec<usize> {
    let origin = x.row(i);
    let mut distances: Vec<(f64, usize)> = x
        .rows()
        .into_iter()
        .enumerate()
        .filter(|&(j, _)| j != i)
        .map(|(j, row)| {
            let d = row
                .iter()
                .zip(origin.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>();
            (d, j)
        })
        .collect();
    distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    distances.into_iter().take(k).map(|(_, j)| j).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::as_invalid_argument;
    use crate::synthetic::build_rotation_mixing;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, concatenate, Axis};

    #[test]
    fn test_identical_basis_has_similarity_one() {
        let bases = [
            array![[-0.3, 0.4, 0.866], [0.885, 0.46, 0.1]],
            array![[1.0, 0.0, 0.0]],
            array![[3.0, 1.0, 0.0, 2.0], [0.0, 5.0, 1.0, 1.0], [1.0, 1.0, 1.0, 1.0]],
        ];
        for basis in bases {
            let similarity = cosine_similarity_of_subspaces(basis.view(), basis.view()).unwrap();
            assert_abs_diff_eq!(similarity, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_similarity_ignores_sign_scale_and_in_span_rotation() {
        let basis = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let rotated = array![[0.6, 0.8, 0.0], [-8.0, 6.0, 0.0]];
        let flipped = -&basis * 3.0;

        assert_abs_diff_eq!(
            cosine_similarity_of_subspaces(basis.view(), rotated.view()).unwrap(),
            1.0,
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(
            cosine_similarity_of_subspaces(basis.view(), flipped.view()).unwrap(),
            1.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_principal_angles() {
        let plane = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let tilted = array![[1.0, 0.0, 0.0], [0.0, 1.0, 1.0]];
        let cosines = principal_angle_cosines(plane.view(), tilted.view()).unwrap();
        assert_abs_diff_eq!(cosines[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cosines[1], std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);

        let normal = array![[0.0, 0.0, 1.0]];
        let similarity = cosine_similarity_of_subspaces(plane.view(), normal.view()).unwrap();
        assert_abs_diff_eq!(similarity, 0.0, epsilon = 1e-12);

        // A line inside the plane is fully contained in it.
        let line = array![[1.0, 1.0, 0.0]];
        let similarity = cosine_similarity_of_subspaces(plane.view(), line.view()).unwrap();
        assert_abs_diff_eq!(similarity, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_similarity_stays_in_unit_interval() {
        for (a1, a2) in [(0.1, 0.2), (1.0, 2.0), (3.0, 0.5)] {
            let r = build_rotation_mixing(a1, a2);
            let top = r.slice(ndarray::s![..2, ..]);
            let eye = ndarray::Array2::<f64>::eye(3);
            let similarity =
                cosine_similarity_of_subspaces(eye.slice(ndarray::s![..2, ..]), top).unwrap();
            assert!((0.0..=1.0).contains(&similarity));
        }
    }

    #[test]
    fn test_invalid_bases() {
        let zero = array![[0.0, 0.0, 0.0]];
        let basis = array![[1.0, 0.0, 0.0]];
        let err = cosine_similarity_of_subspaces(zero.view(), basis.view()).unwrap_err();
        assert_eq!(as_invalid_argument(&err).unwrap().argument(), "true_basis");

        let dependent = array![[1.0, 2.0, 3.0], [2.0, 4.0, 6.0]];
        assert!(cosine_similarity_of_subspaces(basis.view(), dependent.view()).is_err());

        let short = array![[1.0, 0.0]];
        assert!(cosine_similarity_of_subspaces(basis.view(), short.view()).is_err());

        let empty = ndarray::Array2::<f64>::zeros((0, 3));
        assert!(cosine_similarity_of_subspaces(empty.view(), basis.view()).is_err());
    }

    #[test]
    fn test_rowwise_alignment() {
        let a = array![[1.0, 0.0], [0.0, 1.0]];
        let b = array![[-2.0, 0.0], [1.0, 1.0]];
        let alignment = rowwise_alignment(a.view(), b.view()).unwrap();
        assert_abs_diff_eq!(alignment[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(alignment[1], std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
        assert!(rowwise_alignment(a.view(), array![[1.0, 0.0]].view()).is_err());
    }

    #[test]
    fn test_match_signals_resolves_sign_and_order() {
        let s0 = array![[1.0], [2.0], [0.0], [-1.0], [3.0]];
        let s1 = array![[0.5], [-1.0], [2.0], [0.0], [1.0]];
        let truth = concatenate(Axis(1), &[s0.view(), s1.view()]).unwrap();
        let estimate = concatenate(Axis(1), &[(&s1 * 2.0).view(), (-&s0).view()]).unwrap();

        let matched = match_signals(truth.view(), estimate.view()).unwrap();
        assert_eq!(matched.matches[0].estimate, 1);
        assert_eq!(matched.matches[0].sign(), -1.0);
        assert_eq!(matched.matches[1].estimate, 0);
        assert_eq!(matched.matches[1].sign(), 1.0);
        assert!(matched.is_one_to_one());
        assert_abs_diff_eq!(matched.mean_abs_correlation(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(matched.min_abs_correlation(), 1.0, epsilon = 1e-12);
        assert!(matched.to_string().contains("estimate 1"));
    }

    #[test]
    fn test_match_signals_rejects_length_mismatch() {
        let truth = array![[1.0], [2.0], [3.0]];
        let estimate = array![[1.0], [2.0]];
        assert!(match_signals(truth.view(), estimate.view()).is_err());
    }

    #[test]
    fn test_match_signals_rejects_empty_truth() {
        let truth = ndarray::Array2::<f64>::zeros((3, 0));
        let estimate = array![[1.0], [2.0], [3.0]];
        let err = match_signals(truth.view(), estimate.view()).unwrap_err();
        assert_eq!(as_invalid_argument(&err).unwrap().argument(), "truth");
    }

    #[test]
    fn test_reconstruction_error() {
        let original = array![[1.0, 2.0], [3.0, 4.0]];
        let exact = reconstruction_error(original.view(), original.view()).unwrap();
        assert_eq!(exact.rmse, 0.0);
        assert_eq!(exact.relative, 0.0);

        let shifted = &original + 1.0;
        let err = reconstruction_error(original.view(), shifted.view()).unwrap();
        assert_abs_diff_eq!(err.rmse, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(err.max_abs, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(err.relative, 2.0 / 30.0f64.sqrt(), epsilon = 1e-12);

        assert!(reconstruction_error(original.view(), array![[1.0, 2.0]].view()).is_err());
    }

    #[test]
    fn test_neighbourhood_preservation() {
        let line = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [10.0, 0.0], [11.0, 0.0]];
        let scaled = &line * 3.0;
        assert_eq!(neighbourhood_preservation(line.view(), scaled.view(), 1).unwrap(), 1.0);

        // Collapsed onto one point, neighbours fall back to index order.
        let collapsed = ndarray::Array2::<f64>::zeros((5, 1));
        let score = neighbourhood_preservation(line.view(), collapsed.view(), 2).unwrap();
        assert!((0.0..1.0).contains(&score));

        assert!(neighbourhood_preservation(line.view(), scaled.view(), 5).is_err());
        assert!(neighbourhood_preservation(line.view(), scaled.view(), 0).is_err());
    }
}
