//! Thin singular value decompositions behind a common trait, so PCA can run
//! on whichever linear algebra backend is compiled in.

use ndarray::{Array1, Array2, ArrayView2, Axis};

#[cfg(feature = "faer")]
mod faer;
mod nalgebra_backend;

#[cfg(feature = "faer")]
pub use self::faer::FaerSVD;
pub use nalgebra_backend::NalgebraSVD;

/// `X = U · diag(s) · Vᵀ` with `U: m × r`, `s: r`, `Vᵀ: r × n`, `r = min(m, n)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThinSvd {
    pub u: Array2<f64>,
    pub s: Array1<f64>,
    pub vt: Array2<f64>,
}

impl ThinSvd {
    pub fn rank(&self) -> usize {
        self.s.len()
    }

    pub fn reconstruct(&self) -> Array2<f64> {
        let s_diag = Array2::from_diag(&self.s);
        self.u.dot(&s_diag).dot(&self.vt)
    }

    /// Reorders the singular triplets so that `s` is non-increasing.
    pub fn sorted(self) -> Self {
        let mut order: Vec<usize> = (0..self.s.len()).collect();
        order.sort_by(|&a, &b| self.s[b].total_cmp(&self.s[a]));

        if order.iter().enumerate().all(|(i, &idx)| i == idx) {
            return self;
        }

        ThinSvd {
            u: self.u.select(Axis(1), &order),
            s: order.iter().map(|&i| self.s[i]).collect(),
            vt: self.vt.select(Axis(0), &order),
        }
    }

    /// Makes the largest-magnitude entry of every right singular vector
    /// positive, flipping the matching left singular vector with it.
    pub fn flip_signs(mut self) -> Self {
        for k in 0..self.vt.nrows() {
            let pivot = self
                .vt
                .row(k)
                .iter()
                .copied()
                .fold(0.0f64, |best, v| if v.abs() > best.abs() { v } else { best });
            if pivot < 0.0 {
                self.vt.row_mut(k).mapv_inplace(|v| -v);
                self.u.column_mut(k).mapv_inplace(|v| -v);
            }
        }
        self
    }
}

// Trait for SVD implementations
pub trait SVDImplementation: Send + Sync {
    fn compute(&self, matrix: ArrayView2<f64>) -> anyhow::Result<ThinSvd>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_sorted_reorders_triplets() {
        let svd = ThinSvd {
            u: array![[1.0, 0.0], [0.0, 1.0]],
            s: array![1.0, 3.0],
            vt: array![[0.0, 1.0], [1.0, 0.0]],
        };
        let before = svd.reconstruct();
        let sorted = svd.sorted();

        assert_eq!(sorted.s, array![3.0, 1.0]);
        assert_eq!(sorted.u, array![[0.0, 1.0], [1.0, 0.0]]);
        let after = sorted.reconstruct();
        for (a, b) in before.iter().zip(after.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_flip_signs_preserves_product() {
        let svd = ThinSvd {
            u: array![[-0.6, 0.8], [-0.8, -0.6]],
            s: array![2.0, 1.0],
            vt: array![[-1.0, 0.0], [0.0, 1.0]],
        };
        let before = svd.reconstruct();
        let flipped = svd.flip_signs();

        assert_eq!(flipped.vt.row(0), array![1.0, 0.0]);
        assert_eq!(flipped.u.column(0), array![0.6, 0.8]);
        let after = flipped.reconstruct();
        for (a, b) in before.iter().zip(after.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }
}
