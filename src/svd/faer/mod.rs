use super::{SVDImplementation, ThinSvd};
use faer_ext::*;
use ndarray::{Array1, ArrayView2};

/// Dense SVD computed with `faer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaerSVD;

impl SVDImplementation for FaerSVD {
    fn compute(&self, matrix: ArrayView2<f64>) -> anyhow::Result<ThinSvd> {
        let faer_mat = matrix.into_faer();
        let svd = faer_mat.thin_svd();
        let u = svd.u().into_ndarray().to_owned();
        let s: Array1<f64> = Array1::from_iter(svd.s_diagonal().iter().cloned());
        // faer hands back V, not Vᵀ.
        let vt = svd.v().into_ndarray().t().to_owned();

        Ok(ThinSvd { u, s, vt }.sorted())
    }
}
