use super::{SVDImplementation, ThinSvd};
use anyhow::anyhow;
use log::debug;
use nalgebra::linalg::SVD;
use ndarray::{Array1, ArrayView2};
use nshare::{IntoNalgebra, IntoNdarray2};

const MAX_ITERATIONS: usize = 0;

/// Dense SVD computed with `nalgebra`'s bidiagonalisation + implicit QR.
#[derive(Debug, Clone, Copy, Default)]
pub struct NalgebraSVD;

impl SVDImplementation for NalgebraSVD {
    fn compute(&self, matrix: ArrayView2<f64>) -> anyhow::Result<ThinSvd> {
        let (m, n) = matrix.dim();
        if m == 0 || n == 0 {
            return Err(anyhow!("Cannot decompose an empty {}x{} matrix", m, n));
        }

        let x = matrix.as_standard_layout().into_owned().into_nalgebra();
        // A zero iteration cap means "iterate until convergence".
        let svd = SVD::try_new(x, true, true, f64::EPSILON, MAX_ITERATIONS)
            .ok_or_else(|| anyhow!("SVD failed to converge on a {}x{} matrix", m, n))?;

        let u = svd
            .u
            .ok_or_else(|| anyhow!("SVD did not return left singular vectors"))?;
        let vt = svd
            .v_t
            .ok_or_else(|| anyhow!("SVD did not return right singular vectors"))?;
        let s = Array1::from(svd.singular_values.as_slice().to_vec());

        debug!("Computed {}x{} SVD with {} singular values", m, n, s.len());

        Ok(ThinSvd {
            u: u.into_ndarray2(),
            s,
            vt: vt.into_ndarray2(),
        }
        .sorted())
    }
}
