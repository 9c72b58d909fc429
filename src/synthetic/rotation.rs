use crate::utils::seeded_rng;
use log::debug;
use ndarray::{array, Array2};
use rand::Rng;
use std::f64::consts::TAU;

/// Interval the random rotation angles are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleRange {
    /// Angles uniform in `[0, 1)` radians. Only a narrow wedge of rotation
    /// space is reachable; kept as the default to reproduce the notebook.
    #[default]
    Unit,
    /// Angles uniform in `[0, 2π)`.
    FullTurn,
}

impl AngleRange {
    fn upper(&self) -> f64 {
        match self {
            AngleRange::Unit => 1.0,
            AngleRange::FullTurn => TAU,
        }
    }
}

/// Rotation by `angle` radians about the first axis.
pub fn rotation_x(angle: f64) -> Array2<f64> {
    let (s, c) = angle.sin_cos();
    array![[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]]
}

/// Rotation by `angle` radians about the third axis.
pub fn rotation_z(angle: f64) -> Array2<f64> {
    let (s, c) = angle.sin_cos();
    array![[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]
}

/// `R_x(angle1) · R_z(angle2)`, an orthogonal 3×3 mixing matrix.
pub fn build_rotation_mixing(angle1: f64, angle2: f64) -> Array2<f64> {
    rotation_x(angle1).dot(&rotation_z(angle2))
}

/// Draws both angles independently from `range` and composes the rotations.
pub fn random_rotation_mixing<R: Rng>(rng: &mut R, range: AngleRange) -> Array2<f64> {
    let upper = range.upper();
    let angle1 = rng.random::<f64>() * upper;
    let angle2 = rng.random::<f64>() * upper;
    debug!("Rotation mixing angles: {:.4}, {:.4} ({:?})", angle1, angle2, range);
    build_rotation_mixing(angle1, angle2)
}

pub fn seeded_rotation_mixing(seed: u64, range: AngleRange) -> Array2<f64> {
    let mut rng = seeded_rng(seed);
    random_rotation_mixing(&mut rng, range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;
    use std::f64::consts::FRAC_PI_2;

    fn orthogonality_defect(r: &Array2<f64>) -> f64 {
        let gram = r.t().dot(r);
        let diff = gram - Array2::<f64>::eye(3);
        diff.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    #[test]
    fn test_rotation_mixing_is_orthogonal() {
        for seed in 0..25 {
            for range in [AngleRange::Unit, AngleRange::FullTurn] {
                let r = seeded_rotation_mixing(seed, range);
                assert!(orthogonality_defect(&r) < 1e-9);
            }
        }
    }

    #[test]
    fn test_quarter_turns() {
        let r = rotation_z(FRAC_PI_2);
        let e1 = array![1.0, 0.0, 0.0];
        let rotated = r.dot(&e1);
        assert_abs_diff_eq!(rotated[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rotated[1], 1.0, epsilon = 1e-12);

        let r = build_rotation_mixing(FRAC_PI_2, 0.0);
        let e2 = array![0.0, 1.0, 0.0];
        let rotated = r.dot(&e2);
        assert_abs_diff_eq!(rotated[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_determinant_is_one() {
        let r = build_rotation_mixing(0.3, 0.8);
        let det = r[[0, 0]] * (r[[1, 1]] * r[[2, 2]] - r[[1, 2]] * r[[2, 1]])
            - r[[0, 1]] * (r[[1, 0]] * r[[2, 2]] - r[[1, 2]] * r[[2, 0]])
            + r[[0, 2]] * (r[[1, 0]] * r[[2, 1]] - r[[1, 1]] * r[[2, 0]]);
        assert_abs_diff_eq!(det, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unit_range_keeps_angles_below_one_radian() {
        // R_x(a1)·R_z(a2)[0][0] == cos(a2); a2 in [0, 1) keeps it above cos(1).
        for seed in 0..50 {
            let r = seeded_rotation_mixing(seed, AngleRange::Unit);
            assert!(r[[0, 0]] > 1.0f64.cos() - 1e-12);
        }
    }
}
