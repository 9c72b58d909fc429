use crate::error::invalid_argument;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Axis along which a matrix operation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Row,
    Column,
}

/// Rescales every row (or column) of a matrix to unit Euclidean norm.
pub trait UnitNorm {
    fn unit_norm(&mut self, direction: &Direction) -> anyhow::Result<()>;
}

/// The generator used whenever a caller hands in a bare seed instead of an RNG.
pub type SeededRng = ChaCha8Rng;

pub fn seeded_rng(seed: u64) -> SeededRng {
    ChaCha8Rng::seed_from_u64(seed)
}

pub(crate) fn ensure_positive(argument: &'static str, value: f64) -> anyhow::Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid_argument(
            argument,
            format!("must be finite and positive, got {}", value),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_non_negative(argument: &'static str, value: f64) -> anyhow::Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid_argument(
            argument,
            format!("must be finite and non-negative, got {}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::as_invalid_argument;
    use rand::Rng;

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a: Vec<u64> = (0..4).map(|_| seeded_rng(7).random()).collect();
        let mut rng = seeded_rng(7);
        let first: u64 = rng.random();
        assert!(a.iter().all(|&v| v == first));
    }

    #[test]
    fn test_range_checks() {
        assert!(ensure_positive("step", 0.02).is_ok());
        assert!(ensure_non_negative("noise_std", 0.0).is_ok());

        let err = ensure_positive("step", 0.0).unwrap_err();
        assert_eq!(as_invalid_argument(&err).unwrap().argument(), "step");
        assert!(ensure_non_negative("noise_std", -1.0).is_err());
        assert!(ensure_non_negative("noise_std", f64::NAN).is_err());
    }
}
