use crate::error::invalid_argument;
use crate::utils::ensure_positive;

/// Waveform produced by a single spike:
/// `a · (exp(-t/τ_slow) - exp(-t/τ_fast)) · sin(ω t)` for `t >= 0`, zero before.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeKernel {
    tau_slow: f64,
    tau_fast: f64,
    frequency: f64,
    amplitude: f64,
}

/// Fast, strongly oscillating unit.
pub const NEURON_1: SpikeKernel = SpikeKernel {
    tau_slow: 0.2,
    tau_fast: 0.01,
    frequency: 10.0,
    amplitude: 1.0,
};

/// Slow, broad unit.
pub const NEURON_2: SpikeKernel = SpikeKernel {
    tau_slow: 0.5,
    tau_fast: 0.3,
    frequency: 4.0,
    amplitude: 1.0,
};

impl SpikeKernel {
    pub fn new(tau_slow: f64, tau_fast: f64, frequency: f64) -> anyhow::Result<Self> {
        ensure_positive("tau_slow", tau_slow)?;
        ensure_positive("tau_fast", tau_fast)?;
        if !frequency.is_finite() {
            return Err(invalid_argument("frequency", "must be finite"));
        }
        Ok(Self {
            tau_slow,
            tau_fast,
            frequency,
            amplitude: 1.0,
        })
    }

    /// The same shape multiplied by `amplitude`.
    pub fn scaled(self, amplitude: f64) -> Self {
        Self { amplitude, ..self }
    }

    pub fn evaluate(&self, t: f64) -> f64 {
        if t < 0.0 {
            return 0.0;
        }
        let envelope = (-t / self.tau_slow).exp() - (-t / self.tau_fast).exp();
        self.amplitude * envelope * (self.frequency * t).sin()
    }

    pub fn tau_slow(&self) -> f64 {
        self.tau_slow
    }

    pub fn tau_fast(&self) -> f64 {
        self.tau_fast
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_kernel_is_causal() {
        for t in [-10.0, -1.0, -1e-9] {
            assert_eq!(NEURON_1.evaluate(t), 0.0);
            assert_eq!(NEURON_2.evaluate(t), 0.0);
        }
        assert_eq!(NEURON_1.evaluate(0.0), 0.0);
    }

    #[test]
    fn test_kernel_values() {
        assert_abs_diff_eq!(NEURON_1.evaluate(0.1), 0.5103397488209653, epsilon = 1e-12);
        assert_abs_diff_eq!(NEURON_1.evaluate(0.3), 0.031488129998532684, epsilon = 1e-12);
        assert_abs_diff_eq!(NEURON_2.evaluate(0.5), 0.16276772958891786, epsilon = 1e-12);
        assert_abs_diff_eq!(NEURON_2.evaluate(1.0), -0.07542391287387468, epsilon = 1e-12);
    }

    #[test]
    fn test_new_matches_constants() {
        let kernel = SpikeKernel::new(0.2, 0.01, 10.0).unwrap();
        assert_eq!(kernel, NEURON_1);
        assert_abs_diff_eq!(
            kernel.scaled(3.0).evaluate(0.1),
            3.0 * NEURON_1.evaluate(0.1),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_new_rejects_bad_time_constants() {
        assert!(SpikeKernel::new(0.0, 0.01, 10.0).is_err());
        assert!(SpikeKernel::new(0.2, -0.01, 10.0).is_err());
        assert!(SpikeKernel::new(0.2, 0.01, f64::INFINITY).is_err());
    }
}
