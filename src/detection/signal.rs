//! Statistical Signals: Auxiliary Scalar Scoring
//!
//! The statistical modality of the detector maps an auxiliary scalar
//! (typically the per-cycle event rate) to a score on the same scale as
//! the topological components.
//!
//! Two implementations are provided:
//!
//! - [`MagnitudeSignal`]: |x|, the default pass-through
//! - [`CusumSignal`]: Page's CUSUM on the standardized signal
//!
//!   C(t) = max(0, C(t-1) + (x(t) - μ₀)/σ₀ - k)
//!
//!   self-calibrated on its first observations

/// Maps an auxiliary scalar to a statistical anomaly score.
pub trait StatisticalSignal: Send {
    fn score(&mut self, aux: f64) -> f64;

    fn name(&self) -> &'static str;
}

/// Direct magnitude pass-through. Non-finite input scores 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagnitudeSignal;

impl StatisticalSignal for MagnitudeSignal {
    fn score(&mut self, aux: f64) -> f64 {
        if aux.is_finite() {
            aux.abs()
        } else {
            0.0
        }
    }

    fn name(&self) -> &'static str {
        "magnitude"
    }
}

/// One-sided CUSUM over the auxiliary signal.
///
/// Scores 0 until `calibration_window` observations have been seen, then
/// reports the current cumulative sum in units of the reference σ.
#[derive(Debug, Clone)]
pub struct CusumSignal {
    /// Reference mean (computed from calibration period)
    reference_mean: f64,
    /// Reference standard deviation
    reference_std: f64,
    /// Allowance parameter k (slack)
    allowance: f64,
    /// Current CUSUM value
    current: f64,
    calibration_window: usize,
    buffer: Vec<f64>,
    calibrated: bool,
}

impl CusumSignal {
    pub fn new(calibration_window: usize) -> Self {
        Self::with_allowance(calibration_window, 0.5)
    }

    pub fn with_allowance(calibration_window: usize, allowance_sigmas: f64) -> Self {
        let calibration_window = calibration_window.max(2);
        Self {
            reference_mean: 0.0,
            reference_std: 1.0,
            allowance: allowance_sigmas,
            current: 0.0,
            calibration_window,
            buffer: Vec::with_capacity(calibration_window),
            calibrated: false,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    pub fn reference(&self) -> (f64, f64) {
        (self.reference_mean, self.reference_std)
    }

    fn calibrate(&mut self) {
        let n = self.buffer.len() as f64;
        self.reference_mean = self.buffer.iter().sum::<f64>() / n;

        let variance: f64 = self
            .buffer
            .iter()
            .map(|x| (x - self.reference_mean).powi(2))
            .sum::<f64>()
            / (n - 1.0).max(1.0);
        self.reference_std = variance.sqrt().max(1e-10);

        self.buffer.clear();
        self.current = 0.0;
        self.calibrated = true;
    }
}

impl StatisticalSignal for CusumSignal {
    fn score(&mut self, aux: f64) -> f64 {
        if !aux.is_finite() {
            return self.current;
        }
        if !self.calibrated {
            self.buffer.push(aux);
            if self.buffer.len() >= self.calibration_window {
                self.calibrate();
            }
            return 0.0;
        }

        let z = (aux - self.reference_mean) / self.reference_std;
        self.current = (self.current + z - self.allowance).max(0.0);
        self.current
    }

    fn name(&self) -> &'static str {
        "cusum"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_pass_through() {
        let mut signal = MagnitudeSignal;
        assert_eq!(signal.score(-4.5), 4.5);
        assert_eq!(signal.score(f64::NAN), 0.0);
    }

    #[test]
    fn test_cusum_quiet_during_calibration() {
        let mut cusum = CusumSignal::new(10);
        for i in 0..10 {
            assert_eq!(cusum.score(5.0 + (i % 2) as f64), 0.0);
        }
        assert!(cusum.is_calibrated());
        let (mean, _) = cusum.reference();
        assert!((mean - 5.5).abs() < 1e-12);
    }

    #[test]
    fn test_cusum_detects_shift() {
        let mut cusum = CusumSignal::new(20);
        for i in 0..20 {
            cusum.score((i as f64 * 0.7).sin());
        }
        // In-control data keeps the sum small
        let quiet = (0..20).map(|i| cusum.score((i as f64 * 0.7).sin())).fold(0.0, f64::max);

        let mut shifted = 0.0;
        for _ in 0..10 {
            shifted = cusum.score(3.0);
        }
        assert!(shifted > quiet, "CUSUM should accumulate a mean shift");
        assert!(shifted > 5.0);
    }
}
