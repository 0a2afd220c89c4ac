//! Sliding-window robust mean for the orientation angle.
//!
//! Orientation is the noisiest reading, worst near 0°. Each frame the window
//! is sorted, `trim` values are dropped from each end, and the survivors
//! within `max_dev` standard deviations of their own mean are averaged.

use std::collections::VecDeque;

use crate::params::{ParamsError, SmootherParams};

/// Robust mean of one window of integer degrees.
///
/// The outlier filter runs on the trimmed set using statistics of that same
/// trimmed set. If it rejects everything (e.g. all values equal, std = 0)
/// the trimmed mean is used.
pub fn robust_mean(samples: &[i32], trim: usize, max_dev: f64) -> i32 {
    if samples.len() <= 2 * trim {
        return mean(samples).round() as i32;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    let trimmed = &sorted[trim..sorted.len() - trim];

    let m = mean(trimmed);
    let std = population_std(trimmed, m);
    let kept: Vec<i32> = trimmed
        .iter()
        .copied()
        .filter(|&v| (f64::from(v) - m).abs() < max_dev * std)
        .collect();

    let out = if kept.is_empty() { m } else { mean(&kept) };
    out.round() as i32
}

fn mean(values: &[i32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64
}

fn population_std(values: &[i32], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let var = values
        .iter()
        .map(|&v| (f64::from(v) - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    var.sqrt()
}

/// Fixed-length FIFO of raw orientation readings.
#[derive(Clone, Debug)]
pub struct OrientationSmoother {
    params: SmootherParams,
    window: VecDeque<i32>,
}

impl OrientationSmoother {
    /// Create a smoother whose window is pre-filled with zeros.
    pub fn new(params: SmootherParams) -> Result<Self, ParamsError> {
        params.validate()?;
        let window = std::iter::repeat_n(0, params.window).collect();
        Ok(Self { params, window })
    }

    /// Push one raw reading (evicting the oldest) and return the smoothed angle.
    pub fn update(&mut self, raw: i32) -> i32 {
        self.window.pop_front();
        self.window.push_back(raw);
        let samples = self.window.make_contiguous();
        robust_mean(samples, self.params.trim, self.params.max_dev)
    }

    /// Oldest reading first.
    pub fn samples(&self) -> impl ExactSizeIterator<Item = i32> + '_ {
        self.window.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

impl Default for OrientationSmoother {
    fn default() -> Self {
        Self {
            window: std::iter::repeat_n(0, SmootherParams::default().window).collect(),
            params: SmootherParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_outlier_is_rejected() {
        let mut window = [5; 13];
        window[12] = 40;
        assert_eq!(robust_mean(&window, 2, 1.0), 5);
    }

    #[test]
    fn trimming_drops_exactly_two_from_each_end() {
        // Extremes far enough away that keeping any would move the mean.
        let window = [-90, -80, 10, 10, 10, 10, 10, 10, 10, 10, 10, 70, 90];
        assert_eq!(robust_mean(&window, 2, 1.0), 10);
    }

    #[test]
    fn secondary_filter_uses_trimmed_statistics() {
        // Trimmed: [0, 0, 0, 0, 0, 0, 0, 0, 9]; mean = 1, std = 2.83.
        // 9 is 8 away and dropped; the zeros survive.
        let window = [-50, -50, 0, 0, 0, 0, 0, 0, 0, 0, 9, 50, 50];
        assert_eq!(robust_mean(&window, 2, 1.0), 0);
    }

    #[test]
    fn spread_values_average_inner_band() {
        // Trimmed: 2..=10, mean 6, std 2.58; kept 4..=8 -> 6.
        let window = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        assert_eq!(robust_mean(&window, 2, 1.0), 6);
    }

    #[test]
    fn window_stays_full_and_fifo() {
        let mut s = OrientationSmoother::new(SmootherParams::default()).expect("params");
        assert_eq!(s.len(), 13);
        for raw in 1..=20 {
            s.update(raw);
            assert_eq!(s.len(), 13);
        }
        let samples: Vec<i32> = s.samples().collect();
        assert_eq!(samples, (8..=20).collect::<Vec<_>>());
    }

    #[test]
    fn converges_to_steady_reading() {
        let mut s = OrientationSmoother::default();
        let mut last = 0;
        for _ in 0..13 {
            last = s.update(-12);
        }
        assert_eq!(last, -12);
    }

    #[test]
    fn rejects_window_not_larger_than_trim() {
        let params = SmootherParams {
            window: 4,
            trim: 2,
            max_dev: 1.0,
        };
        assert!(OrientationSmoother::new(params).is_err());
    }
}
