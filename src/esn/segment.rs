//! Trial segmentation and forecast targets
//!
//! A series is a concatenation of equal-length trials. Every trial loses its
//! first `washout` samples (reservoir transient) and its last `steps` samples
//! (no valid target inside the trial). Removal never crosses a trial boundary.

use std::ops::Range;

use ndarray::{Array1, Array2, Axis};

use crate::error::{EsnError, Result};

/// Per-trial washout and horizon removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialLayout {
    trial_length: usize,
    washout: usize,
    steps: usize,
}

impl TrialLayout {
    /// Create a layout; at least one sample of every trial must survive.
    pub fn new(trial_length: usize, washout: usize, steps: usize) -> Result<Self> {
        if trial_length == 0 || washout + steps >= trial_length {
            return Err(EsnError::InvalidTrialLayout {
                trial_length,
                washout,
                steps,
            });
        }
        Ok(Self {
            trial_length,
            washout,
            steps,
        })
    }

    pub fn trial_length(&self) -> usize {
        self.trial_length
    }

    /// Samples kept from each trial
    pub fn kept_per_trial(&self) -> usize {
        self.trial_length - self.washout - self.steps
    }

    /// Length of a segmented series of `len` samples
    pub fn segmented_len(&self, len: usize) -> Result<usize> {
        Ok(self.num_trials(len)? * self.kept_per_trial())
    }

    /// Index ranges retained from a series of `len` samples, in order
    pub fn keep_ranges(&self, len: usize) -> Result<Vec<Range<usize>>> {
        let trials = self.num_trials(len)?;
        Ok((0..trials)
            .map(|k| {
                let start = k * self.trial_length;
                start + self.washout..start + self.trial_length - self.steps
            })
            .collect())
    }

    /// Segment a one-dimensional series
    pub fn segment(&self, series: &Array1<f64>) -> Result<Array1<f64>> {
        let mut kept = Vec::with_capacity(self.segmented_len(series.len())?);
        for range in self.keep_ranges(series.len())? {
            kept.extend(series.slice(ndarray::s![range]).iter().copied());
        }
        Ok(Array1::from_vec(kept))
    }

    /// Segment the columns (timepoints) of a feature matrix
    pub fn segment_columns(&self, matrix: &Array2<f64>) -> Result<Array2<f64>> {
        let indices: Vec<usize> = self
            .keep_ranges(matrix.ncols())?
            .into_iter()
            .flatten()
            .collect();
        Ok(matrix.select(Axis(1), &indices))
    }

    fn num_trials(&self, len: usize) -> Result<usize> {
        if len % self.trial_length != 0 {
            return Err(EsnError::PartialTrial {
                len,
                trial_length: self.trial_length,
            });
        }
        Ok(len / self.trial_length)
    }
}

/// Forecast target for horizon `steps`: `target[i] = data[i + steps - 1]`,
/// with the tail that has no source sample left at zero.
pub fn target_data(data: &Array1<f64>, steps: usize) -> Array1<f64> {
    let n = data.len();
    let mut target = Array1::zeros(n);
    if steps == 0 || steps > n {
        return target;
    }
    let shift = steps - 1;
    target
        .slice_mut(ndarray::s![..n - shift])
        .assign(&data.slice(ndarray::s![shift..]));
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ramp(n: usize) -> Array1<f64> {
        Array1::from_iter((0..n).map(|i| i as f64))
    }

    #[test]
    fn test_segmented_length() {
        let layout = TrialLayout::new(100, 10, 5).unwrap();
        let out = layout.segment(&ramp(300)).unwrap();
        assert_eq!(out.len(), 255);
        assert_eq!(layout.segmented_len(300).unwrap(), 255);
    }

    #[test]
    fn test_keeps_interior_of_each_trial() {
        let layout = TrialLayout::new(5, 1, 2).unwrap();
        let out = layout.segment(&ramp(10)).unwrap();
        assert_eq!(out, array![1.0, 2.0, 6.0, 7.0]);
    }

    #[test]
    fn test_zero_washout_single_step() {
        let layout = TrialLayout::new(4, 0, 1).unwrap();
        let out = layout.segment(&ramp(8)).unwrap();
        assert_eq!(out, array![0.0, 1.0, 2.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_largest_valid_removal_keeps_one_sample() {
        let layout = TrialLayout::new(4, 2, 1).unwrap();
        let out = layout.segment(&ramp(8)).unwrap();
        assert_eq!(out, array![2.0, 6.0]);
    }

    #[test]
    fn test_rejects_overlapping_removal() {
        assert!(matches!(
            TrialLayout::new(10, 8, 2),
            Err(EsnError::InvalidTrialLayout { .. })
        ));
        assert!(TrialLayout::new(10, 10, 1).is_err());
        assert!(TrialLayout::new(0, 0, 1).is_err());
    }

    #[test]
    fn test_rejects_partial_trial() {
        let layout = TrialLayout::new(10, 1, 1).unwrap();
        assert!(matches!(
            layout.segment(&ramp(25)),
            Err(EsnError::PartialTrial { len: 25, .. })
        ));
    }

    #[test]
    fn test_segment_columns_matches_segment() {
        let layout = TrialLayout::new(6, 2, 1).unwrap();
        let series = ramp(12);
        let mut matrix = Array2::zeros((2, 12));
        matrix.row_mut(0).fill(1.0);
        matrix.row_mut(1).assign(&series);

        let columns = layout.segment_columns(&matrix).unwrap();
        assert_eq!(columns.ncols(), 6);
        assert_eq!(columns.row(1).to_owned(), layout.segment(&series).unwrap());
        assert!(columns.row(0).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_target_shift() {
        let data = ramp(6);
        assert_eq!(target_data(&data, 1), data);
        assert_eq!(target_data(&data, 3), array![2.0, 3.0, 4.0, 5.0, 0.0, 0.0]);
    }
}
