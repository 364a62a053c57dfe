//! Supervised window construction: fixed-length history in, next value out

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2};

/// Set of (history window, next value) pairs built from a scaled series.
///
/// `inputs` is `[n, offset]`, `targets` is `[n]`; row `i` of `inputs` is the
/// `offset` values immediately preceding `targets[i]` in the source series.
#[derive(Debug, Clone)]
pub struct WindowedDataset {
    pub inputs: Array2<f64>,
    pub targets: Array1<f64>,
}

impl WindowedDataset {
    /// Number of (window, target) pairs
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Window length (history steps per input)
    pub fn offset(&self) -> usize {
        self.inputs.ncols()
    }
}

/// Builds windows over a scaled series.
///
/// For `i` in `offset..len`, the window is `scaled[i - offset..i]` and the
/// target is `scaled[i]`, yielding exactly `len - offset` pairs. Fails with
/// [`ForecastError::InsufficientData`] when `len <= offset`.
pub fn make_windows(scaled: &[f64], offset: usize) -> Result<WindowedDataset> {
    if scaled.len() <= offset {
        return Err(ForecastError::InsufficientData {
            len: scaled.len(),
            offset,
        });
    }

    let n = scaled.len() - offset;
    let inputs = Array2::from_shape_fn((n, offset), |(i, j)| scaled[i + j]);
    let targets = Array1::from_shape_fn(n, |i| scaled[i + offset]);

    Ok(WindowedDataset { inputs, targets })
}

/// Builds validation windows seeded from the training tail.
///
/// The windows are taken over the concatenation of the last `offset` training
/// points and all validation points, so the first validation target already
/// has a fully-populated window and no warm-up gap exists. Yields exactly
/// `valid_scaled.len()` pairs.
pub fn make_validation_windows(
    train_scaled: &[f64],
    valid_scaled: &[f64],
    offset: usize,
) -> Result<WindowedDataset> {
    if train_scaled.len() < offset {
        return Err(ForecastError::InsufficientData {
            len: train_scaled.len(),
            offset,
        });
    }

    let tail = &train_scaled[train_scaled.len() - offset..];
    let mut joined = Vec::with_capacity(offset + valid_scaled.len());
    joined.extend_from_slice(tail);
    joined.extend_from_slice(valid_scaled);

    make_windows(&joined, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_count_is_len_minus_offset() {
        let scaled: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        let ds = make_windows(&scaled, 10).unwrap();

        assert_eq!(ds.len(), 90);
        assert_eq!(ds.inputs.dim(), (90, 10));
        assert_eq!(ds.offset(), 10);
    }

    #[test]
    fn test_window_contents_and_target() {
        let scaled = [0.0, 0.1, 0.2, 0.3, 0.4];
        let ds = make_windows(&scaled, 3).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.inputs.row(0).to_vec(), vec![0.0, 0.1, 0.2]);
        assert_eq!(ds.targets[0], 0.3);
        assert_eq!(ds.inputs.row(1).to_vec(), vec![0.1, 0.2, 0.3]);
        assert_eq!(ds.targets[1], 0.4);
    }

    #[test]
    fn test_too_short_series_is_rejected() {
        let scaled = [0.0, 0.1, 0.2];
        let err = make_windows(&scaled, 3).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientData { len: 3, offset: 3 }
        ));
    }

    #[test]
    fn test_validation_windows_reach_into_train_tail() {
        let train = [0.0, 0.1, 0.2, 0.3, 0.4];
        let valid = [0.5, 0.6];
        let ds = make_validation_windows(&train, &valid, 3).unwrap();

        // one fully-populated window per validation point
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.inputs.row(0).to_vec(), vec![0.2, 0.3, 0.4]);
        assert_eq!(ds.targets[0], 0.5);
        assert_eq!(ds.inputs.row(1).to_vec(), vec![0.3, 0.4, 0.5]);
        assert_eq!(ds.targets[1], 0.6);
    }

    #[test]
    fn test_validation_windows_need_full_tail() {
        let train = [0.0, 0.1];
        let valid = [0.2];
        assert!(make_validation_windows(&train, &valid, 3).is_err());
    }
}
