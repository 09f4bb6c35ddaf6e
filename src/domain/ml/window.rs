use crate::domain::errors::ForecastError;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

/// Fixed-length block of normalized feature rows fed to the model in one call.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    values: Array2<f64>,
    target: Option<f64>,
}

impl Window {
    pub fn new(values: Array2<f64>, target: Option<f64>) -> Self {
        Self { values, target }
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn target(&self) -> Option<f64> {
        self.target
    }

    /// Number of time steps (rows)
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    pub fn feature_count(&self) -> usize {
        self.values.ncols()
    }

    pub fn last_row(&self) -> Option<ArrayView1<'_, f64>> {
        self.len().checked_sub(1).map(|i| self.values.row(i))
    }

    /// Row-major copy as `f32`, the layout tensor runtimes expect.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.values.iter().map(|v| *v as f32).collect()
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    /// Drops the oldest row and appends `row`, returning a new window of the same length.
    pub fn advance(&self, row: ArrayView1<f64>) -> Result<Window, ForecastError> {
        let (k, f) = self.values.dim();
        if row.len() != f {
            return Err(ForecastError::ShapeMismatch {
                expected_rows: 1,
                expected_cols: f,
                rows: 1,
                cols: row.len(),
            });
        }

        let mut next = Array2::zeros((k, f));
        if k > 0 {
            next.slice_mut(s![..k - 1, ..])
                .assign(&self.values.slice(s![1.., ..]));
            next.row_mut(k - 1).assign(&row);
        }
        Ok(Window::new(next, None))
    }

    /// Fails unless the window is exactly `lookback x feature_count`.
    pub fn check_shape(&self, lookback: usize, feature_count: usize) -> Result<(), ForecastError> {
        let (rows, cols) = self.values.dim();
        if rows != lookback || cols != feature_count {
            return Err(ForecastError::ShapeMismatch {
                expected_rows: lookback,
                expected_cols: feature_count,
                rows,
                cols,
            });
        }
        Ok(())
    }
}

/// Windows plus their next-step targets, in chronological order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowSet {
    pub windows: Vec<Window>,
    pub targets: Vec<f64>,
}

impl WindowSet {
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Slices `series` into `max(0, L - lookback)` overlapping windows.
///
/// Window `i` covers rows `[i, i + lookback)`; its target is column
/// `target_index` of row `i + lookback`. A series no longer than `lookback`
/// yields an empty set.
pub fn build_windows(series: ArrayView2<f64>, lookback: usize, target_index: usize) -> WindowSet {
    let rows = series.nrows();
    if lookback == 0 || rows <= lookback || target_index >= series.ncols() {
        return WindowSet::default();
    }

    let count = rows - lookback;
    let mut set = WindowSet {
        windows: Vec::with_capacity(count),
        targets: Vec::with_capacity(count),
    };

    for i in 0..count {
        let target = series[[i + lookback, target_index]];
        set.windows.push(Window::new(
            series.slice(s![i..i + lookback, ..]).to_owned(),
            Some(target),
        ));
        set.targets.push(target);
    }
    set
}

/// The final `lookback` rows, used to seed a forecast.
pub fn build_last_window(series: ArrayView2<f64>, lookback: usize) -> Result<Window, ForecastError> {
    let rows = series.nrows();
    if lookback == 0 || rows < lookback {
        return Err(ForecastError::InsufficientData {
            required: lookback.max(1),
            available: rows,
        });
    }
    Ok(Window::new(
        series.slice(s![rows - lookback.., ..]).to_owned(),
        None,
    ))
}

/// Single-column matrix for a univariate series.
pub fn column_matrix(values: &[f64]) -> Array2<f64> {
    Array1::from(values.to_vec()).insert_axis(ndarray::Axis(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ramp(len: usize) -> Array2<f64> {
        column_matrix(&(0..len).map(|v| v as f64).collect::<Vec<_>>())
    }

    #[test]
    fn test_window_count_and_order() {
        let series = ramp(10);
        let set = build_windows(series.view(), 3, 0);

        assert_eq!(set.len(), 7);
        assert_eq!(set.targets, vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        for (i, window) in set.windows.iter().enumerate() {
            assert_eq!(window.len(), 3);
            assert_eq!(window.values()[[0, 0]], i as f64);
            assert_eq!(window.values()[[2, 0]], (i + 2) as f64);
            assert_eq!(window.target(), Some((i + 3) as f64));
        }
    }

    #[test]
    fn test_short_series_yields_no_windows() {
        for len in 0..=5 {
            let series = ramp(len);
            assert!(build_windows(series.view(), 5, 0).is_empty());
        }
    }

    #[test]
    fn test_exact_lookback_last_window_succeeds() {
        let series = ramp(5);
        assert!(build_windows(series.view(), 5, 0).is_empty());

        let last = build_last_window(series.view(), 5).unwrap();
        assert_eq!(last.len(), 5);
        assert_eq!(last.target(), None);
        assert_eq!(last.values()[[4, 0]], 4.0);
    }

    #[test]
    fn test_last_window_insufficient() {
        let series = ramp(4);
        assert_eq!(
            build_last_window(series.view(), 5),
            Err(ForecastError::InsufficientData {
                required: 5,
                available: 4
            })
        );
    }

    #[test]
    fn test_multivariate_target_column() {
        let series = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]];
        let set = build_windows(series.view(), 2, 1);
        assert_eq!(set.len(), 1);
        assert_eq!(set.targets, vec![30.0]);
        assert_eq!(set.windows[0].feature_count(), 2);
    }

    #[test]
    fn test_advance_shifts_by_one_row() {
        let window = Window::new(array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]], None);
        let next = window.advance(array![4.0, 40.0].view()).unwrap();

        assert_eq!(next.values(), array![[2.0, 20.0], [3.0, 30.0], [4.0, 40.0]]);
        // Original is untouched
        assert_eq!(window.values()[[0, 0]], 1.0);
        assert!(window.advance(array![1.0].view()).is_err());
    }

    #[test]
    fn test_check_shape() {
        let window = Window::new(Array2::zeros((100, 1)), None);
        assert!(window.check_shape(100, 1).is_ok());
        assert!(matches!(
            window.check_shape(100, 5),
            Err(ForecastError::ShapeMismatch { cols: 1, .. })
        ));
    }
}
