//! Dense bar-by-order matrices and the first-crossing search used by the
//! exit algorithm.

/// Row-major matrix of `n_bars` rows by `n_orders` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Fill every cell from `f(row, col)`.
    pub fn from_fn(n_rows: usize, n_cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for r in 0..n_rows {
            for c in 0..n_cols {
                data.push(f(r, c));
            }
        }
        Self {
            n_rows,
            n_cols,
            data,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.n_cols;
        &self.data[start..start + self.n_cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let start = row * self.n_cols;
        &mut self.data[start..start + self.n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.n_rows).map(move |r| self.row(r))
    }

    /// Signed sum across each row.
    pub fn row_sums(&self) -> Vec<f64> {
        self.rows().map(|r| r.iter().sum()).collect()
    }

    /// Sum of absolute values across each row.
    pub fn abs_row_sums(&self) -> Vec<f64> {
        self.rows().map(|r| r.iter().map(|v| v.abs()).sum()).collect()
    }

    /// Subtract row `base` from every row.
    pub fn rebase_to_row(&mut self, base: usize) {
        let origin = self.row(base).to_vec();
        for r in 0..self.n_rows {
            for (v, o) in self.row_mut(r).iter_mut().zip(&origin) {
                *v -= o;
            }
        }
    }

    /// Zero every row with index `< start` or `> end`.
    pub fn zero_outside(&mut self, start: usize, end: usize) {
        for r in (0..self.n_rows).filter(|&r| r < start || r > end) {
            self.row_mut(r).fill(0.0);
        }
    }

    /// Zero every row with index `< start`.
    pub fn zero_before(&mut self, start: usize) {
        for r in 0..start.min(self.n_rows) {
            self.row_mut(r).fill(0.0);
        }
    }

    /// Copy row `at` over every later row.
    pub fn hold_from(&mut self, at: usize) {
        if at >= self.n_rows {
            return;
        }
        let held = self.row(at).to_vec();
        for r in at + 1..self.n_rows {
            self.row_mut(r).copy_from_slice(&held);
        }
    }
}

/// Index of the earliest `true` at or after `from`, scanning in order.
pub fn first_true(signal: &[bool], from: usize) -> Option<usize> {
    signal
        .iter()
        .skip(from)
        .position(|&s| s)
        .map(|offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        // rows: [1, -2], [3, -4], [5, -6]
        Matrix::from_fn(3, 2, |r, c| {
            let v = (2 * r + c + 1) as f64;
            if c == 1 { -v } else { v }
        })
    }

    #[test]
    fn from_fn_layout() {
        let m = sample();
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.n_cols(), 2);
        assert_eq!(m.row(1), &[3.0, -4.0]);
        assert_eq!(m.get(2, 1), -6.0);
    }

    #[test]
    fn row_sums_signed_and_absolute() {
        let m = sample();
        assert_eq!(m.row_sums(), vec![-1.0, -1.0, -1.0]);
        assert_eq!(m.abs_row_sums(), vec![3.0, 7.0, 11.0]);
    }

    #[test]
    fn rebase_zeroes_base_row() {
        let mut m = sample();
        m.rebase_to_row(1);
        assert_eq!(m.row(0), &[-2.0, 2.0]);
        assert_eq!(m.row(1), &[0.0, 0.0]);
        assert_eq!(m.row(2), &[2.0, -2.0]);
    }

    #[test]
    fn zero_outside_keeps_inclusive_window() {
        let mut m = sample();
        m.zero_outside(1, 1);
        assert_eq!(m.row(0), &[0.0, 0.0]);
        assert_eq!(m.row(1), &[3.0, -4.0]);
        assert_eq!(m.row(2), &[0.0, 0.0]);
    }

    #[test]
    fn hold_from_flat_lines_tail() {
        let mut m = sample();
        m.hold_from(0);
        assert_eq!(m.row(2), &[1.0, -2.0]);
        m.hold_from(10);
        assert_eq!(m.row(2), &[1.0, -2.0]);
    }

    #[test]
    fn zero_before_clamps_to_rows() {
        let mut m = sample();
        m.zero_before(5);
        assert_eq!(m.row_sums(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn first_true_is_earliest_not_binary_search() {
        let signal = [false, true, false, false, true];
        assert_eq!(first_true(&signal, 0), Some(1));
        assert_eq!(first_true(&signal, 2), Some(4));
        assert_eq!(first_true(&[false, false], 0), None);
        assert_eq!(first_true(&signal, 9), None);
    }
}
