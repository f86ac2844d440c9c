//! Variable numbering for the CFF membership matrix

use crate::error::{CffError, Result};

/// Maps the t x n membership matrix and the indicator variables to SAT ids.
///
/// Matrix variables are numbered row-major, `row * n + col + 1`, so the
/// decoder can recover `(row, col)` from the id alone. Indicators follow
/// from `n * t + 1` in allocation order.
#[derive(Debug)]
pub struct VariableLayout {
    rows: usize,
    cols: usize,
    next_id: i32,
}

impl VariableLayout {
    /// Create a layout for `rows` universe elements and `cols` blocks.
    ///
    /// Returns `None` when the matrix ids do not fit 32-bit literals.
    pub fn new(rows: usize, cols: usize) -> Option<Self> {
        let primary = rows
            .checked_mul(cols)
            .and_then(|p| i32::try_from(p).ok())?
            .checked_add(1)?;

        Some(Self {
            rows,
            cols,
            next_id: primary,
        })
    }

    /// Get the SAT id of the matrix cell `(row, col)`
    pub fn matrix_variable(&self, row: usize, col: usize) -> Result<i32> {
        if row >= self.rows {
            return Err(CffError::MalformedModel(format!(
                "row {} out of bounds (rows: {})",
                row, self.rows
            )));
        }
        if col >= self.cols {
            return Err(CffError::MalformedModel(format!(
                "column {} out of bounds (columns: {})",
                col, self.cols
            )));
        }
        // fits: checked against i32 in `new`
        Ok((row * self.cols + col + 1) as i32)
    }

    /// Allocate a fresh indicator variable, `None` once ids run out
    pub fn fresh_indicator(&mut self) -> Option<i32> {
        let id = self.next_id;
        self.next_id = self.next_id.checked_add(1)?;
        Some(id)
    }

    /// Inverse of [`matrix_variable`](Self::matrix_variable) for a positive id
    pub fn position(&self, var: i32) -> Option<(usize, usize)> {
        let index = usize::try_from(var).ok()?.checked_sub(1)?;
        if index >= self.primary_count() {
            return None;
        }
        Some((index / self.cols, index % self.cols))
    }

    /// Number of matrix variables (`t * n`)
    pub fn primary_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Total number of variables allocated so far
    pub fn variable_count(&self) -> usize {
        (self.next_id - 1) as usize
    }

    /// Number of indicator variables allocated so far
    pub fn indicator_count(&self) -> usize {
        self.variable_count() - self.primary_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_numbering() {
        let layout = VariableLayout::new(3, 4).unwrap();

        assert_eq!(layout.matrix_variable(0, 0).unwrap(), 1);
        assert_eq!(layout.matrix_variable(0, 3).unwrap(), 4);
        assert_eq!(layout.matrix_variable(1, 0).unwrap(), 5);
        assert_eq!(layout.matrix_variable(2, 3).unwrap(), 12);
    }

    #[test]
    fn test_position_inverts_numbering() {
        let layout = VariableLayout::new(3, 4).unwrap();
        for row in 0..3 {
            for col in 0..4 {
                let var = layout.matrix_variable(row, col).unwrap();
                assert_eq!(layout.position(var), Some((row, col)));
            }
        }
        assert_eq!(layout.position(0), None);
        assert_eq!(layout.position(13), None);
        assert_eq!(layout.position(-1), None);
    }

    #[test]
    fn test_indicators_follow_matrix() {
        let mut layout = VariableLayout::new(2, 3).unwrap();

        let first = layout.fresh_indicator().unwrap();
        let second = layout.fresh_indicator().unwrap();

        assert_eq!(first, 7);
        assert_eq!(second, 8);
        assert_eq!(layout.variable_count(), 8);
        assert_eq!(layout.indicator_count(), 2);
    }

    #[test]
    fn test_variable_bounds() {
        let layout = VariableLayout::new(2, 2).unwrap();

        assert!(layout.matrix_variable(1, 1).is_ok());
        assert!(layout.matrix_variable(2, 0).is_err());
        assert!(layout.matrix_variable(0, 2).is_err());
    }

    #[test]
    fn test_oversized_matrix_rejected() {
        assert!(VariableLayout::new(1 << 16, 1 << 16).is_none());
    }
}
