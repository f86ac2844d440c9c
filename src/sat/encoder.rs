//! CNF encoder for d-cover-free families

use super::combinations::{binomial, combinations};
use super::constraints::{Clause, Formula};
use super::variables::VariableLayout;
use crate::cff::CffParams;
use crate::error::{CffError, Result};
use tracing::debug;

/// Encodes "a t x n membership matrix whose columns form a d-CFF" as CNF.
///
/// For every column j and every d-subset S of the other columns, one
/// indicator per row r means "M[r][j] is set and every M[r][k], k in S, is
/// clear"; a final clause asks for at least one such row.
pub struct CffEncoder {
    max_clauses: Option<u64>,
}

impl CffEncoder {
    /// Create an encoder without a clause ceiling
    pub fn new() -> Self {
        Self { max_clauses: None }
    }

    /// Create an encoder that refuses formulas above `max_clauses`
    pub fn with_clause_limit(max_clauses: u64) -> Self {
        Self {
            max_clauses: Some(max_clauses),
        }
    }

    /// Build the full formula for `params`
    pub fn encode(&self, params: CffParams) -> Result<Formula> {
        let stats = self.estimate(params)?;
        let CffParams { d, t, n } = params;

        let mut layout =
            VariableLayout::new(t, n).ok_or(CffError::VariableOverflow { d, t, n })?;
        let mut formula = Formula::new(layout.primary_count());

        for column in 0..n {
            let other_columns: Vec<usize> = (0..n).filter(|&c| c != column).collect();

            for covering in combinations(&other_columns, d) {
                let mut witnesses = Vec::with_capacity(t);
                for row in 0..t {
                    let y = layout
                        .fresh_indicator()
                        .ok_or(CffError::VariableOverflow { d, t, n })?;
                    witnesses.push(y);

                    formula.push(Clause::binary(layout.matrix_variable(row, column)?, -y));
                    for &other in &covering {
                        formula.push(Clause::binary(-layout.matrix_variable(row, other)?, -y));
                    }
                }
                formula.push(Clause::new(witnesses));
            }
        }

        debug!(
            %params,
            clauses = formula.clause_count(),
            variables = formula.variable_count(),
            "encoded formula"
        );
        debug_assert_eq!(formula.clause_count() as u64, stats.clauses);
        Ok(formula)
    }

    /// Size of the formula for `params`, computed without building it
    pub fn estimate(&self, params: CffParams) -> Result<EncodingStatistics> {
        params.validate()?;
        let CffParams { d, t, n } = params;
        let overflow = || CffError::VariableOverflow { d, t, n };

        let (d64, t64, n64) = (d as u64, t as u64, n as u64);
        let covering_sets = binomial(n64 - 1, d64).ok_or_else(overflow)?;
        let pairs = n64.checked_mul(covering_sets).ok_or_else(overflow)?;
        let primary = n64.checked_mul(t64).ok_or_else(overflow)?;
        let auxiliary = pairs.checked_mul(t64).ok_or_else(overflow)?;
        let clauses = t64
            .checked_mul(d64 + 1)
            .and_then(|per_pair| per_pair.checked_add(1))
            .and_then(|per_pair| per_pair.checked_mul(pairs))
            .ok_or_else(overflow)?;

        let total = primary.checked_add(auxiliary).ok_or_else(overflow)?;
        if total > i32::MAX as u64 {
            return Err(overflow());
        }
        if let Some(limit) = self.max_clauses {
            if clauses > limit {
                return Err(CffError::EncodingTooLarge { clauses, limit });
            }
        }

        Ok(EncodingStatistics {
            params,
            primary_variables: primary,
            auxiliary_variables: auxiliary,
            clauses,
        })
    }
}

impl Default for CffEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the SAT encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingStatistics {
    pub params: CffParams,
    pub primary_variables: u64,
    pub auxiliary_variables: u64,
    pub clauses: u64,
}

impl EncodingStatistics {
    pub fn total_variables(&self) -> u64 {
        self.primary_variables + self.auxiliary_variables
    }
}

impl std::fmt::Display for EncodingStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAT Encoding Statistics:")?;
        writeln!(f, "  Parameters: {}", self.params)?;
        writeln!(f, "  Matrix variables: {}", self.primary_variables)?;
        writeln!(f, "  Indicator variables: {}", self.auxiliary_variables)?;
        writeln!(f, "  Total variables: {}", self.total_variables())?;
        writeln!(f, "  Total clauses: {}", self.clauses)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cff::decoder::{encode_assignment, Block};
    use crate::cff::is_cover_free;

    /// Extend a matrix assignment with every indicator its binary clauses allow
    fn with_indicators(formula: &Formula, matrix: &[i32]) -> Vec<i32> {
        let primary = formula.primary_variables();
        let mut allowed = vec![true; formula.variable_count() - primary];
        let holds = |lit: i32| (matrix[lit.unsigned_abs() as usize - 1] > 0) == (lit > 0);

        for clause in formula.clauses() {
            if let [lit, y] = clause.literals[..] {
                if y < 0 && y.unsigned_abs() as usize > primary && !holds(lit) {
                    allowed[y.unsigned_abs() as usize - primary - 1] = false;
                }
            }
        }

        let indicators = allowed.iter().enumerate().map(|(i, &on)| {
            let var = (primary + i + 1) as i32;
            if on { var } else { -var }
        });
        matrix.iter().copied().chain(indicators).collect()
    }

    #[test]
    fn test_clause_layout_small_instance() {
        // d=1, t=2, n=2: column 0 vs {1}, then column 1 vs {0}
        let formula = CffEncoder::new().encode(CffParams::new(1, 2, 2)).unwrap();

        let expected = vec![
            vec![1, -5],
            vec![-2, -5],
            vec![3, -6],
            vec![-4, -6],
            vec![5, 6],
            vec![2, -7],
            vec![-1, -7],
            vec![4, -8],
            vec![-3, -8],
            vec![7, 8],
        ];
        let actual: Vec<Vec<i32>> = formula
            .clauses()
            .iter()
            .map(|c| c.literals.clone())
            .collect();
        assert_eq!(actual, expected);
        assert_eq!(formula.variable_count(), 8);
        assert_eq!(formula.primary_variables(), 4);
    }

    #[test]
    fn test_formula_accepts_exactly_the_cover_free_matrices() {
        for &(d, t, n) in &[(1, 2, 3), (1, 3, 3), (1, 3, 4), (2, 4, 4)] {
            let formula = CffEncoder::new().encode(CffParams::new(d, t, n)).unwrap();

            for mask in 0u32..(1 << (t * n)) {
                let blocks: Vec<Block> = (0..n)
                    .map(|col| {
                        (0..t)
                            .filter(|row| mask & (1 << (row * n + col)) != 0)
                            .map(|row| row + 1)
                            .collect()
                    })
                    .collect();
                let assignment = with_indicators(&formula, &encode_assignment(&blocks, t));

                assert_eq!(
                    formula.is_satisfied_by(&assignment),
                    is_cover_free(&blocks, d).unwrap(),
                    "d={} t={} n={} blocks={:?}",
                    d,
                    t,
                    n,
                    blocks
                );
            }
        }
    }

    #[test]
    fn test_estimate_matches_encoding() {
        let encoder = CffEncoder::new();
        for &(d, t, n) in &[(1, 3, 3), (2, 5, 6), (2, 4, 7), (3, 6, 5)] {
            let params = CffParams::new(d, t, n);
            let stats = encoder.estimate(params).unwrap();
            let formula = encoder.encode(params).unwrap();

            assert_eq!(stats.clauses, formula.clause_count() as u64);
            assert_eq!(stats.total_variables(), formula.variable_count() as u64);
            assert_eq!(stats.primary_variables, (t * n) as u64);
        }
    }

    #[test]
    fn test_degenerate_parameters_rejected() {
        let encoder = CffEncoder::new();
        assert!(matches!(
            encoder.encode(CffParams::new(3, 4, 3)),
            Err(CffError::InvalidParameters { .. })
        ));
        assert!(encoder.encode(CffParams::new(0, 4, 3)).is_err());
    }

    #[test]
    fn test_clause_limit() {
        let encoder = CffEncoder::with_clause_limit(10);
        assert!(matches!(
            encoder.encode(CffParams::new(2, 5, 6)),
            Err(CffError::EncodingTooLarge { limit: 10, .. })
        ));
    }

    #[test]
    fn test_variable_overflow_reported() {
        let result = CffEncoder::new().estimate(CffParams::new(10, 1000, 200));
        assert!(matches!(result, Err(CffError::VariableOverflow { .. })));
    }
}
