//! Clauses and formulas handed to the SAT oracle

/// Represents a SAT clause (disjunction of literals)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub literals: Vec<i32>, // Positive for variable, negative for negation
}

impl Clause {
    /// Create a new clause from literals
    pub fn new(literals: Vec<i32>) -> Self {
        Self { literals }
    }

    /// Create a binary clause (two literals)
    pub fn binary(lit1: i32, lit2: i32) -> Self {
        Self { literals: vec![lit1, lit2] }
    }

    /// Check if clause is empty (unsatisfiable)
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Whether some literal is true under `value(var)`
    pub fn is_satisfied_by(&self, value: impl Fn(i32) -> bool) -> bool {
        self.literals
            .iter()
            .any(|&lit| value(lit.abs()) == (lit > 0))
    }
}

/// A CNF formula: clauses implicitly AND-ed together.
///
/// `primary_variables` counts the leading variables that carry the answer;
/// everything above it is auxiliary and never decoded.
#[derive(Debug, Clone, Default)]
pub struct Formula {
    clauses: Vec<Clause>,
    variable_count: usize,
    primary_variables: usize,
}

impl Formula {
    /// Create an empty formula whose first `primary_variables` ids are decoded
    pub fn new(primary_variables: usize) -> Self {
        Self {
            clauses: Vec::new(),
            variable_count: primary_variables,
            primary_variables,
        }
    }

    /// Append a clause, tracking the highest variable seen
    pub fn push(&mut self, clause: Clause) {
        for &literal in &clause.literals {
            let var = literal.unsigned_abs() as usize;
            if var > self.variable_count {
                self.variable_count = var;
            }
        }
        self.clauses.push(clause);
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    pub fn primary_variables(&self) -> usize {
        self.primary_variables
    }

    /// Check a full assignment (signed literal per variable, index = var - 1)
    pub fn is_satisfied_by(&self, assignment: &[i32]) -> bool {
        let value = |var: i32| {
            assignment
                .get(var as usize - 1)
                .map(|&lit| lit > 0)
                .unwrap_or(false)
        };
        self.clauses.iter().all(|clause| clause.is_satisfied_by(value))
    }
}
