//! SAT oracle integration using CaDiCaL

use super::constraints::{Clause, Formula};
use crate::error::{CffError, Result};
use cadical::{Callbacks, Solver};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Verdict of one bounded solve attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveVerdict {
    /// Signed literal for each primary variable, in id order
    Satisfiable(Vec<i32>),
    Unsatisfiable,
    /// The time budget ran out before a verdict
    Interrupted,
}

/// The black-box decision procedure the search delegates to.
///
/// Each call owns its solver for the duration of the attempt and must
/// release it on every exit path.
pub trait SatOracle {
    /// Decide `formula` within `budget`
    fn solve(&mut self, formula: &Formula, budget: Duration) -> Result<SolveVerdict>;

    /// Short backend name for logs
    fn name(&self) -> &str;
}

/// Terminate callback that stops CaDiCaL once a deadline passes
#[derive(Debug)]
pub struct Deadline {
    budget: Duration,
    started: Instant,
    expired: bool,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            started: Instant::now(),
            expired: false,
        }
    }

    pub fn expired(&self) -> bool {
        self.expired
    }
}

impl Callbacks for Deadline {
    fn started(&mut self) {
        self.started = Instant::now();
        self.expired = false;
    }

    fn terminate(&mut self) -> bool {
        if self.started.elapsed() >= self.budget {
            self.expired = true;
        }
        self.expired
    }
}

/// SAT solver wrapper for CaDiCaL
pub struct SatSolver {
    solver: Solver<Deadline>,
    variable_count: usize,
    clause_count: usize,
}

/// Statistics about the solving process
#[derive(Debug, Clone)]
pub struct SolverStatistics {
    pub variable_count: usize,
    pub clause_count: usize,
    pub solve_time: Duration,
}

impl SatSolver {
    /// Create a new SAT solver instance
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            variable_count: 0,
            clause_count: 0,
        }
    }

    /// Stop solving once `timeout` has elapsed
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.solver.set_callbacks(Some(Deadline::new(timeout)));
    }

    /// Add clauses to the solver
    pub fn add_clauses(&mut self, clauses: &[Clause]) -> Result<()> {
        for clause in clauses {
            self.add_clause(clause)?;
        }
        Ok(())
    }

    /// Add a single clause to the solver
    pub fn add_clause(&mut self, clause: &Clause) -> Result<()> {
        if clause.is_empty() {
            return Err(CffError::Oracle(
                "cannot add empty clause (unsatisfiable)".to_string(),
            ));
        }

        for &literal in &clause.literals {
            let var = literal.unsigned_abs() as usize;
            if var > self.variable_count {
                self.variable_count = var;
            }
        }

        self.solver.add_clause(clause.literals.iter().copied());
        self.clause_count += 1;
        Ok(())
    }

    /// Solve, returning `None` when interrupted by the timeout
    pub fn solve(&mut self) -> Option<bool> {
        self.solver.solve()
    }

    /// Whether the last `solve` stopped on the deadline
    pub fn timed_out(&mut self) -> bool {
        self.solver
            .get_callbacks()
            .map(|deadline| deadline.expired())
            .unwrap_or(false)
    }

    /// Signed literals for variables `1..=count` after a satisfiable solve
    pub fn model(&self, count: usize) -> Result<Vec<i32>> {
        if count > self.variable_count {
            return Err(CffError::MalformedModel(format!(
                "requested {} variables but solver only knows {}",
                count, self.variable_count
            )));
        }
        Ok((1..=count as i32)
            .map(|var| match self.solver.value(var) {
                Some(true) => var,
                // unassigned variables are free; report them false
                _ => -var,
            })
            .collect())
    }

    /// Get the number of variables
    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    /// Get the number of clauses
    pub fn clause_count(&self) -> usize {
        self.clause_count
    }
}

impl Default for SatSolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Oracle that builds a fresh CaDiCaL instance per attempt.
///
/// The instance is dropped at the end of `solve`, so the native solver is
/// released whether the attempt succeeded, failed or timed out.
#[derive(Debug, Default)]
pub struct CadicalOracle {
    last_statistics: Option<SolverStatistics>,
}

impl CadicalOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics from the most recent attempt
    pub fn last_statistics(&self) -> Option<&SolverStatistics> {
        self.last_statistics.as_ref()
    }
}

impl SatOracle for CadicalOracle {
    fn solve(&mut self, formula: &Formula, budget: Duration) -> Result<SolveVerdict> {
        let mut solver = SatSolver::new();
        solver.set_timeout(budget);
        solver.add_clauses(formula.clauses())?;

        let start_time = Instant::now();
        let result = solver.solve();
        let solve_time = start_time.elapsed();

        self.last_statistics = Some(SolverStatistics {
            variable_count: solver.variable_count(),
            clause_count: solver.clause_count(),
            solve_time,
        });
        debug!(
            clauses = solver.clause_count(),
            elapsed_ms = solve_time.as_millis() as u64,
            ?result,
            "cadical finished"
        );

        match result {
            Some(true) => Ok(SolveVerdict::Satisfiable(
                solver.model(formula.primary_variables())?,
            )),
            Some(false) => Ok(SolveVerdict::Unsatisfiable),
            None if solver.timed_out() => Ok(SolveVerdict::Interrupted),
            None => {
                warn!("cadical returned no verdict without reaching the deadline");
                Err(CffError::Oracle("solver stopped without a verdict".to_string()))
            }
        }
    }

    fn name(&self) -> &str {
        "cadical"
    }
}

impl std::fmt::Display for SolverStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAT Solver Statistics:")?;
        writeln!(f, "  Variables: {}", self.variable_count)?;
        writeln!(f, "  Clauses: {}", self.clause_count)?;
        writeln!(f, "  Solve time: {:.3}s", self.solve_time.as_secs_f64())?;
        Ok(())
    }
}
