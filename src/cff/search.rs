//! Cached search over the (t, n) lattice for a fixed d

use super::decoder::{decode, Block};
use super::params::CffParams;
use super::verifier::{CoverFreeVerifier, Verdict};
use crate::config::Settings;
use crate::error::{CffError, Result};
use crate::sat::{CffEncoder, SatOracle, SolveVerdict};
use crate::store::result_store::write_atomically;
use crate::store::{OutcomeRecord, ResultStore, Status};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Per-attempt budget used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Classified result of one solve attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Sat(Vec<Block>),
    Unsat,
    Timeout,
    Error(String),
}

impl Outcome {
    pub fn status(&self) -> Status {
        match self {
            Outcome::Sat(_) => Status::Sat,
            Outcome::Unsat => Status::Unsat,
            Outcome::Timeout => Status::Timeout,
            Outcome::Error(_) => Status::Error,
        }
    }
}

/// An outcome together with what it cost
#[derive(Debug, Clone)]
pub struct Attempt {
    pub params: CffParams,
    pub outcome: Outcome,
    pub clauses: Option<u64>,
    pub elapsed: Duration,
}

impl Attempt {
    pub fn into_record(self) -> OutcomeRecord {
        let status = self.outcome.status();
        let (solution, detail) = match self.outcome {
            Outcome::Sat(blocks) => (blocks, None),
            Outcome::Error(message) => (Vec::new(), Some(message)),
            Outcome::Unsat | Outcome::Timeout => (Vec::new(), None),
        };

        let mut record = OutcomeRecord::new(self.params, status, solution);
        record.clauses = self.clauses;
        record.time = Some(self.elapsed.as_secs_f64());
        record.detail = detail;
        record
    }
}

/// Whether a probe was answered by the store or by the oracle
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    Cached(OutcomeRecord),
    Solved(OutcomeRecord),
}

impl Probe {
    pub fn record(&self) -> &OutcomeRecord {
        match self {
            Probe::Cached(record) | Probe::Solved(record) => record,
        }
    }

    pub fn status(&self) -> Status {
        self.record().status
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Probe::Cached(_))
    }
}

/// Position of the exploration; serializable so a run can resume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCursor {
    pub d: usize,
    pub t: usize,
    pub n: usize,
}

impl SearchCursor {
    pub fn new(d: usize, t: usize, n: usize) -> Self {
        Self { d, t, n }
    }

    pub fn params(&self) -> CffParams {
        CffParams::new(self.d, self.t, self.n)
    }

    /// Next point after observing `status` here.
    ///
    /// Anything but SAT moves to the next t with n reset to t; then n always
    /// increments, so the first probe at a new t is `(t, t + 1)`.
    pub fn advance(self, status: Status) -> Self {
        let mut next = self;
        if status != Status::Sat {
            next.t += 1;
            next.n = next.t;
        }
        next.n += 1;
        next
    }

    /// Read a saved cursor; `None` when the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CffError::StoreIo {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| CffError::StoreFormat {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self).map_err(|source| CffError::StoreFormat {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomically(path, json.as_bytes())
    }
}

/// Bounds for an otherwise endless exploration
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits {
    pub max_probes: Option<usize>,
    pub max_t: Option<usize>,
}

impl SearchLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    fn reached(&self, probes: usize, cursor: &SearchCursor) -> bool {
        self.max_probes.is_some_and(|max| probes >= max)
            || self.max_t.is_some_and(|max| cursor.t > max)
    }
}

/// Drives the store, encoder and oracle for single probes and long runs
pub struct SearchDriver<O: SatOracle> {
    oracle: O,
    store: ResultStore,
    encoder: CffEncoder,
    verifier: Option<CoverFreeVerifier>,
    timeout: Duration,
    cursor_path: Option<PathBuf>,
}

impl<O: SatOracle> SearchDriver<O> {
    pub fn new(oracle: O, store: ResultStore) -> Self {
        Self {
            oracle,
            store,
            encoder: CffEncoder::new(),
            verifier: None,
            timeout: DEFAULT_TIMEOUT,
            cursor_path: None,
        }
    }

    /// Build a driver from loaded settings
    pub fn from_settings(oracle: O, settings: &Settings) -> Self {
        let store = ResultStore::open(&settings.store.path, settings.store.upsert_policy);
        let mut driver = Self::new(oracle, store)
            .with_timeout(Duration::from_secs(settings.solver.timeout_seconds))
            .with_encoder(CffEncoder::with_clause_limit(settings.solver.max_clauses));

        if settings.verifier.verify_solutions {
            driver = driver.with_verifier(CoverFreeVerifier::new(settings.verifier.max_blocks));
        }
        if let Some(path) = &settings.store.cursor_path {
            driver = driver.with_cursor_path(path.clone());
        }
        driver
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_encoder(mut self, encoder: CffEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Certify SAT families before they are stored
    pub fn with_verifier(mut self, verifier: CoverFreeVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Persist the cursor after every step of `find_all`
    pub fn with_cursor_path(mut self, path: PathBuf) -> Self {
        self.cursor_path = Some(path);
        self
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Solve one triple under the time budget. Never fails: every fault,
    /// including a panic inside the oracle, becomes `Outcome::Error`.
    pub fn find(&mut self, params: CffParams) -> Attempt {
        info!(%params, "finding solution");
        let started = Instant::now();
        let mut clauses = None;

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.attempt(params, &mut clauses)));
        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(%params, error = %e, "attempt failed");
                Outcome::Error(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(%params, %message, "solver panicked");
                Outcome::Error(format!("solver panicked: {}", message))
            }
        };

        let elapsed = started.elapsed();
        info!(
            %params,
            status = %outcome.status(),
            elapsed_ms = elapsed.as_millis() as u64,
            "attempt finished"
        );
        Attempt {
            params,
            outcome,
            clauses,
            elapsed,
        }
    }

    fn attempt(&mut self, params: CffParams, clauses: &mut Option<u64>) -> Result<Outcome> {
        let formula = self.encoder.encode(params)?;
        *clauses = Some(formula.clause_count() as u64);
        debug!(
            %params,
            oracle = self.oracle.name(),
            clauses = formula.clause_count(),
            variables = formula.variable_count(),
            "submitting formula"
        );

        let blocks = match self.oracle.solve(&formula, self.timeout)? {
            SolveVerdict::Satisfiable(model) => decode(&model, params.n, params.t)?,
            SolveVerdict::Unsatisfiable => return Ok(Outcome::Unsat),
            SolveVerdict::Interrupted => return Ok(Outcome::Timeout),
        };

        if let Some(verifier) = &self.verifier {
            if blocks.len() > verifier.max_blocks() {
                warn!(%params, "family too large to verify, storing unverified");
            } else if let Verdict::Covered { block, by } = verifier.verify(&blocks, params.d)? {
                return Ok(Outcome::Error(format!(
                    "decoded family is not {}-cover-free: block {} is covered by {:?}",
                    params.d, block, by
                )));
            }
        }
        Ok(Outcome::Sat(blocks))
    }

    /// Answer one triple from the store, or solve and persist it
    pub fn find_one(&mut self, params: CffParams) -> Result<Probe> {
        if let Some(record) = self.store.get(params)? {
            if !record.status.is_retryable() {
                info!(%params, status = %record.status, "solution already stored");
                return Ok(Probe::Cached(record));
            }
            debug!(%params, "stored timeout, retrying");
        }

        let record = self.find(params).into_record();
        self.store.upsert(record.clone())?;
        Ok(Probe::Solved(record))
    }

    /// Probe the cursor's triple and compute the next cursor
    pub fn step(&mut self, cursor: SearchCursor) -> Result<(Probe, SearchCursor)> {
        let probe = self.find_one(cursor.params())?;
        let next = cursor.advance(probe.status());

        if let Some(path) = &self.cursor_path {
            next.save(path)?;
        }
        Ok((probe, next))
    }

    /// Explore from `start` until a limit is hit; unbounded limits run
    /// until the process is interrupted. Returns the next unvisited cursor.
    pub fn find_all(&mut self, start: SearchCursor, limits: SearchLimits) -> Result<SearchCursor> {
        let mut cursor = start;
        let mut probes = 0;

        while !limits.reached(probes, &cursor) {
            let (probe, next) = self.step(cursor)?;
            debug!(
                from = %cursor.params(),
                to = %next.params(),
                status = %probe.status(),
                cached = probe.is_cached(),
                "search step"
            );
            probes += 1;
            cursor = next;
        }

        info!(probes, next = %cursor.params(), "search stopped at limit");
        Ok(cursor)
    }

    /// Probe each `(t, n)` pair for `d`, in order
    pub fn find_batch(&mut self, d: usize, pairs: &[(usize, usize)]) -> Result<Vec<Probe>> {
        pairs
            .iter()
            .map(|&(t, n)| self.find_one(CffParams::new(d, t, n)))
            .collect()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
