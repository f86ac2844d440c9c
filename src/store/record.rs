//! Persisted outcome records

use crate::cff::{Block, CffParams};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Outcome tag of one (d, t, n) attempt, serialized in upper case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "SAT")]
    Sat,
    #[serde(rename = "UNSAT")]
    Unsat,
    #[serde(rename = "TIMEOUT")]
    Timeout,
    #[serde(rename = "ERROR")]
    Error,
}

impl Status {
    /// The persisted tag
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Sat => "SAT",
            Status::Unsat => "UNSAT",
            Status::Timeout => "TIMEOUT",
            Status::Error => "ERROR",
        }
    }

    /// SAT and UNSAT are answers; the rest are not
    pub fn is_final(self) -> bool {
        matches!(self, Status::Sat | Status::Unsat)
    }

    /// Only a timeout is worth another attempt
    pub fn is_retryable(self) -> bool {
        self == Status::Timeout
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored attempt, keyed by (d, t, n)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub d: usize,
    pub t: usize,
    pub n: usize,
    pub status: Status,
    /// The n blocks; empty unless `status` is SAT
    #[serde(default, deserialize_with = "null_as_empty")]
    pub solution: Vec<Block>,
    /// Clause count of the submitted formula
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clauses: Option<u64>,
    /// Seconds spent encoding and solving
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    /// Failure description for ERROR records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl OutcomeRecord {
    pub fn new(params: CffParams, status: Status, solution: Vec<Block>) -> Self {
        Self {
            d: params.d,
            t: params.t,
            n: params.n,
            status,
            solution,
            clauses: None,
            time: None,
            detail: None,
        }
    }

    pub fn params(&self) -> CffParams {
        CffParams::new(self.d, self.t, self.n)
    }

    pub fn matches(&self, params: CffParams) -> bool {
        self.params() == params
    }
}

// older stores write `"solution": null` for non-SAT records
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Block>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Block>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tags_are_upper_case() {
        let json = serde_json::to_string(&Status::Timeout).unwrap();
        assert_eq!(json, "\"TIMEOUT\"");
        assert!(serde_json::from_str::<Status>("\"timeout\"").is_err());
        assert_eq!(serde_json::from_str::<Status>("\"UNSAT\"").unwrap(), Status::Unsat);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let record = OutcomeRecord::new(CffParams::new(1, 3, 3), Status::Unsat, vec![]);
        let json = serde_json::to_string(&record).unwrap();

        assert_eq!(json, r#"{"d":1,"t":3,"n":3,"status":"UNSAT","solution":[]}"#);
    }

    #[test]
    fn test_record_without_solution_parses() {
        let record: OutcomeRecord =
            serde_json::from_str(r#"{"d":2,"t":5,"n":6,"status":"TIMEOUT"}"#).unwrap();

        assert_eq!(record.params(), CffParams::new(2, 5, 6));
        assert!(record.solution.is_empty());
        assert!(record.status.is_retryable());
    }

    #[test]
    fn test_null_solution_parses_as_empty() {
        let record: OutcomeRecord =
            serde_json::from_str(r#"{"d":2,"t":5,"n":6,"status":"UNSAT","solution":null}"#)
                .unwrap();
        assert!(record.solution.is_empty());
    }
}
