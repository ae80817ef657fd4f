//! Run results and statistics.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{dedupe_by_source_url, CandidateEvent};
use crate::scrapers::ScrapeError;

/// Why a source produced nothing this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    /// Short machine-readable kind, e.g. `navigation_timeout` or `panic`.
    pub kind: String,
    pub message: String,
}

impl SourceFailure {
    pub fn panicked(message: impl Into<String>) -> Self {
        Self {
            kind: "panic".to_string(),
            message: message.into(),
        }
    }
}

impl From<&ScrapeError> for SourceFailure {
    fn from(err: &ScrapeError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Outcome of one source in one run. Holds either records or a failure.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub source: String,
    pub outcome: Result<Vec<CandidateEvent>, SourceFailure>,
    pub elapsed: Duration,
}

impl RunResult {
    /// Records of this source; empty for a failed source.
    pub fn events(&self) -> &[CandidateEvent] {
        match &self.outcome {
            Ok(events) => events,
            Err(_) => &[],
        }
    }

    pub fn failure(&self) -> Option<&SourceFailure> {
        self.outcome.as_ref().err()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Everything one run produced, one result per source in registration
/// order.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<RunResult>,
}

impl RunReport {
    /// Report for a run with no registered sources.
    pub fn empty() -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            results: Vec::new(),
        }
    }

    /// All records, in registration order then emission order. Duplicates
    /// are kept.
    pub fn events(&self) -> Vec<CandidateEvent> {
        self.results
            .iter()
            .flat_map(|r| r.events().iter().cloned())
            .collect()
    }

    /// Like [`events`](Self::events), keeping only the first record per
    /// `source_url`.
    pub fn unique_events(&self) -> Vec<CandidateEvent> {
        dedupe_by_source_url(self.results.iter().flat_map(|r| r.events().iter().cloned()))
    }

    pub fn result_for(&self, source: &str) -> Option<&RunResult> {
        self.results.iter().find(|r| r.source == source)
    }

    /// Records of one source; empty for an unknown or failed source.
    pub fn events_for(&self, source: &str) -> Vec<CandidateEvent> {
        self.result_for(source)
            .map(|r| r.events().to_vec())
            .unwrap_or_default()
    }

    pub fn failed_sources(&self) -> impl Iterator<Item = &RunResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn stats(&self, sources_registered: usize) -> OrchestrationStats {
        let events_by_source: BTreeMap<String, usize> = self
            .results
            .iter()
            .map(|r| (r.source.clone(), r.events().len()))
            .collect();
        let failures = self
            .results
            .iter()
            .filter_map(|r| r.failure().map(|f| (r.source.clone(), f.message.clone())))
            .collect();

        OrchestrationStats {
            run_id: Some(self.run_id),
            sources_registered,
            sources_executed: self.results.len(),
            total_events: events_by_source.values().sum(),
            events_by_source,
            failures,
            duration_ms: (self.finished_at - self.started_at)
                .num_milliseconds()
                .max(0) as u64,
            last_run: Some(self.finished_at),
        }
    }
}

/// Aggregate statistics of the most recent run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    pub sources_registered: usize,
    pub sources_executed: usize,
    pub total_events: usize,
    /// Failing sources report 0.
    pub events_by_source: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<String, String>,
    #[serde(default)]
    pub duration_ms: u64,
    /// End of the last run; `None` before the first run.
    pub last_run: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(url: &str) -> CandidateEvent {
        let start = NaiveDate::from_ymd_opt(2025, 4, 1)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        CandidateEvent::new("E", start, "V", "C", "R", url, "s")
    }

    fn report() -> RunReport {
        RunReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            results: vec![
                RunResult {
                    source: "a".into(),
                    outcome: Ok(vec![event("u1"), event("u2")]),
                    elapsed: Duration::ZERO,
                },
                RunResult {
                    source: "b".into(),
                    outcome: Err(SourceFailure::panicked("boom")),
                    elapsed: Duration::ZERO,
                },
                RunResult {
                    source: "c".into(),
                    outcome: Ok(vec![event("u1")]),
                    elapsed: Duration::ZERO,
                },
            ],
        }
    }

    #[test]
    fn test_stats_from_report() {
        let stats = report().stats(3);
        assert_eq!(stats.sources_registered, 3);
        assert_eq!(stats.sources_executed, 3);
        assert_eq!(stats.total_events, 3);
        assert_eq!(stats.events_by_source["b"], 0);
        assert_eq!(stats.failures["b"], "boom");
        assert!(stats.last_run.is_some());
    }

    #[test]
    fn test_events_keep_and_drop_duplicates() {
        let report = report();
        assert_eq!(report.events().len(), 3);
        let unique = report.unique_events();
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].source_url, "u1");
        assert!(report.events_for("b").is_empty());
        assert!(report.events_for("zzz").is_empty());

        let failed: Vec<&str> = report.failed_sources().map(|r| r.source.as_str()).collect();
        assert_eq!(failed, ["b"]);
    }

    #[test]
    fn test_stats_serialize() {
        let json = serde_json::to_value(OrchestrationStats::default()).unwrap();
        assert_eq!(json["total_events"], 0);
        assert!(json["last_run"].is_null());
        assert!(json.get("failures").is_none());
    }
}
