use crate::error::{ErrorKind, FlowError};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Outcome of one device run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub device: String,
    pub success: bool,
    pub duration_secs: f64,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub session_id: Option<String>,
}

impl RunResult {
    pub fn passed(device: &str, duration_secs: f64, session_id: Option<String>) -> Self {
        Self {
            device: device.to_string(),
            success: true,
            duration_secs,
            error: None,
            error_kind: None,
            session_id,
        }
    }

    pub fn failed(
        device: &str,
        duration_secs: f64,
        err: &FlowError,
        session_id: Option<String>,
    ) -> Self {
        Self {
            device: device.to_string(),
            success: false,
            duration_secs,
            error: Some(err.to_string()),
            error_kind: Some(err.kind),
            session_id,
        }
    }
}

/// Aggregate view over a finished batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub results: Vec<RunResult>,
    pub successes: usize,
    pub failures: usize,
    /// Whole percent, rounded half up.
    pub success_rate: u32,
    pub total_secs: f64,
    pub failures_by_kind: BTreeMap<ErrorKind, usize>,
}

impl BatchReport {
    pub fn new(results: Vec<RunResult>, total_secs: f64) -> Self {
        let successes = results.iter().filter(|r| r.success).count();
        let failures = results.len() - successes;
        let mut failures_by_kind = BTreeMap::new();
        for kind in results.iter().filter_map(|r| r.error_kind) {
            *failures_by_kind.entry(kind).or_insert(0) += 1;
        }
        Self {
            success_rate: success_rate(successes, results.len()),
            results,
            successes,
            failures,
            total_secs,
            failures_by_kind,
        }
    }

    pub fn any_passed(&self) -> bool {
        self.successes > 0
    }

    /// Human-readable per-device table plus totals.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let width = self
            .results
            .iter()
            .map(|r| r.device.len())
            .max()
            .unwrap_or(6)
            .max(6);

        let _ = writeln!(out, "{:<width$}  {:<6}  {:>8}  detail", "device", "status", "time");
        for r in &self.results {
            let status = if r.success { "PASS" } else { "FAIL" };
            let detail = match (&r.error, &r.session_id) {
                (Some(err), _) => err.clone(),
                (None, Some(id)) => format!("session {id}"),
                (None, None) => String::new(),
            };
            let _ = writeln!(
                out,
                "{:<width$}  {:<6}  {:>7.1}s  {}",
                r.device, status, r.duration_secs, detail
            );
        }
        let _ = writeln!(
            out,
            "\n{} passed, {} failed, {}% success rate, {:.1}s total",
            self.successes, self.failures, self.success_rate, self.total_secs
        );
        for (kind, n) in &self.failures_by_kind {
            let _ = writeln!(out, "  {n} x {}", failure_hint(*kind));
        }
        out
    }
}

pub fn success_rate(successes: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((successes as f64 / total as f64) * 100.0).round() as u32
}

fn failure_hint(kind: ErrorKind) -> String {
    match kind {
        ErrorKind::Configuration => "configuration error (check credentials)".into(),
        ErrorKind::Authorization => "authorization rejected by provider".into(),
        ErrorKind::Capacity => "parallel session limit reached".into(),
        ErrorKind::DeviceUnavailable => "device unavailable on provider".into(),
        ErrorKind::Connectivity => "connection failure or timeout".into(),
        ErrorKind::ElementNotFound(target) => format!("{target} not found"),
        ErrorKind::Remote => "remote command failed".into(),
        ErrorKind::Teardown => "session teardown failed".into(),
        ErrorKind::Internal => "runner crashed".into(),
    }
}
