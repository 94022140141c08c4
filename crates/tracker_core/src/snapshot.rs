use serde::Deserialize;

use crate::SolveParams;

/// Server-side run status of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum RunStatus {
    Starting,
    #[default]
    Running,
    Done,
    Canceled,
    Failed,
}

/// Point-in-time report of an operation's progress.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub run_status: RunStatus,
    #[serde(default)]
    pub percent_done: f64,
    #[serde(default)]
    pub total: u64,
    #[serde(default, rename = "elapsed")]
    pub elapsed_ms: u64,
    #[serde(default)]
    pub solutions: Vec<String>,
}

impl ProgressSnapshot {
    /// Pins `percent_done` to 100 for finished runs and into `[0, 100]` otherwise.
    pub fn normalized(mut self) -> Self {
        self.percent_done = if self.run_status == RunStatus::Done {
            100.0
        } else if self.percent_done.is_finite() {
            self.percent_done.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self
    }
}

/// A decoded progress body: the snapshot plus the parameters the server echoed, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub snapshot: ProgressSnapshot,
    pub params: Option<SolveParams>,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    params: Option<SolveParams>,
    progress: ProgressSnapshot,
}

/// Decodes either `{params, progress}` or a bare snapshot.
pub fn parse_progress(body: &str) -> Result<ProgressReport, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if value.get("progress").is_some() {
        let envelope: Envelope = serde_json::from_value(value)?;
        return Ok(ProgressReport {
            snapshot: envelope.progress,
            params: envelope.params,
        });
    }
    let snapshot: ProgressSnapshot = serde_json::from_value(value)?;
    Ok(ProgressReport {
        snapshot,
        params: None,
    })
}
