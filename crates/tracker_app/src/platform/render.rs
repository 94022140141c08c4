use std::sync::Mutex;

use chrono::DateTime;
use tracker_core::{
    LifecycleEvent, Notice, ParamsSummary, RequestFailure, TrackerViewModel,
};
use tracker_engine::PresentationSink;

/// Prints tracker notices to the terminal.
#[derive(Default)]
pub struct TerminalSink {
    last_summary: Mutex<Option<ParamsSummary>>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the summary block the first time a given summary is seen.
    fn fresh_summary(&self, view: &TrackerViewModel) -> Option<String> {
        let summary = view.summary.as_ref()?;
        let mut last = self.last_summary.lock().ok()?;
        if last.as_ref() == Some(summary) {
            return None;
        }
        *last = Some(summary.clone());
        Some(render_summary(summary))
    }
}

impl PresentationSink for TerminalSink {
    fn present(&self, notice: &Notice, view: &TrackerViewModel) {
        if let Some(summary) = self.fresh_summary(view) {
            println!("{summary}");
        }
        match render_notice(notice, view) {
            Rendered::Out(text) => println!("{text}"),
            Rendered::Err(text) => eprintln!("{text}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Out(String),
    Err(String),
}

pub fn render_notice(notice: &Notice, view: &TrackerViewModel) -> Rendered {
    match notice {
        Notice::Lifecycle(LifecycleEvent::Progress(_)) => Rendered::Out(render_progress(view)),
        Notice::Lifecycle(LifecycleEvent::Completed(_)) => Rendered::Out(format!(
            "{}\n{}",
            render_progress(view),
            render_solutions(&view.solutions)
        )),
        Notice::Lifecycle(LifecycleEvent::CancelPending) | Notice::CancelAccepted => {
            Rendered::Out("Cancellation pending...".to_string())
        }
        Notice::Lifecycle(LifecycleEvent::Canceled) => Rendered::Out("Canceled!".to_string()),
        Notice::Lifecycle(event) => Rendered::Err(format!(
            "Error from server getting progress: {}",
            event.error_reason().unwrap_or_default()
        )),
        Notice::Submitted(handle) => Rendered::Out(format!("Started operation {handle}")),
        Notice::Attached(handle) => Rendered::Out(format!("Watching operation {handle}")),
        Notice::InvalidParams(err) => Rendered::Err(format!("Invalid parameters: {err}")),
        Notice::SubmitFailed(RequestFailure::Credential) => {
            Rendered::Err("No valid credential was sent; check the password.".to_string())
        }
        Notice::SubmitFailed(failure) => Rendered::Err(format!(
            "Error from server starting solve operation: {failure}"
        )),
        Notice::CancelFailed(failure) => {
            Rendered::Err(format!("Error cancelling operation: {failure}"))
        }
        Notice::Usage(err) => Rendered::Err(err.to_string()),
    }
}

pub fn render_summary(summary: &ParamsSummary) -> String {
    format!(
        "{} ({} chars)\n{} Mode\nMinimum: {} chars\nMatching {}",
        summary.input,
        summary.input_chars,
        if summary.parallel_mode {
            "Parallel"
        } else {
            "Sequential"
        },
        summary.min_chars,
        summary.regex
    )
}

pub fn render_progress(view: &TrackerViewModel) -> String {
    format!(
        "{}% of {}  {}",
        format_percent(view.percent_done.unwrap_or(0.0)),
        format_total(view.total.unwrap_or(0)),
        format_elapsed(view.elapsed_ms.unwrap_or(0))
    )
}

pub fn render_solutions(solutions: &[String]) -> String {
    let mut text = format!("Found {} solutions!\n", solutions.len());
    for solution in solutions {
        text.push('\n');
        text.push_str(solution);
    }
    text
}

pub fn format_percent(percent: f64) -> String {
    format!("{percent:.1}")
}

/// Groups digits in threes: `1234567` becomes `1,234,567`.
pub fn format_total(total: u64) -> String {
    let digits = total.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Wall-clock style `HH:MM:SS`; wraps after a day.
pub fn format_elapsed(elapsed_ms: u64) -> String {
    i64::try_from(elapsed_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|time| time.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}
