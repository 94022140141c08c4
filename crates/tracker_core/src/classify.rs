use crate::snapshot::{parse_progress, ProgressReport, RunStatus};

/// What the transport produced for one request: a status and body, or no response at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    Response { status: u16, body: String },
    Failed { message: String },
}

/// A classified lifecycle transition.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Progress(ProgressReport),
    Completed(ProgressReport),
    CancelPending,
    Canceled,
    CredentialError,
    TransportError { status: Option<u16>, message: String },
}

impl LifecycleEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleEvent::Completed(_) | LifecycleEvent::Canceled)
    }

    /// Human-readable reason for error events.
    pub fn error_reason(&self) -> Option<String> {
        match self {
            LifecycleEvent::CredentialError => {
                Some("missing or invalid credential (status 400)".to_string())
            }
            LifecycleEvent::TransportError {
                status: Some(status),
                message,
            } => Some(format!("status {status}: {message}")),
            LifecycleEvent::TransportError {
                status: None,
                message,
            } => Some(message.clone()),
            _ => None,
        }
    }
}

/// Pure mapping from a progress call's outcome to a lifecycle event.
pub fn classify(outcome: &TransportOutcome) -> LifecycleEvent {
    let (status, body) = match outcome {
        TransportOutcome::Failed { message } => {
            return LifecycleEvent::TransportError {
                status: None,
                message: message.clone(),
            };
        }
        TransportOutcome::Response { status, body } => (*status, body),
    };

    match status {
        200..=299 => classify_success(status, body),
        400 => LifecycleEvent::CredentialError,
        410 => LifecycleEvent::Canceled,
        503 => LifecycleEvent::CancelPending,
        _ => LifecycleEvent::TransportError {
            status: Some(status),
            message: error_message(body),
        },
    }
}

fn classify_success(status: u16, body: &str) -> LifecycleEvent {
    let report = match parse_progress(body) {
        Ok(report) => report,
        Err(err) => {
            return LifecycleEvent::TransportError {
                status: Some(status),
                message: format!("undecodable progress body: {err}"),
            };
        }
    };

    match report.snapshot.run_status {
        RunStatus::Starting | RunStatus::Running => LifecycleEvent::Progress(ProgressReport {
            snapshot: report.snapshot.normalized(),
            params: report.params,
        }),
        RunStatus::Done => LifecycleEvent::Completed(ProgressReport {
            snapshot: report.snapshot.normalized(),
            params: report.params,
        }),
        RunStatus::Canceled => LifecycleEvent::Canceled,
        RunStatus::Failed => LifecycleEvent::TransportError {
            status: Some(status),
            message: "operation failed on the server".to_string(),
        },
    }
}

fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "request failed".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> TransportOutcome {
        TransportOutcome::Response {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn running_body_is_progress() {
        let event = classify(&response(
            200,
            r#"{"runStatus":"Running","percentDone":12.5,"total":720,"elapsed":1000,"solutions":[]}"#,
        ));
        match event {
            LifecycleEvent::Progress(report) => {
                assert_eq!(report.snapshot.percent_done, 12.5);
                assert_eq!(report.snapshot.total, 720);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn done_body_is_completed_at_one_hundred_percent() {
        let event = classify(&response(
            200,
            r#"{"runStatus":"Done","percentDone":97,"total":720,"elapsed":4000,"solutions":["ABC","XYZ"]}"#,
        ));
        assert!(event.is_terminal());
        match event {
            LifecycleEvent::Completed(report) => {
                assert_eq!(report.snapshot.percent_done, 100.0);
                assert_eq!(report.snapshot.solutions.len(), 2);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn status_codes_map_to_events() {
        assert_eq!(classify(&response(503, "")), LifecycleEvent::CancelPending);
        assert_eq!(classify(&response(410, "gone")), LifecycleEvent::Canceled);
        assert_eq!(classify(&response(400, "")), LifecycleEvent::CredentialError);
        assert_eq!(
            classify(&response(500, "boom\n")),
            LifecycleEvent::TransportError {
                status: Some(500),
                message: "boom".to_string()
            }
        );
        assert_eq!(
            classify(&response(404, "")),
            LifecycleEvent::TransportError {
                status: Some(404),
                message: "request failed".to_string()
            }
        );
    }

    #[test]
    fn undecodable_success_body_is_transport_error() {
        let event = classify(&response(200, "not json"));
        assert!(matches!(
            event,
            LifecycleEvent::TransportError {
                status: Some(200),
                ..
            }
        ));
    }

    #[test]
    fn connection_failure_has_no_status() {
        let event = classify(&TransportOutcome::Failed {
            message: "connection refused".to_string(),
        });
        assert_eq!(event.error_reason().as_deref(), Some("connection refused"));
    }

    #[test]
    fn canceled_run_status_is_canceled() {
        assert_eq!(
            classify(&response(200, r#"{"runStatus":"Canceled"}"#)),
            LifecycleEvent::Canceled
        );
    }
}
