use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::view_model::{ParamsSummary, TrackerViewModel};
use crate::{ProgressSnapshot, SolveParams};

/// Opaque server-issued identifier of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    Submitting,
    Running,
    CancelPending,
    Canceled,
    Done,
    Failed(String),
}

impl LifecycleState {
    /// True while an operation is being submitted or tracked.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            LifecycleState::Submitting | LifecycleState::Running | LifecycleState::CancelPending
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleState::Canceled | LifecycleState::Done | LifecycleState::Failed(_)
        )
    }
}

/// What the tracker does with an unclassified poll error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// Surface the error and keep polling.
    #[default]
    Continue,
    /// Surface the error, then fail the operation and stop polling.
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerPolicy {
    pub require_input: bool,
    pub on_transport_error: ErrorPolicy,
}

impl Default for TrackerPolicy {
    fn default() -> Self {
        Self {
            require_input: true,
            on_transport_error: ErrorPolicy::Continue,
        }
    }
}

/// Why a submit or cancel call did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestFailure {
    #[error("missing or invalid credential")]
    Credential,
    #[error("operation no longer exists")]
    Gone,
    #[error("server returned status {0}")]
    Status(u16),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("transport failure: {0}")]
    Network(String),
}

/// Local misuse that never reaches the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("no ongoing operation")]
    NoActiveOperation,
    #[error("an operation is already being tracked")]
    OperationAlreadyActive,
    #[error("cancellation already pending")]
    CancelAlreadyPending,
}

/// The tracker's whole mutable session: lifecycle, active handle, timer and in-flight flag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackerState {
    policy: TrackerPolicy,
    lifecycle: LifecycleState,
    handle: Option<OperationHandle>,
    timer_running: bool,
    poll_in_flight: bool,
    polls_issued: u64,
    session: u64,
    params: Option<SolveParams>,
    snapshot: Option<ProgressSnapshot>,
    last_error: Option<String>,
    dirty: bool,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: TrackerPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> TrackerPolicy {
        self.policy
    }

    pub fn lifecycle(&self) -> &LifecycleState {
        &self.lifecycle
    }

    pub fn handle(&self) -> Option<&OperationHandle> {
        self.handle.as_ref()
    }

    pub fn timer_running(&self) -> bool {
        self.timer_running
    }

    pub fn poll_in_flight(&self) -> bool {
        self.poll_in_flight
    }

    pub fn polls_issued(&self) -> u64 {
        self.polls_issued
    }

    /// Bumped whenever tracking starts or is reset; replies carry the session they were issued in.
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn snapshot(&self) -> Option<&ProgressSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn view(&self) -> TrackerViewModel {
        TrackerViewModel {
            lifecycle: self.lifecycle.clone(),
            operation_id: self.handle.as_ref().map(|h| h.id().to_string()),
            summary: self.params.as_ref().map(ParamsSummary::from_params),
            percent_done: self.snapshot.as_ref().map(|s| s.percent_done),
            total: self.snapshot.as_ref().map(|s| s.total),
            elapsed_ms: self.snapshot.as_ref().map(|s| s.elapsed_ms),
            solutions: self
                .snapshot
                .as_ref()
                .map(|s| s.solutions.clone())
                .unwrap_or_default(),
            last_error: self.last_error.clone(),
            timer_running: self.timer_running,
            poll_in_flight: self.poll_in_flight,
            polls_issued: self.polls_issued,
            dirty: self.dirty,
        }
    }

    /// Returns whether the view changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn begin_submit(&mut self, params: SolveParams) {
        self.lifecycle = LifecycleState::Submitting;
        self.params = Some(params);
        self.snapshot = None;
        self.last_error = None;
        self.mark_dirty();
    }

    /// Stores the handle and starts the timer.
    pub(crate) fn activate(&mut self, handle: OperationHandle) {
        self.handle = Some(handle);
        self.session += 1;
        self.lifecycle = LifecycleState::Running;
        self.timer_running = true;
        self.poll_in_flight = false;
        self.mark_dirty();
    }

    pub(crate) fn begin_attach(&mut self) {
        self.params = None;
        self.snapshot = None;
        self.last_error = None;
    }

    pub(crate) fn fail_submit(&mut self, reason: String) {
        self.lifecycle = LifecycleState::Failed(reason.clone());
        self.last_error = Some(reason);
        self.mark_dirty();
    }

    /// Marks a poll as outstanding and returns the handle to poll, or `None` if the tick is skipped.
    pub(crate) fn begin_poll(&mut self) -> Option<OperationHandle> {
        if !self.timer_running || self.poll_in_flight {
            return None;
        }
        let handle = self.handle.clone()?;
        self.poll_in_flight = true;
        self.polls_issued += 1;
        Some(handle)
    }

    /// A reply counts only if it belongs to the active handle in the active session.
    pub(crate) fn is_current(&self, handle: &OperationHandle, session: u64) -> bool {
        self.session == session && self.handle.as_ref() == Some(handle)
    }

    pub(crate) fn end_poll(&mut self) {
        self.poll_in_flight = false;
    }

    pub(crate) fn apply_snapshot(&mut self, snapshot: ProgressSnapshot, params: Option<SolveParams>) {
        self.snapshot = Some(snapshot);
        if let Some(params) = params {
            self.params = Some(params);
        }
        self.mark_dirty();
    }

    pub(crate) fn mark_cancel_pending(&mut self) {
        if self.lifecycle != LifecycleState::CancelPending {
            self.lifecycle = LifecycleState::CancelPending;
            self.mark_dirty();
        }
    }

    pub(crate) fn record_error(&mut self, reason: String) {
        self.last_error = Some(reason);
        self.mark_dirty();
    }

    /// Enters a terminal state and clears the handle. Returns true if the timer was
    /// running, so the caller stops it exactly once.
    pub(crate) fn finish(&mut self, terminal: LifecycleState) -> bool {
        debug_assert!(terminal.is_terminal());
        self.lifecycle = terminal;
        self.handle = None;
        self.poll_in_flight = false;
        self.mark_dirty();
        std::mem::take(&mut self.timer_running)
    }

    /// Returns to `Idle`. Returns true if the timer was running.
    pub(crate) fn reset(&mut self) -> bool {
        let policy = self.policy;
        let polls_issued = self.polls_issued;
        let session = self.session + 1;
        let was_running = self.timer_running;
        *self = Self {
            policy,
            polls_issued,
            session,
            dirty: true,
            ..Self::default()
        };
        was_running
    }
}
