use crate::{OperationHandle, RequestFailure, SolveForm, TransportOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Caller asked to submit a new job.
    SubmitRequested(SolveForm),
    /// The submit call returned.
    SubmitFinished(Result<OperationHandle, RequestFailure>),
    /// Caller picked an operation it did not submit (from the server's running list).
    Attach(OperationHandle),
    /// Poll timer fired.
    Tick,
    /// A progress request for `handle` returned.
    PollFinished {
        handle: OperationHandle,
        session: u64,
        outcome: TransportOutcome,
    },
    /// Caller asked to cancel the active operation.
    CancelRequested,
    /// The cancel call for `handle` returned.
    CancelFinished {
        handle: OperationHandle,
        session: u64,
        result: Result<(), RequestFailure>,
    },
    /// Drop the active operation and return to idle.
    Reset,
}
