use crate::{LifecycleEvent, OperationHandle, RequestFailure, SolveParams, UsageError, ValidationError};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Submit { params: SolveParams },
    StartTimer,
    StopTimer,
    Poll { handle: OperationHandle, session: u64 },
    Cancel { handle: OperationHandle, session: u64 },
    Present(Notice),
}

/// Everything the presentation sink is told about.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// One classified poll response.
    Lifecycle(LifecycleEvent),
    Submitted(OperationHandle),
    Attached(OperationHandle),
    InvalidParams(ValidationError),
    SubmitFailed(RequestFailure),
    CancelAccepted,
    CancelFailed(RequestFailure),
    Usage(UsageError),
}
