//! Tracker core: pure lifecycle state machine, response classifier and view-model helpers.
mod classify;
mod effect;
mod msg;
mod params;
mod snapshot;
mod state;
mod update;
mod view_model;

pub use classify::{classify, LifecycleEvent, TransportOutcome};
pub use effect::{Effect, Notice};
pub use msg::Msg;
pub use params::{SolveForm, SolveParams, ValidationError, DEFAULT_REGEX};
pub use snapshot::{parse_progress, ProgressReport, ProgressSnapshot, RunStatus};
pub use state::{
    ErrorPolicy, LifecycleState, OperationHandle, RequestFailure, TrackerPolicy, TrackerState,
    UsageError,
};
pub use update::update;
pub use view_model::{ParamsSummary, TrackerViewModel};
