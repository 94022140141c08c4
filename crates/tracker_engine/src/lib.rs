//! Tracker engine: solver API transport and effect execution for the lifecycle tracker.
mod client;
mod credential;
mod tracker;
mod transport;
mod types;

pub use client::{
    SolverClient, CANCEL_PATH, PROGRESS_PATH, RUNNING_PATH, SOLVE_PATH, VERSIONS_PATH,
};
pub use credential::credential_digest;
pub use tracker::{ChannelSink, PresentationSink, TrackerHandle, TrackerSettings};
pub use transport::{
    Exchange, ExchangeResponse, ReqwestTransport, Transport, TransportSettings,
};
pub use types::{
    CancelAck, ClientError, EnvironmentInfo, FailureKind, IdLocation, RunningOperations,
    ServerCapabilities, TransportFailure,
};
