use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracker_core::RequestFailure;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportFailure {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Timeout,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Errors from a single solver API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("missing or invalid credential")]
    Credential,
    #[error("operation no longer exists")]
    Gone,
    #[error("operation busy")]
    Busy,
    #[error("server returned status {0}")]
    Status(u16),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("server does not support {0}")]
    Unsupported(&'static str),
    #[error(transparent)]
    Transport(#[from] TransportFailure),
}

impl From<ClientError> for RequestFailure {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Credential => RequestFailure::Credential,
            ClientError::Gone => RequestFailure::Gone,
            ClientError::Busy => RequestFailure::Status(503),
            ClientError::Status(status) => RequestFailure::Status(status),
            ClientError::Decode(message) => RequestFailure::Decode(message),
            ClientError::Unsupported(what) => {
                RequestFailure::Network(format!("unsupported capability: {what}"))
            }
            ClientError::Transport(failure) => RequestFailure::Network(failure.to_string()),
        }
    }
}

/// Where the operation id travels on progress and cancel calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IdLocation {
    #[default]
    Body,
    Query,
}

/// Which optional parts of the protocol the deployed server supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerCapabilities {
    pub id_location: IdLocation,
    pub send_credential_digest: bool,
    pub list_operations: bool,
    pub environment_info: bool,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            id_location: IdLocation::Body,
            send_credential_digest: false,
            list_operations: true,
            environment_info: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelAck {
    Accepted,
    AlreadyPending,
}

/// Descriptive server metadata. Every field is optional because server variants differ.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub app: Option<String>,
    pub server: Option<String>,
    pub tomcat: Option<String>,
    pub spring_boot: Option<String>,
    pub servlet_api: Option<String>,
    pub java: Option<String>,
    pub num_cores: Option<u32>,
    pub max_concurrent_operations: Option<u32>,
}

impl EnvironmentInfo {
    /// One display line per known field.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(app) = &self.app {
            lines.push(app.clone());
        }
        if let Some(spring_boot) = &self.spring_boot {
            lines.push(format!("Spring Boot {spring_boot}"));
        }
        if let Some(server) = self.server.as_ref().or(self.tomcat.as_ref()) {
            lines.push(server.clone());
        }
        if let Some(servlet_api) = &self.servlet_api {
            lines.push(format!("Java Servlet API {servlet_api}"));
        }
        if let Some(java) = &self.java {
            lines.push(format!("Java {java}"));
        }
        match (self.num_cores, self.max_concurrent_operations) {
            (Some(cores), Some(max)) => lines.push(format!("{cores} cores (using {max})")),
            (Some(cores), None) => lines.push(format!("{cores} cores")),
            _ => {}
        }
        lines
    }
}

/// Operations currently running on the server, id to label.
pub type RunningOperations = BTreeMap<String, String>;

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponseBody {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunningResponseBody {
    #[serde(default)]
    pub operations: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub ids: Option<Vec<String>>,
}

impl RunningResponseBody {
    pub fn into_operations(self) -> RunningOperations {
        let mut operations = self.operations.unwrap_or_default();
        for id in self.ids.unwrap_or_default() {
            operations.entry(id).or_default();
        }
        operations
    }
}
