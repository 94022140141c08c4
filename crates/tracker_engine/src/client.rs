use std::sync::Arc;

use engine_logging::{engine_debug, engine_info, engine_warn};
use tracker_core::{OperationHandle, SolveParams, TransportOutcome};

use crate::transport::{Exchange, ExchangeResponse, Transport};
use crate::types::{RunningResponseBody, SubmitResponseBody};
use crate::{
    CancelAck, ClientError, EnvironmentInfo, IdLocation, RunningOperations, ServerCapabilities,
};

pub const SOLVE_PATH: &str = "api/solve";
pub const PROGRESS_PATH: &str = "api/getProgress";
pub const CANCEL_PATH: &str = "api/cancel";
pub const RUNNING_PATH: &str = "api/getCurrentlyRunning";
pub const VERSIONS_PATH: &str = "api/getVersions";

/// Typed access to the solver API on top of any [`Transport`].
#[derive(Clone)]
pub struct SolverClient {
    transport: Arc<dyn Transport>,
    capabilities: ServerCapabilities,
}

impl SolverClient {
    pub fn new(transport: Arc<dyn Transport>, capabilities: ServerCapabilities) -> Self {
        Self {
            transport,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> ServerCapabilities {
        self.capabilities
    }

    pub async fn submit(&self, params: &SolveParams) -> Result<OperationHandle, ClientError> {
        let mut params = params.clone();
        if !self.capabilities.send_credential_digest {
            params.credential_digest = None;
        }
        let payload =
            serde_json::to_value(&params).map_err(|err| ClientError::Decode(err.to_string()))?;

        let response = self
            .transport
            .exchange(Exchange::post(SOLVE_PATH).with_payload(payload))
            .await?;
        let response = check_status(response, true)?;

        let body: SubmitResponseBody = serde_json::from_str(&response.body)
            .map_err(|err| ClientError::Decode(err.to_string()))?;
        engine_info!("Submitted solve operation id={}", body.id);
        Ok(OperationHandle::new(body.id))
    }

    /// Raw progress call; classification happens in the core.
    pub async fn progress(&self, handle: &OperationHandle) -> TransportOutcome {
        match self.transport.exchange(self.keyed(PROGRESS_PATH, handle)).await {
            Ok(ExchangeResponse { status, body }) => {
                engine_debug!("Progress for {} returned status {}", handle, status);
                TransportOutcome::Response { status, body }
            }
            Err(failure) => {
                engine_warn!("Progress for {} failed: {}", handle, failure);
                TransportOutcome::Failed {
                    message: failure.to_string(),
                }
            }
        }
    }

    pub async fn cancel(&self, handle: &OperationHandle) -> Result<CancelAck, ClientError> {
        let response = self
            .transport
            .exchange(self.keyed(CANCEL_PATH, handle))
            .await?;
        match check_status(response, false) {
            Ok(_) => Ok(CancelAck::Accepted),
            Err(ClientError::Busy) => Ok(CancelAck::AlreadyPending),
            Err(err) => Err(err),
        }
    }

    pub async fn running_operations(&self) -> Result<RunningOperations, ClientError> {
        if !self.capabilities.list_operations {
            return Err(ClientError::Unsupported("listing running operations"));
        }
        let response = self.transport.exchange(Exchange::post(RUNNING_PATH)).await?;
        let response = check_status(response, false)?;
        let body: RunningResponseBody = serde_json::from_str(&response.body)
            .map_err(|err| ClientError::Decode(err.to_string()))?;
        Ok(body.into_operations())
    }

    pub async fn environment_info(&self) -> Result<EnvironmentInfo, ClientError> {
        if !self.capabilities.environment_info {
            return Err(ClientError::Unsupported("environment info"));
        }
        let response = self.transport.exchange(Exchange::post(VERSIONS_PATH)).await?;
        let response = check_status(response, false)?;
        serde_json::from_str(&response.body).map_err(|err| ClientError::Decode(err.to_string()))
    }

    fn keyed(&self, path: &str, handle: &OperationHandle) -> Exchange {
        let exchange = Exchange::post(path);
        match self.capabilities.id_location {
            IdLocation::Body => exchange.with_payload(serde_json::json!({ "id": handle.id() })),
            IdLocation::Query => exchange.with_query("id", handle.id()),
        }
    }
}

fn check_status(
    response: ExchangeResponse,
    unauthorized_is_credential: bool,
) -> Result<ExchangeResponse, ClientError> {
    if response.is_success() {
        return Ok(response);
    }
    Err(match response.status {
        400 => ClientError::Credential,
        401 if unauthorized_is_credential => ClientError::Credential,
        410 => ClientError::Gone,
        503 => ClientError::Busy,
        status => ClientError::Status(status),
    })
}
