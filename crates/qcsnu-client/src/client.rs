//! The service client.
//!
//! [`QuantumClient`] holds the transport and the caller's token. Job
//! operations live in [`lifecycle`](crate::lifecycle); this module has
//! authentication, the shared request path, backend and experiment calls,
//! and the one-call [`run`](QuantumClient::run) facade.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::auth::{Credentials, LoginResponse, TOKEN_ENDPOINT, Token};
use crate::backend::BackendInfo;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, ErrorKind};
use crate::experiment::{Experiment, ExperimentId, ExperimentRequest};
use crate::job::JobRequest;
use crate::lifecycle::{PollEvent, WaitOptions};
use crate::result::ExecutionResult;
use crate::transport::{HttpTransport, Request, Response, Transport};

const BACKENDS_PATH: &str = "/api/hardware/backends/";
const EXPERIMENTS_PATH: &str = "/api/experiments/";

/// Client for the quantum computing service.
///
/// Generic over the [`Transport`] so tests can drive it without a network.
///
/// ```ignore
/// use qcsnu_client::{JobRequest, QuantumClient, WaitOptions};
///
/// # async fn example() -> qcsnu_client::ClientResult<()> {
/// let mut client = QuantumClient::new(None, None)?;
/// client.login("alice", "secret").await?;
///
/// let request = JobRequest::new("OPENQASM 2.0; ...", "cassiopeia", 1024);
/// let result = client.run(&request, &WaitOptions::default()).await?;
/// println!("P(00) = {}", result.get_probability("00")?);
/// # Ok(())
/// # }
/// ```
pub struct QuantumClient<T: Transport = HttpTransport> {
    transport: T,
    /// `None` until `login`, `login_with_token` or `set_token`.
    token: Option<Token>,
}

impl QuantumClient<HttpTransport> {
    /// Create a client over HTTP.
    ///
    /// Explicit arguments take precedence over `QCSNU_BASE_URL` and
    /// `QCSNU_TOKEN`, which are read here and never again.
    pub fn new(base_url: Option<String>, token: Option<String>) -> ClientResult<Self> {
        Self::from_config(ClientConfig::resolve(base_url, token))
    }

    /// Create a client over HTTP from an explicit configuration.
    pub fn from_config(config: ClientConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(&config)?;
        debug!(base_url = %config.base_url, "Created client");
        Ok(Self {
            transport,
            token: config.token,
        })
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }
}

impl<T: Transport> QuantumClient<T> {
    /// Create a client over any transport.
    pub fn with_transport(transport: T, token: Option<Token>) -> Self {
        Self { transport, token }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Set or replace the token without contacting the service.
    pub fn set_token(&mut self, token: impl Into<Token>) {
        self.token = Some(token.into());
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Exchange a username and password for a token.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<()> {
        let body = serde_json::to_value(Credentials::new(username, password))?;
        let response = self
            .transport
            .send(Request::post(TOKEN_ENDPOINT, body))
            .await
            .map_err(|e| ClientError::Authentication(format!("Login request failed: {e}")))?;

        if response.status != 200 {
            let detail = error_message(&response.body).unwrap_or_else(|| response.body.to_string());
            return Err(ClientError::Authentication(format!("Login failed: {detail}")));
        }

        let data: LoginResponse = serde_json::from_value(response.body)
            .map_err(|e| ClientError::Authentication(format!("Login failed: {e}")))?;
        self.token = Some(Token::new(data.token));
        info!("Logged in");
        Ok(())
    }

    /// Adopt an existing token after checking that the service accepts it.
    ///
    /// A token the service refuses is discarded.
    #[instrument(skip_all)]
    pub async fn login_with_token(&mut self, token: impl Into<Token>) -> ClientResult<()> {
        self.token = Some(token.into());
        match self.list_backends().await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::Authentication => {
                self.token = None;
                Err(ClientError::Authentication("Invalid token".into()))
            }
            Err(e) => Err(e),
        }
    }

    /// Send an authenticated request and classify the response.
    pub(crate) async fn request(&self, request: Request) -> ClientResult<Value> {
        let Some(token) = &self.token else {
            return Err(ClientError::Authentication(
                "Not authenticated. Call login() first.".into(),
            ));
        };
        let response = self.transport.send(request.with_token(Some(token.clone()))).await?;
        interpret(response)
    }

    pub(crate) async fn request_as<R: DeserializeOwned>(&self, request: Request) -> ClientResult<R> {
        let body = self.request(request).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// All backends visible to the caller.
    #[instrument(skip(self))]
    pub async fn list_backends(&self) -> ClientResult<Vec<BackendInfo>> {
        self.request_as(Request::get(BACKENDS_PATH)).await
    }

    /// Live status of one backend.
    #[instrument(skip(self))]
    pub async fn get_backend_status(&self, name: &str) -> ClientResult<Map<String, Value>> {
        self.request_as(Request::get(format!("/api/hardware/status/{name}/")))
            .await
    }

    /// Latest calibration data of one backend.
    #[instrument(skip(self))]
    pub async fn get_backend_calibration(&self, name: &str) -> ClientResult<Map<String, Value>> {
        self.request_as(Request::get(format!("/api/hardware/calibration/{name}/")))
            .await
    }

    /// Register a pulse-level experiment run.
    #[instrument(skip(self, pulse_schedule))]
    pub async fn create_experiment(
        &self,
        pulse_schedule: Value,
        external_run_id: i64,
    ) -> ClientResult<Experiment> {
        let body = serde_json::to_value(ExperimentRequest {
            pulse_schedule,
            external_run_id,
        })?;
        let experiment: Experiment = self.request_as(Request::post(EXPERIMENTS_PATH, body)).await?;
        info!(experiment_id = %experiment.id, "Experiment created");
        Ok(experiment)
    }

    #[instrument(skip(self))]
    pub async fn get_experiment(&self, id: &ExperimentId) -> ClientResult<Experiment> {
        self.request_as(Request::get(format!("{EXPERIMENTS_PATH}{id}/")))
            .await
    }

    /// Submit, wait and fetch the result in one call.
    ///
    /// Wait options are validated before anything is submitted. Any failure
    /// after submission is returned as [`ClientError::Execution`] wrapping
    /// the reason.
    pub async fn run(
        &self,
        request: &JobRequest,
        options: &WaitOptions,
    ) -> ClientResult<ExecutionResult> {
        self.run_with(request, options, |_| {}).await
    }

    /// [`run`](Self::run) with a poll callback.
    #[instrument(skip_all, fields(backend = %request.backend, shots = request.shots))]
    pub async fn run_with<F>(
        &self,
        request: &JobRequest,
        options: &WaitOptions,
        on_event: F,
    ) -> ClientResult<ExecutionResult>
    where
        F: FnMut(&PollEvent<'_>),
    {
        options.validate()?;
        let job = self.submit(request).await?;

        let wrap = |source: ClientError| ClientError::Execution {
            job_id: job.id.clone(),
            source: Box::new(source),
        };
        let outcome = self
            .wait_for_job_with(&job.id, options, on_event)
            .await
            .map_err(wrap)?;
        outcome.into_result(&job.id).map_err(wrap)
    }
}

impl<T: Transport> fmt::Debug for QuantumClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuantumClient")
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

/// Map a response to its body or the error its status stands for.
pub(crate) fn interpret(response: Response) -> ClientResult<Value> {
    let Response { status, body } = response;
    match status {
        200..=299 => Ok(body),
        401 => Err(ClientError::Authentication("Authentication failed".into())),
        403 => Err(ClientError::Authentication("Permission denied".into())),
        s if s >= 500 => Err(ClientError::Server {
            status,
            message: error_message(&body).unwrap_or_else(|| "Server error".into()),
        }),
        _ => Err(ClientError::Rejected {
            status,
            message: error_message(&body).unwrap_or_else(|| "Unknown error".into()),
        }),
    }
}

/// Human-readable message from an error body.
fn error_message(body: &Value) -> Option<String> {
    if let Value::String(s) = body {
        return Some(s.clone());
    }
    ["error", "message", "detail"]
        .iter()
        .find_map(|key| body.get(key))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}
