use std::sync::Arc;
use std::time::Instant;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, GenerationDefaults};
use crate::dispatch::GenerationRequest;
use crate::dispatch::async_poll::{PollPolicy, Poller, TerminalOutcome};
use crate::dispatch::http::RunwayClient;
use crate::error::VidshiftError;
use crate::response::{ToolMetadata, ToolResponse};
use crate::sessions::ActiveSessions;
use crate::task::{RemoteTask, TaskId};
use crate::tools::generate::{GenerateRequest, GenerateResponse};
use crate::tools::options::OptionsResponse;
use crate::tools::task::{AwaitTaskRequest, CancelResponse, TaskRequest};
use crate::validation;

#[derive(Clone)]
pub struct VidshiftServer {
    client: Arc<RunwayClient>,
    sessions: Arc<ActiveSessions>,
    poll_policy: PollPolicy,
    generation: GenerationDefaults,
    tool_router: ToolRouter<Self>,
}

impl VidshiftServer {
    /// Poll `task_id` to a terminal outcome under `policy`. The session is
    /// registered so `cancel_task` on the same id stops it; cancelling `caller`
    /// (the MCP request's token) stops only this waiter.
    pub async fn await_task_outcome(
        &self,
        task_id: &str,
        policy: PollPolicy,
        caller: &CancellationToken,
    ) -> Result<RemoteTask, VidshiftError> {
        validation::validate_task_id(task_id)?;
        let session = self.sessions.register(task_id);
        let poller = Poller::new(self.client.clone(), policy);
        let outcome = tokio::select! {
            outcome = poller.poll_until_terminal(task_id, session.token()) => outcome,
            _ = caller.cancelled() => {
                tracing::info!(task_id, "request cancelled by client; polling stopped");
                TerminalOutcome::Cancelled
            }
        };
        outcome.into_result(task_id)
    }

    /// Validate, submit and optionally wait. The task id is returned alongside
    /// the result whenever creation succeeded, even if waiting then failed.
    pub async fn generate_task(
        &self,
        req: &GenerateRequest,
        caller: &CancellationToken,
    ) -> (Option<TaskId>, Result<GenerateResponse, VidshiftError>) {
        let id = match self.create(req).await {
            Ok(id) => id,
            Err(e) => return (None, Err(e)),
        };
        if !req.wait.unwrap_or(false) {
            let response = GenerateResponse {
                task_id: id.clone(),
                task: None,
            };
            return (Some(id), Ok(response));
        }

        let result = self
            .await_task_outcome(&id, self.poll_policy, caller)
            .await
            .map(|task| GenerateResponse {
                task_id: id.clone(),
                task: Some(task),
            });
        (Some(id), result)
    }

    /// Stop local polling first so no further status query goes out, even if
    /// the remote cancellation fails.
    pub async fn cancel(&self, task_id: &str) -> Result<CancelResponse, VidshiftError> {
        validation::validate_task_id(task_id)?;
        let stopped_local_polling = self.sessions.cancel(task_id);
        let ack = self.client.cancel_task(task_id).await?;
        Ok(CancelResponse {
            cancelled: ack.cancelled,
            stopped_local_polling,
        })
    }

    /// Number of task ids with an `await_task` currently polling them.
    pub fn active_polls(&self) -> usize {
        self.sessions.active_count()
    }

    async fn create(&self, req: &GenerateRequest) -> Result<TaskId, VidshiftError> {
        let request = GenerationRequest::new(
            &req.prompt,
            req.model_or(&self.generation.model),
            req.ratio_or(&self.generation.ratio),
            &req.video_url,
            req.seed,
        )?
        .with_defaults(&self.generation);

        Ok(self.client.create_task(&request).await?.id)
    }
}

#[tool_router]
impl VidshiftServer {
    pub fn new(config: Config) -> Result<Self, VidshiftError> {
        let client = Arc::new(RunwayClient::new(&config.api)?);
        Ok(Self {
            client,
            sessions: Arc::new(ActiveSessions::new()),
            poll_policy: config.poll,
            generation: config.generation,
            tool_router: Self::tool_router(),
        })
    }

    #[tool(
        name = "generate",
        description = "Submit a video-to-video generation: an HTTPS video URL plus a text prompt. Returns the task id; set `wait` to block until the video is ready. Use `list_options` for models and ratios."
    )]
    async fn generate(
        &self,
        Parameters(req): Parameters<GenerateRequest>,
        ct: CancellationToken,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();
        let (task_id, result) = self.generate_task(&req, &ct).await;
        let metadata = ToolMetadata::new(
            "generate",
            task_id.as_deref(),
            start.elapsed().as_secs_f64(),
        );
        Ok(ToolResponse::from_result(result, metadata).into_call_tool_result())
    }

    #[tool(
        name = "task_status",
        description = "Check a generation task once. Returns status (QUEUED, RUNNING, SUCCEEDED, FAILED), output URLs when finished, progress and queue position when known.",
        annotations(read_only_hint = true)
    )]
    async fn task_status(
        &self,
        Parameters(req): Parameters<TaskRequest>,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();
        let result = self.client.get_status(&req.task_id).await;
        let metadata = ToolMetadata::new(
            "task_status",
            Some(&req.task_id),
            start.elapsed().as_secs_f64(),
        );
        Ok(ToolResponse::from_result(result, metadata).into_call_tool_result())
    }

    #[tool(
        name = "task_detail",
        description = "Fetch the raw, un-normalized task payload from the video service. For debugging.",
        annotations(read_only_hint = true)
    )]
    async fn task_detail(
        &self,
        Parameters(req): Parameters<TaskRequest>,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();
        let result = self.client.task_detail(&req.task_id).await;
        let metadata = ToolMetadata::new(
            "task_detail",
            Some(&req.task_id),
            start.elapsed().as_secs_f64(),
        );
        Ok(ToolResponse::from_result(result, metadata).into_call_tool_result())
    }

    #[tool(
        name = "await_task",
        description = "Poll a generation task until it succeeds, fails, times out or is cancelled. Stops immediately on permanent errors (HTTP 400/401/403/404) and after repeated transient errors.",
        annotations(read_only_hint = true)
    )]
    async fn await_task(
        &self,
        Parameters(req): Parameters<AwaitTaskRequest>,
        ct: CancellationToken,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();
        let result = match self.poll_policy.with_overrides(
            req.interval_ms,
            req.max_duration_ms,
            req.max_consecutive_errors,
        ) {
            Ok(policy) => self.await_task_outcome(&req.task_id, policy, &ct).await,
            Err(e) => Err(e),
        };
        let metadata = ToolMetadata::new(
            "await_task",
            Some(&req.task_id),
            start.elapsed().as_secs_f64(),
        );
        Ok(ToolResponse::from_result(result, metadata).into_call_tool_result())
    }

    #[tool(
        name = "cancel_task",
        description = "Cancel a generation task. Also stops any `await_task` polling it in this server. The service may still finish the task before honoring the cancellation."
    )]
    async fn cancel_task(
        &self,
        Parameters(req): Parameters<TaskRequest>,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();
        let result = self.cancel(&req.task_id).await;
        let metadata = ToolMetadata::new(
            "cancel_task",
            Some(&req.task_id),
            start.elapsed().as_secs_f64(),
        );
        Ok(ToolResponse::from_result(result, metadata).into_call_tool_result())
    }

    #[tool(
        name = "list_options",
        description = "List supported models, aspect ratios, prompt limits and the default polling policy.",
        annotations(read_only_hint = true)
    )]
    async fn list_options(&self) -> Result<CallToolResult, McpError> {
        let options = OptionsResponse::new(&self.generation, &self.poll_policy);
        let response = ToolResponse::success(&options, ToolMetadata::new("list_options", None, 0.0));
        Ok(response.into_call_tool_result())
    }
}

#[tool_handler]
impl ServerHandler for VidshiftServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "vidshift".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "vidshift: restyle a video with a text prompt via a remote generation service.\n\n\
                 Workflow:\n\
                 1. Call `list_options` for supported models and ratios.\n\
                 2. Call `generate` with an HTTPS `video_url` and a `prompt`. It returns a task id.\n\
                 3. Call `await_task` to block until the video is ready, or `task_status` to check once.\n\
                 4. Call `cancel_task` to stop a task you no longer need.\n\n\
                 Errors carry `metadata.error_kind` and `metadata.retryable`; do not retry when \
                 `retryable` is false."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
