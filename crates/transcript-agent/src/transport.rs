use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

use crate::errors::TransportError;
use crate::message::RawMessage;

/// Everything one turn needs from the service: prompt, environment, and
/// resumption state.
#[derive(Clone, Debug)]
pub struct QueryRequest {
    pub prompt: String,
    /// Working directory the agent operates in.
    pub cwd: PathBuf,
    /// Resolved executable for CLI-backed transports.
    pub cli_path: PathBuf,
    /// Session id to resume, when a prior turn captured one.
    pub resume: Option<String>,
    pub allowed_tools: Vec<String>,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
}

/// Raw message stream for one in-flight turn.
pub type MessageStream =
    Pin<Box<dyn futures::Stream<Item = Result<RawMessage, TransportError>> + Send + 'static>>;

/// Requests the upstream service interrupt the in-flight turn.
///
/// Called at most once per turn, after cancellation is observed.
#[async_trait]
pub trait Interrupter: Send {
    async fn interrupt(&mut self);
}

/// One in-flight turn: its raw message stream plus the interrupt operation.
pub struct TurnHandle {
    pub stream: MessageStream,
    pub interrupter: Box<dyn Interrupter>,
}

/// Upstream agent service abstraction: starts a turn and yields its raw,
/// loosely-typed message stream.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn start_query(&self, request: QueryRequest) -> Result<TurnHandle, TransportError>;
}

/// Default transport: spawns the resolved agent CLI in streaming-JSON mode
/// and decodes one raw message per stdout line.
pub struct CliTransport;

#[async_trait]
impl AgentTransport for CliTransport {
    async fn start_query(&self, request: QueryRequest) -> Result<TurnHandle, TransportError> {
        let mut command = Command::new(&request.cli_path);
        command
            .current_dir(&request.cwd)
            .arg("--print")
            .arg("--output-format")
            .arg("stream-json")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(resume) = &request.resume {
            command.arg("--resume").arg(resume);
        }
        if let Some(model) = &request.model {
            command.arg("--model").arg(model);
        }
        if let Some(system_prompt) = &request.system_prompt {
            command.arg("--system-prompt").arg(system_prompt);
        }
        if !request.allowed_tools.is_empty() {
            command
                .arg("--allowed-tools")
                .arg(request.allowed_tools.join(","));
        }
        command.arg(&request.prompt);

        debug!(cli = %request.cli_path.display(), cwd = %request.cwd.display(), "spawning agent CLI");
        let mut child = command
            .spawn()
            .map_err(|e| TransportError::transport(format!("failed to spawn agent CLI: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::transport("agent CLI stdout was not captured"))?;

        let lines = BufReader::new(stdout).lines();
        let stream = stream::try_unfold(lines, |mut lines| async move {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        let message =
                            serde_json::from_str::<RawMessage>(trimmed).map_err(|e| {
                                TransportError::protocol(format!("invalid message line: {e}"))
                            })?;
                        return Ok(Some((message, lines)));
                    }
                    Ok(None) => return Ok(None),
                    Err(e) => {
                        return Err(TransportError::transport(format!(
                            "agent CLI read failed: {e}"
                        )));
                    }
                }
            }
        });

        Ok(TurnHandle {
            stream: Box::pin(stream),
            interrupter: Box::new(CliInterrupter { child }),
        })
    }
}

struct CliInterrupter {
    child: Child,
}

#[async_trait]
impl Interrupter for CliInterrupter {
    async fn interrupt(&mut self) {
        // kill_on_drop backstops the case where the task is torn down first.
        if let Err(error) = self.child.start_kill() {
            debug!(%error, "agent CLI already exited");
        }
    }
}
