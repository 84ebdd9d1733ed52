use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::debug;
use transcript_core::{Chunk, CommandPolicy, PolicyConfig};

use crate::errors::AgentError;
use crate::query::{CancelHandle, QueryStream, query_task};
use crate::resolver::find_agent_cli;
use crate::session::SessionHandle;
use crate::transport::{AgentTransport, CliTransport, QueryRequest};

const CHUNK_BUFFER: usize = 128;

fn default_allowed_tools() -> Vec<String> {
    ["Read", "Write", "Edit", "Bash", "Glob", "Grep", "LS"]
        .iter()
        .map(|tool| (*tool).to_string())
        .collect()
}

/// Service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Working directory the agent operates in.
    pub cwd: PathBuf,
    /// Explicit CLI path. Must exist; when unset, the conventional install
    /// locations are probed instead.
    #[serde(default)]
    pub cli_path: Option<PathBuf>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_allowed_tools")]
    pub allowed_tools: Vec<String>,
    /// Shell-command blocklist applied to tool invocations.
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl AgentConfig {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            cli_path: None,
            model: None,
            system_prompt: None,
            allowed_tools: default_allowed_tools(),
            policy: PolicyConfig::default(),
        }
    }
}

/// Long-lived pipeline instance talking to the upstream agent service.
///
/// Owns the memoized executable resolution, the session handle, and the
/// active query's cancellation handle. [`AgentService::query`] never fails:
/// every failure becomes an `Error` chunk followed by the terminal `Done`.
pub struct AgentService {
    transport: Arc<dyn AgentTransport>,
    config: AgentConfig,
    policy: CommandPolicy,
    session: SessionHandle,
    resolved_cli: Mutex<Option<PathBuf>>,
    active_cancel: Mutex<Option<CancelHandle>>,
}

impl AgentService {
    /// Creates a service backed by the subprocess CLI transport.
    pub fn new(config: AgentConfig) -> Self {
        Self::with_transport(config, Arc::new(CliTransport))
    }

    /// Creates a service over a custom transport (tests, fakes, remotes).
    pub fn with_transport(config: AgentConfig, transport: Arc<dyn AgentTransport>) -> Self {
        let policy = CommandPolicy::new(&config.policy);
        Self {
            transport,
            config,
            policy,
            session: SessionHandle::new(),
            resolved_cli: Mutex::new(None),
            active_cancel: Mutex::new(None),
        }
    }

    /// The shared session handle.
    pub fn session(&self) -> SessionHandle {
        self.session.clone()
    }

    /// Clears the session so the next query starts a fresh conversation.
    pub fn reset_session(&self) {
        self.session.clear();
    }

    /// Cancels the active query, if any.
    pub fn cancel(&self) {
        let handle = self.lock(&self.active_cancel).clone();
        if let Some(handle) = handle {
            handle.cancel();
        }
    }

    /// Starts one turn and returns its pull-based chunk stream.
    pub async fn query(&self, prompt: impl Into<String>) -> QueryStream {
        let (tx, rx) = mpsc::channel(CHUNK_BUFFER);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let cancel = CancelHandle::new(cancel_tx);
        *self.lock(&self.active_cancel) = Some(cancel.clone());
        let stream = QueryStream::new(rx, cancel);

        let Some(cli_path) = self.resolve_cli() else {
            let _ = tx
                .send(Chunk::error(AgentError::CliNotFound.to_string()))
                .await;
            let _ = tx.send(Chunk::Done).await;
            return stream;
        };

        let request = QueryRequest {
            prompt: prompt.into(),
            cwd: self.config.cwd.clone(),
            cli_path,
            resume: self.session.get(),
            allowed_tools: self.config.allowed_tools.clone(),
            system_prompt: self.config.system_prompt.clone(),
            model: self.config.model.clone(),
        };

        match self.transport.start_query(request).await {
            Ok(turn) => {
                tokio::spawn(query_task(
                    turn,
                    self.policy.clone(),
                    self.session.clone(),
                    tx,
                    cancel_rx,
                ));
            }
            Err(error) => {
                let _ = tx.send(Chunk::error(error.to_string())).await;
                let _ = tx.send(Chunk::Done).await;
            }
        }
        stream
    }

    // Resolution happens once per service lifetime; only success is
    // memoized, so a later install is picked up by the next query.
    fn resolve_cli(&self) -> Option<PathBuf> {
        let mut resolved = self.lock(&self.resolved_cli);
        if resolved.is_none() {
            *resolved = match &self.config.cli_path {
                Some(path) if path.is_file() => Some(path.clone()),
                Some(path) => {
                    debug!(path = %path.display(), "configured agent CLI path does not exist");
                    None
                }
                None => find_agent_cli(),
            };
        }
        resolved.clone()
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use crate::message::RawMessage;
    use crate::transport::{Interrupter, TurnHandle};
    use async_trait::async_trait;
    use futures::stream;
    use std::sync::atomic::{AtomicBool, Ordering};

    enum FakeBehavior {
        Events(Vec<Result<RawMessage, TransportError>>),
        Pending,
        StartError(TransportError),
    }

    struct FakeTransport {
        behavior: FakeBehavior,
        interrupted: Arc<AtomicBool>,
    }

    struct RecordingInterrupter {
        flag: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Interrupter for RecordingInterrupter {
        async fn interrupt(&mut self) {
            self.flag.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl AgentTransport for FakeTransport {
        async fn start_query(&self, _request: QueryRequest) -> Result<TurnHandle, TransportError> {
            let interrupter = Box::new(RecordingInterrupter {
                flag: self.interrupted.clone(),
            });
            match &self.behavior {
                FakeBehavior::Events(events) => Ok(TurnHandle {
                    stream: Box::pin(stream::iter(events.clone())),
                    interrupter,
                }),
                FakeBehavior::Pending => Ok(TurnHandle {
                    stream: Box::pin(stream::pending()),
                    interrupter,
                }),
                FakeBehavior::StartError(error) => Err(error.clone()),
            }
        }
    }

    fn decode(raw: &str) -> Result<RawMessage, TransportError> {
        Ok(serde_json::from_str(raw).expect("decode raw message"))
    }

    fn service_with(behavior: FakeBehavior) -> (AgentService, Arc<AtomicBool>, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let cli = dir.path().join("claude");
        std::fs::write(&cli, "#!/bin/sh\n").expect("write stub");
        let mut config = AgentConfig::new(dir.path());
        config.cli_path = Some(cli);
        let interrupted = Arc::new(AtomicBool::new(false));
        let transport = Arc::new(FakeTransport {
            behavior,
            interrupted: interrupted.clone(),
        });
        (
            AgentService::with_transport(config, transport),
            interrupted,
            dir,
        )
    }

    #[tokio::test]
    async fn successful_turn_ends_in_exactly_one_done() {
        let (service, _, _dir) = service_with(FakeBehavior::Events(vec![
            decode(r#"{"type":"system","subtype":"init","session_id":"sess-9"}"#),
            decode(
                r#"{"type":"assistant","message":{"content":[
                    {"type":"text","text":"checking"},
                    {"type":"tool_use","id":"t1","name":"Read","input":{"file_path":"a.md"}}
                ]}}"#,
            ),
            decode(r#"{"type":"user","tool_use_result":"contents","parent_tool_use_id":"t1"}"#),
            decode(r#"{"type":"result"}"#),
        ]));

        let chunks = service.query("look around").await.collect().await;
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], Chunk::text("checking"));
        assert!(matches!(&chunks[1], Chunk::ToolUse { id, .. } if id == "t1"));
        assert_eq!(chunks[2], Chunk::tool_result("t1", "contents", false));
        assert_eq!(chunks[3], Chunk::Done);
        assert_eq!(
            chunks.iter().filter(|chunk| chunk.is_done()).count(),
            1,
            "exactly one terminal marker"
        );
        assert_eq!(service.session().get(), Some("sess-9".to_string()));
    }

    #[tokio::test]
    async fn upstream_failure_becomes_error_then_done() {
        let (service, _, _dir) = service_with(FakeBehavior::Events(vec![
            decode(r#"{"type":"assistant","message":{"content":[{"type":"text","text":"hi"}]}}"#),
            Err(TransportError::transport("stream collapsed")),
        ]));
        let chunks = service.query("hello").await.collect().await;
        assert_eq!(chunks[0], Chunk::text("hi"));
        assert!(matches!(&chunks[1], Chunk::Error { content } if content.contains("stream collapsed")));
        assert_eq!(chunks[2], Chunk::Done);
    }

    #[tokio::test]
    async fn start_failure_becomes_error_then_done() {
        let (service, _, _dir) = service_with(FakeBehavior::StartError(
            TransportError::transport("spawn failed"),
        ));
        let chunks = service.query("hello").await.collect().await;
        assert_eq!(chunks.len(), 2);
        assert!(matches!(&chunks[0], Chunk::Error { .. }));
        assert_eq!(chunks[1], Chunk::Done);
    }

    #[tokio::test]
    async fn cancellation_interrupts_upstream_and_terminates() {
        let (service, interrupted, _dir) = service_with(FakeBehavior::Pending);
        let mut stream = service.query("long task").await;
        stream.cancel_handle().cancel();
        let chunk = stream.next_chunk().await;
        assert_eq!(chunk, Some(Chunk::Done));
        assert!(interrupted.load(Ordering::SeqCst));
        assert_eq!(stream.next_chunk().await, None);
    }

    #[tokio::test]
    async fn service_level_cancel_reaches_the_active_query() {
        let (service, interrupted, _dir) = service_with(FakeBehavior::Pending);
        let mut stream = service.query("long task").await;
        service.cancel();
        assert_eq!(stream.next_chunk().await, Some(Chunk::Done));
        assert!(interrupted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn missing_cli_is_terminal_for_the_query() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AgentConfig::new(dir.path());
        config.cli_path = Some(dir.path().join("not-installed"));
        let service = AgentService::with_transport(
            config,
            Arc::new(FakeTransport {
                behavior: FakeBehavior::Pending,
                interrupted: Arc::new(AtomicBool::new(false)),
            }),
        );
        let chunks = service.query("hello").await.collect().await;
        assert_eq!(chunks.len(), 2);
        assert!(matches!(&chunks[0], Chunk::Error { content } if content.contains("not found")));
        assert_eq!(chunks[1], Chunk::Done);
    }

    #[tokio::test]
    async fn session_resumes_and_resets() {
        let (service, _, _dir) = service_with(FakeBehavior::Events(vec![decode(
            r#"{"type":"system","subtype":"init","session_id":"sess-1"}"#,
        )]));
        let _ = service.query("first").await.collect().await;
        assert_eq!(service.session().get(), Some("sess-1".to_string()));
        service.reset_session();
        assert_eq!(service.session().get(), None);
    }

    #[tokio::test]
    async fn blocked_commands_are_substituted_in_the_stream() {
        let (service, _, _dir) = service_with(FakeBehavior::Events(vec![decode(
            r#"{"type":"assistant","message":{"content":[
                {"type":"tool_use","id":"t1","name":"Bash","input":{"command":"rm -rf /tmp/x"}}
            ]}}"#,
        )]));
        let chunks = service.query("clean up").await.collect().await;
        assert_eq!(chunks[0], Chunk::blocked("Blocked command: rm -rf /tmp/x"));
        assert!(
            !chunks
                .iter()
                .any(|chunk| matches!(chunk, Chunk::ToolUse { .. })),
            "the vetoed invocation must not appear"
        );
    }
}
