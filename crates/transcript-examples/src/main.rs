//! End-to-end demo: a scripted upstream turn flows through the normalizer
//! and the grouping transcript, then the final structure is printed.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use transcript_agent::prelude::*;
use transcript_agent::{Interrupter, RawMessage, TurnHandle};
use transcript_core::{OutlineNode, RenderedUnit, Transcript, init_observability};

const TURN: &[&str] = &[
    r#"{"type":"system","subtype":"init","session_id":"demo-session"}"#,
    r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Let me look at the daily note first."}]}}"#,
    r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"t1","name":"Read","input":{"file_path":"daily/2026-08-08.md"}}]}}"#,
    r#"{"type":"user","tool_use_result":"- [ ] water the plants","parent_tool_use_id":"t1"}"#,
    r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"t2","name":"Bash","input":{"command":"rm -rf /tmp/scratch"}}]}}"#,
    r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"t3","name":"Grep","input":{"pattern":"plants"}}]}}"#,
    r#"{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"t3","content":"daily/2026-08-07.md: watered the plants","is_error":false}]}}"#,
    r#"{"type":"assistant","message":{"content":[{"type":"text","text":"The plants were watered yesterday; today's note still lists it."}]}}"#,
    r#"{"type":"result"}"#,
];

struct ScriptedTransport;

#[async_trait]
impl AgentTransport for ScriptedTransport {
    async fn start_query(&self, _request: QueryRequest) -> Result<TurnHandle, TransportError> {
        let messages: Vec<Result<RawMessage, TransportError>> = TURN
            .iter()
            .map(|line| {
                serde_json::from_str(line).map_err(|e| TransportError::protocol(e.to_string()))
            })
            .collect();
        Ok(TurnHandle {
            stream: Box::pin(stream::iter(messages)),
            interrupter: Box::new(NoopInterrupter),
        })
    }
}

struct NoopInterrupter;

#[async_trait]
impl Interrupter for NoopInterrupter {
    async fn interrupt(&mut self) {}
}

fn print_outline(nodes: &[OutlineNode], indent: usize) {
    for node in nodes {
        match node {
            OutlineNode::Unit { kind, caption } => {
                println!("{:indent$}- [{kind:?}] {caption}", "");
            }
            OutlineNode::Group {
                label,
                has_errors,
                members,
                ..
            } => {
                let status = if *has_errors { "error" } else { "ok" };
                println!("{:indent$}+ {label} ({status})", "");
                print_outline(members, indent + 2);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_observability();

    // A stub executable keeps resolution happy; the scripted transport never
    // actually spawns it.
    let dir = tempfile::tempdir()?;
    let cli = dir.path().join("claude");
    std::fs::write(&cli, "#!/bin/sh\n")?;

    let mut config = AgentConfig::new(dir.path());
    config.cli_path = Some(cli);
    let service = AgentService::with_transport(config, Arc::new(ScriptedTransport));

    let mut stream = service.query("Did I water the plants?").await;
    let mut transcript = Transcript::new();
    transcript.push_unit(RenderedUnit::thinking("Thought for 3s"));
    while let Some(chunk) = stream.next_chunk().await {
        let done = chunk.is_done();
        transcript.push_chunk(&chunk);
        if done {
            break;
        }
    }

    println!("session: {:?}", service.session().get());
    println!("transcript:");
    print_outline(&transcript.outline(), 2);
    Ok(())
}
