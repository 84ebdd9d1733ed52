use futures::StreamExt as _;
use tokio::sync::{mpsc, watch};
use tracing::debug;
use transcript_core::{Chunk, CommandPolicy};

use crate::normalize::chunks_for_message;
use crate::session::SessionHandle;
use crate::transport::TurnHandle;

/// Handle used to request cooperative cancellation of a running query.
#[derive(Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub(crate) fn new(tx: watch::Sender<bool>) -> Self {
        Self { tx }
    }

    /// Requests cancellation.
    ///
    /// The query task finishes its current step, emits nothing further from
    /// messages already queued upstream, issues one interrupt request to the
    /// upstream service, and terminates with `Done`.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Pull-based chunk stream for one agent turn.
///
/// The consumer drives the transducer one chunk at a time. The stream always
/// ends with exactly one `Done` — after success, failure, and cancellation
/// alike.
pub struct QueryStream {
    rx: mpsc::Receiver<Chunk>,
    cancel: CancelHandle,
}

impl QueryStream {
    pub(crate) fn new(rx: mpsc::Receiver<Chunk>, cancel: CancelHandle) -> Self {
        Self { rx, cancel }
    }

    /// Waits for and returns the next chunk; `None` once the turn is over.
    pub async fn next_chunk(&mut self) -> Option<Chunk> {
        self.rx.recv().await
    }

    /// Returns a handle that can cancel this query.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Drains the stream to completion and returns every chunk in order.
    pub async fn collect(mut self) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.next_chunk().await {
            let done = chunk.is_done();
            chunks.push(chunk);
            if done {
                break;
            }
        }
        chunks
    }
}

/// Drives one upstream turn to completion.
///
/// Single suspension point per step (awaiting the next upstream message);
/// the cancellation flag is checked at the top of every iteration, so a
/// message already queued upstream can never produce chunks after
/// cancellation is observed.
pub(crate) async fn query_task(
    turn: TurnHandle,
    policy: CommandPolicy,
    session: SessionHandle,
    tx: mpsc::Sender<Chunk>,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let TurnHandle {
        mut stream,
        mut interrupter,
    } = turn;

    'turn: loop {
        if *cancel_rx.borrow() {
            interrupter.interrupt().await;
            break;
        }
        tokio::select! {
            changed = cancel_rx.changed() => {
                if changed.is_ok() && *cancel_rx.borrow() {
                    interrupter.interrupt().await;
                    break;
                }
            }
            next = stream.next() => match next {
                Some(Ok(message)) => {
                    let output = chunks_for_message(message, &policy);
                    if let Some(session_id) = output.session_id {
                        debug!(%session_id, "captured upstream session");
                        session.capture(session_id);
                    }
                    for chunk in output.chunks {
                        if tx.send(chunk).await.is_err() {
                            break 'turn;
                        }
                    }
                }
                Some(Err(error)) => {
                    let _ = tx.send(Chunk::error(error.to_string())).await;
                    break;
                }
                None => break,
            }
        }
    }

    let _ = tx.send(Chunk::Done).await;
}
