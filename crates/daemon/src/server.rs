// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.
//!
//! A connection that says `hello` becomes a context: its context group stays
//! alive until the connection closes. Lock requests are submitted in the
//! order they are read; their answers are written as they resolve, so a
//! client may have several requests in flight.

use std::sync::Arc;
use std::time::Duration;

use swl_adapters::{ContextAttachment, ContextRegistry};
use swl_core::{LockRequest, HOLDER_KEY_SEPARATOR};
use swl_engine::LockService;
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::UnixStream;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info, warn};

use crate::protocol::{self, LockSummary, Request, Response, DEFAULT_TIMEOUT};

/// Outstanding responses buffered per connection
const RESPONSE_BUFFER: usize = 64;

/// Handles shared by all connections
#[derive(Clone)]
pub struct ServerContext {
    pub service: LockService,
    pub registry: ContextRegistry,
    pub shutdown: Arc<Notify>,
    pub sweep_interval: Duration,
}

/// Context group bound to one connection
struct Session {
    context_group: String,
    _attachment: ContextAttachment,
}

/// Handle a single client connection until it closes
pub async fn handle_connection(ctx: ServerContext, stream: UnixStream) -> Result<(), ServerError> {
    let (mut reader, writer) = stream.into_split();
    let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);
    let writer_task = tokio::spawn(write_responses(writer, rx));

    let mut session: Option<Session> = None;
    let mut first = true;

    loop {
        // Only the opening message is timed; a context may idle while it holds locks
        let body = if first {
            tokio::time::timeout(DEFAULT_TIMEOUT, protocol::read_message(&mut reader))
                .await
                .unwrap_or(Err(protocol::ProtocolError::Timeout))
        } else {
            protocol::read_message(&mut reader).await
        };
        first = false;

        let body = match body {
            Ok(body) => body,
            Err(protocol::ProtocolError::Timeout) => {
                error!("Request read timeout");
                return Err(ServerError::Timeout);
            }
            Err(protocol::ProtocolError::ConnectionClosed) => {
                debug!("Client disconnected");
                break;
            }
            Err(e) => {
                error!("Failed to read request: {}", e);
                return Err(ServerError::Protocol(e));
            }
        };

        // The frame was read whole, so the stream is still in step
        let request: Request = match protocol::decode(&body) {
            Ok(req) => req,
            Err(e) => {
                warn!("Rejecting malformed request: {}", e);
                let response = Response::Error {
                    id: protocol::request_id(&body),
                    message: format!("malformed request: {e}"),
                };
                send(&tx, response).await;
                continue;
            }
        };

        debug!("Received request: {:?}", request);

        match request {
            Request::Hello { context_group } => {
                let response = match &session {
                    Some(existing) => Response::Error {
                        id: None,
                        message: format!(
                            "connection already attached to {}",
                            existing.context_group
                        ),
                    },
                    None if context_group
                        .as_deref()
                        .is_some_and(|group| group.contains(HOLDER_KEY_SEPARATOR)) =>
                    {
                        Response::Error {
                            id: None,
                            message: format!(
                                "context group must not contain '{HOLDER_KEY_SEPARATOR}'"
                            ),
                        }
                    }
                    None => {
                        let context_group = context_group
                            .filter(|group| !group.is_empty())
                            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                        info!(context = %context_group, "context attached");
                        let attachment = ctx.registry.attach(context_group.clone());
                        session = Some(Session {
                            context_group: context_group.clone(),
                            _attachment: attachment,
                        });
                        Response::Welcome { context_group }
                    }
                };
                send(&tx, response).await;
            }

            Request::Lock {
                id,
                name,
                kind,
                sub_context,
            } => {
                let Some(current) = &session else {
                    let message = "hello required before lock requests".to_string();
                    send(&tx, Response::Error { id: Some(id), message }).await;
                    continue;
                };
                let request = LockRequest::new(name, kind, current.context_group.clone(), sub_context);
                submit(&ctx.service, request, id, tx.clone()).await;
            }

            other => {
                let response = handle_control(&ctx, other).await;
                send(&tx, response).await;
            }
        }
    }

    if let Some(session) = session {
        info!(context = %session.context_group, "context detached");
    }

    // Nobody is left to read answers still pending in the lock service
    writer_task.abort();
    Ok(())
}

/// Submit a lock request and answer it once its ticket resolves
async fn submit(service: &LockService, request: LockRequest, id: u64, tx: mpsc::Sender<Response>) {
    let ticket = match service.submit(request).await {
        Ok(ticket) => ticket,
        Err(e) => {
            send(&tx, Response::Error { id: Some(id), message: e.to_string() }).await;
            return;
        }
    };

    tokio::spawn(async move {
        let response = match ticket.wait().await {
            Some(outcome) => Response::Done { id, outcome },
            None => Response::Error {
                id: Some(id),
                message: "request dropped by lock service".to_string(),
            },
        };
        send(&tx, response).await;
    });
}

/// Answer a request that does not need a context
async fn handle_control(ctx: &ServerContext, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Status => match ctx.service.snapshot().await {
            Ok(snapshot) => Response::Status {
                locks: snapshot.into_iter().map(LockSummary::from).collect(),
                contexts: ctx.registry.len(),
                sweep_interval_ms: u64::try_from(ctx.sweep_interval.as_millis())
                    .unwrap_or(u64::MAX),
            },
            Err(e) => Response::Error {
                id: None,
                message: e.to_string(),
            },
        },

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }

        Request::Hello { .. } | Request::Lock { .. } => Response::Error {
            id: None,
            message: "unexpected request".to_string(),
        },
    }
}

async fn send(tx: &mpsc::Sender<Response>, response: Response) {
    if tx.send(response).await.is_err() {
        debug!("Dropping response for closed connection");
    }
}

async fn write_responses(
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::Receiver<Response>,
) -> Result<(), ServerError> {
    while let Some(response) = rx.recv().await {
        debug!("Sending response: {:?}", response);
        protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
            .await
            .map_err(ServerError::Protocol)?;
    }
    Ok(())
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}
