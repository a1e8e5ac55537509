use crate::interface_adapters::net::hub::ConnId;
use crate::interface_adapters::net::session::Session;
use crate::interface_adapters::net::{should_log, throttle_start};
use crate::interface_adapters::protocol::ClientMessage;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids;

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, timeout};
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures for the owning connection's logs.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    DrainTask(JoinError),
    DrainTimeout,
    WriteTimeout,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

const MAX_INVALID_JSON: u32 = 10;
// How long teardown waits for the writer to flush queued frames and the close frame.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // Separate connection id for correlating logs before/after a player_id exists.
    let conn_id = ids::conn_id();
    let span = info_span!("conn", conn_id, player_id = tracing::field::Empty);
    run_connection(socket, state, conn_id).instrument(span).await;
}

#[derive(Debug, Default)]
struct DrainStats {
    msgs_out: u64,
    bytes_out: u64,
    pings: u64,
}

struct ReadCtx {
    msgs_in: u64,
    bytes_in: u64,
    // Frames that were not JSON at all; counted toward the disconnect limit.
    invalid_json: u32,
    // Well-formed JSON that matched no known message; dropped without counting.
    unmatched: u64,
    last_invalid_log: Instant,
    close_frame: Option<CloseFrame>,
}

enum LoopControl {
    Continue,
    Disconnect,
}

async fn run_connection(socket: WebSocket, state: Arc<AppState>, conn_id: ConnId) {
    // Register before reading anything so the connection sees every broadcast after this point.
    let outbox = state.hub.register(conn_id).await;
    let (sink, stream) = socket.split();
    let (close_tx, close_rx) = oneshot::channel::<CloseFrame>();
    let mut drain = tokio::spawn(
        drain_task(
            sink,
            outbox,
            close_rx,
            state.keepalive_interval,
            state.write_timeout,
        )
        .in_current_span(),
    );
    info!("client connected");

    let mut session = Session::new(conn_id, state);
    let mut ctx = ReadCtx {
        msgs_in: 0,
        bytes_in: 0,
        invalid_json: 0,
        unmatched: 0,
        last_invalid_log: throttle_start(),
        close_frame: None,
    };

    let drain_finished = read_loop(stream, &mut session, &mut ctx, &mut drain).await;

    match ctx.close_frame.take() {
        Some(frame) => {
            let _ = close_tx.send(frame);
        }
        None => drop(close_tx),
    }

    let dropped_frames = session.dropped_frames();
    let rejected_moves = session.rejected_moves();
    // Unregistering closes the outbox, which lets the writer flush and exit.
    session.teardown().await;

    let drain_result = match drain_finished {
        Some(result) => flatten_drain(result),
        None => match timeout(DRAIN_GRACE, &mut drain).await {
            Ok(result) => flatten_drain(result),
            Err(_) => {
                drain.abort();
                Err(NetError::DrainTimeout)
            }
        },
    };

    let out = match drain_result {
        Ok(stats) => stats,
        Err(e) => {
            debug!(error = ?e, "outbound writer ended with error");
            DrainStats::default()
        }
    };

    debug!(
        msgs_in = ctx.msgs_in,
        bytes_in = ctx.bytes_in,
        msgs_out = out.msgs_out,
        bytes_out = out.bytes_out,
        pings = out.pings,
        invalid_json = ctx.invalid_json,
        unmatched = ctx.unmatched,
        dropped_frames,
        rejected_moves,
        "connection stats"
    );
    info!("client disconnected");
}

type DrainOutcome = Result<Result<DrainStats, NetError>, JoinError>;

fn flatten_drain(result: DrainOutcome) -> Result<DrainStats, NetError> {
    result.map_err(NetError::DrainTask)?
}

/// Reads until the client goes away, a protocol violation, or the writer exits (write failure or
/// hub eviction). Returns the writer's result when that is what ended the loop.
async fn read_loop(
    mut stream: SplitStream<WebSocket>,
    session: &mut Session,
    ctx: &mut ReadCtx,
    drain: &mut JoinHandle<Result<DrainStats, NetError>>,
) -> Option<DrainOutcome> {
    loop {
        tokio::select! {
            incoming = stream.next() => {
                match handle_incoming(incoming, session, ctx).await {
                    LoopControl::Continue => {}
                    LoopControl::Disconnect => return None,
                }
            }
            finished = &mut *drain => {
                debug!("outbound writer exited; closing connection");
                return Some(finished);
            }
        }
    }
}

async fn handle_incoming(
    incoming: Option<Result<Message, axum::Error>>,
    session: &mut Session,
    ctx: &mut ReadCtx,
) -> LoopControl {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;
                handle_text(&text, session, ctx).await
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                LoopControl::Disconnect
            }
            Message::Ping(_) | Message::Pong(_) => LoopControl::Continue,
            Message::Close(_) => LoopControl::Disconnect,
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            LoopControl::Disconnect
        }
        None => {
            info!("websocket closed");
            LoopControl::Disconnect
        }
    }
}

async fn handle_text(text: &Utf8Bytes, session: &mut Session, ctx: &mut ReadCtx) -> LoopControl {
    let parse_err = match serde_json::from_str::<ClientMessage>(text.as_str()) {
        Ok(msg) => {
            session.handle(msg).await;
            return LoopControl::Continue;
        }
        Err(e) => e,
    };

    // Valid JSON with an unknown type or mismatched fields is dropped without penalty.
    if serde_json::from_str::<serde_json::Value>(text.as_str()).is_ok() {
        ctx.unmatched += 1;
        if should_log(&mut ctx.last_invalid_log) {
            debug!(error = %parse_err, "unrecognized client message dropped");
        }
        return LoopControl::Continue;
    }

    ctx.invalid_json += 1;
    if should_log(&mut ctx.last_invalid_log) {
        warn!(
            bytes = text.len(),
            error = %parse_err,
            "failed to parse client message"
        );
    }

    if ctx.invalid_json > MAX_INVALID_JSON {
        ctx.close_frame = Some(CloseFrame {
            code: close_code::POLICY,
            reason: "too many invalid messages".into(),
        });
        return LoopControl::Disconnect;
    }

    LoopControl::Continue
}

async fn write(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: Message,
    limit: Duration,
) -> Result<(), NetError> {
    match timeout(limit, sink.send(msg)).await {
        Ok(sent) => Ok(sent?),
        Err(_) => Err(NetError::WriteTimeout),
    }
}

/// Sole writer to the socket. Forwards queued frames in order and pings on a fixed interval.
/// Exits when the outbox closes (unregistered by teardown or evicted by the hub), sending the
/// pending close frame if the read side left one. A write blocked past `write_timeout` ends the
/// task too, so a client that stops reading cannot pin its connection open.
async fn drain_task(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbox: mpsc::Receiver<Utf8Bytes>,
    mut close_rx: oneshot::Receiver<CloseFrame>,
    keepalive_interval: Duration,
    write_timeout: Duration,
) -> Result<DrainStats, NetError> {
    let mut stats = DrainStats::default();
    let start = tokio::time::Instant::now() + keepalive_interval;
    let mut keepalive = interval_at(start, keepalive_interval);

    loop {
        tokio::select! {
            biased;
            frame = outbox.recv() => {
                let Some(frame) = frame else {
                    break;
                };
                let len = frame.len();
                write(&mut sink, Message::Text(frame), write_timeout).await?;
                stats.msgs_out += 1;
                stats.bytes_out += len as u64;
            }
            _ = keepalive.tick() => {
                write(&mut sink, Message::Ping(Bytes::new()), write_timeout).await?;
                stats.pings += 1;
            }
        }
    }

    if let Ok(frame) = close_rx.try_recv() {
        write(&mut sink, Message::Close(Some(frame)), write_timeout).await?;
    }
    match timeout(write_timeout, sink.close()).await {
        Ok(Err(e)) => debug!(error = ?e, "socket close error"),
        Err(_) => debug!("socket close timed out"),
        Ok(Ok(())) => {}
    }
    Ok(stats)
}
