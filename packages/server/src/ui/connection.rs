//! Lifecycle of one live WebSocket connection.
//!
//! `Connecting → Joining → Active → Closing → Closed`
//!
//! - Joining: record participation, register with the meeting's hub and
//!   announce the join. Any failure closes the socket with 1011.
//! - Active: the read pump dispatches inbound frames to the session while the
//!   write pump drains the hub-fed and direct queues to the socket.
//! - Closing: whichever pump ends first stops the other, the connection
//!   unregisters from its hub and a leave notice is broadcast unless the user
//!   still has another connection in the meeting.

use std::{fmt::Display, future::Future, pin::pin, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::ws::{CloseFrame, Message, WebSocket, close_code},
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, MissedTickBehavior, interval_at, timeout, timeout_at},
};

use crate::{
    config::ConnectionSettings,
    domain::{ClientHandle, ConnectionId, Frame, MeetingId, UserId},
    infrastructure::dto::websocket::RoomAction,
};

use super::{
    session::{FrameHandler, Session},
    state::AppState,
};

/// Why a pump stopped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFault {
    #[error("peer closed the connection")]
    PeerClosed,

    #[error("no pong received within {0:?}")]
    ReadTimeout(Duration),

    #[error("socket write did not complete within {0:?}")]
    WriteTimeout(Duration),

    #[error("outbound queue closed")]
    QueueClosed,

    #[error("socket error: {0}")]
    Socket(String),
}

/// Serve an upgraded socket until either side goes away.
pub async fn serve_connection(
    mut socket: WebSocket,
    state: Arc<AppState>,
    meeting_id: MeetingId,
    user_id: UserId,
) {
    let service = state.chat_service.clone();
    let settings = state.settings;
    let connection_id = ConnectionId::generate();

    if let Err(e) = service.join_meeting(meeting_id, user_id).await {
        tracing::warn!(
            "User {} failed to join meeting {}: {}",
            user_id,
            meeting_id,
            e
        );
        close_with_error(&mut socket, settings.write_wait).await;
        return;
    }

    let (outbound_tx, outbound_rx) = mpsc::channel(settings.outbound_queue_capacity);
    let (direct_tx, direct_rx) = mpsc::channel(settings.direct_queue_capacity);

    let client = ClientHandle {
        connection_id,
        user_id,
        sender: outbound_tx,
    };
    if let Err(e) = service.register_client(meeting_id, client).await {
        tracing::error!(
            "Failed to register connection {} to meeting {}: {}",
            connection_id,
            meeting_id,
            e
        );
        close_with_error(&mut socket, settings.write_wait).await;
        return;
    }
    tracing::info!(
        "Connection {} (user {}) active in meeting {}",
        connection_id,
        user_id,
        meeting_id
    );

    let session = Session::new(
        service.clone(),
        meeting_id,
        user_id,
        connection_id,
        direct_tx,
        settings.history_page_size,
    );
    session.announce(RoomAction::Join).await;

    let (sink, stream) = socket.split();
    let (writer_done_tx, writer_done_rx) = oneshot::channel::<()>();
    let mut write_task = tokio::spawn(async move {
        let fault = write_pump(sink, outbound_rx, direct_rx, &settings).await;
        let _ = writer_done_tx.send(());
        fault
    });

    let writer_done = async move {
        let _ = writer_done_rx.await;
    };
    match read_pump(stream, &session, &settings, writer_done).await {
        Ok(()) => tracing::debug!("Connection {} read loop stopped by writer", connection_id),
        Err(fault) => tracing::info!("Connection {} read loop ended: {}", connection_id, fault),
    }

    // Unregistering drops the hub's sender, which lets the writer send a close frame and exit.
    service.unregister_client(meeting_id, connection_id).await;
    session.announce_leave().await;
    drop(session);

    let grace = settings.write_wait + Duration::from_secs(1);
    match timeout(grace, &mut write_task).await {
        Ok(Ok(fault)) => tracing::debug!("Connection {} write loop ended: {}", connection_id, fault),
        Ok(Err(e)) => tracing::error!("Connection {} write task failed: {}", connection_id, e),
        Err(_) => {
            tracing::warn!("Connection {} write loop did not stop, aborting", connection_id);
            write_task.abort();
        }
    }
    tracing::info!("Connection {} (user {}) closed", connection_id, user_id);
}

async fn close_with_error(socket: &mut WebSocket, write_wait: Duration) {
    let close = Message::Close(Some(CloseFrame {
        code: close_code::ERROR,
        reason: "Failed to join chat".into(),
    }));
    if timeout(write_wait, socket.send(close)).await.is_err() {
        tracing::debug!("Timed out sending close frame");
    }
}

/// Drain the hub-fed and direct queues to the socket and keep the peer alive with pings.
///
/// Every frame already queued behind the one received is written in the same
/// text message, separated by `\n`.
pub async fn write_pump<K>(
    mut sink: K,
    mut outbound: mpsc::Receiver<Frame>,
    mut direct: mpsc::Receiver<Frame>,
    settings: &ConnectionSettings,
) -> TransportFault
where
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    let mut ping = interval_at(
        Instant::now() + settings.ping_interval,
        settings.ping_interval,
    );
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut direct_open = true;

    loop {
        let message = tokio::select! {
            frame = outbound.recv() => match frame {
                Some(frame) => Message::Text(coalesce(frame, &mut outbound).into()),
                None => {
                    let close = Message::Close(Some(CloseFrame {
                        code: close_code::NORMAL,
                        reason: "".into(),
                    }));
                    let _ = send_within(&mut sink, close, settings.write_wait).await;
                    return TransportFault::QueueClosed;
                }
            },
            frame = direct.recv(), if direct_open => match frame {
                Some(frame) => Message::Text(coalesce(frame, &mut direct).into()),
                None => {
                    direct_open = false;
                    continue;
                }
            },
            _ = ping.tick() => Message::Ping(Bytes::new()),
        };

        if let Err(fault) = send_within(&mut sink, message, settings.write_wait).await {
            return fault;
        }
    }
}

fn coalesce(first: Frame, queue: &mut mpsc::Receiver<Frame>) -> String {
    let queued = queue.len();
    let mut text = String::from(&*first);
    for _ in 0..queued {
        match queue.try_recv() {
            Ok(next) => {
                text.push('\n');
                text.push_str(&next);
            }
            Err(_) => break,
        }
    }
    text
}

async fn send_within<K>(sink: &mut K, message: Message, wait: Duration) -> Result<(), TransportFault>
where
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    match timeout(wait, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(TransportFault::Socket(e.to_string())),
        Err(_) => Err(TransportFault::WriteTimeout(wait)),
    }
}

/// Read frames until the peer goes away, the pong deadline passes or `stop` fires.
///
/// `stop` is only observed while waiting for the next frame, so a frame handed
/// to `handler` always runs to completion. Returns `Ok(())` when stopped.
pub async fn read_pump<S, E, H>(
    mut stream: S,
    handler: &H,
    settings: &ConnectionSettings,
    stop: impl Future<Output = ()>,
) -> Result<(), TransportFault>
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
    H: FrameHandler + ?Sized,
{
    let mut stop = pin!(stop);
    let mut deadline = Instant::now() + settings.pong_wait;

    loop {
        let next = tokio::select! {
            biased;
            _ = &mut stop => return Ok(()),
            next = timeout_at(deadline, stream.next()) => next,
        };

        let message = match next {
            Err(_) => return Err(TransportFault::ReadTimeout(settings.pong_wait)),
            Ok(None) => return Err(TransportFault::PeerClosed),
            Ok(Some(Err(e))) => return Err(TransportFault::Socket(e.to_string())),
            Ok(Some(Ok(message))) => message,
        };

        match message {
            Message::Text(text) => handler.handle_frame(text.as_str().as_bytes()).await,
            Message::Binary(bytes) => handler.handle_frame(&bytes).await,
            Message::Pong(_) => deadline = Instant::now() + settings.pong_wait,
            // Answered by the WebSocket layer
            Message::Ping(_) => {}
            Message::Close(_) => return Err(TransportFault::PeerClosed),
        }
    }
}
