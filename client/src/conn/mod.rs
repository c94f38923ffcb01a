// Connection manager: owns the transport, the reconnect cycle, and
// inbound frame decoding.
// Invariants: one connection attempt in flight at a time; the retry
// deadline is the single cancellable unit; frames are decoded and
// fanned out in wire order before the next frame is read.

mod state;
pub mod ws;

pub use state::{ConnAction, ConnEvent, ConnMachine, ConnState};

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use woltride_core::envelope::{self, Envelope};

use crate::constants::COMMAND_QUEUE_CAP;
use crate::hub::SubscriptionHub;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Factory for the persistent duplex connection. This core is
/// receive-only, so no send surface is exposed.
pub trait Transport: Send + 'static {
    type Conn: Connection;

    fn open(&mut self) -> BoxFuture<'_, Result<Self::Conn, TransportError>>;
}

/// One live connection. `next_frame` yields inbound text frames and
/// returns `None` once the remote has closed.
pub trait Connection: Send + 'static {
    fn next_frame(&mut self) -> BoxFuture<'_, Option<Result<String, TransportError>>>;

    fn close(&mut self) -> BoxFuture<'_, ()>;
}

#[derive(Clone, Copy, Debug)]
pub enum ConnCommand {
    Connect,
    Disconnect,
}

/// Owned handle to the connection driver task. Commands are queued;
/// the current state is observable through a watch channel (the live
/// connection-status indicator).
pub struct ConnectionManager {
    cmd_tx: mpsc::Sender<ConnCommand>,
    state_rx: watch::Receiver<ConnState>,
}

impl ConnectionManager {
    /// Build the manager handle and its driver future. The caller
    /// spawns the driver; dropping the handle tears the driver down.
    pub fn new<T: Transport>(
        transport: T,
        hub: SubscriptionHub,
        retry_delay: Duration,
    ) -> (Self, impl Future<Output = ()> + Send) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_CAP);
        let (state_tx, state_rx) = watch::channel(ConnState::Disconnected);
        let driver = drive(transport, hub, retry_delay, cmd_rx, state_tx);
        (Self { cmd_tx, state_rx }, driver)
    }

    pub async fn connect(&self) {
        let _ = self.cmd_tx.send(ConnCommand::Connect).await;
    }

    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(ConnCommand::Disconnect).await;
    }

    pub fn state(&self) -> ConnState {
        *self.state_rx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnState> {
        self.state_rx.clone()
    }
}

async fn drive<T: Transport>(
    mut transport: T,
    hub: SubscriptionHub,
    retry_delay: Duration,
    mut cmd_rx: mpsc::Receiver<ConnCommand>,
    state_tx: watch::Sender<ConnState>,
) {
    let mut machine = ConnMachine::new();
    let mut conn: Option<T::Conn> = None;
    let mut retry_at: Option<Instant> = None;
    let mut shutdown = false;

    loop {
        let event = tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(ConnCommand::Connect) => ConnEvent::ConnectRequested,
                Some(ConnCommand::Disconnect) => ConnEvent::DisconnectRequested,
                // All handles dropped: tear down and exit.
                None => {
                    shutdown = true;
                    ConnEvent::DisconnectRequested
                }
            },
            frame = next_frame(&mut conn) => match frame {
                Some(Ok(text)) => {
                    deliver(&hub, &text);
                    continue;
                }
                Some(Err(err)) => {
                    warn!(%err, "transport error");
                    conn = None;
                    ConnEvent::TransportClosed
                }
                None => {
                    info!("connection closed by remote");
                    conn = None;
                    ConnEvent::TransportClosed
                }
            },
            _ = wait_until(retry_at) => {
                retry_at = None;
                ConnEvent::RetryElapsed
            }
        };

        match machine.handle(event) {
            ConnAction::None => {}
            ConnAction::OpenTransport => {
                publish_state(&state_tx, machine.state());
                match transport.open().await {
                    Ok(active) => {
                        machine.handle(ConnEvent::Opened);
                        conn = Some(active);
                        info!("connected");
                    }
                    Err(err) => {
                        warn!(%err, "connect failed");
                        if machine.handle(ConnEvent::TransportClosed) == ConnAction::ScheduleRetry
                        {
                            retry_at = Some(Instant::now() + retry_delay);
                        }
                    }
                }
                publish_state(&state_tx, machine.state());
            }
            ConnAction::ScheduleRetry => {
                retry_at = Some(Instant::now() + retry_delay);
                publish_state(&state_tx, machine.state());
                info!(delay_ms = retry_delay.as_millis() as u64, "reconnect scheduled");
            }
            ConnAction::Teardown => {
                retry_at = None;
                if let Some(mut active) = conn.take() {
                    active.close().await;
                }
                publish_state(&state_tx, machine.state());
            }
        }

        if shutdown {
            break;
        }
    }
}

async fn next_frame<C: Connection>(
    conn: &mut Option<C>,
) -> Option<Result<String, TransportError>> {
    match conn.as_mut() {
        Some(active) => active.next_frame().await,
        None => std::future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn publish_state(state_tx: &watch::Sender<ConnState>, next: ConnState) {
    state_tx.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}

/// Decode one inbound frame and fan it out. Malformed frames are
/// dropped without affecting the connection.
fn deliver(hub: &SubscriptionHub, raw: &str) {
    match envelope::decode(raw) {
        Ok(decoded) => {
            match &decoded {
                Envelope::DeviceUpdate(update) => {
                    if update.skipped > 0 {
                        warn!(skipped = update.skipped, "undecodable device entries dropped");
                    }
                    debug!(devices = update.devices.len(), "device update received");
                }
                Envelope::Ignored { message_type } => {
                    debug!(%message_type, "ignoring message type");
                }
            }
            hub.publish(&decoded);
        }
        Err(err) => {
            warn!(%err, "malformed frame dropped");
        }
    }
}
