//! Event plumbing: the events the main loop processes and the IPC server
//! producing some of them.

use anyhow::{Context, Result};
use marquee_ipc::{
    decode_line, encode_line, IpcCommand, IpcResponse, IPC_READ_TIMEOUT, MAX_IPC_MESSAGE_SIZE,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

/// Capacity of the main event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Events that the main loop processes.
#[derive(Debug)]
pub enum LauncherEvent {
    /// An IPC command from a CLI client.
    IpcCommand {
        cmd: IpcCommand,
        responder: oneshot::Sender<IpcResponse>,
    },
    /// A key press, by binding name.
    Key(String),
    /// Time to advance animations and draw.
    Frame,
    /// Shutdown signal.
    Shutdown,
}

/// Bind the IPC socket, failing when another launcher already holds it.
pub async fn bind_ipc(address: &str) -> Result<TcpListener> {
    TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind IPC socket {} (is marquee already running?)", address))
}

/// Accept connections and dispatch their commands until the event loop stops.
pub async fn run_ipc_server(listener: TcpListener, event_tx: mpsc::Sender<LauncherEvent>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to accept client connection: {}", e);
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };
        if event_tx.is_closed() {
            break;
        }
        debug!("Client connected from {}", peer);

        let event_tx = event_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, event_tx).await {
                warn!("Client handler error: {}", e);
            }
        });
    }
}

/// Handle a single client connection: one request line, one response line.
async fn handle_client(stream: TcpStream, event_tx: mpsc::Sender<LauncherEvent>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader.take(MAX_IPC_MESSAGE_SIZE));
    let mut line = String::new();

    // Read command (single line of JSON) with timeout and size bound
    let bytes_read = match tokio::time::timeout(IPC_READ_TIMEOUT, reader.read_line(&mut line)).await {
        Ok(result) => result?,
        Err(_) => {
            // Client did not send in time, silently close
            return Ok(());
        }
    };
    if bytes_read == 0 {
        return Ok(());
    }
    debug!("Received command: {}", line.trim());

    let response = match decode_line::<IpcCommand>(&line) {
        Ok(cmd) => dispatch(cmd, &event_tx).await,
        Err(e) => IpcResponse::error(format!("Invalid command: {}", e)),
    };

    let response_line = encode_line(&response).unwrap_or_else(|e| {
        warn!("Failed to serialize IPC response: {}", e);
        "{\"status\":\"error\",\"message\":\"Internal serialization error\"}\n".to_string()
    });
    writer.write_all(response_line.as_bytes()).await?;
    writer.shutdown().await?;
    Ok(())
}

async fn dispatch(cmd: IpcCommand, event_tx: &mpsc::Sender<LauncherEvent>) -> IpcResponse {
    let (responder, response) = oneshot::channel();
    if event_tx
        .send(LauncherEvent::IpcCommand { cmd, responder })
        .await
        .is_err()
    {
        return IpcResponse::error("Launcher is shutting down");
    }
    response
        .await
        .unwrap_or_else(|_| IpcResponse::error("Failed to get response from launcher"))
}

/// Spawn a named forwarding thread that receives events from a std::sync::mpsc
/// channel and forwards them to the event loop.
pub fn spawn_forwarding_thread<T: Send + 'static>(
    name: &str,
    receiver: std::sync::mpsc::Receiver<T>,
    sender: mpsc::Sender<LauncherEvent>,
    map_fn: impl Fn(T) -> LauncherEvent + Send + 'static,
) -> Result<std::thread::JoinHandle<()>> {
    let thread_name = name.to_string();
    std::thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            while let Ok(event) = receiver.recv() {
                if sender.blocking_send(map_fn(event)).is_err() {
                    break; // Channel closed, launcher shutting down
                }
            }
        })
        .with_context(|| format!("Failed to spawn {} thread", thread_name))
}

/// Send [`LauncherEvent::Frame`] every `1/fps` seconds until the loop hangs up.
pub fn spawn_frame_timer(fps: u32, event_tx: mpsc::Sender<LauncherEvent>) -> tokio::task::JoinHandle<()> {
    let period = Duration::from_micros(1_000_000 / u64::from(fps.max(1)));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match event_tx.try_send(LauncherEvent::Frame) {
                // A busy loop drops frames instead of queueing them
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Closed(_)) => break,
            }
        }
    })
}
