//! Scripted stand-ins for the Blender add-on listener.
//!
//! Each [`FakeRemote`] accepts exactly one connection, reads the request until
//! the client half-closes, then behaves according to its [`RemoteScript`].

use bridge_core::BlenderClient;
use bridge_core::config::ConnectionConfig;

use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const HOLD_OPEN: Duration = Duration::from_secs(30);
const WATCH_INTERVAL: Duration = Duration::from_millis(20);

pub enum RemoteScript {
    /// Write the bytes, then close.
    ReplyAndClose(Vec<u8>),
    /// Write the bytes, then keep the connection open.
    ReplyAndHold(Vec<u8>),
    /// Write each part with a pause in between, then close.
    Chunks { parts: Vec<Vec<u8>>, gap: Duration },
    /// Close without writing anything.
    CloseSilently,
    /// Never write, never close.
    Hang,
}

pub struct FakeRemote {
    pub port: u16,
    /// Resolves to the raw request bytes the remote read.
    pub request: JoinHandle<Vec<u8>>,
}

impl FakeRemote {
    /// Awaits the bytes the client sent and parses them as the envelope.
    pub async fn received_envelope(self) -> Value {
        let bytes = self.request.await.expect("Remote task panicked");
        serde_json::from_slice(&bytes).expect("Client should send one JSON document")
    }
}

pub async fn start_remote(script: RemoteScript) -> FakeRemote {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake remote");
    let port = listener.local_addr().expect("No local addr").port();

    let request = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("Failed to accept");

        // The client half-closes after writing, so EOF marks the end of the request.
        let mut request = Vec::new();
        socket
            .read_to_end(&mut request)
            .await
            .expect("Failed to read request");

        match script {
            RemoteScript::ReplyAndClose(reply) => {
                socket.write_all(&reply).await.expect("Failed to reply");
                socket.shutdown().await.ok();
            }
            RemoteScript::ReplyAndHold(reply) => {
                socket.write_all(&reply).await.expect("Failed to reply");
                socket.flush().await.ok();
                hold(socket);
            }
            RemoteScript::Chunks { parts, gap } => {
                for part in parts {
                    socket.write_all(&part).await.expect("Failed to write chunk");
                    socket.flush().await.ok();
                    tokio::time::sleep(gap).await;
                }
                socket.shutdown().await.ok();
            }
            RemoteScript::CloseSilently => {
                socket.shutdown().await.ok();
            }
            RemoteScript::Hang => hold(socket),
        }

        request
    });

    FakeRemote { port, request }
}

/// Keeps the socket open in a detached task so the script can hand back the request.
fn hold(socket: TcpStream) {
    tokio::spawn(async move {
        tokio::time::sleep(HOLD_OPEN).await;
        drop(socket);
    });
}

/// A remote that never replies and reports when the client's socket is gone.
pub struct WatchingRemote {
    pub port: u16,
    /// Resolves to how long after the request the client closed its socket,
    /// or `None` if it was still open after [`HOLD_OPEN`].
    pub closed_after: JoinHandle<Option<Duration>>,
}

/// Reads the request, then writes one byte at a time without replying.
///
/// The request EOF only means the client half-closed. Writes keep succeeding
/// while the client holds the socket; once it is dropped the peer answers
/// with a reset and a later write fails.
pub async fn start_watching_remote() -> WatchingRemote {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind watching remote");
    let port = listener.local_addr().expect("No local addr").port();

    let closed_after = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("Failed to accept");
        let mut request = Vec::new();
        socket
            .read_to_end(&mut request)
            .await
            .expect("Failed to read request");

        let started = Instant::now();
        while started.elapsed() < HOLD_OPEN {
            if socket.write_all(b" ").await.is_err() {
                return Some(started.elapsed());
            }
            tokio::time::sleep(WATCH_INTERVAL).await;
        }
        None
    });

    WatchingRemote { port, closed_after }
}

/// A port that had a listener a moment ago and now refuses connections.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let port = listener.local_addr().expect("No local addr").port();
    drop(listener);
    port
}

pub fn client_for(port: u16, timeout: Duration) -> BlenderClient {
    BlenderClient::new(ConnectionConfig::new("127.0.0.1", port, timeout))
}
