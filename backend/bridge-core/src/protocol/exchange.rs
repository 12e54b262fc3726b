//! One request/response exchange over one TCP connection.
//!
//! [`PendingExchange`] is the state machine: it consumes [`ExchangeEvent`]s
//! and yields a settlement at most once. [`run_exchange`] feeds it from the
//! socket and from a deadline that races every socket operation.

use crate::error::ProtocolError;
use crate::protocol::codec::{DecodeError, Finality, try_decode};

use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;
use std::time::Duration;

use log::{debug, trace};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::sleep as TokioSleep;

const READ_CHUNK_SIZE: usize = 8 * 1024;

pub(crate) type Settlement = Result<Value, ProtocolError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExchangePhase {
    Connecting,
    Sending,
    AwaitingResponse,
    Settled,
}

#[derive(Debug)]
pub(crate) enum ExchangeEvent {
    Connected,
    /// Envelope written and the write side shut down.
    Sent,
    Data(Vec<u8>),
    /// The remote finished its side (EOF).
    Closed,
    Failed(IoError),
    TimedOut,
}

impl ExchangeEvent {
    fn name(&self) -> &'static str {
        match self {
            ExchangeEvent::Connected => "connected",
            ExchangeEvent::Sent => "sent",
            ExchangeEvent::Data(_) => "data",
            ExchangeEvent::Closed => "closed",
            ExchangeEvent::Failed(_) => "failed",
            ExchangeEvent::TimedOut => "timed-out",
        }
    }
}

#[derive(Debug)]
pub(crate) struct PendingExchange {
    buffer: Vec<u8>,
    chunks: usize,
    phase: ExchangePhase,
    timeout: Duration,
}

impl PendingExchange {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            buffer: Vec::new(),
            chunks: 0,
            phase: ExchangePhase::Connecting,
            timeout,
        }
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> ExchangePhase {
        self.phase
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.phase == ExchangePhase::Settled
    }

    #[cfg(test)]
    pub(crate) fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Applies one event. Returns the settlement the first time an event
    /// settles the exchange and `None` for every event before or after it.
    #[track_caller]
    pub(crate) fn apply(&mut self, event: ExchangeEvent) -> Option<Settlement> {
        if self.is_settled() {
            trace!("Ignoring {} event on settled exchange", event.name());
            return None;
        }

        match event {
            ExchangeEvent::Connected => {
                self.phase = ExchangePhase::Sending;
                None
            }
            ExchangeEvent::Sent => {
                self.phase = ExchangePhase::AwaitingResponse;
                None
            }
            ExchangeEvent::Data(chunk) => {
                self.chunks += 1;
                self.buffer.extend_from_slice(&chunk);
                debug!(
                    "Received chunk {} ({} bytes, {} buffered)",
                    self.chunks,
                    chunk.len(),
                    self.buffer.len()
                );

                match try_decode(&self.buffer, Finality::Partial) {
                    Ok(value) => self.settle(Ok(value)),
                    Err(_) => None,
                }
            }
            ExchangeEvent::Closed => {
                let outcome = match try_decode(&self.buffer, Finality::Final) {
                    Ok(value) => Ok(value),
                    Err(DecodeError::Incomplete) => Err(ProtocolError::NoResponse {
                        message: "connection closed before any data arrived".to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    }),
                    Err(DecodeError::Malformed { raw }) => Err(ProtocolError::MalformedResponse {
                        raw,
                        location: ErrorLocation::from(Location::caller()),
                    }),
                };
                self.settle(outcome)
            }
            ExchangeEvent::Failed(error) => self.settle(Err(ProtocolError::from(error))),
            ExchangeEvent::TimedOut => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                self.settle(Err(ProtocolError::Timeout {
                    timeout_ms,
                    location: ErrorLocation::from(Location::caller()),
                }))
            }
        }
    }

    fn settle(&mut self, outcome: Settlement) -> Option<Settlement> {
        debug!(
            "Exchange settled from {:?} as {}",
            self.phase,
            if outcome.is_ok() { "success" } else { "failure" }
        );
        self.phase = ExchangePhase::Settled;
        Some(outcome)
    }
}

/// Socket side of an exchange. Produces one event per call.
struct Transport {
    address: String,
    payload: Option<Vec<u8>>,
    stream: Option<TcpStream>,
    read_buffer: Vec<u8>,
}

impl Transport {
    fn new(address: &str, payload: Vec<u8>) -> Self {
        Self {
            address: address.to_string(),
            payload: Some(payload),
            stream: None,
            read_buffer: vec![0; READ_CHUNK_SIZE],
        }
    }

    async fn next_event(&mut self) -> ExchangeEvent {
        let Some(stream) = self.stream.as_mut() else {
            return match TcpStream::connect(&self.address).await {
                Ok(stream) => {
                    debug!("Connected to {}", self.address);
                    self.stream = Some(stream);
                    ExchangeEvent::Connected
                }
                Err(e) => ExchangeEvent::Failed(e),
            };
        };

        if let Some(payload) = self.payload.take() {
            return match send_and_half_close(stream, &payload).await {
                Ok(()) => {
                    debug!("Wrote {} bytes to {}", payload.len(), self.address);
                    ExchangeEvent::Sent
                }
                Err(e) => ExchangeEvent::Failed(e),
            };
        }

        match stream.read(&mut self.read_buffer).await {
            Ok(0) => ExchangeEvent::Closed,
            Ok(n) => ExchangeEvent::Data(self.read_buffer[..n].to_vec()),
            Err(e) => ExchangeEvent::Failed(e),
        }
    }

    /// Drops the socket, closing it if the remote has not already.
    fn teardown(&mut self) {
        if self.stream.take().is_some() {
            trace!("Closed connection to {}", self.address);
        }
    }
}

async fn send_and_half_close(stream: &mut TcpStream, payload: &[u8]) -> Result<(), IoError> {
    stream.write_all(payload).await?;
    stream.flush().await?;
    stream.shutdown().await
}

/// Runs a complete exchange: connect, write, half-close, read until the
/// reply parses or the remote closes, all under a single deadline.
pub(crate) async fn run_exchange(
    address: &str,
    timeout: Duration,
    payload: Vec<u8>,
) -> Result<Value, ProtocolError> {
    let mut exchange = PendingExchange::new(timeout);
    let mut transport = Transport::new(address, payload);

    let deadline = TokioSleep(timeout);
    tokio::pin!(deadline);

    let settlement = loop {
        let event = tokio::select! {
            biased;
            () = &mut deadline => ExchangeEvent::TimedOut,
            event = transport.next_event() => event,
        };

        if let Some(settlement) = exchange.apply(event) {
            break settlement;
        }
    };

    transport.teardown();
    settlement
}
