//! Broker connection seam and TCP transport
//!
//! The dispatcher talks to the broker through [`BrokerConnection`], so the
//! engine runs unchanged against the real TCP transport or an in-process
//! test double. Every reply is classified into the closed [`SendOutcome`]
//! variant — acknowledged, transient, or fatal — and consumers must handle
//! all three.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use weir_protocol::{ErrorCode, Request, Response, WireRecord, MAX_MESSAGE_SIZE};

/// Broker acknowledgment for one batch
#[derive(Debug, Clone)]
pub struct BrokerAck {
    /// Partition the batch was appended to
    pub partition: u32,
    /// Offset assigned to the batch
    pub base_offset: u64,
    /// Broker append timestamp, milliseconds since epoch
    pub timestamp_ms: i64,
}

/// Retry-eligible failure: the condition can clear on its own
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransientError {
    /// The broker could not satisfy the acknowledgment requirement
    /// (e.g. not enough in-sync replicas)
    #[error("acknowledgment requirement not met: {0}")]
    AckPolicyUnmet(String),

    /// No broker reply arrived within the per-attempt timeout
    #[error("no broker reply within {0:?}")]
    RequestTimedOut(Duration),

    /// The broker answered but cannot currently serve the partition
    #[error("broker unavailable: {0}")]
    Unavailable(String),

    /// The connection failed mid-exchange; the next attempt reconnects
    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

/// Failure that must never be retried
#[derive(Debug, Clone, thiserror::Error)]
pub enum FatalError {
    /// The broker rejected the request as unservable
    #[error("rejected: {0}")]
    Rejected(String),

    /// The exchange itself is broken (undecodable frame, oversized reply)
    #[error("transport: {0}")]
    Transport(String),
}

/// Classified result of one send attempt
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// The broker acknowledged the batch at the requested acks level
    Acked(BrokerAck),
    /// Retry-eligible failure; the retry decision belongs to the caller
    Transient(TransientError),
    /// Terminal failure; surfaced to the caller without retry
    Fatal(FatalError),
}

/// A connection to the broker, as consumed by the dispatcher.
///
/// One call appends one batch to one partition. Implementations classify
/// every reply (including their own I/O failures) into [`SendOutcome`]
/// rather than surfacing raw errors.
#[async_trait]
pub trait BrokerConnection: Send + Sync {
    async fn produce(
        &self,
        topic: &str,
        partition: u32,
        acks: i8,
        records: &[WireRecord],
    ) -> SendOutcome;
}

// ============================================================================
// TCP transport
// ============================================================================

struct FramedStream {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

/// TCP transport: length-prefixed bincode frames over a single stream.
///
/// The stream is (re)established lazily; a mid-exchange I/O failure drops
/// the stream and classifies as transient, so the next attempt reconnects.
pub struct TcpBrokerConnection {
    addr: String,
    connection_timeout: Duration,
    stream: Mutex<Option<FramedStream>>,
}

impl TcpBrokerConnection {
    /// Connect eagerly so configuration errors surface at construction
    pub async fn connect(addr: impl Into<String>, connection_timeout: Duration) -> Result<Self> {
        let addr = addr.into();
        let framed = Self::open(&addr, connection_timeout)
            .await
            .map_err(Error::TransportError)?;
        info!("Connected to broker at {}", addr);
        Ok(Self {
            addr,
            connection_timeout,
            stream: Mutex::new(Some(framed)),
        })
    }

    async fn open(addr: &str, connection_timeout: Duration) -> std::result::Result<FramedStream, String> {
        let stream = tokio::time::timeout(connection_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| format!("connection timeout to {}", addr))?
            .map_err(|e| format!("failed to connect to {}: {}", addr, e))?;

        stream.set_nodelay(true).ok();

        let (read_half, write_half) = stream.into_split();
        Ok(FramedStream {
            reader: BufReader::with_capacity(64 * 1024, read_half),
            writer: BufWriter::with_capacity(64 * 1024, write_half),
        })
    }

    /// Write one length-prefixed frame and read the reply frame
    async fn exchange(framed: &mut FramedStream, payload: &[u8]) -> std::io::Result<Vec<u8>> {
        framed
            .writer
            .write_all(&(payload.len() as u32).to_be_bytes())
            .await?;
        framed.writer.write_all(payload).await?;
        framed.writer.flush().await?;

        let mut len_buf = [0u8; 4];
        framed.reader.read_exact(&mut len_buf).await?;
        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("response of {} bytes exceeds maximum {}", len, MAX_MESSAGE_SIZE),
            ));
        }

        let mut buf = vec![0u8; len];
        framed.reader.read_exact(&mut buf).await?;
        Ok(buf)
    }
}

#[async_trait]
impl BrokerConnection for TcpBrokerConnection {
    async fn produce(
        &self,
        topic: &str,
        partition: u32,
        acks: i8,
        records: &[WireRecord],
    ) -> SendOutcome {
        let request = Request::Produce {
            topic: topic.to_string(),
            partition,
            acks,
            records: records.to_vec(),
        };
        let payload = match request.to_bytes() {
            // A batch we cannot even serialize will never succeed
            Err(e) => return SendOutcome::Fatal(FatalError::Transport(e.to_string())),
            Ok(p) => p,
        };

        let mut guard = self.stream.lock().await;
        let mut framed = match guard.take() {
            Some(framed) => framed,
            None => match Self::open(&self.addr, self.connection_timeout).await {
                Ok(framed) => {
                    debug!("Reconnected to broker at {}", self.addr);
                    framed
                }
                Err(e) => return SendOutcome::Transient(TransientError::ConnectionLost(e)),
            },
        };

        match Self::exchange(&mut framed, &payload).await {
            Ok(frame) => {
                *guard = Some(framed);
                match Response::from_bytes(&frame) {
                    Ok(response) => classify_response(response),
                    // A peer speaking garbage is not retried
                    Err(e) => SendOutcome::Fatal(FatalError::Transport(e.to_string())),
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                SendOutcome::Fatal(FatalError::Transport(e.to_string()))
            }
            Err(e) => {
                // Stream stays dropped; the next attempt reconnects
                warn!("Connection to {} lost: {}", self.addr, e);
                SendOutcome::Transient(TransientError::ConnectionLost(e.to_string()))
            }
        }
    }
}

/// Map a decoded broker reply onto the closed classification
fn classify_response(response: Response) -> SendOutcome {
    match response {
        Response::Produced {
            partition,
            base_offset,
            timestamp_ms,
        } => SendOutcome::Acked(BrokerAck {
            partition,
            base_offset,
            timestamp_ms,
        }),
        Response::Error { code, message } => {
            if code.is_retriable() {
                match code {
                    ErrorCode::NotEnoughReplicas | ErrorCode::NotEnoughReplicasAfterAppend => {
                        SendOutcome::Transient(TransientError::AckPolicyUnmet(message))
                    }
                    _ => SendOutcome::Transient(TransientError::Unavailable(format!(
                        "{}: {}",
                        code, message
                    ))),
                }
            } else {
                SendOutcome::Fatal(FatalError::Rejected(format!("{}: {}", code, message)))
            }
        }
        other => SendOutcome::Fatal(FatalError::Transport(format!(
            "unexpected broker response: {:?}",
            other
        ))),
    }
}
