//! Connection Handler
//!
//! Serves one client connection: read frame, dispatch, write frame, repeat.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::dispatch::Dispatcher;
use crate::error::{PdlError, Result};
use crate::protocol::{
    decode_method_key, encode_error, encode_response, read_frame, write_frame, ErrorCode,
    RpcError, RpcResponse,
};
use crate::wire::{MaskPool, TypeRegistry, WireReader, WireWriter};

/// Shared, read-only state every connection needs
#[derive(Clone)]
pub struct ConnectionContext {
    pub registry: Arc<TypeRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub pool: Arc<MaskPool>,
    pub shutdown: Arc<AtomicBool>,
    pub max_frame_size: u32,
}

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    context: ConnectionContext,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O on cloned read/write handles
    pub fn new(stream: TcpStream, context: ConnectionContext) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            context,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 = none)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads one request at a time and answers it before reading the next.
    /// Returns when the client disconnects, an I/O error occurs, or the
    /// server is shutting down.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        while !self.context.shutdown.load(Ordering::Relaxed) {
            let payload = match read_frame(&mut self.reader, self.context.max_frame_size) {
                Ok(payload) => payload,
                Err(PdlError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected ({:?})", self.peer_addr, e.kind());
                    return Ok(());
                }
                Err(PdlError::Io(ref e))
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) =>
                {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    // Oversized frame: the stream can no longer be trusted
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    let _ = self.send_error(&RpcError::bad_request(e.to_string()));
                    return Err(e);
                }
            };

            let response = self.process(&payload);

            if let Err(e) = write_frame(&mut self.writer, &response) {
                if let PdlError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }

        tracing::debug!("Closing {} for shutdown", self.peer_addr);
        Ok(())
    }

    /// Decode, dispatch and encode one request; always yields a response payload
    fn process(&self, payload: &[u8]) -> Vec<u8> {
        let registry = &self.context.registry;
        let mut reader = WireReader::with_pool(payload, Arc::clone(&self.context.pool));

        let outcome = match decode_method_key(&mut reader) {
            Ok(key) => {
                tracing::trace!("Request {} from {}", key, self.peer_addr);
                match registry.read_object(&mut reader) {
                    Ok(request) => self.context.dispatcher.dispatch(&key, request),
                    Err(e) => Err(RpcError::bad_request(format!(
                        "cannot decode payload for {}: {}",
                        key, e
                    ))),
                }
            }
            Err(e) => Err(RpcError::bad_request(e.to_string())),
        };

        let response = match outcome {
            Ok(object) => RpcResponse::Ok(object),
            Err(err) => {
                tracing::debug!("Request from {} failed: {}", self.peer_addr, err);
                RpcResponse::Err(err)
            }
        };

        let mut writer = WireWriter::with_pool(Arc::clone(&self.context.pool));
        if let Err(e) = encode_response(registry, &response, &mut writer) {
            tracing::warn!("Cannot encode response for {}: {}", self.peer_addr, e);
            writer.clear();
            let err = RpcError::new(ErrorCode::Internal, format!("cannot encode response: {}", e));
            // Error envelopes hold only an i32 and a string
            let _ = encode_error(&err, &mut writer);
        }
        writer.into_vec()
    }

    fn send_error(&mut self, err: &RpcError) -> Result<()> {
        let mut writer = WireWriter::new();
        encode_error(err, &mut writer)?;
        write_frame(&mut self.writer, writer.as_slice())
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
    )
}
