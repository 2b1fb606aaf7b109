//! RPC Client
//!
//! Blocking request/response calls over one TCP connection.

use std::any::Any;
use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{PdlError, Result};
use crate::protocol::{
    decode_response, encode_request, read_frame, write_frame, RpcResponse, MAX_PAYLOAD_SIZE,
};
use crate::wire::{downcast, MaskPool, TypeRegistry, WireReader, WireWriter};

/// A connection to an RPC server
///
/// Calls block until the response arrives or the connection fails; there is
/// no timeout unless one is set with `set_timeout`.
pub struct RpcClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    registry: Arc<TypeRegistry>,
    pool: Option<Arc<MaskPool>>,
    max_frame_size: u32,
}

impl RpcClient {
    /// Connect to a server.
    ///
    /// `registry` must know every request and response type used.
    pub fn connect(addr: impl ToSocketAddrs, registry: Arc<TypeRegistry>) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        tracing::debug!("Connected to {}", stream.peer_addr()?);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            registry,
            pool: None,
            max_frame_size: MAX_PAYLOAD_SIZE,
        })
    }

    /// Borrow presence masks from a shared pool
    pub fn with_pool(mut self, pool: Arc<MaskPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_max_frame_size(mut self, bytes: u32) -> Self {
        self.max_frame_size = bytes;
        self
    }

    /// Set read and write timeouts; `None` blocks indefinitely
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        self.writer.get_ref().set_write_timeout(timeout)?;
        Ok(())
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Send one request and return the decoded envelope as-is.
    ///
    /// A remote failure is `Ok(RpcResponse::Err(..))`: the caller must check.
    pub fn call_raw(
        &mut self,
        method_key: &str,
        request: Option<&(dyn Any + Send)>,
    ) -> Result<RpcResponse> {
        let mut writer = match &self.pool {
            Some(pool) => WireWriter::with_pool(Arc::clone(pool)),
            None => WireWriter::new(),
        };
        encode_request(&self.registry, method_key, request, &mut writer)?;
        write_frame(&mut self.writer, writer.as_slice())?;

        let payload = read_frame(&mut self.reader, self.max_frame_size)?;
        let mut reader = match &self.pool {
            Some(pool) => WireReader::with_pool(&payload, Arc::clone(pool)),
            None => WireReader::new(&payload),
        };
        let response = decode_response(&self.registry, &mut reader)?;
        if !reader.is_empty() {
            return Err(PdlError::Protocol(format!(
                "{} trailing bytes after response to {}",
                reader.remaining(),
                method_key
            )));
        }

        tracing::trace!("{} -> {:?}", method_key, response);
        Ok(response)
    }

    /// Typed call.
    ///
    /// Remote failures become `PdlError::Remote`; a null or differently-typed
    /// result becomes `PdlError::TypeMismatch`.
    pub fn call<Req, Resp>(&mut self, method_key: &str, request: &Req) -> Result<Resp>
    where
        Req: Any + Send,
        Resp: Any,
    {
        match self.call_raw(method_key, Some(request as &(dyn Any + Send)))? {
            RpcResponse::Ok(Some(object)) => downcast::<Resp>(object),
            RpcResponse::Ok(None) => Err(PdlError::TypeMismatch {
                expected: std::any::type_name::<Resp>().to_string(),
                actual: "null".to_string(),
            }),
            RpcResponse::Err(err) => Err(err.into()),
        }
    }
}
