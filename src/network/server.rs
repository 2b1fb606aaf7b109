//! TCP Server
//!
//! Accepts connections and hands each one to its own thread.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::connection::{Connection, ConnectionContext};
use super::dispatch::Dispatcher;
use crate::config::{PoolConfig, ServerConfig};
use crate::error::{PdlError, Result};
use crate::wire::{MaskPool, TypeRegistry};

/// RPC server over length-framed TCP
///
/// ## Concurrency
/// - One accept loop (the thread calling `run`)
/// - One thread per connection, one request in flight per connection
/// - `registry` and `dispatcher` are read-only once the server exists
/// - `pool` is shared by every connection
pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
    context: ConnectionContext,
    active_connections: Arc<AtomicUsize>,
}

impl Server {
    /// Bind the listen address.
    ///
    /// The registry must already hold every type the services exchange.
    pub fn bind(
        config: ServerConfig,
        registry: Arc<TypeRegistry>,
        dispatcher: Arc<Dispatcher>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        let local_addr = listener.local_addr()?;

        // Non-blocking accept so the loop can notice shutdown
        listener.set_nonblocking(true)?;

        let context = ConnectionContext {
            registry,
            dispatcher,
            pool: Arc::new(MaskPool::new(PoolConfig::default())),
            shutdown: Arc::new(AtomicBool::new(false)),
            max_frame_size: config.max_frame_size,
        };

        Ok(Self {
            config,
            listener,
            local_addr,
            context,
            active_connections: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Replace the mask pool shared by connections
    pub fn with_pool(mut self, pool: Arc<MaskPool>) -> Self {
        self.context.pool = pool;
        self
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Flag that stops the accept loop when set
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.context.shutdown)
    }

    /// Signal the server to shutdown gracefully
    ///
    /// The accept loop exits at its next poll; connection threads stop after
    /// their current request.
    pub fn shutdown(&self) {
        self.context.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&self) -> Result<()> {
        tracing::info!(
            "Serving {} services on {}",
            self.context.dispatcher.service_count(),
            self.local_addr
        );

        let poll = Duration::from_millis(self.config.accept_poll_ms.max(1));

        while !self.context.shutdown.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, peer)) => self.spawn_connection(stream, peer),
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(poll),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => tracing::warn!("Accept failed: {}", e),
            }
        }

        tracing::info!("Server on {} stopped accepting", self.local_addr);
        Ok(())
    }

    /// Run the accept loop on a background thread
    pub fn spawn(self) -> Result<ServerHandle> {
        let local_addr = self.local_addr;
        let shutdown = self.shutdown_flag();
        let thread = thread::Builder::new()
            .name(format!("pdlkit-accept-{}", local_addr.port()))
            .spawn(move || self.run())?;

        Ok(ServerHandle {
            local_addr,
            shutdown,
            thread: Some(thread),
        })
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let active = self.active_connections.fetch_add(1, Ordering::SeqCst);
        if active >= self.config.max_connections {
            self.active_connections.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(
                "Rejecting {}: {} connections already open",
                peer,
                self.config.max_connections
            );
            return;
        }

        let context = self.context.clone();
        let counter = Arc::clone(&self.active_connections);
        let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

        let spawned = thread::Builder::new()
            .name(format!("pdlkit-conn-{}", peer))
            .spawn(move || {
                let result = stream
                    .set_nonblocking(false)
                    .map_err(PdlError::from)
                    .and_then(|_| Connection::new(stream, context))
                    .and_then(|mut conn| {
                        conn.set_timeouts(read_ms, write_ms)?;
                        conn.handle()
                    });
                if let Err(e) = result {
                    tracing::warn!("Connection {} ended with error: {}", peer, e);
                }
                counter.fetch_sub(1, Ordering::SeqCst);
            });

        if let Err(e) = spawned {
            self.active_connections.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!("Cannot spawn handler for {}: {}", peer, e);
        }
    }
}

/// Handle to a server running on a background thread
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<Result<()>>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and wait for the accept loop to exit
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::Relaxed);
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| PdlError::Network("accept thread panicked".to_string()))?,
            None => Ok(()),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
