//! Network Module
//!
//! TCP RPC server and client.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One thread per connection, strictly request/response
//! - Requests routed through the `Dispatcher`
//!
//! ## Connection States
//! ```text
//! Connected ─► ReadLength ─► ReadPayload ─► Dispatch ─► WriteLength ─► WritePayload ─┐
//!                  ▲                                                                 │
//!                  └─────────────────────────────────────────────────────────────────┘
//!              (EOF / error / shutdown) ─► Disconnected
//! ```

mod client;
mod connection;
mod dispatch;
mod server;

pub use client::RpcClient;
pub use connection::{Connection, ConnectionContext};
pub use dispatch::{Dispatcher, MethodFn, ServiceDispatch};
pub use server::{Server, ServerHandle};
