//! # pdlkit
//!
//! A schema-driven RPC toolkit:
//! - PDL parser producing a language-neutral protocol definition
//! - Code generators for Rust, C# and C++
//! - Compact binary wire format with presence masks and pooled masks
//! - Length-framed TCP request/response transport
//!
//! ## Architecture Overview
//!
//! ```text
//!   schema.pdl
//!       │
//! ┌─────▼───────────────────────────────────────────────────────┐
//! │                 Schema (parse + validate)                    │
//! └─────┬───────────────────────────────────────────────────────┘
//!       │ ProtocolDefinition
//! ┌─────▼───────────────────────────────────────────────────────┐
//! │                 Codegen (rust / csharp / cpp)                │
//! └─────┬───────────────────────────────────────────────────────┘
//!       │ generated types + serializers + stubs
//!       ▼
//! ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐
//! │    Wire     │◄─┤  Registry   │◄─┤  Protocol   │◄─┤   Network   │
//! │ (mask+pool) │  │ (type tags) │  │ (envelope)  │  │ (TCP, RPC)  │
//! └─────────────┘  └─────────────┘  └─────────────┘  └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod codegen;
pub mod network;
pub mod protocol;
pub mod schema;
pub mod wire;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{GeneratorOptions, PoolConfig, ServerConfig};
pub use error::{PdlError, Result};
pub use schema::ProtocolDefinition;
pub use wire::{TypeRegistry, WireMessage};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of pdlkit
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
