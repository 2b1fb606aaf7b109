//! Configuration for pdlkit
//!
//! Centralized configuration with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PdlError, Result};

// =============================================================================
// Code Generation
// =============================================================================

/// Options for a single target generator run
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Target namespace. Empty means "derive from the schema namespace".
    pub namespace: String,

    /// Root directory for generated sources
    pub output_dir: PathBuf,

    /// Emit one serializer unit per message
    pub generate_serialization: bool,

    /// Emit client stubs and server bases per service
    pub generate_client_server: bool,

    /// Emit the registry initialization entry point
    pub generate_factories: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            output_dir: PathBuf::from("./generated"),
            generate_serialization: true,
            generate_client_server: true,
            generate_factories: true,
        }
    }
}

impl GeneratorOptions {
    /// Create a new options builder
    pub fn builder() -> GeneratorOptionsBuilder {
        GeneratorOptionsBuilder::default()
    }
}

/// Builder for GeneratorOptions
#[derive(Default)]
pub struct GeneratorOptionsBuilder {
    options: GeneratorOptions,
}

impl GeneratorOptionsBuilder {
    /// Set the target namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.options.namespace = namespace.into();
        self
    }

    /// Set the output root directory
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.output_dir = path.into();
        self
    }

    pub fn generate_serialization(mut self, enabled: bool) -> Self {
        self.options.generate_serialization = enabled;
        self
    }

    pub fn generate_client_server(mut self, enabled: bool) -> Self {
        self.options.generate_client_server = enabled;
        self
    }

    pub fn generate_factories(mut self, enabled: bool) -> Self {
        self.options.generate_factories = enabled;
        self
    }

    pub fn build(self) -> GeneratorOptions {
        self.options
    }
}

/// One generation run across several target languages.
///
/// Loaded from JSON:
/// ```text
/// {
///   "schema_path": "chat.pdl",
///   "output_root": "generated",
///   "languages": [{ "name": "rust" }, { "name": "csharp", "namespace": "Acme.Chat" }]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRun {
    /// Path to the `.pdl` schema (or compiled `.pdlc` snapshot)
    pub schema_path: PathBuf,

    /// Each enabled language writes to `{output_root}/{name}`
    pub output_root: PathBuf,

    pub languages: Vec<LanguageTarget>,
}

/// Per-language entry of a generation run
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageTarget {
    /// Target name: `rust`, `csharp` or `cpp`
    pub name: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub namespace: String,
}

fn default_enabled() -> bool {
    true
}

impl GenerationRun {
    /// Read a run description; relative paths resolve against the file's directory
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut run: GenerationRun = serde_json::from_str(&text)
            .map_err(|e| PdlError::Config(format!("{}: {}", path.display(), e)))?;

        if let Some(base) = path.parent() {
            if run.schema_path.is_relative() {
                run.schema_path = base.join(&run.schema_path);
            }
            if run.output_root.is_relative() {
                run.output_root = base.join(&run.output_root);
            }
        }
        Ok(run)
    }

    /// Languages with `enabled` set
    pub fn enabled_languages(&self) -> impl Iterator<Item = &LanguageTarget> {
        self.languages.iter().filter(|l| l.enabled)
    }

    /// Options for one language of this run
    pub fn options_for(&self, target: &LanguageTarget) -> GeneratorOptions {
        GeneratorOptions::builder()
            .namespace(target.namespace.clone())
            .output_dir(self.output_root.join(&target.name))
            .build()
    }
}

// =============================================================================
// Mask Pool
// =============================================================================

/// Sizing of the presence-mask pool
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Retained masks per word of mask width (sub-pool capacity scales with it)
    pub base_capacity: usize,

    /// Upper bound on retained masks in any one sub-pool
    pub max_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            base_capacity: 32,
            max_capacity: 256,
        }
    }
}

impl PoolConfig {
    /// Capacity of the sub-pool holding masks of `words` words
    pub fn capacity_for(&self, words: usize) -> usize {
        self.base_capacity
            .saturating_mul(words.max(1))
            .min(self.max_capacity)
            .max(1)
    }
}

// =============================================================================
// RPC Server
// =============================================================================

/// RPC server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    /// Largest accepted frame payload (bytes)
    pub max_frame_size: u32,

    /// How often the accept loop checks the shutdown flag (milliseconds)
    pub accept_poll_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:7070".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            max_frame_size: 16 * 1024 * 1024, // 16 MB
            accept_poll_ms: 10,
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the maximum frame payload size
    pub fn max_frame_size(mut self, bytes: u32) -> Self {
        self.config.max_frame_size = bytes;
        self
    }

    pub fn accept_poll_ms(mut self, ms: u64) -> Self {
        self.config.accept_poll_ms = ms;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}
