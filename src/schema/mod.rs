//! Schema Module
//!
//! Protocol definition language front end.
//!
//! ## Responsibilities
//! - Parse PDL text into the IR, collecting diagnostics for skipped input
//! - Validate names, field ids and type references
//! - Freeze a definition into a checksummed snapshot
//!
//! ## Pipeline
//! ```text
//!   .pdl text ──► parser ──► ProtocolDefinition ──► validate ──► codegen
//!                                  │
//!                                  └──► snapshot (.pdlc)
//! ```

pub mod diagnostic;
pub mod ir;
pub mod parser;
pub mod snapshot;
pub mod validate;

use std::fs;
use std::path::Path;

pub use diagnostic::{Diagnostic, Severity};
pub use ir::{
    FieldType, ProtocolDefinition, ProtocolField, ProtocolMessage, ProtocolMethod, ProtocolService,
};
pub use parser::{parse, ParseOutput};
pub use validate::validate;

use crate::error::Result;

/// Load a definition from a `.pdl` source or a `.pdlc` snapshot.
///
/// Parse diagnostics are returned alongside; snapshots never carry any.
pub fn load(path: &Path) -> Result<ParseOutput> {
    if path.extension().and_then(|e| e.to_str()) == Some("pdlc") {
        let definition = snapshot::load(path)?;
        return Ok(ParseOutput {
            definition,
            diagnostics: Vec::new(),
        });
    }

    let source = fs::read_to_string(path)?;
    let output = parse(&source);
    tracing::debug!(
        "Parsed {}: {} messages, {} services, {} diagnostics",
        path.display(),
        output.definition.messages().len(),
        output.definition.services().len(),
        output.diagnostics.len()
    );
    Ok(output)
}
