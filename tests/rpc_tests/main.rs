//! RPC Tests
//!
//! Framing, envelopes and end-to-end calls over loopback TCP.

mod envelope_tests;

#[path = "../codegen_tests/generated/rust/mod.rs"]
#[allow(dead_code)]
mod chat;
