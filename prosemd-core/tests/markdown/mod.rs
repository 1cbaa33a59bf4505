//! Markdown format tests
//!
//! Tests for bidirectional Markdown ↔ document tree conversion.

mod export;
mod gating;
mod import;
mod roundtrip;
