//! Common types and utilities for the jsty type inference engine.
//!
//! This crate provides foundational types used across all jsty crates:
//! - Source spans (`Span`)
//! - Position/Range types and line maps for editor queries
//! - Diagnostics for analyser-internal errors and assertion failures
//! - Centralized analysis budgets and thresholds

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Centralized limits and thresholds
pub mod limits;

// Position/Range types for line/column source locations
pub mod position;
pub use position::{LineMap, Position, Range};

// Diagnostics reported to the host
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, diagnostic_codes, format_message};

#[cfg(test)]
#[path = "../tests/span_tests.rs"]
mod span_tests;
#[cfg(test)]
#[path = "../tests/position_tests.rs"]
mod position_tests;
