//! Diagnostics surfaced to the host.
//!
//! The analyser never raises exceptions across its public boundary. Two
//! kinds of conditions become diagnostics:
//! - Analyser-internal errors (malformed AST, resolver failure): the
//!   analysis of the offending function is abandoned, other functions
//!   continue.
//! - Assertion failures from expected-result directives: reported with
//!   severity error without aborting further analysis.
//!
//! Budget exhaustion (loop sampling, union cardinality, fixed-point
//! iteration) is *not* a diagnostic; widening is normal operation.

use serde::Serialize;

use crate::span::Span;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Message,
}

/// Stable diagnostic codes. Codes are part of the host contract and must
/// not be renumbered.
pub mod diagnostic_codes {
    /// An AST node referenced a child index outside the arena.
    pub const MALFORMED_AST: u32 = 1001;
    /// The injected module resolver returned no module for an import.
    pub const UNRESOLVED_MODULE: u32 = 1002;
    /// An imported name is not among the resolved module's exports.
    pub const UNRESOLVED_IMPORT: u32 = 1003;
    /// A mock directive referenced a name that is not in scope.
    pub const UNKNOWN_MOCK_TARGET: u32 = 1004;
    /// An inferred result did not match the expected type of a
    /// `returns` directive or a case expectation.
    pub const EXPECTED_TYPE_MISMATCH: u32 = 2001;
    /// A case directive supplied more arguments than the function accepts.
    pub const CASE_ARITY_MISMATCH: u32 = 2002;
}

/// Message templates for the codes above. `{0}`, `{1}`... are filled by
/// [`format_message`].
pub fn message_template(code: u32) -> &'static str {
    match code {
        diagnostic_codes::MALFORMED_AST => "Malformed AST: {0}.",
        diagnostic_codes::UNRESOLVED_MODULE => "Cannot resolve module '{0}'.",
        diagnostic_codes::UNRESOLVED_IMPORT => "Module '{0}' has no export named '{1}'.",
        diagnostic_codes::UNKNOWN_MOCK_TARGET => "Cannot mock unknown binding '{0}'.",
        diagnostic_codes::EXPECTED_TYPE_MISMATCH => "Expected type '{0}' but inferred '{1}'.",
        diagnostic_codes::CASE_ARITY_MISMATCH => {
            "Case '{0}' supplies {1} arguments but the function declares {2} parameters."
        }
        _ => "Unknown diagnostic.",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub span: Span,
    pub message_text: String,
}

impl Diagnostic {
    pub fn error(file: impl Into<String>, span: Span, message: impl Into<String>, code: u32) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            file: file.into(),
            span,
            message_text: message.into(),
        }
    }

    pub fn warning(
        file: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            code,
            file: file.into(),
            span,
            message_text: message.into(),
        }
    }
}

/// Substitute `{i}` placeholders in a message template.
pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}
