// diag.rs — Front-end diagnostics model
//
// Provides the diagnostic type produced by parsing and type checking. A
// diagnostic points at a span inside one file of the checking session and
// renders as `file:line:column: message` once resolved through the
// `SourceMap`, followed by its related spans and hint on indented lines.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;
use std::fmt::Write as _;

use crate::ast::Span;
use crate::id::FileId;
use crate::source::{Pos, SourceMap};

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0001`, `E0200`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Codes emitted by the front end.
pub mod codes {
    use super::DiagCode;

    // E00xx: syntax and loading
    pub const E0001: DiagCode = DiagCode("E0001"); // syntax error
    pub const E0002: DiagCode = DiagCode("E0002"); // package clause mismatch

    // E01xx: names and scopes
    pub const E0100: DiagCode = DiagCode("E0100"); // undefined name
    pub const E0101: DiagCode = DiagCode("E0101"); // redeclared in scope
    pub const E0102: DiagCode = DiagCode("E0102"); // no new variables on :=
    pub const E0103: DiagCode = DiagCode("E0103"); // not exported
    pub const E0104: DiagCode = DiagCode("E0104"); // wrong kind of name (not a type / not a value)

    // E02xx: types and expressions
    pub const E0200: DiagCode = DiagCode("E0200"); // not assignable
    pub const E0201: DiagCode = DiagCode("E0201"); // argument or value count mismatch
    pub const E0202: DiagCode = DiagCode("E0202"); // invalid operation
    pub const E0203: DiagCode = DiagCode("E0203"); // no field or method
    pub const E0204: DiagCode = DiagCode("E0204"); // not callable
    pub const E0205: DiagCode = DiagCode("E0205"); // invalid statement

    // E03xx: imports and declarations
    pub const E0300: DiagCode = DiagCode("E0300"); // module not found
    pub const E0301: DiagCode = DiagCode("E0301"); // import cycle
    pub const E0302: DiagCode = DiagCode("E0302"); // invalid receiver
}

// ── Related span ─────────────────────────────────────────────────────────

/// A secondary source location providing context for a diagnostic.
#[derive(Debug, Clone)]
pub struct RelatedSpan {
    pub file: FileId,
    pub span: Span,
    pub label: String,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// An error raised while loading or checking a package.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub file: FileId,
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
    pub related_spans: Vec<RelatedSpan>,
}

impl Diagnostic {
    /// Create a new diagnostic with no code, hint or related spans.
    pub fn new(file: FileId, span: Span, message: impl Into<String>) -> Self {
        Self {
            code: None,
            file,
            span,
            message: message.into(),
            hint: None,
            related_spans: Vec::new(),
        }
    }

    /// Attach a stable diagnostic code.
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach a related span.
    pub fn with_related(mut self, file: FileId, span: Span, label: impl Into<String>) -> Self {
        self.related_spans.push(RelatedSpan {
            file,
            span,
            label: label.into(),
        });
        self
    }

    pub fn pos(&self) -> Pos {
        Pos::of_span(self.file, self.span)
    }

    /// `file:line:column: message`, the form used in unit error summaries.
    /// Each related span adds a tab-indented `file:line:column: label` line
    /// and a hint adds a final `hint:` line.
    pub fn render(&self, sources: &SourceMap) -> String {
        let mut out = format!("{}: {}", sources.position(self.pos()), self.message);
        for related in &self.related_spans {
            let at = sources.position(Pos::of_span(related.file, related.span));
            let _ = write!(out, "\n\t{at}: {}", related.label);
        }
        if let Some(hint) = &self.hint {
            let _ = write!(out, "\n\thint: {hint}");
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = &self.code {
            write!(f, "error[{}]: {}", code, self.message)?;
        } else {
            write!(f, "error: {}", self.message)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}
