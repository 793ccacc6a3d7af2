//! Diagnostics accumulation (spec §4.8, §7).
//!
//! Grounded on `noet-core::codec::diagnostic`'s severity-tagged problem list with optional source
//! ranges and suggested replacements, reused here verbatim in shape (only the stable-identifier
//! taxonomy is new).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

/// A span within a source file, 1-indexed line/column like most editors expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

/// A suggested fix: replacement text for a range (spec §4.8 "solutions").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub summary: String,
    pub replacement_text: String,
    pub range: Option<SourceRange>,
}

/// Stable problem identifiers (spec §7 taxonomy, e.g. `.DuplicateReference`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProblemIdentifier {
    MalformedSymbolGraph,
    DuplicateReference,
    UnmatchedDocumentationExtension,
    MultipleDocumentationExtensions,
    UnresolvedLink,
    OrphanRelationship,
    LookupCollision,
    OsDeclarationConflict,
    RegistrationCancelled,
    ExternalResolverMisbehavior,
    CyclicRelationship,
}

impl ProblemIdentifier {
    /// Whether this kind is, per spec §7, recoverable at the level it is raised (a diagnostic is
    /// still recorded either way; this marks whether the catalog may still proceed).
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ProblemIdentifier::MalformedSymbolGraph | ProblemIdentifier::ExternalResolverMisbehavior
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub severity: Severity,
    pub identifier: ProblemIdentifier,
    pub summary: String,
    pub source_file: Option<PathBuf>,
    pub range: Option<SourceRange>,
    pub explanation: Option<String>,
    pub solutions: Vec<Solution>,
    /// Free-form candidate/alternative notes (spec §7: "enumerate the candidate URLs the
    /// resolver tried").
    pub notes: Vec<String>,
}

impl Problem {
    pub fn new(severity: Severity, identifier: ProblemIdentifier, summary: impl Into<String>) -> Self {
        Problem {
            severity,
            identifier,
            summary: summary.into(),
            source_file: None,
            range: None,
            explanation: None,
            solutions: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_source(mut self, source_file: PathBuf, range: Option<SourceRange>) -> Self {
        self.source_file = Some(source_file);
        self.range = range;
        self
    }
}

/// An append-only bag of problems accumulated during registration and conversion (spec §4.8).
#[derive(Debug, Clone, Default)]
pub struct DiagnosticEngine {
    problems: Vec<Problem>,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        DiagnosticEngine::default()
    }

    pub fn record(&mut self, problem: Problem) {
        if problem.severity == Severity::Error {
            tracing::error!(identifier = ?problem.identifier, summary = %problem.summary, "fatal problem recorded");
        } else {
            tracing::warn!(identifier = ?problem.identifier, summary = %problem.summary, "problem recorded");
        }
        self.problems.push(problem);
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// spec §7: "a non-empty set of error-severity problems at the end of registration blocks
    /// conversion."
    pub fn has_fatal_errors(&self) -> bool {
        self.problems.iter().any(|p| p.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_severity_is_fatal() {
        let mut engine = DiagnosticEngine::new();
        assert!(!engine.has_fatal_errors());
        engine.record(Problem::new(
            Severity::Error,
            ProblemIdentifier::MalformedSymbolGraph,
            "bad json",
        ));
        assert!(engine.has_fatal_errors());
    }

    #[test]
    fn warnings_do_not_block_conversion() {
        let mut engine = DiagnosticEngine::new();
        engine.record(Problem::new(
            Severity::Warning,
            ProblemIdentifier::DuplicateReference,
            "duplicate",
        ));
        assert!(!engine.has_fatal_errors());
    }

    #[test]
    fn malformed_symbol_graph_is_a_fatal_kind() {
        assert!(ProblemIdentifier::MalformedSymbolGraph.is_fatal());
        assert!(!ProblemIdentifier::DuplicateReference.is_fatal());
    }
}
