//! Diagnostics collection for the patch pipeline.
//!
//! This module provides types for collecting and reporting diagnostic messages during a
//! patch run. The pipeline is deliberately lenient: a hook declaration that cannot be
//! resolved or injected is reported here and skipped, while the remaining declarations
//! keep being processed. The caller inspects the collected entries after the run to
//! decide what to surface.
//!
//! # Architecture
//!
//! The diagnostics container is shared across the pipeline phases:
//! - **Registry**: malformed attribute arguments, visibility failures
//! - **Resolver**: unknown types/methods, ambiguous overloads
//! - **Executor**: duplicate methods, body splice failures
//! - **Image loading**: missing extern dependencies
//!
//! The [`Diagnostics`] container uses `boxcar::Vec` for append-only collection through
//! a shared reference, so every phase can report without taking `&mut`.
//!
//! # Key Components
//!
//! - [`Diagnostics`] - Container for diagnostic entries
//! - [`Diagnostic`] - Individual diagnostic entry with severity and context
//! - [`DiagnosticSeverity`] - Severity level (Info, Warning, Error)
//! - [`DiagnosticCategory`] - Category of the diagnostic source
//!
//! # Usage Examples
//!
//! ```rust
//! use dotsplice::{Diagnostics, DiagnosticCategory};
//!
//! let diagnostics = Diagnostics::new();
//!
//! diagnostics.warning(
//!     DiagnosticCategory::Resolution,
//!     "Ambiguous overload",
//!     "2 overloads of 'Game.Player.Damage' survive matching",
//! );
//!
//! diagnostics.error(
//!     DiagnosticCategory::Injection,
//!     "Duplicate method",
//!     "'Game.Player' already declares a method named 'Respawn'",
//! );
//!
//! assert!(diagnostics.has_errors());
//! for entry in diagnostics.iter() {
//!     println!("{entry}");
//! }
//! ```

use std::fmt::{self, Write};

/// Severity level of a diagnostic entry.
///
/// Determines how the diagnostic should be treated and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Informational message, not indicating a problem.
    ///
    /// Used for noting unusual but valid situations.
    Info,

    /// Warning about a declaration that was processed on a best-effort basis.
    ///
    /// The run continues and the declaration may still have been injected,
    /// but the outcome relied on a fallback choice.
    Warning,

    /// Error indicating a declaration that could not be processed.
    ///
    /// The affected declaration is skipped; unrelated declarations keep
    /// being processed.
    Error,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Category indicating the source or type of diagnostic.
///
/// Helps classify diagnostics for filtering and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// Issues found while building the hook registry.
    ///
    /// Examples: malformed attribute arguments, non-public declaring types.
    Registry,

    /// Issues found while resolving a dotted target name.
    ///
    /// Examples: unknown types, unknown methods, ambiguous overloads.
    Resolution,

    /// Issues found while executing an injection.
    ///
    /// Examples: duplicate methods, malformed bodies, missing return points.
    Injection,

    /// Issues with the structure or content of a module image.
    ///
    /// Examples: missing extern dependencies, suspicious metadata.
    Image,

    /// Issues with reading or writing image files.
    Io,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Registry => write!(f, "Registry"),
            DiagnosticCategory::Resolution => write!(f, "Resolution"),
            DiagnosticCategory::Injection => write!(f, "Injection"),
            DiagnosticCategory::Image => write!(f, "Image"),
            DiagnosticCategory::Io => write!(f, "Io"),
        }
    }
}

/// A single diagnostic entry with context information.
///
/// Carries a short title plus a full detail message, mirroring how the entries are
/// surfaced to a user: the title identifies the kind of problem, the detail names
/// the exact types, methods, and signatures involved.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,

    /// Category indicating the source of this diagnostic.
    pub category: DiagnosticCategory,

    /// Short summary of the problem kind.
    pub title: String,

    /// Human-readable description with full context.
    pub detail: String,

    /// Optional dotted target name the diagnostic relates to.
    pub target: Option<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic entry.
    ///
    /// # Arguments
    ///
    /// * `severity` - Severity level of the diagnostic
    /// * `category` - Category of the diagnostic source
    /// * `title` - Short summary of the problem kind
    /// * `detail` - Full human-readable description
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            title: title.into(),
            detail: detail.into(),
            target: None,
        }
    }

    /// Adds the dotted target name the diagnostic relates to.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}: {}",
            self.severity, self.category, self.title, self.detail
        )?;

        if let Some(target) = &self.target {
            write!(f, " (target: {target})")?;
        }

        Ok(())
    }
}

/// Container for collecting diagnostic entries during a patch run.
///
/// Uses `boxcar::Vec` internally, so entries can be appended through a shared
/// reference. Every pipeline phase takes `&Diagnostics` and pushes into the same
/// container; the caller reads the collected entries after the run.
///
/// # Example
///
/// ```rust
/// use dotsplice::{Diagnostics, DiagnosticCategory};
///
/// let diagnostics = Diagnostics::new();
/// diagnostics.error(DiagnosticCategory::Resolution, "Unknown type", "No type named 'Game.Playr'");
///
/// assert_eq!(diagnostics.error_count(), 1);
/// ```
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Adds an informational diagnostic.
    ///
    /// # Arguments
    ///
    /// * `category` - Category of the diagnostic
    /// * `title` - Short summary of the observation
    /// * `detail` - Description of the observation
    pub fn info(
        &self,
        category: DiagnosticCategory,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Info,
            category,
            title,
            detail,
        ));
    }

    /// Adds a warning diagnostic.
    ///
    /// # Arguments
    ///
    /// * `category` - Category of the diagnostic
    /// * `title` - Short summary of the problem kind
    /// * `detail` - Description of the issue
    pub fn warning(
        &self,
        category: DiagnosticCategory,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Warning,
            category,
            title,
            detail,
        ));
    }

    /// Adds an error diagnostic.
    ///
    /// # Arguments
    ///
    /// * `category` - Category of the diagnostic
    /// * `title` - Short summary of the problem kind
    /// * `detail` - Description of the error
    pub fn error(
        &self,
        category: DiagnosticCategory,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Error,
            category,
            title,
            detail,
        ));
    }

    /// Adds a diagnostic entry directly.
    ///
    /// Use this for diagnostics that need additional context like the
    /// dotted target name.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Returns true if any diagnostics have been collected.
    pub fn has_any(&self) -> bool {
        self.entries.count() > 0
    }

    /// Returns true if any error-level diagnostics have been collected.
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Error)
    }

    /// Returns true if any warning-level diagnostics have been collected.
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Warning)
    }

    /// Returns the total number of diagnostics.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns the number of error-level diagnostics.
    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Error)
            .count()
    }

    /// Returns the number of warning-level diagnostics.
    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Warning)
            .count()
    }

    /// Returns the number of info-level diagnostics.
    pub fn info_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Info)
            .count()
    }

    /// Returns an iterator over all diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Returns all errors as a vector.
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Error)
            .map(|(_, d)| d)
            .collect()
    }

    /// Returns all warnings as a vector.
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Warning)
            .map(|(_, d)| d)
            .collect()
    }

    /// Returns diagnostics filtered by category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.category == category)
            .map(|(_, d)| d)
            .collect()
    }

    /// Formats a summary of all diagnostics for display.
    ///
    /// Groups diagnostics by severity for readable output.
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let error_count = self.error_count();
        let warning_count = self.warning_count();
        let info_count = self.info_count();

        let _ = writeln!(
            output,
            "Diagnostics: {} error(s), {} warning(s), {} info(s)",
            error_count, warning_count, info_count
        );

        if error_count > 0 {
            output.push_str("\nErrors:\n");
            for diag in self.errors() {
                let _ = writeln!(output, "  {diag}");
            }
        }

        if warning_count > 0 {
            output.push_str("\nWarnings:\n");
            for diag in self.warnings() {
                let _ = writeln!(output, "  {diag}");
            }
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
