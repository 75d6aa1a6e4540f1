//! Attribute-driven patch pipeline over module images.
//!
//! This module contains the pipeline that turns hook declarations into
//! modified target images. A run moves through fixed phases: the hook image
//! is scanned for attributes and validated into a registry, each dotted
//! target name is resolved against the target module's symbol table, every
//! resolved declaration is executed as a body splice or a method synthesis,
//! and the patched image is written back if anything changed.
//!
//! Failures are scoped as narrowly as possible. One declaration with an
//! unknown target or an unspliceable body is skipped with a diagnostic while
//! the rest of the run proceeds; only image-level problems (unreadable
//! files, non-public hook types) abort the run as a whole. The returned
//! [`PatchSummary`] carries the injected/skipped tally and the phase the
//! run reached.
//!
//! # Key Components
//!
//! - [`Patcher`] - Drives a full run from configuration to write-back
//! - [`PatchOptions`] - Image paths and dependency search paths for one run
//! - [`PatchSummary`] - Tally and final [`RunState`] of a completed run
//! - [`registry`] - Attribute recognition and hook validation
//! - [`resolver`] - Dotted-name and overload resolution
//! - [`executor`] - Body splicing and method synthesis
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use dotsplice::{PatchOptions, Patcher};
//!
//! let patcher = Patcher::new(PatchOptions {
//!     hook_image: PathBuf::from("mods/hooks.dspl"),
//!     target_image: PathBuf::from("game.dspl"),
//!     output: None,
//!     search_paths: vec![PathBuf::from("mods")],
//! });
//!
//! let summary = patcher.run()?;
//! println!("{} injected, {} skipped", summary.injected, summary.skipped);
//! for diagnostic in patcher.diagnostics().iter() {
//!     eprintln!("{diagnostic}");
//! }
//! # Ok::<(), dotsplice::Error>(())
//! ```

use std::path::PathBuf;

use crate::diagnostics::{Diagnostic, DiagnosticCategory, Diagnostics, DiagnosticSeverity};
use crate::metadata::module::Module;
use crate::metadata::symbols::SymbolTable;
use crate::Result;

/// Splice execution and method synthesis
pub mod executor;
/// Injection shape planning from hook and target signatures
pub mod planner;
/// Attribute recognition, visibility validation, and argument screening
pub mod registry;
/// Dotted-name and structural overload resolution
pub mod resolver;
/// Attribute discovery over a module's types and methods
pub mod scanner;

pub use executor::{SpliceOutcome, SynthesisOutcome};
pub use planner::{InjectionPlan, ParameterPassing, Placement};
pub use registry::{HookDeclaration, HookKind, HookPayload, HookSet};
pub use resolver::{Resolution, ResolvedTarget};
pub use scanner::HookCandidate;

/// Configuration for one patch run.
#[derive(Debug, Clone, Default)]
pub struct PatchOptions {
    /// Image containing the hook implementations and their attributes.
    pub hook_image: PathBuf,
    /// Image to patch.
    pub target_image: PathBuf,
    /// Where the patched image is written; the target path itself when `None`.
    pub output: Option<PathBuf>,
    /// Extra directories searched when verifying extern dependencies.
    pub search_paths: Vec<PathBuf>,
}

/// The phase a patch run has reached.
///
/// States advance monotonically; a summary carries the last phase that
/// completed, which distinguishes a run that wrote an image from one that
/// had nothing to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Nothing has happened yet.
    #[default]
    Unpatched,
    /// The target's symbol table was built.
    SymbolTableBuilt,
    /// Every declaration was resolved (or skipped with a diagnostic).
    Resolved,
    /// Every resolved declaration was executed.
    Injected,
    /// The patched image was written to its destination.
    WrittenBack,
    /// No injection succeeded, so no image was written.
    NoOpWriteback,
}

/// Overall outcome of a patch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    /// Every declaration was injected.
    #[default]
    Success,
    /// At least one declaration was skipped; see the diagnostics.
    Partial,
}

/// Tally of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatchSummary {
    /// Number of declarations that modified the target.
    pub injected: usize,
    /// Number of declarations that were skipped.
    pub skipped: usize,
    /// The phase the run reached.
    pub state: RunState,
    /// Whether every declaration made it through.
    pub status: RunStatus,
}

/// Drives a patch run: loading, registry, resolution, injection, write-back.
///
/// A `Patcher` is configured once and collects diagnostics across the run;
/// inspect them through [`Patcher::diagnostics`] after [`Patcher::run`]
/// returns. [`Patcher::apply`] exposes the in-memory pipeline for callers
/// that manage module loading themselves.
#[derive(Debug)]
pub struct Patcher {
    options: PatchOptions,
    diagnostics: Diagnostics,
}

impl Patcher {
    /// Creates a patcher for the given configuration.
    #[must_use]
    pub fn new(options: PatchOptions) -> Self {
        Patcher {
            options,
            diagnostics: Diagnostics::new(),
        }
    }

    /// The configuration this patcher runs with.
    #[must_use]
    pub fn options(&self) -> &PatchOptions {
        &self.options
    }

    /// Diagnostics collected so far.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Runs the full pipeline: load both images, patch in memory, verify
    /// extern dependencies, and write the result back.
    ///
    /// The image is only written when at least one declaration injected;
    /// a run where everything was skipped leaves the filesystem untouched
    /// and reports [`RunState::NoOpWriteback`].
    ///
    /// # Errors
    /// Returns an error when either image cannot be read or parsed, when the
    /// hook registry fails validation, or when write-back fails.
    pub fn run(&self) -> Result<PatchSummary> {
        let hook_module = Module::from_file(&self.options.hook_image)?;
        let mut target = Module::from_file(&self.options.target_image)?;

        let mut summary = self.apply(&hook_module, &mut target)?;
        self.check_dependencies(&target);

        if summary.injected > 0 {
            let destination = self
                .options
                .output
                .as_deref()
                .unwrap_or(self.options.target_image.as_path());
            target.write_to(destination)?;
            summary.state = RunState::WrittenBack;
        } else {
            summary.state = RunState::NoOpWriteback;
        }
        Ok(summary)
    }

    /// Applies every hook declaration from `hook_module` to `target` in
    /// memory, without touching the filesystem.
    ///
    /// Declarations are resolved in full before any injection executes, so
    /// resolution always sees the unmodified target. Injection only appends
    /// methods and rewrites bodies, which keeps resolved indices valid.
    ///
    /// # Errors
    /// Returns an error when registry validation fails; per-declaration
    /// problems are reported as diagnostics and counted as skipped instead.
    pub fn apply(&self, hook_module: &Module, target: &mut Module) -> Result<PatchSummary> {
        let mut summary = PatchSummary::default();

        let hooks = registry::build(hook_module, &self.diagnostics)?;
        summary.skipped += hooks.excluded();

        let symbols = SymbolTable::new(target);
        summary.state = RunState::SymbolTableBuilt;

        let mut splices = Vec::new();
        for declaration in hooks.of_kind(HookKind::CallHook) {
            let HookPayload::CallHook {
                type_name,
                method_name,
                place_at_end,
            } = &declaration.payload
            else {
                continue;
            };
            let hook = &hook_module[declaration.type_index].methods[declaration.method_pos];
            match resolver::resolve(target, &symbols, type_name, method_name, hook) {
                Resolution::Resolved(resolved) => {
                    splices.push((declaration, resolved, *place_at_end));
                }
                Resolution::Ambiguous {
                    target: resolved,
                    candidates,
                } => {
                    self.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticSeverity::Warning,
                            DiagnosticCategory::Resolution,
                            "Ambiguous overload",
                            format!(
                                "Several overloads of '{}' match the hook; using the first:\n{}",
                                declaration.target_name(),
                                candidates.join("\n")
                            ),
                        )
                        .with_target(declaration.target_name()),
                    );
                    splices.push((declaration, resolved, *place_at_end));
                }
                Resolution::UnknownType { type_name } => {
                    summary.skipped += 1;
                    self.diagnostics.error(
                        DiagnosticCategory::Resolution,
                        "Unknown type",
                        format!(
                            "Type '{}' was not found in module '{}'",
                            type_name,
                            target.name()
                        ),
                    );
                }
                Resolution::UnknownMethod {
                    type_name,
                    method_name,
                } => {
                    summary.skipped += 1;
                    self.diagnostics.error(
                        DiagnosticCategory::Resolution,
                        "Unknown method",
                        format!("Type '{type_name}' declares no method named '{method_name}'"),
                    );
                }
            }
        }

        let mut additions = Vec::new();
        for declaration in hooks.of_kind(HookKind::NewMethod) {
            let HookPayload::NewMethod {
                type_name,
                method_name,
            } = &declaration.payload
            else {
                continue;
            };
            match symbols.type_index(type_name) {
                Some(type_index) => additions.push((declaration, type_index, method_name.clone())),
                None => {
                    summary.skipped += 1;
                    self.diagnostics.error(
                        DiagnosticCategory::Resolution,
                        "Unknown type",
                        format!(
                            "Type '{}' was not found in module '{}'",
                            type_name,
                            target.name()
                        ),
                    );
                }
            }
        }
        summary.state = RunState::Resolved;

        for (declaration, resolved, place_at_end) in splices {
            let hook = &hook_module[declaration.type_index].methods[declaration.method_pos];
            let plan = {
                let target_method = &target[resolved.type_index].methods[resolved.method_pos];
                planner::plan_call_hook(target_method, hook, place_at_end)
            };
            let hook_owner = hook_module.type_fullname(declaration.type_index);
            match executor::splice_call(
                target,
                resolved.type_index,
                resolved.method_pos,
                plan,
                &hook_owner,
                &hook.name,
            ) {
                Ok(SpliceOutcome::Injected) => summary.injected += 1,
                Ok(SpliceOutcome::AlreadyInjected) => {
                    summary.skipped += 1;
                    self.diagnostics.warning(
                        DiagnosticCategory::Injection,
                        "Already injected",
                        format!(
                            "'{}' already calls '{}.{}'; skipping",
                            declaration.target_name(),
                            hook_owner,
                            hook.name
                        ),
                    );
                }
                Err(error) => {
                    summary.skipped += 1;
                    self.diagnostics.error(
                        DiagnosticCategory::Injection,
                        "Splice failed",
                        format!(
                            "Injection into '{}' failed: {error}",
                            declaration.target_name()
                        ),
                    );
                }
            }
        }

        for (declaration, type_index, method_name) in additions {
            let hook = &hook_module[declaration.type_index].methods[declaration.method_pos];
            let hook_owner = hook_module.type_fullname(declaration.type_index);
            match executor::synthesize_method(target, type_index, &method_name, &hook_owner, &hook.name)
            {
                Ok(SynthesisOutcome::Added) => summary.injected += 1,
                Ok(SynthesisOutcome::Duplicate) => {
                    summary.skipped += 1;
                    self.diagnostics.error(
                        DiagnosticCategory::Injection,
                        "Duplicate method",
                        format!(
                            "Type '{}' already declares a method named '{method_name}'",
                            target.type_fullname(type_index)
                        ),
                    );
                }
                Err(error) => {
                    summary.skipped += 1;
                    self.diagnostics.error(
                        DiagnosticCategory::Injection,
                        "Synthesis failed",
                        format!(
                            "Adding '{}' failed: {error}",
                            declaration.target_name()
                        ),
                    );
                }
            }
        }
        summary.state = RunState::Injected;

        if summary.injected > 0 {
            target.add_extern_ref(hook_module.name());
        }
        summary.status = if summary.skipped == 0 {
            RunStatus::Success
        } else {
            RunStatus::Partial
        };
        Ok(summary)
    }

    /// Verifies that every image the target references can be found next to
    /// the target or on one of the configured search paths, emitting a
    /// warning for each miss.
    ///
    /// Runs after injection, so the hook image itself is checked too: a hook
    /// image that is not deployed alongside the target will fail to load at
    /// runtime even though patching succeeded.
    fn check_dependencies(&self, target: &Module) {
        for name in target.extern_refs() {
            let found = self
                .options
                .search_paths
                .iter()
                .map(PathBuf::as_path)
                .chain(self.options.target_image.parent())
                .any(|dir| dir.join(name).is_file());
            if !found {
                self.diagnostics.warning(
                    DiagnosticCategory::Image,
                    "Missing dependency",
                    format!(
                        "Referenced image '{name}' was not found next to the target or on any search path"
                    ),
                );
            }
        }
    }
}
