//! The upgrade pipeline, extracted from the CLI.
//!
//! These entry points are I/O-agnostic: reads go through a [`RepoView`], writes through a
//! [`WritePort`], and registry lookups through a [`ProviderSource`].

use std::collections::BTreeMap;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use hcl_edit::structure::Body;
use provup_domain::{RepoView, SourceFile, collect_requirements, load_module, parse_source};
use provup_edit::{render_patch, rewrite_requirements, strip_requirements};
use provup_registry::{ProviderSource, resolve_provenance};
use provup_types::{Diagnostic, Diagnostics, RequirementSet, RewritePlan};
use serde::Serialize;
use tracing::{debug, info};

use crate::discovery::{child_dirs, discover_module, is_module_dir};
use crate::ports::WritePort;
use crate::settings::UpgradeSettings;

/// Error type for pipeline results. Every variant maps to exit code 1.
///
/// All variants except `Internal` carry the diagnostics gathered up to the failure, so the
/// caller can print them.
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    #[error("invalid invocation")]
    Usage(Diagnostics),
    #[error("failed to load configuration")]
    Config(Diagnostics),
    #[error("cannot update configuration file {path}")]
    Io {
        path: Utf8PathBuf,
        diagnostics: Diagnostics,
    },
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl UpgradeError {
    pub fn exit_code(&self) -> u8 {
        1
    }

    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            UpgradeError::Usage(diags) | UpgradeError::Config(diags) => Some(diags),
            UpgradeError::Io { diagnostics, .. } => Some(diagnostics),
            UpgradeError::Internal(_) => None,
        }
    }
}

/// Outcome of `run_upgrade`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpgradeOutcome {
    pub diagnostics: Diagnostics,
    /// `None` when the module requires no providers at all.
    pub plan: Option<RewritePlan>,
    /// Files whose contents changed (written, unless dry-running), in write order.
    pub changed: Vec<Utf8PathBuf>,
    /// Unified diff of every changed file.
    pub patch: String,
}

/// Outcome of one module in `run_recursive`.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleOutcome {
    pub module_dir: Utf8PathBuf,
    pub outcome: UpgradeOutcome,
}

/// Upgrade one module directory.
///
/// Provider requirements from every primary file are collected, resolved against `source`,
/// written as one `required_providers` block into the target file, and removed from every
/// other file that declared some. Writes happen one file at a time; a failed write aborts the
/// run without undoing earlier ones.
pub fn run_upgrade(
    settings: &UpgradeSettings,
    repo: &dyn RepoView,
    source: &dyn ProviderSource,
    writer: &dyn WritePort,
) -> Result<UpgradeOutcome, UpgradeError> {
    let dir = settings.module_dir.as_path();
    let files = discover_module(repo, dir);
    if files.is_empty() {
        return Err(UpgradeError::Usage(not_a_module(repo, dir).into()));
    }

    let mut diags = Diagnostics::new();
    let mut sources = Vec::with_capacity(files.primary.len());
    for path in &files.primary {
        let text = match repo.read_to_string(path) {
            Ok(text) => text,
            Err(err) => return Err(io_error(diags, path, "read", err)),
        };
        sources.push(SourceFile::new(path.clone(), text));
    }

    let (module, load_diags) = load_module(&sources);
    diags.append(load_diags);
    if diags.has_errors() {
        return Err(UpgradeError::Config(diags));
    }
    diags.append(files.skipped_warnings());

    let (mut set, collect_diags) = collect_requirements(&module);
    diags.append(collect_diags);
    if diags.has_errors() {
        return Err(UpgradeError::Config(diags));
    }
    info!(
        dir = %display_dir(dir),
        files = module.len(),
        providers = set.len(),
        candidates = set.rewrite_candidates.len(),
        "collected provider requirements"
    );

    if set.is_empty() {
        return Ok(UpgradeOutcome {
            diagnostics: diags,
            ..UpgradeOutcome::default()
        });
    }

    diags.append(resolve_provenance(&mut set, source));

    let plan = plan_rewrite(repo, dir, &settings.output_file, &set);
    debug!(
        target = %plan.target,
        exists = plan.target_exists,
        strip = plan.strip.len(),
        "planned rewrite"
    );

    let mut before = BTreeMap::new();
    let mut after = BTreeMap::new();
    let mut changed = Vec::new();

    // Target first, then every other file that declared requirements.
    let original = if plan.target_exists {
        match repo.read_to_string(&plan.target) {
            Ok(text) => Some(text),
            Err(err) => return Err(io_error(diags, &plan.target, "read", err)),
        }
    } else {
        None
    };
    let mut body = match &original {
        Some(text) => match parse_source(&SourceFile::new(plan.target.clone(), text.clone())) {
            Ok(body) => body,
            Err(diag) => {
                diags.push(diag);
                return Err(UpgradeError::Config(diags));
            }
        },
        None => Body::new(),
    };
    rewrite_requirements(&mut body, &plan.facts)
        .with_context(|| format!("rewrite {}", plan.target))?;

    let rendered = body.to_string();
    if original.as_ref() != Some(&rendered) {
        if let Err(err) = persist(settings, repo, writer, &plan.target, &rendered) {
            return Err(io_error(diags, &plan.target, "write", err));
        }
        changed.push(plan.target.clone());
    }
    if let Some(original) = original {
        before.insert(plan.target.clone(), original);
    }
    after.insert(plan.target.clone(), rendered);

    for path in &plan.strip {
        let original = match repo.read_to_string(path) {
            Ok(text) => text,
            Err(err) => return Err(io_error(diags, path, "read", err)),
        };
        let mut body = match parse_source(&SourceFile::new(path.clone(), original.clone())) {
            Ok(body) => body,
            Err(diag) => {
                diags.push(diag);
                return Err(UpgradeError::Config(diags));
            }
        };
        let removed = strip_requirements(&mut body);
        let rendered = body.to_string();
        debug!(path = %path, removed, "stripped requirement blocks");

        if rendered != original {
            if let Err(err) = persist(settings, repo, writer, path, &rendered) {
                return Err(io_error(diags, path, "write", err));
            }
            changed.push(path.clone());
        }
        before.insert(path.clone(), original);
        after.insert(path.clone(), rendered);
    }

    info!(
        changed = changed.len(),
        dry_run = settings.dry_run,
        "upgrade finished"
    );

    Ok(UpgradeOutcome {
        diagnostics: diags,
        plan: Some(plan),
        changed,
        patch: render_patch(&before, &after),
    })
}

/// Upgrade every module directory at or below `settings.module_dir`.
///
/// Each directory holding configuration files is upgraded on its own, with its own target
/// file. Hidden directories (including `.terraform`) are not entered. The first failing module
/// aborts the walk; modules upgraded before it stay upgraded.
pub fn run_recursive(
    settings: &UpgradeSettings,
    repo: &dyn RepoView,
    source: &dyn ProviderSource,
    writer: &dyn WritePort,
) -> Result<Vec<ModuleOutcome>, UpgradeError> {
    let mut modules = Vec::new();
    collect_module_dirs(repo, &settings.module_dir, &mut modules);
    if modules.is_empty() {
        return Err(UpgradeError::Usage(
            not_a_module(repo, &settings.module_dir).into(),
        ));
    }

    let mut outcomes = Vec::with_capacity(modules.len());
    for module_dir in modules {
        info!(dir = %display_dir(&module_dir), "upgrading module");
        let outcome = run_upgrade(&settings.for_module(module_dir.clone()), repo, source, writer)?;
        outcomes.push(ModuleOutcome {
            module_dir,
            outcome,
        });
    }
    Ok(outcomes)
}

fn collect_module_dirs(repo: &dyn RepoView, dir: &Utf8Path, out: &mut Vec<Utf8PathBuf>) {
    if is_module_dir(repo, dir) {
        out.push(dir.to_path_buf());
    }
    for child in child_dirs(repo, dir) {
        collect_module_dirs(repo, &child, out);
    }
}

/// Chooses the file that receives the consolidated block.
///
/// A single file with explicit requirement blocks is rewritten in place; otherwise the block
/// goes into `output_file` inside the module directory.
fn plan_rewrite(
    repo: &dyn RepoView,
    dir: &Utf8Path,
    output_file: &str,
    set: &RequirementSet,
) -> RewritePlan {
    let target = match set.rewrite_candidates.as_slice() {
        [only] => only.clone(),
        _ => dir.join(output_file),
    };
    let strip = set
        .rewrite_candidates
        .iter()
        .filter(|path| **path != target)
        .cloned()
        .collect();

    RewritePlan {
        target_exists: repo.exists(&target),
        target,
        strip,
        facts: set.sorted_facts(),
    }
}

fn persist(
    settings: &UpgradeSettings,
    repo: &dyn RepoView,
    writer: &dyn WritePort,
    path: &Utf8Path,
    contents: &str,
) -> anyhow::Result<()> {
    if settings.dry_run {
        debug!(path = %path, "dry run, not writing");
        return Ok(());
    }
    info!(path = %path, bytes = contents.len(), "writing");
    writer.write_file(&repo.root().join(path), contents.as_bytes())
}

fn io_error(
    mut diagnostics: Diagnostics,
    path: &Utf8Path,
    action: &str,
    err: anyhow::Error,
) -> UpgradeError {
    let (summary, verb) = match action {
        "read" => ("Unable to read configuration file", "reading"),
        _ => ("Unable to write configuration file", "writing"),
    };
    diagnostics.push(Diagnostic::error(
        summary,
        format!(
            "Error when {verb} configuration file {:?}: {err:#}",
            path.as_str()
        ),
    ));
    UpgradeError::Io {
        path: path.to_path_buf(),
        diagnostics,
    }
}

fn not_a_module(repo: &dyn RepoView, dir: &Utf8Path) -> Diagnostic {
    let shown = repo.root().join(dir);
    Diagnostic::error(
        "Not a module directory",
        format!(
            "The given directory {} does not contain any Terraform configuration files.",
            display_dir(&shown)
        ),
    )
}

fn display_dir(dir: &Utf8Path) -> &str {
    match dir.as_str() {
        "" => ".",
        other => other,
    }
}
