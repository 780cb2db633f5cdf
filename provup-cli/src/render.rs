//! Terminal and JSON rendering of run results.

use camino::{Utf8Path, Utf8PathBuf};
use provup_core::{Diagnostic, Diagnostics, ModuleOutcome};
use serde::Serialize;

/// Printed between the diagnostics and the success message.
pub const SEPARATOR: &str =
    "-----------------------------------------------------------------------------";

pub const SUCCESS_MESSAGE: &str = "Upgrade complete!

Use your version control system to review the proposed changes, make any
necessary adjustments, and then commit.";

/// Human-readable form of every diagnostic, each followed by a blank line.
pub fn render_diagnostics(diags: &Diagnostics) -> String {
    let mut out = String::new();
    for diag in diags.iter() {
        render_diagnostic(diag, &mut out);
        out.push('\n');
    }
    out
}

fn render_diagnostic(diag: &Diagnostic, out: &mut String) {
    out.push_str(&format!("{}: {}\n", diag.severity, diag.summary));
    if let Some(pos) = &diag.subject {
        out.push_str(&format!("\n  on {} line {}:\n", pos.file, pos.line));
    }
    if !diag.detail.is_empty() {
        out.push('\n');
        out.push_str(&diag.detail);
        out.push('\n');
    }
}

/// The closing message of a successful run.
pub fn render_success(had_diagnostics: bool) -> String {
    if had_diagnostics {
        format!("{SEPARATOR}\n\n{SUCCESS_MESSAGE}\n")
    } else {
        format!("{SUCCESS_MESSAGE}\n")
    }
}

/// Machine-readable summary printed by `--json`.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub ok: bool,
    pub diagnostics: Vec<&'a Diagnostic>,
    pub modules: Vec<JsonModule<'a>>,
}

#[derive(Debug, Serialize)]
pub struct JsonModule<'a> {
    pub dir: String,
    /// `None` when the module requires no providers.
    pub target: Option<&'a Utf8Path>,
    pub changed: &'a [Utf8PathBuf],
    #[serde(skip_serializing_if = "str::is_empty")]
    pub patch: &'a str,
}

impl<'a> JsonReport<'a> {
    pub fn success(modules: &'a [ModuleOutcome], include_patch: bool) -> Self {
        Self {
            ok: true,
            diagnostics: modules
                .iter()
                .flat_map(|m| m.outcome.diagnostics.iter())
                .collect(),
            modules: modules
                .iter()
                .map(|m| JsonModule {
                    dir: display_dir(&m.module_dir),
                    target: m.outcome.plan.as_ref().map(|p| p.target.as_path()),
                    changed: &m.outcome.changed,
                    patch: if include_patch { &m.outcome.patch } else { "" },
                })
                .collect(),
        }
    }

    pub fn failure(diags: Option<&'a Diagnostics>) -> Self {
        Self {
            ok: false,
            diagnostics: diags.map(|d| d.iter().collect()).unwrap_or_default(),
            modules: Vec::new(),
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A module directory relative to the run root; the root itself is shown as `.`.
pub fn display_dir(dir: &Utf8Path) -> String {
    if dir.as_str().is_empty() {
        ".".to_string()
    } else {
        dir.to_string()
    }
}
