//! Reads HCL configuration files into a read-only view of their provider-related facts.

use camino::{Utf8Path, Utf8PathBuf};
use hcl_edit::Span;
use hcl_edit::expr::{Expression, ObjectKey, TraversalOperator};
use hcl_edit::structure::{Attribute, Block, Body};
use provup_types::{Diagnostic, Diagnostics, SourcePos};
use std::ops::Range;
use tracing::debug;

/// Raw contents of one configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: Utf8PathBuf,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<Utf8PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Provider-related facts of one parsed file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFile {
    pub path: Utf8PathBuf,
    pub required_providers: Vec<RequiredProvidersBlock>,
    pub provider_configs: Vec<ProviderConfig>,
    pub resources: Vec<ResourceRef>,
}

/// A `terraform { required_providers { ... } }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredProvidersBlock {
    pub pos: SourcePos,
    pub entries: Vec<RequiredProviderDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredProviderDecl {
    pub name: String,
    pub source: Option<String>,
    pub version: Option<String>,
    pub pos: SourcePos,
}

/// A `provider "<name>" { ... }` configuration block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub name: String,
    pub alias: Option<String>,
    pub pos: SourcePos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceMode {
    Managed,
    Data,
}

/// A `resource` or `data` block and the provider it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub mode: ResourceMode,
    pub type_name: String,
    pub name: String,
    /// The `provider` argument as written, e.g. `aws.west`.
    pub provider_ref: Option<String>,
    pub pos: SourcePos,
}

impl ResourceRef {
    /// Local provider name: the root of an explicit `provider` reference, else the implied name.
    pub fn provider_local_name(&self) -> &str {
        match &self.provider_ref {
            Some(r) => r.split('.').next().unwrap_or(r),
            None => implied_provider(&self.type_name),
        }
    }
}

/// The provider implied by a resource type: everything before the first underscore.
pub fn implied_provider(type_name: &str) -> &str {
    match type_name.split_once('_') {
        Some((prefix, _)) => prefix,
        None => type_name,
    }
}

/// Maps a node span to a source position; nodes without span info point at the file start.
pub fn pos_of(path: &Utf8Path, text: &str, span: Option<Range<usize>>) -> SourcePos {
    match span {
        Some(range) => SourcePos::from_offset(path, text, range.start),
        None => SourcePos::new(path, 1, 1),
    }
}

/// Parses one file, turning a syntax error into an error diagnostic.
pub fn parse_source(file: &SourceFile) -> Result<Body, Diagnostic> {
    hcl_edit::parser::parse_body(&file.text).map_err(|err| {
        let loc = err.location();
        Diagnostic::error(
            "Invalid HCL syntax",
            format!("{} (in {:?})", err.message(), err.line().trim_end()),
        )
        .with_subject(SourcePos::new(&file.path, loc.line(), loc.column()))
    })
}

/// Parses every file and extracts its facts.
///
/// All files are attempted so every malformed one is reported in a single pass. Files that fail
/// to parse are left out of the returned list.
pub fn load_module(files: &[SourceFile]) -> (Vec<ModuleFile>, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut module = Vec::with_capacity(files.len());

    for file in files {
        match parse_source(file) {
            Ok(body) => module.push(read_module_file(file, &body, &mut diags)),
            Err(diag) => {
                debug!(path = %file.path, "parse failed");
                diags.push(diag);
            }
        }
    }

    (module, diags)
}

fn read_module_file(file: &SourceFile, body: &Body, diags: &mut Diagnostics) -> ModuleFile {
    let mut out = ModuleFile {
        path: file.path.clone(),
        ..ModuleFile::default()
    };

    for block in body.blocks() {
        match block.ident.as_str() {
            "terraform" => {
                for inner in block.body.blocks() {
                    if inner.has_ident("required_providers") {
                        out.required_providers
                            .push(read_required_providers(file, inner, diags));
                    }
                }
            }
            "provider" => match block.labels.first() {
                Some(label) => out.provider_configs.push(ProviderConfig {
                    name: label.as_str().to_string(),
                    alias: block
                        .body
                        .get_attribute("alias")
                        .and_then(|a| a.value.as_str())
                        .map(str::to_string),
                    pos: pos_of(&file.path, &file.text, block.span()),
                }),
                None => debug!(path = %file.path, "provider block without a name"),
            },
            "resource" | "data" => {
                let mode = if block.has_ident("data") {
                    ResourceMode::Data
                } else {
                    ResourceMode::Managed
                };
                if let [type_label, name_label, ..] = block.labels.as_slice() {
                    out.resources.push(ResourceRef {
                        mode,
                        type_name: type_label.as_str().to_string(),
                        name: name_label.as_str().to_string(),
                        provider_ref: read_provider_ref(file, block, diags),
                        pos: pos_of(&file.path, &file.text, block.span()),
                    });
                } else {
                    debug!(path = %file.path, "resource block without type and name labels");
                }
            }
            _ => {}
        }
    }

    debug!(
        path = %file.path,
        required_providers = out.required_providers.len(),
        provider_configs = out.provider_configs.len(),
        resources = out.resources.len(),
        "loaded file"
    );
    out
}

fn read_required_providers(
    file: &SourceFile,
    block: &Block,
    diags: &mut Diagnostics,
) -> RequiredProvidersBlock {
    let entries = block
        .body
        .attributes()
        .filter_map(|attr| read_required_provider(file, attr, diags))
        .collect();

    RequiredProvidersBlock {
        pos: pos_of(&file.path, &file.text, block.span()),
        entries,
    }
}

fn read_required_provider(
    file: &SourceFile,
    attr: &Attribute,
    diags: &mut Diagnostics,
) -> Option<RequiredProviderDecl> {
    let name = attr.key.as_str().to_string();
    let pos = pos_of(&file.path, &file.text, attr.span());
    let mut decl = RequiredProviderDecl {
        name,
        source: None,
        version: None,
        pos,
    };

    match &attr.value {
        // Pre-0.13 shorthand: `aws = "~> 2.0"`.
        Expression::String(version) => {
            decl.version = Some(version.as_str().to_string());
        }
        Expression::Object(object) => {
            for (key, value) in object.iter() {
                let key_name = match key {
                    ObjectKey::Ident(ident) => Some(ident.as_str()),
                    ObjectKey::Expression(expr) => expr.as_str(),
                };
                let slot = match key_name {
                    Some("source") => &mut decl.source,
                    Some("version") => &mut decl.version,
                    _ => continue,
                };
                match value.expr().as_str() {
                    Some(s) => *slot = Some(s.to_string()),
                    None => {
                        diags.push(invalid_entry(&decl, key_name.unwrap_or_default()));
                        return None;
                    }
                }
            }
        }
        _ => {
            diags.push(
                Diagnostic::error(
                    "Invalid required_providers entry",
                    format!(
                        "The requirement for provider {:?} must be a version string or an object with source and version.",
                        decl.name
                    ),
                )
                .with_subject(decl.pos.clone()),
            );
            return None;
        }
    }

    Some(decl)
}

fn invalid_entry(decl: &RequiredProviderDecl, key: &str) -> Diagnostic {
    Diagnostic::error(
        "Invalid required_providers entry",
        format!(
            "The {} argument for provider {:?} must be a literal string.",
            key, decl.name
        ),
    )
    .with_subject(decl.pos.clone())
}

fn read_provider_ref(file: &SourceFile, block: &Block, diags: &mut Diagnostics) -> Option<String> {
    let attr = block.body.get_attribute("provider")?;
    let reference = match &attr.value {
        Expression::Variable(root) => Some(root.as_str().to_string()),
        Expression::Traversal(traversal) => traversal.expr.as_variable().map(|root| {
            let mut reference = root.as_str().to_string();
            for op in &traversal.operators {
                if let TraversalOperator::GetAttr(ident) = op.value() {
                    reference.push('.');
                    reference.push_str(ident.as_str());
                }
            }
            reference
        }),
        // Legacy quoted form: `provider = "aws.west"`.
        Expression::String(s) => Some(s.as_str().to_string()),
        _ => None,
    };

    if reference.is_none() {
        diags.push(
            Diagnostic::error(
                "Invalid provider reference",
                "The provider argument must be a provider name, optionally followed by an alias, such as aws.west.",
            )
            .with_subject(pos_of(&file.path, &file.text, attr.span())),
        );
    }
    reference
}
