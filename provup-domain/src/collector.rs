//! Three-pass merge of requirement facts, keyed by local provider name.
//!
//! Pass order sets precedence: explicit declarations, then configured providers, then resources.
//! A name is never revisited once recorded.

use crate::loader::ModuleFile;
use provup_types::{
    Diagnostic, Diagnostics, ProviderAddr, Provenance, RequirementFact, RequirementSet,
};
use tracing::debug;

/// Collects one requirement fact per provider name across all files.
///
/// `files` must be in processing order; the first explicit declaration of a name wins.
pub fn collect_requirements(files: &[ModuleFile]) -> (RequirementSet, Diagnostics) {
    let mut set = RequirementSet::new();
    let mut diags = Diagnostics::new();

    explicit_pass(files, &mut set, &mut diags);
    configured_provider_pass(files, &mut set);
    usage_site_pass(files, &mut set);

    debug!(
        facts = set.len(),
        rewrite_candidates = set.rewrite_candidates.len(),
        "collected requirements"
    );
    (set, diags)
}

fn explicit_pass(files: &[ModuleFile], set: &mut RequirementSet, diags: &mut Diagnostics) {
    for file in files {
        if !file.required_providers.is_empty() {
            set.mark_candidate(&file.path);
        }

        for decl in file.required_providers.iter().flat_map(|b| &b.entries) {
            let provenance = match decl.source.as_deref() {
                Some(source) => match ProviderAddr::parse(source) {
                    Ok(addr) => Provenance::Declared(addr),
                    Err(err) => {
                        diags.push(
                            Diagnostic::error(
                                "Invalid provider source address",
                                format!(
                                    "The source {:?} for provider {:?} is not valid: {}.",
                                    source, decl.name, err
                                ),
                            )
                            .with_subject(decl.pos.clone()),
                        );
                        continue;
                    }
                },
                None => Provenance::Legacy(ProviderAddr::legacy(&decl.name)),
            };

            let fact = RequirementFact {
                name: decl.name.clone(),
                provenance,
                version: decl.version.clone(),
                origin: Some(decl.pos.clone()),
            };
            let (kept, inserted) = set.insert_if_absent(fact);
            if !inserted {
                let previous = kept
                    .origin
                    .as_ref()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "an unknown location".to_string());
                diags.push(
                    Diagnostic::warning(
                        "Duplicate required provider configuration",
                        format!(
                            "Found duplicate required provider configuration for {:?}. Previously configured at {}.",
                            decl.name, previous
                        ),
                    )
                    .with_subject(decl.pos.clone()),
                );
            }
        }
    }
}

fn configured_provider_pass(files: &[ModuleFile], set: &mut RequirementSet) {
    for config in files.iter().flat_map(|f| &f.provider_configs) {
        if !set.contains(&config.name) {
            debug!(
                name = %config.name,
                alias = ?config.alias,
                "provider inferred from configuration block"
            );
            set.insert_if_absent(RequirementFact::legacy(
                config.name.clone(),
                Some(config.pos.clone()),
            ));
        }
    }
}

fn usage_site_pass(files: &[ModuleFile], set: &mut RequirementSet) {
    for resource in files.iter().flat_map(|f| &f.resources) {
        let local = resource.provider_local_name();
        if !set.contains(local) {
            debug!(
                name = %local,
                mode = ?resource.mode,
                resource = %format!("{}.{}", resource.type_name, resource.name),
                "provider inferred from resource"
            );
            set.insert_if_absent(RequirementFact::legacy(local, Some(resource.pos.clone())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{SourceFile, load_module};
    use pretty_assertions::assert_eq;

    fn collect(files: &[(&str, &str)]) -> (RequirementSet, Diagnostics) {
        let sources: Vec<SourceFile> = files
            .iter()
            .map(|(path, text)| SourceFile::new(*path, *text))
            .collect();
        let (module, load_diags) = load_module(&sources);
        assert!(load_diags.is_empty(), "unexpected diagnostics: {:?}", load_diags);
        collect_requirements(&module)
    }

    #[test]
    fn explicit_declaration_beats_usage_sites() {
        let (set, diags) = collect(&[(
            "main.tf",
            r#"terraform {
  required_providers {
    aws = {
      source  = "example.com/acme/aws"
      version = "~> 2.0"
    }
  }
}

provider "aws" {}

resource "aws_instance" "a" {}
"#,
        )]);
        assert!(diags.is_empty());
        let aws = set.get("aws").unwrap();
        assert_eq!(
            aws.provenance,
            Provenance::Declared(ProviderAddr::new("example.com", "acme", "aws"))
        );
        assert_eq!(aws.version.as_deref(), Some("~> 2.0"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn duplicate_explicit_declarations_warn_and_keep_first() {
        let (set, diags) = collect(&[
            (
                "a.tf",
                "terraform {\n  required_providers {\n    aws = \"1.0\"\n  }\n}\n",
            ),
            (
                "b.tf",
                "terraform {\n  required_providers {\n    aws = \"2.0\"\n  }\n}\n",
            ),
        ]);
        assert_eq!(set.get("aws").unwrap().version.as_deref(), Some("1.0"));
        let warnings: Vec<&Diagnostic> = diags.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].summary, "Duplicate required provider configuration");
        assert!(warnings[0].detail.contains("a.tf:3"));
        assert_eq!(warnings[0].subject.as_ref().unwrap().file, "b.tf");
        assert_eq!(set.rewrite_candidates, vec!["a.tf", "b.tf"]);
    }

    #[test]
    fn configured_and_implied_providers_become_legacy_facts() {
        let (set, diags) = collect(&[(
            "main.tf",
            r#"provider "foo" {}

resource "bar_thing" "x" {}

data "baz_info" "y" {
  provider = quux.alt
}
"#,
        )]);
        assert!(diags.is_empty());
        let names: Vec<String> = set.sorted_facts().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["bar", "foo", "quux"]);
        for fact in set.iter() {
            assert_eq!(
                fact.provenance,
                Provenance::Legacy(ProviderAddr::legacy(&fact.name))
            );
            assert_eq!(fact.version, None);
        }
        assert!(set.rewrite_candidates.is_empty());
    }

    #[test]
    fn empty_required_providers_block_still_marks_candidate() {
        let (set, _) = collect(&[(
            "versions.tf",
            "terraform {\n  required_providers {\n  }\n}\n",
        )]);
        assert!(set.is_empty());
        assert_eq!(set.rewrite_candidates, vec!["versions.tf"]);
    }

    #[test]
    fn invalid_source_is_an_error() {
        let (set, diags) = collect(&[(
            "main.tf",
            "terraform {\n  required_providers {\n    aws = {\n      source = \"a/b/c/d\"\n    }\n  }\n}\n",
        )]);
        assert!(diags.has_errors());
        assert!(!set.contains("aws"));
    }
}
