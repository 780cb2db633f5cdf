//! Property tests for requirement collection across randomly assembled modules.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use provup_domain::{SourceFile, collect_requirements, load_module};
use provup_types::Provenance;

const NAMES: &[&str] = &["aws", "google", "foo", "bar", "baz"];

#[derive(Debug, Clone)]
struct FileShape {
    /// Explicit entries by local name; `true` when written with a `source`.
    explicit: BTreeMap<usize, bool>,
    providers: Vec<usize>,
    resources: Vec<usize>,
}

fn file_shape() -> impl Strategy<Value = FileShape> {
    (
        prop::collection::btree_map(0..NAMES.len(), any::<bool>(), 0..3),
        prop::collection::vec(0..NAMES.len(), 0..3),
        prop::collection::vec(0..NAMES.len(), 0..3),
    )
        .prop_map(|(explicit, providers, resources)| FileShape {
            explicit,
            providers,
            resources,
        })
}

fn render(shape: &FileShape) -> String {
    let mut out = String::new();
    if !shape.explicit.is_empty() {
        out.push_str("terraform {\n  required_providers {\n");
        for (&idx, &with_source) in &shape.explicit {
            let name = NAMES[idx];
            if with_source {
                out.push_str(&format!("    {name} = {{\n      source = \"hashicorp/{name}\"\n    }}\n"));
            } else {
                out.push_str(&format!("    {name} = \"~> 1.0\"\n"));
            }
        }
        out.push_str("  }\n}\n\n");
    }
    for &idx in &shape.providers {
        out.push_str(&format!("provider \"{}\" {{}}\n\n", NAMES[idx]));
    }
    for (i, &idx) in shape.resources.iter().enumerate() {
        out.push_str(&format!("resource \"{}_thing\" \"r{i}\" {{}}\n\n", NAMES[idx]));
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn one_fact_per_name_and_first_declaration_wins(
        shapes in prop::collection::vec(file_shape(), 1..4)
    ) {
        let sources: Vec<SourceFile> = shapes
            .iter()
            .enumerate()
            .map(|(i, shape)| SourceFile::new(format!("f{i}.tf"), render(shape)))
            .collect();
        let (files, load_diags) = load_module(&sources);
        prop_assert!(load_diags.is_empty(), "{:?}", load_diags);

        let (set, diags) = collect_requirements(&files);
        prop_assert!(!diags.has_errors());

        let mentioned: BTreeSet<&str> = shapes
            .iter()
            .flat_map(|s| {
                s.explicit
                    .keys()
                    .chain(&s.providers)
                    .chain(&s.resources)
                    .map(|&idx| NAMES[idx])
            })
            .collect();
        let collected: BTreeSet<&str> = set.iter().map(|f| f.name.as_str()).collect();
        prop_assert_eq!(collected, mentioned);

        let mut first_explicit: BTreeMap<&str, (usize, bool)> = BTreeMap::new();
        let mut explicit_total = 0;
        for (i, shape) in shapes.iter().enumerate() {
            for (&idx, &with_source) in &shape.explicit {
                explicit_total += 1;
                first_explicit.entry(NAMES[idx]).or_insert((i, with_source));
            }
        }

        for (name, (file_idx, with_source)) in &first_explicit {
            let fact = set.get(name).expect("explicit fact");
            let origin = fact.origin.as_ref().expect("origin");
            prop_assert_eq!(origin.file.as_str(), format!("f{file_idx}.tf"));
            prop_assert_eq!(matches!(fact.provenance, Provenance::Declared(_)), *with_source);
            if !with_source {
                prop_assert_eq!(fact.version.as_deref(), Some("~> 1.0"));
            }
        }
        for fact in set.iter().filter(|f| !first_explicit.contains_key(f.name.as_str())) {
            prop_assert!(matches!(fact.provenance, Provenance::Legacy(_)));
        }

        prop_assert_eq!(diags.len(), explicit_total - first_explicit.len());

        let candidates: Vec<String> = shapes
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.explicit.is_empty())
            .map(|(i, _)| format!("f{i}.tf"))
            .collect();
        let actual: Vec<String> = set
            .rewrite_candidates
            .iter()
            .map(|p| p.to_string())
            .collect();
        prop_assert_eq!(actual, candidates);
    }
}
