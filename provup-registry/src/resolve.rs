use provup_types::{Diagnostic, Diagnostics, Provenance, RequirementSet};
use tracing::{debug, warn};

use crate::ProviderSource;

/// Fills in provenance for every fact that still carries a legacy placeholder.
///
/// Declared addresses are never looked up or overwritten. A "not known" answer marks the fact
/// [`Provenance::NotKnown`]; any other error leaves the placeholder in place. Both produce a
/// warning and neither fails the run.
pub fn resolve_provenance(set: &mut RequirementSet, source: &dyn ProviderSource) -> Diagnostics {
    let mut diags = Diagnostics::new();

    for fact in set.iter_mut() {
        let Some(legacy) = fact.provenance.pending_lookup().cloned() else {
            continue;
        };

        match source.lookup_legacy(&legacy) {
            Ok(addr) => {
                debug!(name = %fact.name, source = %addr, "resolved provider source");
                fact.provenance = Provenance::Resolved(addr);
            }
            Err(err) => {
                warn!(name = %fact.name, error = %err, "provider source lookup failed");
                if err.is_not_known() {
                    fact.provenance = Provenance::NotKnown;
                }
                diags.push(Diagnostic::warning(
                    "Could not detect provider source",
                    format!(
                        "Error looking up provider source for {:?}: {}",
                        fact.name, err
                    ),
                ));
            }
        }
    }

    diags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemorySource;
    use pretty_assertions::assert_eq;
    use provup_types::{ProviderAddr, RequirementFact};

    fn set_of(facts: Vec<RequirementFact>) -> RequirementSet {
        let mut set = RequirementSet::new();
        for fact in facts {
            set.insert_if_absent(fact);
        }
        set
    }

    #[test]
    fn three_way_outcomes() {
        let mut set = set_of(vec![
            RequirementFact::legacy("foo", None),
            RequirementFact::legacy("gone", None),
            RequirementFact::legacy("flaky", None),
        ]);
        let source = InMemorySource::new()
            .with_provider("foo", "hashicorp")
            .with_failure("flaky", "connection reset");

        let diags = resolve_provenance(&mut set, &source);

        assert_eq!(
            set.get("foo").unwrap().provenance,
            Provenance::Resolved(ProviderAddr::default_for("foo"))
        );
        assert_eq!(set.get("gone").unwrap().provenance, Provenance::NotKnown);
        assert_eq!(
            set.get("flaky").unwrap().provenance,
            Provenance::Legacy(ProviderAddr::legacy("flaky"))
        );

        let details: Vec<&str> = diags.iter().map(|d| d.detail.as_str()).collect();
        assert_eq!(
            details,
            vec![
                "Error looking up provider source for \"flaky\": connection reset",
                "Error looking up provider source for \"gone\": provider \"gone\" is not known to the registry",
            ]
        );
        assert!(!diags.has_errors());
    }

    #[test]
    fn declared_sources_are_not_looked_up() {
        let declared = ProviderAddr::new("example.com", "acme", "foo");
        let mut set = set_of(vec![
            RequirementFact {
                name: "foo".into(),
                provenance: Provenance::Declared(declared.clone()),
                version: None,
                origin: None,
            },
            RequirementFact::legacy("bar", None),
        ]);
        let source = InMemorySource::new().with_provider("bar", "terraform-providers");

        let diags = resolve_provenance(&mut set, &source);

        assert!(diags.is_empty());
        assert_eq!(source.lookups(), vec!["bar"]);
        assert_eq!(
            set.get("foo").unwrap().provenance,
            Provenance::Declared(declared)
        );
        assert_eq!(
            set.get("bar").unwrap().provenance.source().unwrap().to_string(),
            "terraform-providers/bar"
        );
    }
}
